use ocrgate_core::EngineError;

use crate::charset::Charset;

/// Recognizer output: one row of class scores per time step, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    steps: usize,
    classes: usize,
    data: Vec<f32>,
}

impl ScoreMatrix {
    pub fn new(steps: usize, classes: usize, data: Vec<f32>) -> Result<Self, EngineError> {
        if data.len() != steps * classes {
            return Err(EngineError::Failed(format!(
                "score matrix is {} values, expected {steps}x{classes}",
                data.len()
            )));
        }
        Ok(Self { steps, classes, data })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn row(&self, step: usize) -> &[f32] {
        &self.data[step * self.classes..(step + 1) * self.classes]
    }
}

/// Greedy CTC decode. Returns the text and the mean score of the emitted symbols.
///
/// A class is emitted when it is not the blank, differs from the previous
/// step's class, and exists in `charset`.
pub fn greedy_decode(scores: &ScoreMatrix, charset: &Charset) -> (String, f32) {
    let mut text = String::new();
    let mut score_sum = 0.0f32;
    let mut emitted = 0usize;
    let mut last_class: Option<usize> = None;

    for step in 0..scores.steps() {
        let Some((class, score)) = arg_max(scores.row(step)) else {
            continue;
        };
        if last_class != Some(class) && class > 0 {
            if let Some(symbol) = charset.symbol(class) {
                text.push_str(symbol);
                score_sum += score;
                emitted += 1;
            }
        }
        last_class = Some(class);
    }

    let confidence = if emitted > 0 {
        score_sum / emitted as f32
    } else {
        0.0
    };
    (text, confidence)
}

fn arg_max(row: &[f32]) -> Option<(usize, f32)> {
    let (first, rest) = row.split_first()?;
    let mut best = (0, *first);
    for (offset, &value) in rest.iter().enumerate() {
        if value > best.1 {
            best = (offset + 1, value);
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(classes: usize, picks: &[(usize, f32)]) -> ScoreMatrix {
        let mut data = vec![0.0; picks.len() * classes];
        for (step, &(class, score)) in picks.iter().enumerate() {
            data[step * classes + class] = score;
        }
        ScoreMatrix::new(picks.len(), classes, data).unwrap()
    }

    #[test]
    fn repeats_collapse_and_blanks_separate() {
        let charset = Charset::parse("a\nb\n");
        let scores = one_hot(
            3,
            &[(1, 0.9), (1, 0.9), (0, 0.99), (1, 0.5), (2, 0.7), (2, 0.8)],
        );
        let (text, confidence) = greedy_decode(&scores, &charset);
        assert_eq!(text, "aab");
        assert!((confidence - (0.9 + 0.5 + 0.7) / 3.0).abs() < 1e-6);
    }

    #[test]
    fn classes_beyond_the_charset_are_skipped() {
        let charset = Charset::parse("a\n");
        let scores = one_hot(4, &[(3, 0.9), (1, 0.6)]);
        let (text, confidence) = greedy_decode(&scores, &charset);
        assert_eq!(text, "a");
        assert!((confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn all_blank_decodes_to_nothing() {
        let charset = Charset::parse("a\n");
        let scores = one_hot(2, &[(0, 0.9), (0, 0.9)]);
        assert_eq!(greedy_decode(&scores, &charset), (String::new(), 0.0));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        assert!(ScoreMatrix::new(2, 3, vec![0.0; 5]).is_err());
    }
}
