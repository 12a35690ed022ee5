/// Symbol reserved for the CTC blank class at index 0.
pub const BLANK: &str = "#";

/// Recognition alphabet loaded from `keys.txt`.
///
/// Index 0 is always the blank; file line `n` becomes class `n + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    symbols: Vec<String>,
}

impl Charset {
    pub fn parse(content: &str) -> Self {
        let mut symbols = vec![BLANK.to_string()];
        if content.is_empty() {
            return Self { symbols };
        }
        let mut lines: Vec<&str> = content.split('\n').collect();
        if content.ends_with('\n') {
            lines.pop();
        }
        symbols.extend(
            lines
                .into_iter()
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string()),
        );
        Self { symbols }
    }

    /// Number of classes including the blank.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.len() <= 1
    }

    pub fn symbol(&self, class: usize) -> Option<&str> {
        self.symbols.get(class).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_is_prepended_and_crlf_stripped() {
        let charset = Charset::parse("a\r\nb\r\n");
        assert_eq!(charset.len(), 3);
        assert_eq!(charset.symbol(0), Some(BLANK));
        assert_eq!(charset.symbol(1), Some("a"));
        assert_eq!(charset.symbol(2), Some("b"));
        assert_eq!(charset.symbol(3), None);
    }

    #[test]
    fn last_line_without_newline_is_kept() {
        let charset = Charset::parse("x\ny");
        assert_eq!(charset.len(), 3);
        assert_eq!(charset.symbol(2), Some("y"));
    }

    #[test]
    fn empty_file_has_only_blank() {
        assert!(Charset::parse("").is_empty());
    }
}
