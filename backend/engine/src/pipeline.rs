//! Two-stage detection + recognition engine.

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, error, info};

use ocrgate_core::{
    AssetSource, DecodedImage, EngineError, Mode, RecognitionEngine, RecognitionResult, TextSpan,
};

use crate::charset::Charset;
use crate::ctc::{greedy_decode, ScoreMatrix};
use crate::detection::{expand_region, find_regions, ProbabilityMap, ScalePlan};
use crate::layout::reading_order;
use crate::profile::EngineProfile;

pub const DET_PARAM: &str = "det.param";
pub const DET_WEIGHTS: &str = "det.bin";
pub const REC_PARAM: &str = "rec.param";
pub const REC_WEIGHTS: &str = "rec.bin";
pub const KEYS: &str = "keys.txt";

/// Files an asset directory must hold for [`PipelineEngine::initialize`] to succeed.
pub const MODEL_ASSETS: [&str; 5] = [DET_PARAM, DET_WEIGHTS, REC_PARAM, REC_WEIGHTS, KEYS];

/// Height of every line image handed to the recognizer.
pub const REC_HEIGHT: u32 = 48;

/// Decoded lines at or below this mean score are discarded.
pub const MIN_CONFIDENCE: f32 = 0.5;

/// The numerical half of the pipeline: detector and recognizer forward passes.
///
/// Input normalization is the model's concern; the pipeline only resizes.
pub trait TextModel: Send + 'static {
    fn load(&mut self, assets: &AssetSource, profile: &EngineProfile) -> Result<(), EngineError>;

    /// Text probability for an image already resized to a [`ScalePlan`] target.
    fn detect(&mut self, input: &RgbImage) -> Result<ProbabilityMap, EngineError>;

    /// Per-step class scores for a single line image of height [`REC_HEIGHT`].
    fn recognize(&mut self, line: &RgbImage) -> Result<ScoreMatrix, EngineError>;

    fn unload(&mut self) {}
}

pub struct PipelineEngine<M> {
    model: M,
    profile: EngineProfile,
    charset: Option<Charset>,
}

impl<M: TextModel> PipelineEngine<M> {
    pub fn new(model: M, profile: EngineProfile) -> Self {
        Self {
            model,
            profile,
            charset: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.charset.is_some()
    }

    fn load(&mut self, assets: &AssetSource) -> Result<Charset, EngineError> {
        assets.require(&MODEL_ASSETS)?;
        self.model.load(assets, &self.profile)?;
        let charset = Charset::parse(&assets.read_to_string(KEYS)?);
        if charset.is_empty() {
            return Err(EngineError::Failed(format!("{KEYS} holds no symbols")));
        }
        Ok(charset)
    }
}

impl<M: TextModel> RecognitionEngine for PipelineEngine<M> {
    fn name(&self) -> &str {
        "pipeline"
    }

    fn initialize(&mut self, assets: &AssetSource) -> bool {
        if self.charset.is_some() {
            return true;
        }
        match self.load(assets) {
            Ok(charset) => {
                info!(
                    assets = %assets.root().display(),
                    classes = charset.len(),
                    max_side = self.profile.max_side,
                    "Pipeline models loaded"
                );
                self.charset = Some(charset);
                true
            }
            Err(e) => {
                error!(assets = %assets.root().display(), error = %e, "Failed to load pipeline models");
                false
            }
        }
    }

    fn infer(
        &mut self,
        image: &DecodedImage,
        mode: Mode,
    ) -> Result<RecognitionResult, EngineError> {
        let charset = self.charset.as_ref().ok_or(EngineError::NotLoaded)?;
        let spans = extract_spans(&mut self.model, &self.profile, charset, image.pixels())?;
        Ok(RecognitionResult::from_spans(reading_order(spans), mode))
    }

    fn release(&mut self) {
        if self.charset.take().is_some() {
            self.model.unload();
            info!("Pipeline models released");
        }
    }
}

fn extract_spans<M: TextModel>(
    model: &mut M,
    profile: &EngineProfile,
    charset: &Charset,
    pixels: &RgbImage,
) -> Result<Vec<TextSpan>, EngineError> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let plan = ScalePlan::new(width, height, profile.max_side);
    let input = imageops::resize(pixels, plan.target_width, plan.target_height, FilterType::Triangle);
    let map = model.detect(&input)?;
    let scale_x = map.width() as f32 / width as f32;
    let scale_y = map.height() as f32 / height as f32;

    let regions = find_regions(&map, profile.box_threshold);
    debug!(regions = regions.len(), "Detection finished");

    let mut spans = Vec::with_capacity(regions.len());
    for region in &regions {
        let bbox = expand_region(region, scale_x, scale_y, profile, width, height);
        if bbox.width == 0 || bbox.height == 0 {
            continue;
        }
        let roi = imageops::crop_imm(pixels, bbox.x, bbox.y, bbox.width, bbox.height).to_image();
        let rec_width = line_width(roi.width(), roi.height(), profile.rec_width_cap);
        let line = imageops::resize(&roi, rec_width, REC_HEIGHT, FilterType::Triangle);

        let scores = model.recognize(&line)?;
        let (text, confidence) = greedy_decode(&scores, charset);
        if !text.is_empty() && confidence > MIN_CONFIDENCE {
            spans.push(TextSpan { text, confidence, bbox });
        }
    }
    Ok(spans)
}

/// Recognizer input width: keep the aspect ratio at height 48, within `[48, cap]`.
fn line_width(width: u32, height: u32, cap: u32) -> u32 {
    let ratio = width as f32 / height.max(1) as f32;
    ((REC_HEIGHT as f32 * ratio) as u32).clamp(REC_HEIGHT, cap.max(REC_HEIGHT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocrgate_core::{BufferTracker, CenteredText, DetailedText};
    use std::fs;

    /// Detects one fixed block per call and decodes every line as "ab".
    struct FakeModel {
        classes: usize,
        loaded: bool,
        detect_calls: usize,
        line_heights: Vec<u32>,
    }

    impl FakeModel {
        fn new() -> Self {
            Self {
                classes: 0,
                loaded: false,
                detect_calls: 0,
                line_heights: Vec::new(),
            }
        }
    }

    impl TextModel for FakeModel {
        fn load(&mut self, assets: &AssetSource, _: &EngineProfile) -> Result<(), EngineError> {
            self.classes = Charset::parse(&assets.read_to_string(KEYS)?).len();
            self.loaded = true;
            Ok(())
        }

        fn detect(&mut self, input: &RgbImage) -> Result<ProbabilityMap, EngineError> {
            self.detect_calls += 1;
            let (w, h) = input.dimensions();
            let mut data = vec![0.0; (w * h) as usize];
            for y in 16..32 {
                for x in 12..52 {
                    data[(y * w + x) as usize] = 0.95;
                }
            }
            ProbabilityMap::new(w, h, data)
        }

        fn recognize(&mut self, line: &RgbImage) -> Result<ScoreMatrix, EngineError> {
            self.line_heights.push(line.height());
            let picks = [(1, 0.9), (1, 0.9), (0, 0.99), (2, 0.7)];
            let mut data = vec![0.0; picks.len() * self.classes];
            for (step, (class, score)) in picks.into_iter().enumerate() {
                data[step * self.classes + class] = score;
            }
            ScoreMatrix::new(picks.len(), self.classes, data)
        }

        fn unload(&mut self) {
            self.loaded = false;
        }
    }

    fn asset_dir(with_keys: bool) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in [DET_PARAM, DET_WEIGHTS, REC_PARAM, REC_WEIGHTS] {
            fs::write(dir.path().join(name), b"stub").unwrap();
        }
        if with_keys {
            fs::write(dir.path().join(KEYS), "a\nb\n").unwrap();
        }
        dir
    }

    fn image(tracker: &BufferTracker) -> DecodedImage {
        tracker.track(RgbImage::from_pixel(100, 40, image::Rgb([255, 255, 255])))
    }

    #[test]
    fn missing_assets_fail_initialization() {
        let dir = asset_dir(false);
        let mut engine = PipelineEngine::new(FakeModel::new(), EngineProfile::MOBILE);
        assert!(!engine.initialize(&AssetSource::new(dir.path())));
        assert!(!engine.is_loaded());
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = asset_dir(true);
        let assets = AssetSource::new(dir.path());
        let mut engine = PipelineEngine::new(FakeModel::new(), EngineProfile::MOBILE);
        assert!(engine.initialize(&assets));
        fs::remove_file(dir.path().join(KEYS)).unwrap();
        assert!(engine.initialize(&assets));
    }

    #[test]
    fn infer_before_initialize_is_an_error() {
        let tracker = BufferTracker::new();
        let mut engine = PipelineEngine::new(FakeModel::new(), EngineProfile::MOBILE);
        assert!(matches!(
            engine.infer(&image(&tracker), Mode::Text),
            Err(EngineError::NotLoaded)
        ));
    }

    #[test]
    fn detected_block_is_recognized_in_every_mode() {
        let dir = asset_dir(true);
        let tracker = BufferTracker::new();
        let mut engine = PipelineEngine::new(FakeModel::new(), EngineProfile::MOBILE);
        assert!(engine.initialize(&AssetSource::new(dir.path())));

        let img = image(&tracker);
        assert_eq!(
            engine.infer(&img, Mode::Text).unwrap(),
            RecognitionResult::Text("ab".into())
        );

        let RecognitionResult::Detailed(items) = engine.infer(&img, Mode::Detailed).unwrap() else {
            panic!("expected detailed result");
        };
        assert_eq!(items.len(), 1);
        let DetailedText { text, confidence, bbox } = &items[0];
        assert_eq!(text, "ab");
        assert!((confidence - 0.8).abs() < 1e-5);
        assert!(bbox.x + bbox.width <= 100 && bbox.y + bbox.height <= 40);
        // The detected block maps to roughly x 9..41, y 10..20 in the source.
        assert!(bbox.x <= 9 && bbox.x + bbox.width >= 41);
        assert!(bbox.y <= 10 && bbox.y + bbox.height >= 20);

        let RecognitionResult::Centers(points) = engine.infer(&img, Mode::Centers).unwrap() else {
            panic!("expected centers result");
        };
        let (cx, cy) = bbox.center();
        assert_eq!(points, vec![CenteredText { text: "ab".into(), x: cx, y: cy }]);

        assert!(engine.model.line_heights.iter().all(|&h| h == REC_HEIGHT));
        assert_eq!(engine.model.detect_calls, 3);
    }

    #[test]
    fn release_unloads_the_model() {
        let dir = asset_dir(true);
        let mut engine = PipelineEngine::new(FakeModel::new(), EngineProfile::MOBILE);
        assert!(engine.initialize(&AssetSource::new(dir.path())));
        engine.release();
        assert!(!engine.is_loaded());
        assert!(!engine.model.loaded);
    }

    #[test]
    fn line_width_is_clamped() {
        assert_eq!(line_width(10, 48, 960), 48);
        assert_eq!(line_width(96, 48, 960), 96);
        assert_eq!(line_width(4000, 48, 960), 960);
    }
}
