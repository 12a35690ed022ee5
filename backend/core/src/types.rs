use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::error::RecognitionError;

/// Output granularity requested by a client (`type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// `type=1`: newline-joined plain text.
    #[default]
    Text,
    /// `type=2`: text with the centre point of its box.
    Centers,
    /// `type=3`: text with confidence and full bounding box.
    Detailed,
}

impl Mode {
    /// Map a raw wire code to a mode. Codes outside `1..=3` fall back to [`Mode::Text`].
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Centers,
            3 => Self::Detailed,
            _ => Self::Text,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Text => 1,
            Self::Centers => 2,
            Self::Detailed => 3,
        }
    }
}

/// A validated inbound request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    path: String,
    mode: Mode,
}

impl RecognitionRequest {
    pub fn new(path: impl Into<String>, mode: Mode) -> Result<Self, RecognitionError> {
        let path = path.into();
        if path.is_empty() {
            return Err(RecognitionError::MissingPath);
        }
        Ok(Self { path, mode })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Axis-aligned box in source image pixels. Serialized as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Integer centre point, `(x + w/2, y + h/2)`.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(4))?;
        seq.serialize_element(&self.x)?;
        seq.serialize_element(&self.y)?;
        seq.serialize_element(&self.width)?;
        seq.serialize_element(&self.height)?;
        seq.end()
    }
}

/// One detected run of text as produced inside an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenteredText {
    pub text: String,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedText {
    pub text: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

/// Engine output, shaped by the requested [`Mode`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionResult {
    Text(String),
    Centers(Vec<CenteredText>),
    Detailed(Vec<DetailedText>),
}

impl RecognitionResult {
    /// Shape spans (already in reading order) into the result for `mode`.
    pub fn from_spans(spans: Vec<TextSpan>, mode: Mode) -> Self {
        match mode {
            Mode::Text => Self::Text(
                spans
                    .into_iter()
                    .map(|span| span.text)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Mode::Centers => Self::Centers(
                spans
                    .into_iter()
                    .map(|span| {
                        let (x, y) = span.bbox.center();
                        CenteredText { text: span.text, x, y }
                    })
                    .collect(),
            ),
            Mode::Detailed => Self::Detailed(
                spans
                    .into_iter()
                    .map(|span| DetailedText {
                        text: span.text,
                        confidence: span.confidence.clamp(0.0, 1.0),
                        bbox: span.bbox,
                    })
                    .collect(),
            ),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Text(_) => Mode::Text,
            Self::Centers(_) => Mode::Centers,
            Self::Detailed(_) => Mode::Detailed,
        }
    }
}

/// `data` half of the wire payload: a message string or a structured result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadData {
    Text(String),
    Centers(Vec<CenteredText>),
    Detailed(Vec<DetailedText>),
}

/// The one reply every request gets: `{ "status": <int>, "data": <string|array> }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsePayload {
    pub status: u16,
    pub data: PayloadData,
}

impl ResponsePayload {
    pub fn success(result: RecognitionResult) -> Self {
        let data = match result {
            RecognitionResult::Text(text) => PayloadData::Text(text),
            RecognitionResult::Centers(items) => PayloadData::Centers(items),
            RecognitionResult::Detailed(items) => PayloadData::Detailed(items),
        };
        Self { status: 200, data }
    }

    pub fn failure(err: &RecognitionError) -> Self {
        Self {
            status: err.status(),
            data: PayloadData::Text(format!("Error: {err}")),
        }
    }
}
