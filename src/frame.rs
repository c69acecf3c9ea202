use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub palm_position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stabilized_palm_position: Option<Vec3>,
}

impl Hand {
    pub fn new(palm_position: Vec3) -> Self {
        Self {
            palm_position,
            stabilized_palm_position: None,
        }
    }

    /// Smoothed palm position, or the raw one when the source sent none.
    pub fn stabilized_palm(&self) -> Vec3 {
        self.stabilized_palm_position.unwrap_or(self.palm_position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointable {
    pub tip_position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stabilized_tip_position: Option<Vec3>,
}

impl Pointable {
    pub fn new(tip_position: Vec3) -> Self {
        Self {
            tip_position,
            stabilized_tip_position: None,
        }
    }

    pub fn stabilized_tip(&self) -> Vec3 {
        self.stabilized_tip_position.unwrap_or(self.tip_position)
    }
}

/// One observation: every visible hand plus the pointables of all hands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub hands: Vec<Hand>,
    #[serde(default)]
    pub pointables: Vec<Pointable>,
}

impl Frame {
    pub fn new(hands: Vec<Hand>, pointables: Vec<Pointable>) -> Self {
        Self { hands, pointables }
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    pub fn finger_count(&self) -> usize {
        self.pointables.len()
    }

    fn is_finite(&self) -> bool {
        let hands_ok = self.hands.iter().all(|h| {
            h.palm_position.is_finite() && h.stabilized_palm_position.is_none_or(|p| p.is_finite())
        });
        let tips_ok = self.pointables.iter().all(|p| {
            p.tip_position.is_finite() && p.stabilized_tip_position.is_none_or(|t| t.is_finite())
        });
        hands_ok && tips_ok
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("line {line}: malformed frame: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: frame contains non-finite coordinates")]
    NonFinite { line: usize },
}

/// Parse one JSON-lines record. Blank lines yield `Ok(None)`.
pub fn parse_line(line_no: usize, text: &str) -> Result<Option<Frame>, FrameError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let frame: Frame = serde_json::from_str(text).map_err(|source| FrameError::Json {
        line: line_no,
        source,
    })?;
    if !frame.is_finite() {
        return Err(FrameError::NonFinite { line: line_no });
    }
    Ok(Some(frame))
}
