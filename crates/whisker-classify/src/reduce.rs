use crate::Scores;

/// One of the two fixed classes the model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryClass {
    Class0,
    Class1,
}

/// The externally visible output of one pipeline pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub class: BinaryClass,
    pub label: String,
    pub confidence: f32,
}

/// Reduces a score vector to the winning class and its confidence.
///
/// Carries the two display label strings so downstream sinks get a
/// human-readable result.
#[derive(Debug, Clone)]
pub struct Reducer {
    labels: [String; 2],
}

impl Reducer {
    pub fn new(labels: [String; 2]) -> Self {
        Self { labels }
    }

    /// Strict greater-than comparison between the two scores.
    ///
    /// Equal scores resolve to class1, always. That tie-break is part of the
    /// pipeline's observable behavior and must not change. No clamping, no
    /// thresholding.
    pub fn reduce(&self, scores: &Scores) -> Classification {
        if scores.class0 > scores.class1 {
            Classification {
                class: BinaryClass::Class0,
                label: self.labels[0].clone(),
                confidence: scores.class0,
            }
        } else {
            Classification {
                class: BinaryClass::Class1,
                label: self.labels[1].clone(),
                confidence: scores.class1,
            }
        }
    }
}
