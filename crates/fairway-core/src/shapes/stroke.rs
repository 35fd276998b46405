//! Freehand ink stroke.

use super::{PathId, PathTrait, Sample, SerializableColor};
use crate::outline::{polygon_to_bez_path, stroke_to_outline};
use kurbo::{BezPath, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A freehand stroke (ordered series of pressure samples).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub(crate) id: PathId,
    /// Samples in drawing order. Never empty.
    samples: Vec<Sample>,
    /// Fill color of the inked outline.
    pub color: SerializableColor,
    /// Nominal stroke thickness.
    pub width: f64,
}

impl Stroke {
    /// Start a stroke at its first sample.
    pub fn new(first: Sample, color: SerializableColor, width: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            samples: vec![first],
            color,
            width,
        }
    }

    /// Build a stroke from existing samples. Returns `None` for an empty list.
    pub fn from_samples(
        samples: Vec<Sample>,
        color: SerializableColor,
        width: f64,
    ) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            samples,
            color,
            width,
        })
    }

    /// Append a sample to the end of the stroke.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Closed fill region of the inked stroke.
    pub fn outline(&self) -> BezPath {
        polygon_to_bez_path(&stroke_to_outline(&self.samples, self.width))
    }
}

impl PathTrait for Stroke {
    fn id(&self) -> PathId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let Some(first) = self.samples.first() else {
            return Rect::ZERO;
        };

        let start = Rect::from_points(first.point(), first.point());
        self.samples
            .iter()
            .fold(start, |acc, s| acc.union_pt(s.point()))
            .inflate(self.width / 2.0, self.width / 2.0)
    }
}
