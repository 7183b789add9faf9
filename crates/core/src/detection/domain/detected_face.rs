use serde::{Deserialize, Serialize};

use crate::shared::point::Point;

/// One face from a single detection call: an ordered landmark list in
/// detector-space. It carries no identity beyond its position in the batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectedFace {
    points: Vec<Point>,
}

impl DetectedFace {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A wireframe needs at least one segment.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }

    /// Consecutive landmark pairs, in detector order.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}

impl From<Vec<(f64, f64)>> for DetectedFace {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self::new(points.into_iter().map(Point::from).collect())
    }
}
