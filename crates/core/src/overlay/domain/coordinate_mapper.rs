use thiserror::Error;

use crate::shared::point::Point;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapperError {
    #[error("source dimensions must be non-zero, got {0}x{1}")]
    ZeroSource(u32, u32),
    #[error("target dimensions must be non-zero, got {0}x{1}")]
    ZeroTarget(u32, u32),
}

/// Independent linear scaling per axis: `x' = x * tw / sw`, `y' = y * th / sh`.
///
/// No clamping; points outside the source map outside the target.
/// `z` passes through unchanged.
pub fn map_point(
    point: Point,
    source_width: f64,
    source_height: f64,
    target_width: f64,
    target_height: f64,
) -> Point {
    Point {
        x: point.x * target_width / source_width,
        y: point.y * target_height / source_height,
        z: point.z,
    }
}

/// Detector-space → display-space mapping with dimensions fixed at
/// construction, so zero sizes are rejected once instead of per point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    source: (u32, u32),
    target: (u32, u32),
}

impl CoordinateMapper {
    pub fn new(source: (u32, u32), target: (u32, u32)) -> Result<Self, MapperError> {
        if source.0 == 0 || source.1 == 0 {
            return Err(MapperError::ZeroSource(source.0, source.1));
        }
        if target.0 == 0 || target.1 == 0 {
            return Err(MapperError::ZeroTarget(target.0, target.1));
        }
        Ok(Self { source, target })
    }

    /// Same mapping with a new display size (e.g. after a canvas resize).
    pub fn with_target(self, target: (u32, u32)) -> Result<Self, MapperError> {
        Self::new(self.source, target)
    }

    pub fn source(&self) -> (u32, u32) {
        self.source
    }

    pub fn target(&self) -> (u32, u32) {
        self.target
    }

    pub fn map(&self, point: Point) -> Point {
        map_point(
            point,
            self.source.0 as f64,
            self.source.1 as f64,
            self.target.0 as f64,
            self.target.1 as f64,
        )
    }
}
