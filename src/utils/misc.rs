use crate::error::{PhotostimError, Result};
use bon::Builder;
use serde::{Deserialize, Serialize};

/// Centre of a stimulation target in pixel (x, y) or voxel (x, y, z) space.
///
/// `x` indexes the first axis of a raster mask and `y` the second, so a
/// coordinate produced by [`crate::processing::image_to_pixel`] addresses the
/// same cell when it is rasterised again.
#[derive(Debug, Copy, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coordinate {
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    pub fn components(&self) -> impl Iterator<Item = f64> {
        [self.x, self.y].into_iter().chain(self.z)
    }

    /// Number of spatial axes, 2 or 3
    pub fn rank(&self) -> usize {
        if self.z.is_some() { 3 } else { 2 }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self::xy(x, y)
    }
}

impl From<(f64, f64, f64)> for Coordinate {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::xyz(x, y, z)
    }
}

impl From<[usize; 2]> for Coordinate {
    fn from([x, y]: [usize; 2]) -> Self {
        Self::xy(x as f64, y as f64)
    }
}

/// A strictly positive mask cell, as `[x, y, weight]`.
pub type PixelWeight = [usize; 3];

/// Reject NaN and infinite values, which cannot be stored.
pub(crate) fn check_finite(field: &str, values: impl IntoIterator<Item = f64>) -> Result<()> {
    match values.into_iter().find(|v| !v.is_finite()) {
        Some(bad) => Err(PhotostimError::Validation(format!(
            "'{}' must be finite, found {}",
            field, bad
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_finite() {
        assert!(check_finite("rate", Some(2.0)).is_ok());
        assert!(check_finite("rate", None).is_ok());
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = check_finite("timestamps", [0.0, bad]).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        }
        assert_eq!(Coordinate::xyz(1.0, 2.0, 3.0).components().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }
}
