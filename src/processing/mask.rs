//! Conversions between raster masks and lists of stimulation centres
//!
//! Axis convention: a centre `(x, y)` addresses mask cell `[x, y]`, i.e. `x`
//! runs along the first array axis and `y` along the second. This keeps
//! [`image_to_pixel`] and [`pixel_to_image_mask`] inverse to each other for
//! unit-sized targets.

use crate::error::{PhotostimError, Result};
use crate::types::pattern::RoiSize;
use crate::utils::misc::{Coordinate, PixelWeight};
use ndarray::{Array2, ArrayD, Ix2};

/// Rasterise a list of centres into a 2D mask of shape `dimension`.
///
/// A scalar `roi_size` stamps a disk of that diameter around every centre, a
/// vector `roi_size` stamps an axis-aligned box of `roi_size[0] x roi_size[1]`.
/// Overlapping stamps are OR'ed together.
pub fn pixel_to_image_mask(
    pixel_roi: &[Coordinate],
    roi_size: &RoiSize,
    dimension: &[usize],
) -> Result<ArrayD<u8>> {
    let (size_x, size_y) = match dimension {
        [size_x, size_y] => (*size_x, *size_y),
        [_, _, _] => {
            return Err(PhotostimError::UnsupportedOperation(
                "Cannot convert 3D 'pixel_roi' to 'image_mask_roi'".into(),
            ));
        }
        other => {
            return Err(PhotostimError::Validation(format!(
                "'dimension' must have 2 or 3 entries, got {}",
                other.len()
            )));
        }
    };

    let mut mask = Array2::<u8>::zeros((size_x, size_y));
    for center in pixel_roi {
        match roi_size {
            RoiSize::Diameter(diameter) => stamp_disk(&mut mask, center, *diameter),
            RoiSize::Extent(extent) => match extent.as_slice() {
                [width, height, ..] => stamp_box(&mut mask, center, *width, *height),
                _ => {
                    return Err(PhotostimError::Validation(format!(
                        "'roi_size' box must have 2 or 3 entries, got {}",
                        extent.len()
                    )));
                }
            },
        }
    }

    Ok(mask.into_dyn())
}

/// Every cell within `diameter / 2` (Euclidean) of the centre
fn stamp_disk(mask: &mut Array2<u8>, center: &Coordinate, diameter: f64) {
    let radius = diameter / 2.0;
    let radius_sq = radius * radius;
    let (xs, ys) = bounding_box(mask, center, radius, radius);

    for x in xs {
        for y in ys.clone() {
            let dx = x as f64 - center.x;
            let dy = y as f64 - center.y;
            if dx * dx + dy * dy <= radius_sq {
                mask[[x, y]] = 1;
            }
        }
    }
}

/// Every cell within `width / 2` along x and `height / 2` along y
fn stamp_box(mask: &mut Array2<u8>, center: &Coordinate, width: f64, height: f64) {
    let (half_w, half_h) = (width / 2.0, height / 2.0);
    let (xs, ys) = bounding_box(mask, center, half_w, half_h);

    for x in xs {
        for y in ys.clone() {
            if (x as f64 - center.x).abs() <= half_w && (y as f64 - center.y).abs() <= half_h {
                mask[[x, y]] = 1;
            }
        }
    }
}

fn bounding_box(
    mask: &Array2<u8>,
    center: &Coordinate,
    half_x: f64,
    half_y: f64,
) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let (size_x, size_y) = mask.dim();
    let clamp = |lo: f64, hi: f64, size: usize| {
        let lo = lo.ceil().max(0.0);
        let hi = (hi.floor() + 1.0).min(size as f64);
        if hi <= lo {
            0..0
        } else {
            lo as usize..hi as usize
        }
    };
    (
        clamp(center.x - half_x, center.x + half_x, size_x),
        clamp(center.y - half_y, center.y + half_y, size_y),
    )
}

/// List every strictly positive cell of a 2D mask as `[x, y, weight]`, in
/// row-major order.
pub fn image_to_pixel(image_mask: &ArrayD<u8>) -> Result<Vec<PixelWeight>> {
    let mask = image_mask
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| {
            PhotostimError::UnsupportedOperation(format!(
                "Cannot convert a {}D 'image_mask_roi' to pixels",
                image_mask.ndim()
            ))
        })?;

    Ok(mask
        .indexed_iter()
        .filter(|(_, weight)| **weight > 0)
        .map(|((x, y), weight)| [x, y, *weight as usize])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::{IxDyn, array};

    #[test]
    fn test_unit_disk_marks_only_center() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mask = pixel_to_image_mask(&[Coordinate::xy(2.0, 3.0)], &RoiSize::Diameter(1.0), &[5, 6])?;
        assert_eq!(mask.shape(), &[5, 6]);
        assert_eq!(mask.iter().filter(|v| **v == 1).count(), 1);
        assert_eq!(mask[IxDyn(&[2, 3])], 1);
        Ok(())
    }

    #[test]
    fn test_disk_is_euclidean() -> std::result::Result<(), Box<dyn std::error::Error>> {
        // radius 1: the centre and its four axis neighbours, no diagonals
        let mask = pixel_to_image_mask(&[Coordinate::xy(2.0, 2.0)], &RoiSize::Diameter(2.0), &[5, 5])?;
        let expected = array![
            [0u8, 0, 0, 0, 0],
            [0, 0, 1, 0, 0],
            [0, 1, 1, 1, 0],
            [0, 0, 1, 0, 0],
            [0, 0, 0, 0, 0],
        ]
        .into_dyn();
        assert_eq!(mask, expected);
        Ok(())
    }

    #[test]
    fn test_box_is_per_axis() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mask = pixel_to_image_mask(
            &[Coordinate::xy(2.0, 2.0)],
            &RoiSize::Extent(vec![2.0, 4.0]),
            &[5, 5],
        )?;
        let expected = array![
            [0u8, 0, 0, 0, 0],
            [1, 1, 1, 1, 1],
            [1, 1, 1, 1, 1],
            [1, 1, 1, 1, 1],
            [0, 0, 0, 0, 0],
        ]
        .into_dyn();
        assert_eq!(mask, expected);
        Ok(())
    }

    #[test]
    fn test_stamps_clip_at_border_and_overlap() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let centers = [Coordinate::xy(0.0, 0.0), Coordinate::xy(1.0, 0.0)];
        let mask = pixel_to_image_mask(&centers, &RoiSize::Extent(vec![2.0, 2.0]), &[3, 3])?;
        let expected = array![[1u8, 1, 0], [1, 1, 0], [1, 1, 0]].into_dyn();
        assert_eq!(mask, expected);
        Ok(())
    }

    #[test]
    fn test_3d_rasterisation_unsupported() {
        let err = pixel_to_image_mask(
            &[Coordinate::xyz(1.0, 1.0, 1.0)],
            &RoiSize::Diameter(2.0),
            &[4, 4, 4],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn test_image_to_pixel_row_major() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mask = array![[0u8, 1, 0], [1, 0, 1]].into_dyn();
        let pixels = image_to_pixel(&mask)?;
        assert_eq!(pixels, vec![[0, 1, 1], [1, 0, 1], [1, 2, 1]]);
        Ok(())
    }

    #[test]
    fn test_image_to_pixel_rejects_3d() {
        let mask = ArrayD::<u8>::zeros(IxDyn(&[2, 2, 2]));
        assert_eq!(
            image_to_pixel(&mask).unwrap_err().kind(),
            ErrorKind::UnsupportedOperation
        );
    }
}
