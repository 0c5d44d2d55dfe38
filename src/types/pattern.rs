//! Spatial stimulation targets

use crate::error::{PhotostimError, Result};
use crate::processing::mask::{image_to_pixel, pixel_to_image_mask};
use crate::types::document::PatternNode;
use crate::types::method::PhotostimulationMethod;
use crate::utils::misc::{Coordinate, PixelWeight, check_finite};
use bon::bon;
use ndarray::{ArrayD, Ix2};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::rc::Rc;

/// Size of a single stimulation target in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoiSize {
    /// Disk (2D) or cylinder (3D) of this diameter
    Diameter(f64),
    /// Rectangle `[width, height]` or cuboid `[width, height, depth]`
    Extent(Vec<f64>),
}

impl RoiSize {
    /// A one-element slice is a diameter, two or three elements a box.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            [diameter] => Ok(Self::Diameter(*diameter)),
            [_, _] | [_, _, _] => Ok(Self::Extent(values.to_vec())),
            _ => Err(PhotostimError::Validation(format!(
                "'roi_size' must be a scalar, a 2D iterable, or a 3D iterable, got {} entries",
                values.len()
            ))),
        }
    }
}

impl From<f64> for RoiSize {
    fn from(diameter: f64) -> Self {
        Self::Diameter(diameter)
    }
}

/// A photostimulation target region, stored either as a raster mask or as a
/// list of target centres with a uniform size.
#[derive(Debug, Clone, PartialEq)]
pub struct HolographicPattern {
    name: String,
    image_mask_roi: Option<ArrayD<u8>>,
    pixel_roi: Option<Vec<Coordinate>>,
    stim_duration: Option<f64>,
    roi_size: Option<RoiSize>,
    dimension: Vec<usize>,
    method: Option<Rc<PhotostimulationMethod>>,
}

#[bon]
impl HolographicPattern {
    /// Build a pattern from exactly one of `image_mask_roi` or `pixel_roi`.
    ///
    /// Mask cells must be exactly 0 or 1. A pixel list needs both `roi_size`
    /// and `dimension`; for a mask, `dimension` defaults to the mask shape.
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        image_mask_roi: Option<ArrayD<f64>>,
        pixel_roi: Option<Vec<Coordinate>>,
        stim_duration: Option<f64>,
        roi_size: Option<Vec<f64>>,
        dimension: Option<Vec<usize>>,
        method: Option<Rc<PhotostimulationMethod>>,
    ) -> Result<Self> {
        check_finite("stim_duration", stim_duration)?;
        check_finite("roi_size", roi_size.iter().flatten().copied())?;
        check_finite(
            "pixel_roi",
            pixel_roi.iter().flatten().flat_map(Coordinate::components),
        )?;
        let roi_size = roi_size.as_deref().map(RoiSize::from_slice).transpose()?;

        if let Some(dimension) = &dimension {
            check_rank("dimension", dimension.len())?;
        }

        let (image_mask_roi, pixel_roi, dimension) = match (image_mask_roi, pixel_roi) {
            (None, None) => {
                return Err(PhotostimError::Configuration(format!(
                    "Must provide 'pixel_roi' or 'image_mask_roi' when constructing HolographicPattern '{}'",
                    name
                )));
            }
            (Some(_), Some(_)) => {
                return Err(PhotostimError::Configuration(format!(
                    "HolographicPattern '{}' takes either 'pixel_roi' or 'image_mask_roi', not both",
                    name
                )));
            }
            (Some(mask), None) => {
                let mask = binarize_mask(&mask)?;
                let dimension = match dimension {
                    Some(dimension) if dimension.as_slice() != mask.shape() => {
                        return Err(PhotostimError::Validation(format!(
                            "'dimension' {:?} does not match 'image_mask_roi' shape {:?}",
                            dimension,
                            mask.shape()
                        )));
                    }
                    Some(dimension) => dimension,
                    None => mask.shape().to_vec(),
                };
                (Some(mask), None, dimension)
            }
            (None, Some(pixels)) => {
                if roi_size.is_none() {
                    return Err(PhotostimError::Configuration(
                        "'roi_size' must be specified when using a pixel mask".into(),
                    ));
                }
                let Some(dimension) = dimension else {
                    return Err(PhotostimError::Configuration(
                        "'dimension' must be specified when using a pixel mask".into(),
                    ));
                };
                if let Some(center) = pixels.iter().find(|c| c.rank() != dimension.len()) {
                    return Err(PhotostimError::Validation(format!(
                        "'pixel_roi' centre {:?} does not have {} coordinates",
                        center,
                        dimension.len()
                    )));
                }
                (None, Some(pixels), dimension)
            }
        };

        tracing::debug!(name = %name, dimension = ?dimension, "created holographic pattern");
        Ok(Self {
            name,
            image_mask_roi,
            pixel_roi,
            stim_duration,
            roi_size,
            dimension,
            method,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image_mask_roi(&self) -> Option<&ArrayD<u8>> {
        self.image_mask_roi.as_ref()
    }

    pub fn pixel_roi(&self) -> Option<&[Coordinate]> {
        self.pixel_roi.as_deref()
    }

    pub fn stim_duration(&self) -> Option<f64> {
        self.stim_duration
    }

    pub fn roi_size(&self) -> Option<&RoiSize> {
        self.roi_size.as_ref()
    }

    /// Number of pixels along x, y (and z)
    pub fn dimension(&self) -> &[usize] {
        &self.dimension
    }

    pub fn method(&self) -> Option<&Rc<PhotostimulationMethod>> {
        self.method.as_ref()
    }

    /// Rasterise `pixel_roi` into a mask of shape `dimension`.
    pub fn pixel_to_image_mask_roi(&self) -> Result<ArrayD<u8>> {
        match (&self.pixel_roi, &self.roi_size) {
            (Some(pixels), Some(roi_size)) => pixel_to_image_mask(pixels, roi_size, &self.dimension),
            _ => Err(PhotostimError::InvalidState(format!(
                "HolographicPattern '{}' has no 'pixel_roi' to convert",
                self.name
            ))),
        }
    }

    /// List the positive cells of a 2D mask as `[x, y, weight]`.
    pub fn image_to_pixel(image_mask: &ArrayD<u8>) -> Result<Vec<PixelWeight>> {
        image_to_pixel(image_mask)
    }

    pub(crate) fn to_node(&self, method: Option<usize>) -> PatternNode {
        PatternNode {
            name: self.name.clone(),
            image_mask_roi: self.image_mask_roi.clone(),
            pixel_roi: self.pixel_roi.clone(),
            stim_duration: self.stim_duration,
            roi_size: self.roi_size.clone(),
            dimension: self.dimension.clone(),
            method,
        }
    }

    /// Stored patterns were validated when first built and are taken as is.
    pub(crate) fn from_node(node: PatternNode, method: Option<Rc<PhotostimulationMethod>>) -> Self {
        Self {
            name: node.name,
            image_mask_roi: node.image_mask_roi,
            pixel_roi: node.pixel_roi,
            stim_duration: node.stim_duration,
            roi_size: node.roi_size,
            dimension: node.dimension,
            method,
        }
    }

    /// Mask used for display: the stored mask, or the rasterised pixel list.
    fn display_mask(&self) -> Result<ArrayD<u8>> {
        match &self.image_mask_roi {
            Some(mask) => Ok(mask.clone()),
            None => self.pixel_to_image_mask_roi(),
        }
    }

    /// Draw the 2D mask as text: `#` marks stimulated cells, `.` background
    /// and `o` the centre of each pixel-list target.
    pub fn show_mask<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.dimension.len() == 3 {
            return Err(PhotostimError::UnsupportedOperation(
                "Cannot display 3D masks".into(),
            ));
        }

        let mask = self.display_mask()?;
        let mask = mask
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| PhotostimError::Validation(e.to_string()))?;

        let centers: Vec<(usize, usize)> = self
            .pixel_roi
            .iter()
            .flatten()
            .filter(|c| c.x >= 0.0 && c.y >= 0.0)
            .map(|c| (c.x.round() as usize, c.y.round() as usize))
            .collect();

        for (x, row) in mask.outer_iter().enumerate() {
            let line: String = row
                .iter()
                .enumerate()
                .map(|(y, value)| {
                    if centers.contains(&(x, y)) {
                        'o'
                    } else if *value > 0 {
                        '#'
                    } else {
                        '.'
                    }
                })
                .collect();
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}

fn check_rank(field: &str, rank: usize) -> Result<()> {
    if rank != 2 && rank != 3 {
        return Err(PhotostimError::Validation(format!(
            "'{}' must be 2D or 3D, got {} dimensions",
            field, rank
        )));
    }
    Ok(())
}

/// Validate a numeric mask as 2D/3D, round every cell to the nearest integer
/// and require the result to be 0 or 1.
fn binarize_mask(mask: &ArrayD<f64>) -> Result<ArrayD<u8>> {
    check_rank("image_mask_roi", mask.ndim())?;

    if let Some(bad) = mask.iter().find(|v| {
        let rounded = v.round();
        rounded != 0.0 && rounded != 1.0
    }) {
        return Err(PhotostimError::Validation(format!(
            "'image_mask_roi' data must be either 0 (off) or 1 (on), found {}",
            bad
        )));
    }
    Ok(mask.mapv(|v| v.round() as u8))
}
