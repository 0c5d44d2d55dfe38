//! Mask rasterisation and stimulus timeline extraction

pub mod mask;
pub mod timeline;

pub use mask::{image_to_pixel, pixel_to_image_mask};
pub use timeline::{PresentationTrack, interval_start_stop, pulse_start_stop, render_tracks};
