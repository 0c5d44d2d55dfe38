//! Data model of the photostimulation extension

pub mod device;
pub mod document;
pub mod header;
pub mod method;
pub mod pattern;
pub mod series;
pub mod table;

pub use device::{Laser, SpatialLightModulator};
pub use document::StoreDocument;
pub use header::Header;
pub use method::PhotostimulationMethod;
pub use pattern::{HolographicPattern, RoiSize};
pub use series::{Onsets, PhotostimulationSeries, StimulusFormat, TimeAxis};
pub use table::{PhotostimulationRow, PhotostimulationTable};
