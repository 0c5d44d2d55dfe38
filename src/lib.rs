//! Holographic photostimulation data model.
//!
//! Devices ([`SpatialLightModulator`], [`Laser`]) are attached to a
//! [`PhotostimulationMethod`], which [`HolographicPattern`]s reference. A
//! [`PhotostimulationSeries`] records when one pattern was presented, and a
//! [`PhotostimulationTable`] summarises many series. [`PhotostimFile`]
//! persists tables together with everything they reference.

pub mod error;
pub mod parser;
pub mod photostim_file;
pub mod processing;
pub mod schema;
pub mod types;
pub mod utils;

pub use error::{ErrorKind, PhotostimError, Result};
pub use photostim_file::{PhotostimFile, StoreOptions};
pub use types::{
    HolographicPattern, Laser, Onsets, PhotostimulationMethod, PhotostimulationRow,
    PhotostimulationSeries, PhotostimulationTable, RoiSize, SpatialLightModulator,
    StimulusFormat, TimeAxis,
};
pub use utils::misc::{Coordinate, PixelWeight};

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn, s};
    use std::rc::Rc;

    /// Devices, method, pattern, series and table assembled end to end.
    #[test]
    fn test_experiment_assembly() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let slm = SpatialLightModulator::builder()
            .name("slm")
            .model("Meadowlark")
            .size(vec![512.0, 512.0])
            .build()?;
        let laser = Laser::builder()
            .name("laser")
            .model("Coherent")
            .wavelength(1030.0)
            .power(8.0)
            .peak_pulse_energy(20.0)
            .pulse_rate(500.0)
            .build();

        let mut method = PhotostimulationMethod::builder()
            .name("method")
            .stimulus_method("scanless")
            .sweep_pattern("none")
            .power_per_target(8.0)
            .opsin("ChRmine")
            .build();
        method.add_slm(slm)?;
        method.add_laser(laser)?;
        let method = Rc::new(method);

        let mut mask = ArrayD::<f64>::zeros(IxDyn(&[10, 10]));
        mask.slice_mut(s![2..4, 2..4]).fill(1.0);
        let pattern = Rc::new(
            HolographicPattern::builder()
                .name("pattern")
                .image_mask_roi(mask)
                .method(Rc::clone(&method))
                .build()?,
        );

        let mut series = PhotostimulationSeries::builder()
            .name("series")
            .format(StimulusFormat::Series)
            .stim_duration(0.5)
            .pattern(Rc::clone(&pattern))
            .build()?;
        series.add_onset([1.0, 3.0])?;

        let mut table = PhotostimulationTable::new("table", "experiment");
        table.add_series(&[Rc::new(series)], None)?;
        let row = table.row(0).unwrap();
        assert_eq!(row.row_name, "series_0");
        assert_eq!((row.start_time, row.stop_time), (1.0, 3.0));
        assert_eq!(row.method_name, "method");
        assert_eq!(
            row.series.pattern().method().and_then(|m| m.laser()).map(|l| l.model()),
            Some("Coherent")
        );
        Ok(())
    }
}
