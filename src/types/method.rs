//! The photostimulation technique and the devices it is carried out with

use crate::error::{PhotostimError, Result};
use crate::types::device::{Laser, SpatialLightModulator};
use bon::bon;
use serde::{Deserialize, Serialize};

/// Method used to apply patterned photostimulation.
///
/// A method owns at most one [`SpatialLightModulator`] and at most one
/// [`Laser`]. Once attached, neither can be replaced or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotostimulationMethod {
    name: String,
    /// Scanning or scanless method for shaping the light (points, 3D shot, disks, ...)
    stimulus_method: String,
    sweep_pattern: Option<String>,
    /// Size or diameter of the sweep pattern in micrometers
    sweep_size: Option<f64>,
    /// Duration of one sweep in milliseconds
    time_per_sweep: Option<f64>,
    num_sweeps: Option<f64>,
    /// Power in milliwatts applied to each target
    power_per_target: Option<f64>,
    opsin: Option<String>,
    slm: Option<SpatialLightModulator>,
    laser: Option<Laser>,
}

#[bon]
impl PhotostimulationMethod {
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        #[builder(into, default = "point".to_string())] stimulus_method: String,
        #[builder(into)] sweep_pattern: Option<String>,
        sweep_size: Option<f64>,
        time_per_sweep: Option<f64>,
        num_sweeps: Option<f64>,
        power_per_target: Option<f64>,
        #[builder(into)] opsin: Option<String>,
        slm: Option<SpatialLightModulator>,
        laser: Option<Laser>,
    ) -> Self {
        tracing::debug!(name = %name, stimulus_method = %stimulus_method, "created photostimulation method");
        Self {
            name,
            stimulus_method,
            sweep_pattern,
            sweep_size,
            time_per_sweep,
            num_sweeps,
            power_per_target,
            opsin,
            slm,
            laser,
        }
    }

    /// Attach the spatial light modulator. Fails if one is already attached.
    pub fn add_slm(&mut self, slm: SpatialLightModulator) -> Result<()> {
        if self.slm.is_some() {
            return Err(PhotostimError::InvalidState(format!(
                "SpatialLightModulator already exists in PhotostimulationMethod '{}'",
                self.name
            )));
        }
        tracing::debug!(method = %self.name, slm = %slm.name(), "attached spatial light modulator");
        self.slm = Some(slm);
        Ok(())
    }

    /// Attach the laser. Fails if one is already attached.
    pub fn add_laser(&mut self, laser: Laser) -> Result<()> {
        if self.laser.is_some() {
            return Err(PhotostimError::InvalidState(format!(
                "Laser already exists in PhotostimulationMethod '{}'",
                self.name
            )));
        }
        tracing::debug!(method = %self.name, laser = %laser.name(), "attached laser");
        self.laser = Some(laser);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stimulus_method(&self) -> &str {
        &self.stimulus_method
    }

    pub fn sweep_pattern(&self) -> Option<&str> {
        self.sweep_pattern.as_deref()
    }

    pub fn sweep_size(&self) -> Option<f64> {
        self.sweep_size
    }

    pub fn time_per_sweep(&self) -> Option<f64> {
        self.time_per_sweep
    }

    pub fn num_sweeps(&self) -> Option<f64> {
        self.num_sweeps
    }

    pub fn power_per_target(&self) -> Option<f64> {
        self.power_per_target
    }

    pub fn opsin(&self) -> Option<&str> {
        self.opsin.as_deref()
    }

    pub fn slm(&self) -> Option<&SpatialLightModulator> {
        self.slm.as_ref()
    }

    pub fn laser(&self) -> Option<&Laser> {
        self.laser.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn get_slm() -> SpatialLightModulator {
        SpatialLightModulator::builder()
            .name("slm")
            .model("Meadowlark")
            .size(vec![512.0, 512.0])
            .build()
            .unwrap()
    }

    fn get_laser() -> Laser {
        Laser::builder()
            .name("laser")
            .model("Coherent")
            .wavelength(1030.0)
            .power(8.0)
            .build()
    }

    #[test]
    fn test_default_stimulus_method() {
        let method = PhotostimulationMethod::builder().name("methodA").build();
        assert_eq!(method.stimulus_method(), "point");
        assert!(method.slm().is_none());
        assert!(method.laser().is_none());
    }

    #[test]
    fn test_devices_attach_once() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut method = PhotostimulationMethod::builder()
            .name("methodA")
            .stimulus_method("scanless")
            .sweep_pattern("none")
            .sweep_size(0.0)
            .time_per_sweep(0.0)
            .num_sweeps(0.0)
            .power_per_target(8.0)
            .opsin("testOpsin")
            .build();

        method.add_slm(get_slm())?;
        method.add_laser(get_laser())?;
        assert_eq!(method.slm().map(|s| s.name()), Some("slm"));

        let err = method.add_slm(get_slm()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let err = method.add_laser(get_laser()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(method.laser().and_then(|l| l.wavelength()), Some(1030.0));
        Ok(())
    }

    #[test]
    fn test_constructor_devices_count_as_attached() {
        let mut method = PhotostimulationMethod::builder()
            .name("methodB")
            .laser(get_laser())
            .build();
        assert!(method.add_laser(get_laser()).is_err());
        assert!(method.add_slm(get_slm()).is_ok());
    }
}
