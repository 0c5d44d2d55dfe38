//! Hardware used to deliver patterned photostimulation

use crate::error::{PhotostimError, Result};
use bon::bon;
use serde::{Deserialize, Serialize};

/// Spatial light modulator used to shape the stimulation light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialLightModulator {
    name: String,
    model: String,
    description: Option<String>,
    manufacturer: Option<String>,
    /// Resolution in pixels, `[width, height]` or `[width, height, depth]`
    size: Option<Vec<f64>>,
}

#[bon]
impl SpatialLightModulator {
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        #[builder(into)] model: String,
        #[builder(into)] description: Option<String>,
        #[builder(into)] manufacturer: Option<String>,
        size: Option<Vec<f64>>,
    ) -> Result<Self> {
        if let Some(size) = &size {
            if size.len() != 2 && size.len() != 3 {
                return Err(PhotostimError::Validation(format!(
                    "SpatialLightModulator '{}' size must have 2 or 3 entries, got {}",
                    name,
                    size.len()
                )));
            }
        }

        tracing::debug!(name = %name, model = %model, "created spatial light modulator");
        Ok(Self {
            name,
            model,
            description,
            manufacturer,
            size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    pub fn size(&self) -> Option<&[f64]> {
        self.size.as_deref()
    }
}

/// Laser used to apply photostimulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laser {
    name: String,
    model: String,
    description: Option<String>,
    manufacturer: Option<String>,
    /// Excitation wavelength in nanometers
    wavelength: Option<f64>,
    /// Incident power in milliwatts
    power: Option<f64>,
    /// Pulse energy of a pulsed laser in microjoules
    peak_pulse_energy: Option<f64>,
    /// Pulse rate of a pulsed laser in kHz
    pulse_rate: Option<f64>,
}

#[bon]
impl Laser {
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        #[builder(into)] model: String,
        #[builder(into)] description: Option<String>,
        #[builder(into)] manufacturer: Option<String>,
        wavelength: Option<f64>,
        power: Option<f64>,
        peak_pulse_energy: Option<f64>,
        pulse_rate: Option<f64>,
    ) -> Self {
        tracing::debug!(name = %name, model = %model, "created laser");
        Self {
            name,
            model,
            description,
            manufacturer,
            wavelength,
            power,
            peak_pulse_energy,
            pulse_rate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    pub fn wavelength(&self) -> Option<f64> {
        self.wavelength
    }

    pub fn power(&self) -> Option<f64> {
        self.power
    }

    pub fn peak_pulse_energy(&self) -> Option<f64> {
        self.peak_pulse_energy
    }

    pub fn pulse_rate(&self) -> Option<f64> {
        self.pulse_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_slm_size_shape() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let slm = SpatialLightModulator::builder()
            .name("slm")
            .model("Meadowlark")
            .size(vec![512.0, 512.0])
            .build()?;
        assert_eq!(slm.size(), Some(&[512.0, 512.0][..]));
        assert_eq!(slm.model(), "Meadowlark");

        let err = SpatialLightModulator::builder()
            .name("slm")
            .model("Meadowlark")
            .size(vec![512.0])
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        Ok(())
    }

    #[test]
    fn test_laser_fields() {
        let laser = Laser::builder()
            .name("laser")
            .model("Coherent")
            .wavelength(1030.0)
            .power(8.0)
            .peak_pulse_energy(20.0)
            .pulse_rate(500.0)
            .build();

        assert_eq!(laser.name(), "laser");
        assert_eq!(laser.wavelength(), Some(1030.0));
        assert_eq!(laser.pulse_rate(), Some(500.0));
        assert_eq!(laser.manufacturer(), None);
    }
}
