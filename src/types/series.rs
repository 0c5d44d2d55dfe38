//! Time series of stimulus presentations
//!
//! Two encodings are supported:
//!
//! * `interval`: `data` holds `1` (onset) and `-1` (offset) markers at the
//!   matching `timestamps`.
//! * `series`: `data` holds `0`/`1` presence markers; a `1` starts a pulse of
//!   `stim_duration` seconds. Time is given by explicit `timestamps` or by a
//!   sample `rate`.

use crate::error::{PhotostimError, Result};
use crate::processing::timeline;
use crate::types::document::SeriesNode;
use crate::types::pattern::HolographicPattern;
use crate::utils::misc::check_finite;
use bon::bon;
use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Encoding of the stimulus schedule, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StimulusFormat {
    Interval,
    Series,
}

impl StimulusFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::Series => "series",
        }
    }

    /// Values `data` may take in this format
    fn allowed_values(&self) -> &'static [i8] {
        match self {
            Self::Interval => &[-1, 1],
            Self::Series => &[0, 1],
        }
    }
}

impl fmt::Display for StimulusFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StimulusFormat {
    type Err = PhotostimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "interval" => Ok(Self::Interval),
            "series" => Ok(Self::Series),
            other => Err(PhotostimError::Validation(format!(
                "'format' must be 'interval' or 'series', got '{}'",
                other
            ))),
        }
    }
}

/// Source of truth for the time of each sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimeAxis {
    Timestamps(Vec<f64>),
    /// Uniform sampling at `rate` Hz from `starting_time`
    Rate {
        rate: f64,
        starting_time: Option<f64>,
    },
}

/// One or more onset times for [`PhotostimulationSeries::add_onset`].
pub trait Onsets {
    fn into_onsets(self) -> Vec<f64>;
}

impl Onsets for f64 {
    fn into_onsets(self) -> Vec<f64> {
        vec![self]
    }
}

impl Onsets for Vec<f64> {
    fn into_onsets(self) -> Vec<f64> {
        self
    }
}

impl Onsets for &[f64] {
    fn into_onsets(self) -> Vec<f64> {
        self.to_vec()
    }
}

impl<const N: usize> Onsets for [f64; N] {
    fn into_onsets(self) -> Vec<f64> {
        self.to_vec()
    }
}

/// Presentation times of one [`HolographicPattern`].
///
/// `data` and `timestamps` only grow, and always together, through
/// [`add_interval`](Self::add_interval) and [`add_onset`](Self::add_onset).
#[derive(Debug, Clone, PartialEq)]
pub struct PhotostimulationSeries {
    name: String,
    format: StimulusFormat,
    data: Vec<i8>,
    time_axis: TimeAxis,
    stim_duration: Option<f64>,
    epoch_length: Option<f64>,
    description: Option<String>,
    comments: Option<String>,
    pattern: Rc<HolographicPattern>,
}

#[bon]
impl PhotostimulationSeries {
    pub const UNIT: &'static str = "seconds";

    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        format: StimulusFormat,
        #[builder(default)] data: Vec<i8>,
        timestamps: Option<Vec<f64>>,
        rate: Option<f64>,
        starting_time: Option<f64>,
        stim_duration: Option<f64>,
        epoch_length: Option<f64>,
        #[builder(into)] description: Option<String>,
        #[builder(into)] comments: Option<String>,
        pattern: Rc<HolographicPattern>,
    ) -> Result<Self> {
        if timestamps.is_some() && rate.is_some() {
            return Err(PhotostimError::Configuration(format!(
                "PhotostimulationSeries '{}' takes either 'timestamps' or 'rate', not both",
                name
            )));
        }
        if starting_time.is_some() && rate.is_none() {
            return Err(PhotostimError::Configuration(
                "'starting_time' can only be used together with 'rate'".into(),
            ));
        }
        if data.is_empty() && timestamps.as_ref().is_some_and(|ts| !ts.is_empty()) {
            return Err(PhotostimError::Configuration(
                "'timestamps' can't be specified without corresponding 'data'".into(),
            ));
        }

        match format {
            StimulusFormat::Interval => {
                if rate.is_some() {
                    return Err(PhotostimError::Configuration(
                        "'interval' format requires 'timestamps', not 'rate'".into(),
                    ));
                }
                if !data.is_empty() && timestamps.is_none() {
                    return Err(PhotostimError::Configuration(
                        "Need to specify corresponding 'timestamps' for each entry in 'data'".into(),
                    ));
                }
            }
            StimulusFormat::Series => {
                if stim_duration.is_none() {
                    return Err(PhotostimError::Configuration(
                        "If 'format' is 'series', 'stim_duration' must be specified".into(),
                    ));
                }
                if !data.is_empty() && timestamps.is_none() && rate.is_none() {
                    return Err(PhotostimError::Configuration(
                        "Either 'timestamps' or 'rate' must be specified".into(),
                    ));
                }
            }
        }

        check_finite("timestamps", timestamps.iter().flatten().copied())?;
        check_finite("rate", rate)?;
        check_finite("starting_time", starting_time)?;
        check_finite("stim_duration", stim_duration)?;
        check_finite("epoch_length", epoch_length)?;

        if let Some(timestamps) = &timestamps {
            if timestamps.len() != data.len() {
                return Err(PhotostimError::Validation(format!(
                    "'data' ({}) and 'timestamps' ({}) need to be the same length",
                    data.len(),
                    timestamps.len()
                )));
            }
        }
        if let Some(rate) = rate {
            if !(rate > 0.0) {
                return Err(PhotostimError::Validation(format!(
                    "'rate' must be positive, got {}",
                    rate
                )));
            }
        }

        let allowed = format.allowed_values();
        if let Some(bad) = data.iter().find(|v| !allowed.contains(*v)) {
            return Err(PhotostimError::Validation(format!(
                "'{}' data must be one of {:?}, found {}",
                format, allowed, bad
            )));
        }

        let time_axis = match rate {
            Some(rate) => TimeAxis::Rate {
                rate,
                starting_time,
            },
            None => TimeAxis::Timestamps(timestamps.unwrap_or_default()),
        };

        tracing::debug!(
            name = %name,
            format = %format,
            num_samples = data.len(),
            "created photostimulation series"
        );
        Ok(Self {
            name,
            format,
            data,
            time_axis,
            stim_duration,
            epoch_length,
            description,
            comments,
            pattern,
        })
    }

    /// Record a stimulus presented from `start` to `stop`.
    ///
    /// Markers are appended in call order; they are not sorted by time.
    pub fn add_interval(&mut self, start: f64, stop: f64) -> Result<()> {
        if self.format == StimulusFormat::Series {
            return Err(PhotostimError::InvalidState(format!(
                "Cannot add interval to PhotostimulationSeries '{}' with 'format' of 'series'",
                self.name
            )));
        }
        check_finite("timestamps", [start, stop])?;
        let timestamps = self.timestamps_mut()?;
        timestamps.extend([start, stop]);
        self.data.extend([1, -1]);

        tracing::debug!(series = %self.name, start, stop, "added interval");
        Ok(())
    }

    /// Record stimulus onsets lasting `stim_duration` each.
    ///
    /// In `interval` format every onset becomes an interval
    /// `[t, t + stim_duration]`; in `series` format a `1` is appended at `t`.
    pub fn add_onset(&mut self, timestamps: impl Onsets) -> Result<()> {
        let Some(stim_duration) = self.stim_duration else {
            return Err(PhotostimError::Configuration(format!(
                "Cannot add presentation to PhotostimulationSeries '{}' without 'stim_duration'",
                self.name
            )));
        };
        let onsets = timestamps.into_onsets();
        check_finite(
            "timestamps",
            onsets.iter().flat_map(|t| [*t, t + stim_duration]),
        )?;

        match self.format {
            StimulusFormat::Interval => {
                for ts in onsets {
                    self.add_interval(ts, ts + stim_duration)?;
                }
            }
            StimulusFormat::Series => {
                let count = onsets.len();
                self.timestamps_mut()?.extend(onsets);
                self.data.extend(std::iter::repeat_n(1, count));
                tracing::debug!(series = %self.name, count, "added onsets");
            }
        }
        Ok(())
    }

    fn timestamps_mut(&mut self) -> Result<&mut Vec<f64>> {
        match &mut self.time_axis {
            TimeAxis::Timestamps(timestamps) => Ok(timestamps),
            TimeAxis::Rate { .. } => Err(PhotostimError::InvalidState(format!(
                "PhotostimulationSeries '{}' is sampled at a fixed 'rate'; presentations cannot be appended",
                self.name
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> StimulusFormat {
        self.format
    }

    pub fn data(&self) -> &[i8] {
        &self.data
    }

    /// Explicit timestamps, `None` when sampled at a fixed rate
    pub fn timestamps(&self) -> Option<&[f64]> {
        match &self.time_axis {
            TimeAxis::Timestamps(timestamps) => Some(timestamps),
            TimeAxis::Rate { .. } => None,
        }
    }

    pub fn rate(&self) -> Option<f64> {
        match self.time_axis {
            TimeAxis::Rate { rate, .. } => Some(rate),
            TimeAxis::Timestamps(_) => None,
        }
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn num_samples(&self) -> usize {
        self.data.len()
    }

    pub fn stim_duration(&self) -> Option<f64> {
        self.stim_duration
    }

    pub fn epoch_length(&self) -> Option<f64> {
        self.epoch_length
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    pub fn unit(&self) -> &'static str {
        Self::UNIT
    }

    pub fn pattern(&self) -> &Rc<HolographicPattern> {
        &self.pattern
    }

    /// Timestamp of every sample, synthesised from the rate when needed.
    fn sample_times(&self) -> Vec<f64> {
        match &self.time_axis {
            TimeAxis::Timestamps(timestamps) => timestamps.clone(),
            TimeAxis::Rate {
                rate,
                starting_time,
            } => {
                let start = starting_time.unwrap_or(0.0);
                (0..self.data.len())
                    .map(|i| start + i as f64 / rate)
                    .collect()
            }
        }
    }

    /// `data` and `timestamps` side by side, one row per sample.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        if self.data.is_empty() {
            return Err(PhotostimError::EmptyData(format!(
                "PhotostimulationSeries '{}' has no data",
                self.name
            )));
        }
        let data: Vec<i32> = self.data.iter().map(|v| *v as i32).collect();
        let timestamps = self.sample_times();

        Ok(DataFrame::new(vec![
            Series::new("data".into(), &data).into(),
            Series::new("timestamps".into(), &timestamps).into(),
        ])?)
    }

    /// Explicit starting time, else the first timestamp, else 0 when there is
    /// data, else NaN.
    pub fn get_starting_time(&self) -> f64 {
        match &self.time_axis {
            TimeAxis::Rate {
                starting_time: Some(start),
                ..
            } => *start,
            TimeAxis::Timestamps(timestamps) if !timestamps.is_empty() => timestamps[0],
            _ if !self.data.is_empty() => 0.0,
            _ => f64::NAN,
        }
    }

    /// Last timestamp; for rate-sampled series the time of the last sample.
    /// NaN when there is no data.
    pub fn get_end_time(&self) -> f64 {
        if self.data.is_empty() {
            return f64::NAN;
        }
        match &self.time_axis {
            TimeAxis::Timestamps(timestamps) => timestamps.last().copied().unwrap_or(f64::NAN),
            TimeAxis::Rate { rate, .. } => {
                self.get_starting_time() + (self.data.len() - 1) as f64 / rate
            }
        }
    }

    /// `(start, stop)` of every presentation, in time order.
    pub fn get_start_stop_list(&self) -> Result<Vec<(f64, f64)>> {
        let df = self.to_dataframe()?;
        match self.format {
            StimulusFormat::Interval => timeline::interval_start_stop(&df),
            StimulusFormat::Series => {
                let stim_duration = self.stim_duration.ok_or_else(|| {
                    PhotostimError::Configuration("'series' format without 'stim_duration'".into())
                })?;
                timeline::pulse_start_stop(&df, stim_duration)
            }
        }
    }

    pub(crate) fn to_node(&self, pattern: usize) -> SeriesNode {
        SeriesNode {
            name: self.name.clone(),
            format: self.format,
            data: self.data.clone(),
            time_axis: self.time_axis.clone(),
            stim_duration: self.stim_duration,
            epoch_length: self.epoch_length,
            description: self.description.clone(),
            comments: self.comments.clone(),
            pattern,
        }
    }

    pub(crate) fn from_node(node: SeriesNode, pattern: Rc<HolographicPattern>) -> Self {
        Self {
            name: node.name,
            format: node.format,
            data: node.data,
            time_axis: node.time_axis,
            stim_duration: node.stim_duration,
            epoch_length: node.epoch_length,
            description: node.description,
            comments: node.comments,
            pattern,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_data_unchecked(&mut self, data: Vec<i8>, timestamps: Vec<f64>) {
        self.data = data;
        self.time_axis = TimeAxis::Timestamps(timestamps);
    }
}
