//! Stimulus onset/offset extraction and presentation-time tracks

use crate::error::{PhotostimError, Result};
use itertools::Itertools;
use polars::prelude::*;
use std::io::Write;

/// Timestamps whose `data` equals `marker`, in time order.
pub fn marker_times(df: &DataFrame, marker: i32) -> Result<Vec<f64>> {
    let selected = df
        .clone()
        .lazy()
        .sort(
            ["timestamps"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .filter(col("data").eq(lit(marker)))
        .select([col("timestamps")])
        .collect()?;

    let times = selected
        .column("timestamps")?
        .as_materialized_series()
        .f64()?
        .into_no_null_iter()
        .collect();
    Ok(times)
}

/// Pair every onset (`1`) with the next offset (`-1`) in time order.
pub fn interval_start_stop(df: &DataFrame) -> Result<Vec<(f64, f64)>> {
    let starts = marker_times(df, 1)?;
    let stops = marker_times(df, -1)?;

    if starts.len() != stops.len() {
        return Err(PhotostimError::Inconsistency(format!(
            "Number of starts ({}) does not equal number of stops ({})",
            starts.len(),
            stops.len()
        )));
    }
    Ok(starts.into_iter().zip_eq(stops).collect())
}

/// Every pulse (`1`) lasts `stim_duration` from its timestamp.
pub fn pulse_start_stop(df: &DataFrame, stim_duration: f64) -> Result<Vec<(f64, f64)>> {
    Ok(marker_times(df, 1)?
        .into_iter()
        .map(|start| (start, start + stim_duration))
        .collect())
}

/// Horizontal bar track for one table row.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationTrack {
    pub label: String,
    /// Lower edge of the bar; rows are stacked upwards in insertion order
    pub y: f64,
    pub height: f64,
    /// `(start, span)` for every presentation
    pub segments: Vec<(f64, f64)>,
}

impl PresentationTrack {
    pub const SPACING: f64 = 10.0;
    pub const HEIGHT: f64 = 8.0;

    pub fn new(index: usize, label: impl Into<String>, start_stop: &[(f64, f64)]) -> Self {
        Self {
            label: label.into(),
            y: (index + 1) as f64 * Self::SPACING,
            height: Self::HEIGHT,
            segments: start_stop
                .iter()
                .map(|(start, stop)| (*start, stop - start))
                .collect(),
        }
    }

    /// Centre of the bar, where the row label sits
    pub fn tick(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Draw tracks as a text timeline, topmost row first.
///
/// `xlim` defaults to the span of all segments.
pub fn render_tracks<W: Write>(
    out: &mut W,
    title: &str,
    tracks: &[PresentationTrack],
    width: usize,
    xlim: Option<(f64, f64)>,
) -> Result<()> {
    let width = width.max(1);
    let (left, right) = xlim.unwrap_or_else(|| {
        tracks
            .iter()
            .flat_map(|t| t.segments.iter())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (start, span)| {
                (lo.min(*start), hi.max(start + span))
            })
    });
    let (left, right) = if left.is_finite() && right > left {
        (left, right)
    } else {
        (0.0, 1.0)
    };
    let scale = width as f64 / (right - left);
    let label_width = tracks.iter().map(|t| t.label.len()).max().unwrap_or(0);

    writeln!(out, "{}", title)?;
    for track in tracks.iter().rev() {
        let mut cells = vec![' '; width];
        for (start, span) in &track.segments {
            let stop = start + span;
            // also skips NaN bounds
            if !(stop >= left && *start <= right) {
                continue;
            }
            let to_cell = |t: f64| ((t - left) * scale).clamp(0.0, width as f64);
            let lo = (to_cell(*start).floor() as usize).min(width - 1);
            let hi = to_cell(stop).ceil() as usize;
            for cell in cells.iter_mut().take(hi.max(lo + 1)).skip(lo) {
                *cell = '=';
            }
        }
        writeln!(
            out,
            "{:>label_width$} |{}|",
            track.label,
            cells.into_iter().collect::<String>()
        )?;
    }
    writeln!(
        out,
        "{:>label_width$}  {:<half$}{:>rest$}",
        "",
        left,
        right,
        half = width / 2,
        rest = width - width / 2
    )?;
    writeln!(out, "{:>label_width$}  Timestamp (seconds)", "")?;
    Ok(())
}
