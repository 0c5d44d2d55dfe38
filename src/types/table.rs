//! Summary table with one row per stimulus series

use crate::error::{PhotostimError, Result};
use crate::processing::timeline::{PresentationTrack, render_tracks};
use crate::types::series::{PhotostimulationSeries, StimulusFormat};
use polars::prelude::{DataFrame, NamedFrom, Series};
use std::io::Write;
use std::rc::Rc;

/// Snapshot of a series taken when it was added to the table.
///
/// The denormalised fields are not refreshed if the series changes later.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotostimulationRow {
    pub row_name: String,
    pub series: Rc<PhotostimulationSeries>,
    pub series_name: String,
    pub series_format: StimulusFormat,
    pub num_samples: usize,
    pub start_time: f64,
    pub stop_time: f64,
    pub pattern_name: String,
    pub method_name: String,
}

impl PhotostimulationRow {
    fn snapshot(row_name: String, series: &Rc<PhotostimulationSeries>) -> Result<Self> {
        if series.num_samples() == 0 {
            return Err(PhotostimError::EmptyData(format!(
                "Series '{}' has no data. Cannot add to PhotostimulationTable",
                series.name()
            )));
        }
        let pattern = series.pattern();
        let Some(method) = pattern.method() else {
            return Err(PhotostimError::Configuration(format!(
                "Pattern '{}' of series '{}' has no PhotostimulationMethod",
                pattern.name(),
                series.name()
            )));
        };

        Ok(Self {
            row_name,
            series: Rc::clone(series),
            series_name: series.name().to_string(),
            series_format: series.format(),
            num_samples: series.num_samples(),
            start_time: series.get_starting_time(),
            stop_time: series.get_end_time(),
            pattern_name: pattern.name().to_string(),
            method_name: method.name().to_string(),
        })
    }
}

/// Append-only table of an experiment's [`PhotostimulationSeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct PhotostimulationTable {
    name: String,
    description: String,
    rows: Vec<PhotostimulationRow>,
}

impl PhotostimulationTable {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn from_rows(name: String, description: String, rows: Vec<PhotostimulationRow>) -> Self {
        Self {
            name,
            description,
            rows,
        }
    }

    /// Add one row per series.
    ///
    /// Rows are named `row_names[i]` if given, otherwise `series_{n}` where
    /// `n` is the row number. Either every series is added or none is.
    pub fn add_series(
        &mut self,
        series: &[Rc<PhotostimulationSeries>],
        row_names: Option<&[&str]>,
    ) -> Result<()> {
        let names: Vec<String> = match row_names {
            Some(names) if names.len() != series.len() => {
                return Err(PhotostimError::Configuration(format!(
                    "'series' ({}) and 'row_name' ({}) must be the same length",
                    series.len(),
                    names.len()
                )));
            }
            Some(names) => names.iter().map(|n| n.to_string()).collect(),
            None => (self.rows.len()..self.rows.len() + series.len())
                .map(|i| format!("series_{}", i))
                .collect(),
        };

        let new_rows = names
            .into_iter()
            .zip(series)
            .map(|(name, series)| PhotostimulationRow::snapshot(name, series))
            .collect::<Result<Vec<_>>>()?;

        for row in &new_rows {
            tracing::debug!(
                table = %self.name,
                row = %row.row_name,
                series = %row.series_name,
                "added series to table"
            );
        }
        self.rows.extend(new_rows);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rows(&self) -> &[PhotostimulationRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&PhotostimulationRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Denormalised columns as a DataFrame, one row per series.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let column = |f: fn(&PhotostimulationRow) -> String| -> Vec<String> {
            self.rows.iter().map(f).collect()
        };
        let num_samples: Vec<u64> = self.rows.iter().map(|r| r.num_samples as u64).collect();
        let start_times: Vec<f64> = self.rows.iter().map(|r| r.start_time).collect();
        let stop_times: Vec<f64> = self.rows.iter().map(|r| r.stop_time).collect();

        Ok(DataFrame::new(vec![
            Series::new("row_name".into(), column(|r| r.row_name.clone())).into(),
            Series::new("series_name".into(), column(|r| r.series_name.clone())).into(),
            Series::new(
                "series_format".into(),
                column(|r| r.series_format.to_string()),
            )
            .into(),
            Series::new("num_samples".into(), &num_samples).into(),
            Series::new("start_time".into(), &start_times).into(),
            Series::new("stop_time".into(), &stop_times).into(),
            Series::new("pattern_name".into(), column(|r| r.pattern_name.clone())).into(),
            Series::new("method_name".into(), column(|r| r.method_name.clone())).into(),
        ])?)
    }

    /// One bar track per row, stacked in insertion order, with one segment
    /// per presentation of the referenced series.
    pub fn presentation_times(&self) -> Result<Vec<PresentationTrack>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let start_stop = row.series.get_start_stop_list()?;
                Ok(PresentationTrack::new(i, row.series_name.clone(), &start_stop))
            })
            .collect()
    }

    /// Draw [`presentation_times`](Self::presentation_times) as a text timeline.
    pub fn plot_presentation_times<W: Write>(
        &self,
        out: &mut W,
        width: usize,
        xlim: Option<(f64, f64)>,
    ) -> Result<()> {
        let tracks = self.presentation_times()?;
        let title = format!("Presentation timestamps for PhotostimulationTable '{}'", self.name);
        render_tracks(out, &title, &tracks, width, xlim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::pattern::HolographicPattern;
    use crate::types::series::tests::get_pattern;
    use crate::utils::misc::Coordinate;

    fn interval_series(name: &str, pattern: &Rc<HolographicPattern>) -> Rc<PhotostimulationSeries> {
        Rc::new(
            PhotostimulationSeries::builder()
                .name(name)
                .format(StimulusFormat::Interval)
                .data(vec![1, -1, 1, -1])
                .timestamps(vec![0.5, 1.0, 2.0, 4.0])
                .pattern(Rc::clone(pattern))
                .build()
                .unwrap(),
        )
    }

    fn onset_series(name: &str, pattern: &Rc<HolographicPattern>) -> Rc<PhotostimulationSeries> {
        let mut series = PhotostimulationSeries::builder()
            .name(name)
            .format(StimulusFormat::Series)
            .stim_duration(2.0)
            .pattern(Rc::clone(pattern))
            .build()
            .unwrap();
        series.add_onset([10.0, 30.0, 40.0]).unwrap();
        Rc::new(series)
    }

    #[test]
    fn test_add_series_denormalises() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let pattern = get_pattern();
        let all = vec![
            interval_series("s1", &pattern),
            onset_series("s2", &pattern),
            interval_series("s3", &pattern),
        ];
        let mut table = PhotostimulationTable::new("test", "test table");
        table.add_series(&all, None)?;

        assert_eq!(table.len(), 3);
        for (row, series) in table.rows().iter().zip(&all) {
            assert_eq!(row.series_name, series.name());
            assert_eq!(row.start_time, series.get_starting_time());
            assert_eq!(row.stop_time, series.get_end_time());
            assert_eq!(row.num_samples, series.num_samples());
            assert_eq!(row.pattern_name, "pattern");
            assert_eq!(row.method_name, "methodA");
            assert!(Rc::ptr_eq(&row.series, series));
        }
        assert_eq!(table.row(1).map(|r| r.series_format), Some(StimulusFormat::Series));
        assert_eq!(table.row(1).map(|r| r.stop_time), Some(40.0));
        assert_eq!(table.row(2).map(|r| r.row_name.as_str()), Some("series_2"));
        Ok(())
    }

    #[test]
    fn test_auto_names_continue_row_numbers() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let pattern = get_pattern();
        let mut table = PhotostimulationTable::new("test", "test table");
        table.add_series(&[interval_series("a", &pattern)], None)?;
        table.add_series(&[interval_series("b", &pattern)], Some(&["named"][..]))?;
        table.add_series(&[interval_series("c", &pattern)], None)?;

        let names: Vec<&str> = table.rows().iter().map(|r| r.row_name.as_str()).collect();
        assert_eq!(names, vec!["series_0", "named", "series_2"]);
        Ok(())
    }

    #[test]
    fn test_row_name_count_mismatch() {
        let pattern = get_pattern();
        let mut table = PhotostimulationTable::new("test", "test table");
        let err = table
            .add_series(
                &[interval_series("a", &pattern), interval_series("b", &pattern)],
                Some(&["only_one"][..]),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_series_rejected_atomically() {
        let pattern = get_pattern();
        let empty = Rc::new(
            PhotostimulationSeries::builder()
                .name("empty")
                .format(StimulusFormat::Interval)
                .pattern(Rc::clone(&pattern))
                .build()
                .unwrap(),
        );
        let mut table = PhotostimulationTable::new("test", "test table");
        let err = table
            .add_series(&[interval_series("ok", &pattern), empty], None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyData);
        assert!(table.is_empty());
    }

    #[test]
    fn test_pattern_without_method_rejected() {
        let pattern = Rc::new(
            HolographicPattern::builder()
                .name("loose")
                .pixel_roi(vec![Coordinate::xy(1.0, 1.0)])
                .roi_size(vec![2.0])
                .dimension(vec![4, 4])
                .build()
                .unwrap(),
        );
        let mut table = PhotostimulationTable::new("test", "test table");
        let err = table
            .add_series(&[interval_series("a", &pattern)], None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_presentation_times() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let pattern = get_pattern();
        let mut table = PhotostimulationTable::new("test", "test table");
        table.add_series(
            &[interval_series("s1", &pattern), onset_series("s2", &pattern)],
            None,
        )?;

        let tracks = table.presentation_times()?;
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].label, "s1");
        assert_eq!(tracks[0].segments, vec![(0.5, 0.5), (2.0, 2.0)]);
        assert_eq!(tracks[1].segments, vec![(10.0, 2.0), (30.0, 2.0), (40.0, 2.0)]);
        assert!(tracks[0].y < tracks[1].y);

        let mut out = Vec::new();
        table.plot_presentation_times(&mut out, 40, Some((0.0, 45.0)))?;
        let text = String::from_utf8(out)?;
        assert!(text.starts_with("Presentation timestamps for PhotostimulationTable 'test'"));
        assert!(text.contains("s1 |"));
        Ok(())
    }

    #[test]
    fn test_to_dataframe() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let pattern = get_pattern();
        let mut table = PhotostimulationTable::new("test", "test table");
        table.add_series(
            &[interval_series("s1", &pattern), onset_series("s2", &pattern)],
            Some(&["first", "second"][..]),
        )?;

        let df = table.to_dataframe()?;
        assert_eq!(df.shape(), (2, 8));
        let formats: Vec<&str> = df
            .column("series_format")?
            .as_materialized_series()
            .str()?
            .into_no_null_iter()
            .collect();
        assert_eq!(formats, vec!["interval", "series"]);
        Ok(())
    }
}
