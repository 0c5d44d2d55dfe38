//! Serialized object graph of a photostimulation store
//!
//! Shared objects are written once and referenced by index, so a pattern used
//! by several series (or a method used by several patterns) is stored a single
//! time and shared again after reading.

use crate::error::{PhotostimError, Result};
use crate::schema::Namespace;
use crate::types::method::PhotostimulationMethod;
use crate::types::pattern::{HolographicPattern, RoiSize};
use crate::types::series::{PhotostimulationSeries, StimulusFormat, TimeAxis};
use crate::types::table::{PhotostimulationRow, PhotostimulationTable};
use crate::utils::misc::Coordinate;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternNode {
    pub name: String,
    pub image_mask_roi: Option<ArrayD<u8>>,
    pub pixel_roi: Option<Vec<Coordinate>>,
    pub stim_duration: Option<f64>,
    pub roi_size: Option<RoiSize>,
    pub dimension: Vec<usize>,
    /// Index into [`StoreDocument::methods`]
    pub method: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesNode {
    pub name: String,
    pub format: StimulusFormat,
    pub data: Vec<i8>,
    pub time_axis: TimeAxis,
    pub stim_duration: Option<f64>,
    pub epoch_length: Option<f64>,
    pub description: Option<String>,
    pub comments: Option<String>,
    /// Index into [`StoreDocument::patterns`]
    pub pattern: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowNode {
    pub row_name: String,
    /// Index into [`StoreDocument::series`]
    pub series: usize,
    pub series_name: String,
    pub series_format: StimulusFormat,
    pub num_samples: usize,
    pub start_time: f64,
    pub stop_time: f64,
    pub pattern_name: String,
    pub method_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableNode {
    pub name: String,
    pub description: String,
    pub rows: Vec<RowNode>,
}

/// Body of a store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub namespace: String,
    pub version: String,
    /// Names of the container types the store was written with
    pub types: Vec<String>,
    pub methods: Vec<PhotostimulationMethod>,
    pub patterns: Vec<PatternNode>,
    pub series: Vec<SeriesNode>,
    pub tables: Vec<TableNode>,
}

/// Assigns each distinct object one slot, keyed by allocation.
#[derive(Default)]
struct GraphWriter {
    method_ids: HashMap<*const PhotostimulationMethod, usize>,
    pattern_ids: HashMap<*const HolographicPattern, usize>,
    series_ids: HashMap<*const PhotostimulationSeries, usize>,
    methods: Vec<PhotostimulationMethod>,
    patterns: Vec<PatternNode>,
    series: Vec<SeriesNode>,
}

impl GraphWriter {
    fn method_id(&mut self, method: &Rc<PhotostimulationMethod>) -> usize {
        let key = Rc::as_ptr(method);
        if let Some(id) = self.method_ids.get(&key) {
            return *id;
        }
        self.methods.push(method.as_ref().clone());
        let id = self.methods.len() - 1;
        self.method_ids.insert(key, id);
        id
    }

    fn pattern_id(&mut self, pattern: &Rc<HolographicPattern>) -> usize {
        let key = Rc::as_ptr(pattern);
        if let Some(id) = self.pattern_ids.get(&key) {
            return *id;
        }
        let method = pattern.method().map(|m| self.method_id(m));
        self.patterns.push(pattern.to_node(method));
        let id = self.patterns.len() - 1;
        self.pattern_ids.insert(key, id);
        id
    }

    fn series_id(&mut self, series: &Rc<PhotostimulationSeries>) -> usize {
        let key = Rc::as_ptr(series);
        if let Some(id) = self.series_ids.get(&key) {
            return *id;
        }
        let pattern = self.pattern_id(series.pattern());
        self.series.push(series.to_node(pattern));
        let id = self.series.len() - 1;
        self.series_ids.insert(key, id);
        id
    }

    fn table_node(&mut self, table: &PhotostimulationTable) -> TableNode {
        let rows = table
            .rows()
            .iter()
            .map(|row| RowNode {
                row_name: row.row_name.clone(),
                series: self.series_id(&row.series),
                series_name: row.series_name.clone(),
                series_format: row.series_format,
                num_samples: row.num_samples,
                start_time: row.start_time,
                stop_time: row.stop_time,
                pattern_name: row.pattern_name.clone(),
                method_name: row.method_name.clone(),
            })
            .collect();
        TableNode {
            name: table.name().to_string(),
            description: table.description().to_string(),
            rows,
        }
    }
}

fn resolve<T>(items: &[Rc<T>], id: usize, kind: &str, owner: &str) -> Result<Rc<T>> {
    items.get(id).cloned().ok_or_else(|| {
        PhotostimError::Format(format!(
            "'{}' references {} #{} but only {} are stored",
            owner,
            kind,
            id,
            items.len()
        ))
    })
}

impl StoreDocument {
    /// Flatten tables and everything they reference.
    pub fn from_tables(tables: &[PhotostimulationTable], namespace: &Namespace) -> Self {
        let mut writer = GraphWriter::default();
        let tables = tables.iter().map(|t| writer.table_node(t)).collect();
        Self {
            namespace: namespace.name.to_string(),
            version: namespace.version.to_string(),
            types: namespace
                .type_names()
                .into_iter()
                .map(String::from)
                .collect(),
            methods: writer.methods,
            patterns: writer.patterns,
            series: writer.series,
            tables,
        }
    }

    /// Rebuild the tables, re-sharing objects stored once.
    pub fn into_tables(self, namespace: &Namespace) -> Result<Vec<PhotostimulationTable>> {
        if self.namespace != namespace.name {
            return Err(PhotostimError::Format(format!(
                "Store was written for namespace '{}', expected '{}'",
                self.namespace, namespace.name
            )));
        }
        if let Some(unknown) = self.types.iter().find(|t| namespace.get(t).is_none()) {
            return Err(PhotostimError::Format(format!(
                "Store declares unknown type '{}'",
                unknown
            )));
        }

        let methods: Vec<Rc<PhotostimulationMethod>> =
            self.methods.into_iter().map(Rc::new).collect();

        let patterns = self
            .patterns
            .into_iter()
            .map(|node| {
                let method = node
                    .method
                    .map(|id| resolve(&methods, id, "method", &node.name))
                    .transpose()?;
                Ok(Rc::new(HolographicPattern::from_node(node, method)))
            })
            .collect::<Result<Vec<_>>>()?;

        let series = self
            .series
            .into_iter()
            .map(|node| {
                let pattern = resolve(&patterns, node.pattern, "pattern", &node.name)?;
                Ok(Rc::new(PhotostimulationSeries::from_node(node, pattern)))
            })
            .collect::<Result<Vec<_>>>()?;

        self.tables
            .into_iter()
            .map(|table| {
                let rows = table
                    .rows
                    .into_iter()
                    .map(|row| {
                        Ok(PhotostimulationRow {
                            series: resolve(&series, row.series, "series", &table.name)?,
                            row_name: row.row_name,
                            series_name: row.series_name,
                            series_format: row.series_format,
                            num_samples: row.num_samples,
                            start_time: row.start_time,
                            stop_time: row.stop_time,
                            pattern_name: row.pattern_name,
                            method_name: row.method_name,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(PhotostimulationTable::from_rows(
                    table.name,
                    table.description,
                    rows,
                ))
            })
            .collect()
    }
}
