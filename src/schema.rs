//! Type declarations for the `ndx-photostim` namespace
//!
//! Every entity declares its container shape (kind, parent type, attributes,
//! datasets and child groups) so a host container framework can register it.
//! The namespace is assembled once per process.

use crate::error::{PhotostimError, Result};
use crate::types::{
    HolographicPattern, Laser, PhotostimulationMethod, PhotostimulationSeries,
    PhotostimulationTable, SpatialLightModulator,
};
use std::sync::OnceLock;

pub const NAMESPACE_NAME: &str = "ndx-photostim";
pub const NAMESPACE_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Dataset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DType {
    Text,
    Numeric,
    Int8,
    UInt8,
    Float64,
    /// Object reference to a container of the named type
    Reference(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub dtype: DType,
    /// Allowed shapes; empty for scalars
    pub shape: Vec<Vec<Option<usize>>>,
    pub required: bool,
    pub doc: &'static str,
}

impl AttributeSpec {
    fn scalar(name: &'static str, dtype: DType, required: bool, doc: &'static str) -> Self {
        Self {
            name,
            dtype,
            shape: Vec::new(),
            required,
            doc,
        }
    }

    fn with_shape(mut self, shape: &[&[Option<usize>]]) -> Self {
        self.shape = shape.iter().map(|s| s.to_vec()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    pub name: &'static str,
    pub dtype: DType,
    pub shape: Vec<Vec<Option<usize>>>,
    pub required: bool,
    pub doc: &'static str,
}

impl DatasetSpec {
    fn new(
        name: &'static str,
        dtype: DType,
        shape: &[&[Option<usize>]],
        required: bool,
        doc: &'static str,
    ) -> Self {
        Self {
            name,
            dtype,
            shape: shape.iter().map(|s| s.to_vec()).collect(),
            required,
            doc,
        }
    }
}

/// A child container, owned (`link == false`) or linked by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: &'static str,
    pub type_name: &'static str,
    pub link: bool,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: &'static str,
    pub kind: NodeKind,
    pub inherits: &'static str,
    pub doc: &'static str,
    pub attributes: Vec<AttributeSpec>,
    pub datasets: Vec<DatasetSpec>,
    pub groups: Vec<GroupSpec>,
}

/// An entity that maps onto a named, typed container node.
pub trait Container {
    const TYPE_NAME: &'static str;

    fn type_spec() -> TypeSpec;
}

const ANY: Option<usize> = None;

impl Container for SpatialLightModulator {
    const TYPE_NAME: &'static str = "SpatialLightModulator";

    fn type_spec() -> TypeSpec {
        TypeSpec {
            name: Self::TYPE_NAME,
            kind: NodeKind::Group,
            inherits: "Device",
            doc: "Spatial light modulator used in the experiment.",
            attributes: vec![
                AttributeSpec::scalar("model", DType::Text, true, "Model of the SpatialLightModulator."),
                AttributeSpec::scalar("size", DType::Numeric, false, "Resolution in pixels.")
                    .with_shape(&[&[Some(2)], &[Some(3)]]),
            ],
            datasets: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl Container for Laser {
    const TYPE_NAME: &'static str = "Laser";

    fn type_spec() -> TypeSpec {
        TypeSpec {
            name: Self::TYPE_NAME,
            kind: NodeKind::Group,
            inherits: "Device",
            doc: "Laser used in the experiment.",
            attributes: vec![
                AttributeSpec::scalar("model", DType::Text, true, "Model of the Laser."),
                AttributeSpec::scalar("wavelength", DType::Numeric, false, "Excitation wavelength (nm)."),
                AttributeSpec::scalar("power", DType::Numeric, false, "Incident power (mW)."),
                AttributeSpec::scalar("peak_pulse_energy", DType::Numeric, false, "Pulse energy (uJ)."),
                AttributeSpec::scalar("pulse_rate", DType::Numeric, false, "Pulse rate (kHz)."),
            ],
            datasets: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl Container for PhotostimulationMethod {
    const TYPE_NAME: &'static str = "PhotostimulationMethod";

    fn type_spec() -> TypeSpec {
        TypeSpec {
            name: Self::TYPE_NAME,
            kind: NodeKind::Group,
            inherits: "NWBContainer",
            doc: "Methods used to apply patterned photostimulation.",
            attributes: vec![
                AttributeSpec::scalar("stimulus_method", DType::Text, true, "Scanning or scanless method."),
                AttributeSpec::scalar("sweep_pattern", DType::Text, false, "Sweeping pattern."),
                AttributeSpec::scalar("sweep_size", DType::Numeric, false, "Sweep size (um)."),
                AttributeSpec::scalar("time_per_sweep", DType::Numeric, false, "Sweep duration (ms)."),
                AttributeSpec::scalar("num_sweeps", DType::Numeric, false, "Sweeps per stimulation."),
                AttributeSpec::scalar("power_per_target", DType::Numeric, false, "Power per target (mW)."),
                AttributeSpec::scalar("opsin", DType::Text, false, "Opsin used."),
            ],
            datasets: Vec::new(),
            groups: vec![
                GroupSpec {
                    name: "slm",
                    type_name: SpatialLightModulator::TYPE_NAME,
                    link: false,
                    required: false,
                },
                GroupSpec {
                    name: "laser",
                    type_name: Laser::TYPE_NAME,
                    link: false,
                    required: false,
                },
            ],
        }
    }
}

impl Container for HolographicPattern {
    const TYPE_NAME: &'static str = "HolographicPattern";

    fn type_spec() -> TypeSpec {
        TypeSpec {
            name: Self::TYPE_NAME,
            kind: NodeKind::Group,
            inherits: "NWBContainer",
            doc: "Container to store the pattern used in a photostimulation experiment.",
            attributes: vec![
                AttributeSpec::scalar("dimension", DType::Numeric, false, "Pixels along x, y (and z).")
                    .with_shape(&[&[Some(2)], &[Some(3)]]),
                AttributeSpec::scalar("stim_duration", DType::Numeric, false, "Stimulus duration (s)."),
            ],
            datasets: vec![
                DatasetSpec::new(
                    "image_mask_roi",
                    DType::UInt8,
                    &[&[ANY, ANY], &[ANY, ANY, ANY]],
                    false,
                    "ROI mask; 1 marks stimulated pixels.",
                ),
                DatasetSpec::new(
                    "pixel_roi",
                    DType::Float64,
                    &[&[ANY, Some(2)], &[ANY, Some(3)]],
                    false,
                    "Centres of the ROIs.",
                ),
                DatasetSpec::new(
                    "roi_size",
                    DType::Float64,
                    &[&[Some(1)], &[Some(2)], &[Some(3)]],
                    false,
                    "Diameter or box size of each ROI.",
                ),
            ],
            groups: vec![GroupSpec {
                name: "method",
                type_name: PhotostimulationMethod::TYPE_NAME,
                link: true,
                required: false,
            }],
        }
    }
}

impl Container for PhotostimulationSeries {
    const TYPE_NAME: &'static str = "PhotostimulationSeries";

    fn type_spec() -> TypeSpec {
        TypeSpec {
            name: Self::TYPE_NAME,
            kind: NodeKind::Group,
            inherits: "TimeSeries",
            doc: "TimeSeries object for photostimulus presentation.",
            attributes: vec![
                AttributeSpec::scalar("format", DType::Text, true, "'interval' or 'series'."),
                AttributeSpec::scalar("stim_duration", DType::Numeric, false, "Stimulus duration (s)."),
                AttributeSpec::scalar("epoch_length", DType::Numeric, false, "Epoch length (s)."),
                AttributeSpec::scalar("rate", DType::Float64, false, "Sampling rate (Hz)."),
                AttributeSpec::scalar("starting_time", DType::Float64, false, "Time of the first sample (s)."),
            ],
            datasets: vec![
                DatasetSpec::new("data", DType::Int8, &[&[ANY]], true, "Presentation markers."),
                DatasetSpec::new("timestamps", DType::Float64, &[&[ANY]], false, "Marker times (s)."),
            ],
            groups: vec![GroupSpec {
                name: "pattern",
                type_name: HolographicPattern::TYPE_NAME,
                link: true,
                required: true,
            }],
        }
    }
}

impl Container for PhotostimulationTable {
    const TYPE_NAME: &'static str = "PhotostimulationTable";

    fn type_spec() -> TypeSpec {
        let column = |name, dtype, doc| DatasetSpec::new(name, dtype, &[&[ANY]], true, doc);
        TypeSpec {
            name: Self::TYPE_NAME,
            kind: NodeKind::Group,
            inherits: "DynamicTable",
            doc: "Table holding one PhotostimulationSeries per row.",
            attributes: vec![AttributeSpec::scalar(
                "description",
                DType::Text,
                true,
                "Description of the table.",
            )],
            datasets: vec![
                column("row_name", DType::Text, "Name of the row."),
                column(
                    "series",
                    DType::Reference(PhotostimulationSeries::TYPE_NAME),
                    "Series referenced by the row.",
                ),
                column("series_name", DType::Text, "Name of the series."),
                column("series_format", DType::Text, "Format of the series."),
                column("num_samples", DType::Numeric, "Number of samples in the series."),
                column("start_time", DType::Float64, "Start time of the series."),
                column("stop_time", DType::Float64, "Stop time of the series."),
                column("pattern_name", DType::Text, "Name of the series' pattern."),
                column("method_name", DType::Text, "Name of the pattern's method."),
            ],
            groups: Vec::new(),
        }
    }
}

/// Registered types, unique by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub name: &'static str,
    pub version: &'static str,
    types: Vec<TypeSpec>,
}

impl Namespace {
    pub fn new(name: &'static str, version: &'static str) -> Self {
        Self {
            name,
            version,
            types: Vec::new(),
        }
    }

    pub fn register(&mut self, spec: TypeSpec) -> Result<()> {
        if self.get(spec.name).is_some() {
            return Err(PhotostimError::Configuration(format!(
                "Type '{}' is already registered in namespace '{}'",
                spec.name, self.name
            )));
        }
        self.types.push(spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeSpec> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn types(&self) -> &[TypeSpec] {
        &self.types
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        self.types.iter().map(|t| t.name).collect()
    }
}

fn build_namespace() -> Result<Namespace> {
    let mut namespace = Namespace::new(NAMESPACE_NAME, NAMESPACE_VERSION);
    namespace.register(SpatialLightModulator::type_spec())?;
    namespace.register(Laser::type_spec())?;
    namespace.register(PhotostimulationMethod::type_spec())?;
    namespace.register(HolographicPattern::type_spec())?;
    namespace.register(PhotostimulationSeries::type_spec())?;
    namespace.register(PhotostimulationTable::type_spec())?;
    Ok(namespace)
}

static NAMESPACE: OnceLock<Namespace> = OnceLock::new();

/// The `ndx-photostim` namespace, built on first use.
pub fn namespace() -> Result<&'static Namespace> {
    if let Some(namespace) = NAMESPACE.get() {
        return Ok(namespace);
    }
    let namespace = build_namespace()?;
    tracing::info!(
        namespace = namespace.name,
        types = namespace.types().len(),
        "registered namespace"
    );
    Ok(NAMESPACE.get_or_init(|| namespace))
}
