use crate::error::{PhotostimError, Result};
use crate::parser::{parse_document, parse_header};
use crate::schema::namespace;
use crate::types::{PhotostimulationTable, StoreDocument, header::Header};
use crate::utils::file_utils::{read_binary_file_mmap, write_binary_file};
use bon::Builder;
use std::path::Path;
use winnow::error::ContextError;

/// How the body of a store is laid out.
#[derive(Debug, Clone, Default, Builder)]
pub struct StoreOptions {
    /// Indent the JSON body
    #[builder(default)]
    pub pretty: bool,
}

/// A set of photostimulation tables persisted as one file.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotostimFile {
    /// Set when the file was read from disk
    pub header: Option<Header>,
    pub tables: Vec<PhotostimulationTable>,
}

impl PhotostimFile {
    pub fn new(tables: Vec<PhotostimulationTable>) -> Self {
        Self {
            header: None,
            tables,
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mmap_data = read_binary_file_mmap(path)?;
        let file = Self::from_bytes(&mmap_data)?;
        tracing::info!(
            path = %path.display(),
            tables = file.tables.len(),
            "opened photostimulation store"
        );
        Ok(file)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut input = bytes;
        let header = parse_header(&mut input).map_err(|e: ContextError| {
            PhotostimError::Format(format!("Failed to parse header: {:?}", e))
        })?;
        if !header.has_valid_signature() {
            return Err(PhotostimError::Format(format!(
                "Unexpected file signature {:?}",
                header.file_signature
            )));
        }
        if header.format_version != Header::FORMAT_VERSION {
            return Err(PhotostimError::Format(format!(
                "Unsupported format version {}",
                header.format_version
            )));
        }

        let document = parse_document(&mut input, &header)?;
        if document.types.len() != usize::from(header.type_count) {
            return Err(PhotostimError::Format(format!(
                "Header announces {} types but the body declares {}",
                header.type_count,
                document.types.len()
            )));
        }
        if !input.is_empty() {
            tracing::warn!(trailing = input.len(), "ignoring bytes after store body");
        }

        let tables = document.into_tables(namespace()?)?;
        Ok(Self {
            header: Some(header),
            tables,
        })
    }

    pub fn to_bytes(&self, options: &StoreOptions) -> Result<Vec<u8>> {
        let (header, body) = self.encode(options)?;
        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Write all tables, and every series, pattern and method they reach.
    pub fn write(&self, path: impl AsRef<Path>, options: &StoreOptions) -> Result<()> {
        let path = path.as_ref();
        let (header, body) = self.encode(options)?;
        write_binary_file(path, &[&header.to_bytes(), &body])?;
        tracing::info!(
            path = %path.display(),
            tables = self.tables.len(),
            bytes = Header::LENGTH + body.len(),
            "wrote photostimulation store"
        );
        Ok(())
    }

    fn encode(&self, options: &StoreOptions) -> Result<(Header, Vec<u8>)> {
        let namespace = namespace()?;
        let document = StoreDocument::from_tables(&self.tables, namespace);
        let body = if options.pretty {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };

        let body_length = u32::try_from(body.len()).map_err(|_| {
            PhotostimError::UnsupportedOperation(format!(
                "Store body of {} bytes exceeds the 4 GiB limit",
                body.len()
            ))
        })?;
        let type_count = u16::try_from(document.types.len())
            .map_err(|_| PhotostimError::Format("Too many registered types".into()))?;

        let header = Header::builder()
            .file_signature(String::from_utf8_lossy(Header::SIGNATURE).into_owned())
            .format_version(Header::FORMAT_VERSION)
            .type_count(type_count)
            .body_length(body_length)
            .build();
        Ok((header, body))
    }

    pub fn table(&self, name: &str) -> Option<&PhotostimulationTable> {
        self.tables.iter().find(|t| t.name() == name)
    }

    /// Get a summary of the file contents
    pub fn get_summary(&self) -> String {
        let mut result = String::new();

        if let Some(header) = &self.header {
            result.push_str("Header:\n");
            result.push_str(&format!("  Format version: {}\n", header.format_version));
            result.push_str(&format!("  Types: {}\n", header.type_count));
            result.push_str(&format!("  Body: {} bytes\n", header.body_length));
        }

        result.push_str("\nTables:\n");
        for table in &self.tables {
            result.push_str(&format!(
                "  {} ({} rows): {}\n",
                table.name(),
                table.len(),
                table.description()
            ));
            for row in table.rows() {
                result.push_str(&format!(
                    "    {}: {} [{}] {:.3}..{:.3} s, pattern '{}', method '{}'\n",
                    row.row_name,
                    row.series_name,
                    row.series_format,
                    row.start_time,
                    row.stop_time,
                    row.pattern_name,
                    row.method_name
                ));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::series::tests::get_pattern;
    use crate::types::{PhotostimulationSeries, StimulusFormat};
    use std::rc::Rc;

    fn shared_pattern_file() -> std::result::Result<PhotostimFile, Box<dyn std::error::Error>> {
        let pattern = get_pattern();
        let mut table = PhotostimulationTable::new("photostim_table", "test table");

        let mut series = Vec::new();
        for i in 0..3 {
            let mut s = PhotostimulationSeries::builder()
                .name(format!("series_{}", i))
                .format(StimulusFormat::Interval)
                .pattern(Rc::clone(&pattern))
                .stim_duration(0.5)
                .build()?;
            s.add_interval(i as f64, i as f64 + 1.0)?;
            s.add_onset(vec![10.0 + i as f64])?;
            series.push(Rc::new(s));
        }
        table.add_series(&series, None)?;

        let pulses = PhotostimulationSeries::builder()
            .name("pulses")
            .format(StimulusFormat::Series)
            .data(vec![0, 1, 0, 1])
            .rate(4.0)
            .starting_time(1.0)
            .stim_duration(0.25)
            .comments("rate based")
            .pattern(Rc::clone(&pattern))
            .build()?;
        table.add_series(&[Rc::new(pulses)], Some(&["pulses"][..]))?;

        Ok(PhotostimFile::new(vec![table]))
    }

    #[test]
    fn test_round_trip_shares_pattern() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let file = shared_pattern_file()?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("photostim.phs");
        file.write(&path, &StoreOptions::default())?;

        let read = PhotostimFile::open(&path)?;
        assert_eq!(read.tables, file.tables);

        let header = read.header.as_ref().unwrap();
        assert!(header.has_valid_signature());
        assert_eq!(header.type_count, 6);

        let table = read.table("photostim_table").unwrap();
        assert_eq!(table.len(), 4);
        let rows = table.rows();
        for row in &rows[1..] {
            assert!(Rc::ptr_eq(rows[0].series.pattern(), row.series.pattern()));
        }
        assert!(Rc::ptr_eq(
            rows[0].series.pattern().method().unwrap(),
            rows[3].series.pattern().method().unwrap()
        ));
        assert_eq!(
            rows[0].series.get_start_stop_list()?,
            vec![(0.0, 1.0), (10.0, 10.5)]
        );
        assert_eq!(rows[3].series.rate(), Some(4.0));
        assert_eq!(rows[3].series.comments(), Some("rate based"));
        Ok(())
    }

    #[test]
    fn test_stored_times_stay_readable() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut file = shared_pattern_file()?;
        let mut series = PhotostimulationSeries::builder()
            .name("open_ended")
            .format(StimulusFormat::Interval)
            .pattern(get_pattern())
            .build()?;
        assert!(series.add_interval(1.0, f64::INFINITY).is_err());
        series.add_interval(1.0, 1000.5)?;
        file.tables[0].add_series(&[Rc::new(series)], None)?;

        let read = PhotostimFile::from_bytes(&file.to_bytes(&StoreOptions::default())?)?;
        assert_eq!(read.tables, file.tables);
        assert_eq!(read.tables[0].rows()[4].stop_time, 1000.5);
        Ok(())
    }

    #[test]
    fn test_pretty_body() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let file = shared_pattern_file()?;
        let compact = file.to_bytes(&StoreOptions::default())?;
        let pretty = file.to_bytes(&StoreOptions::builder().pretty(true).build())?;
        assert!(pretty.len() > compact.len());
        assert_eq!(
            PhotostimFile::from_bytes(&pretty)?.tables,
            PhotostimFile::from_bytes(&compact)?.tables
        );
        Ok(())
    }

    #[test]
    fn test_bad_signature() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut bytes = shared_pattern_file()?.to_bytes(&StoreOptions::default())?;
        bytes[0] = b'X';
        let err = PhotostimFile::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        Ok(())
    }

    #[test]
    fn test_truncated_body() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let bytes = shared_pattern_file()?.to_bytes(&StoreOptions::default())?;
        let err = PhotostimFile::from_bytes(&bytes[..bytes.len() - 10]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        let err = PhotostimFile::from_bytes(&bytes[..4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = PhotostimFile::open("/nonexistent/photostim.phs").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_summary() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let file = shared_pattern_file()?;
        let summary = PhotostimFile::from_bytes(&file.to_bytes(&StoreOptions::default())?)?
            .get_summary();
        assert!(summary.contains("photostim_table (4 rows): test table"));
        assert!(summary.contains("series_0: series_0 [interval]"));
        assert!(summary.contains("pattern 'pattern', method 'methodA'"));
        Ok(())
    }
}
