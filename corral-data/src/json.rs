//! JSON file collaborators: raw record batches in, merged entities out.

use std::io::{BufReader, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use corral_core::{
    EntitySink, EntitySinkError, MergedEntity, RawRecord, RecordSource, RecordSourceError,
};
use corral_fs::{create_for_write, open_for_read};
use log::{info, warn};
use serde_json::Value;

/// Reads a JSON array of [`RawRecord`]s written by a fetch adapter.
///
/// Elements that do not decode as a raw record are logged and skipped so a
/// single malformed listing does not sink the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRecordSource {
    path: Utf8PathBuf,
}

impl JsonRecordSource {
    /// Source reading `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File being read.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl RecordSource for JsonRecordSource {
    fn describe(&self) -> String {
        self.path.to_string()
    }

    fn load(&self) -> Result<Vec<RawRecord>, RecordSourceError> {
        let file = open_for_read(&self.path).map_err(|source| RecordSourceError::Io {
            location: self.describe(),
            source,
        })?;
        let values: Vec<Value> = serde_json::from_reader(BufReader::new(file)).map_err(|err| {
            RecordSourceError::Decode {
                location: self.describe(),
                message: err.to_string(),
            }
        })?;
        let total = values.len();
        let records: Vec<RawRecord> = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!("{}: skipping element {index}: {err}", self.path);
                    None
                }
            })
            .collect();
        info!("loaded {} of {total} raw records from {}", records.len(), self.path);
        Ok(records)
    }
}

/// Writes merged entities as a pretty-printed JSON array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonEntitySink {
    path: Utf8PathBuf,
}

impl JsonEntitySink {
    /// Sink writing to `path`, replacing any existing file.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File being written.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl EntitySink for JsonEntitySink {
    fn write(&mut self, entities: &[MergedEntity]) -> Result<(), EntitySinkError> {
        let io_error = |source| EntitySinkError::Io {
            location: self.path.to_string(),
            source,
        };
        let file = create_for_write(&self.path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, entities).map_err(|err| {
            EntitySinkError::Encode {
                message: err.to_string(),
            }
        })?;
        writer.flush().map_err(io_error)?;
        info!("wrote {} entities to {}", entities.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::test_support::{RecordBuilder, singleton_entity};
    use corral_core::{ScrapedListing, SourceId, SourcePayload};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn workdir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");
        (dir, root)
    }

    #[rstest]
    fn loads_records_and_skips_malformed_elements(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let path = root.join("raw.json");
        let good = RawRecord::new(
            "4521",
            1_700_000_000,
            SourcePayload::BootBarn(ScrapedListing {
                name: Some("Boot Barn #4521".into()),
                ..ScrapedListing::default()
            }),
        );
        let body = serde_json::json!([good, {"key": "x", "source": "foursquare"}]);
        std::fs::write(&path, body.to_string()).expect("write fixture");

        let records = JsonRecordSource::new(path).load().expect("loads");
        assert_eq!(records, vec![good]);
    }

    #[rstest]
    fn missing_file_is_an_io_error(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let err = JsonRecordSource::new(root.join("absent.json"))
            .load()
            .expect_err("missing");
        assert!(matches!(err, RecordSourceError::Io { .. }));
    }

    #[rstest]
    fn non_array_is_a_decode_error(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let path = root.join("raw.json");
        std::fs::write(&path, "{\"not\": \"an array\"}").expect("write fixture");
        let err = JsonRecordSource::new(path).load().expect_err("not an array");
        assert!(matches!(err, RecordSourceError::Decode { .. }));
    }

    #[rstest]
    fn sink_writes_into_new_directories(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let path = root.join("out/entities.json");
        let entity = singleton_entity(
            RecordBuilder::new(SourceId::Osm, "node/1", "Boot Barn")
                .locality("Fort Worth", "TX")
                .build(),
        );
        JsonEntitySink::new(path.clone())
            .write(std::slice::from_ref(&entity))
            .expect("writes");
        let text = std::fs::read_to_string(&path).expect("read back");
        let back: Vec<MergedEntity> = serde_json::from_str(&text).expect("decode");
        assert_eq!(back, vec![entity]);
    }
}
