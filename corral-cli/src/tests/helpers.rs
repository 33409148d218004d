//! Test helpers for composing reconcile inputs and a stub geocoder.

use super::*;
use crate::reconcile::{GeocoderBuilder, ReconcileSettings};
use camino::{Utf8Path, Utf8PathBuf};
use corral_data::geocode::test_support::StubGeocoder;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Geocoder builder handing out a stub that never finds anything.
pub(super) struct StubBuilder;

impl GeocoderBuilder for StubBuilder {
    type Geocoder = StubGeocoder;

    fn build(&self, _settings: &ReconcileSettings) -> Result<Self::Geocoder, CliError> {
        Ok(StubGeocoder::new())
    }
}

/// A listings file holding one store seen by OSM and Yelp, plus an output
/// path inside the same temporary directory.
pub(super) struct ListingFiles {
    _dir: TempDir,
    root: Utf8PathBuf,
    listings: Utf8PathBuf,
    output: Utf8PathBuf,
}

impl ListingFiles {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let listings = root.join("listings.json");
        let output = root.join("out").join("stores.json");
        let records = json!([
            {
                "key": "node/1",
                "retrieved_at": 1_700_000_000_u64,
                "source": "osm",
                "data": {
                    "type": "node",
                    "id": 1,
                    "lat": 32.75,
                    "lon": -97.33,
                    "tags": {
                        "name": "Boot Barn",
                        "shop": "clothes",
                        "addr:housenumber": "100",
                        "addr:street": "Main St",
                        "addr:city": "Fort Worth",
                        "addr:state": "TX"
                    }
                }
            },
            {
                "key": "boot-barn-fort-worth",
                "retrieved_at": 1_700_000_100_u64,
                "source": "yelp",
                "data": {
                    "id": "boot-barn-fort-worth",
                    "name": "BOOT BARN #4521",
                    "location": {
                        "address1": "100 Main Street",
                        "city": "Fort Worth",
                        "state": "TX"
                    },
                    "coordinates": { "latitude": 32.75045, "longitude": -97.33 },
                    "phone": "+18175550100"
                }
            }
        ]);
        write_utf8(&listings, records.to_string().as_bytes());
        Self {
            _dir: dir,
            root,
            listings,
            output,
        }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn listings(&self) -> &Utf8Path {
        &self.listings
    }

    pub(super) fn output(&self) -> &Utf8Path {
        &self.output
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write test file");
}
