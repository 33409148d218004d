//! Input and output collaborators at the edges of a run.

use thiserror::Error;

use crate::{MergedEntity, RawRecord};

/// Supplies a finite batch of raw records.
///
/// Fetch adapters live outside the engine; a source only hands over what
/// they already materialised.
pub trait RecordSource {
    /// Human-readable name used in logs and errors.
    fn describe(&self) -> String;

    /// Load the whole batch.
    ///
    /// # Errors
    ///
    /// Returns [`RecordSourceError`] when the batch cannot be read or decoded.
    fn load(&self) -> Result<Vec<RawRecord>, RecordSourceError>;
}

/// Errors raised while loading raw records.
#[derive(Debug, Error)]
pub enum RecordSourceError {
    /// The batch could not be read.
    #[error("failed to read records from {location}")]
    Io {
        /// Where the batch lives.
        location: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The batch was read but could not be decoded.
    #[error("failed to decode records from {location}: {message}")]
    Decode {
        /// Where the batch lives.
        location: String,
        /// Decoder error message.
        message: String,
    },
}

/// Consumes the ordered entities produced by the aggregator.
pub trait EntitySink {
    /// Hand over the final entity sequence.
    ///
    /// # Errors
    ///
    /// Returns [`EntitySinkError`] when the entities cannot be written.
    fn write(&mut self, entities: &[MergedEntity]) -> Result<(), EntitySinkError>;
}

/// Errors raised while writing entities.
#[derive(Debug, Error)]
pub enum EntitySinkError {
    /// The destination could not be written.
    #[error("failed to write entities to {location}")]
    Io {
        /// Destination.
        location: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The entities could not be encoded.
    #[error("failed to encode entities: {message}")]
    Encode {
        /// Encoder error message.
        message: String,
    },
}
