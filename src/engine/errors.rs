use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Row has {got} columns, flat table expects {expected}")]
    ColumnCount { expected: usize, got: usize },

    #[error("Value {value:?} not found in dictionary of dimension {dimension}")]
    UnknownValue { dimension: String, value: String },

    #[error("Invalid decimal {value:?} for scale {scale}")]
    InvalidDecimal { value: String, scale: u32 },

    #[error("Dictionary of dimension {0} holds more values than a 4-byte code can address")]
    DictionaryOverflow(String),

    #[error("Truncated data while decoding {0}")]
    Truncated(&'static str),

    #[error("{0} bytes left after the last record of a block")]
    TrailingBytes(usize),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Invalid cube descriptor: {0}")]
    InvalidDescriptor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MeasureError {
    #[error("{0} accumulator overflowed")]
    Overflow(&'static str),
}

#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("Cuboid lattice over {0} dimensions is not supported")]
    TooManyDimensions(usize),

    #[error("Cuboid {cuboid:#x} is not a subset of base cuboid {base:#x}")]
    NotInLattice { cuboid: u64, base: u64 },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Sink error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Input queue closed before the end-of-input marker")]
    InputClosed,

    #[error("Malformed input row: {0}")]
    Codec(#[from] CodecError),

    #[error("Lattice error: {0}")]
    Lattice(#[from] LatticeError),

    #[error("Sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Aggregating cuboid {cuboid:#x} failed: {source}")]
    Measure {
        cuboid: u64,
        #[source]
        source: MeasureError,
    },

    #[error("Parent table of cuboid {0:#x} is not materialized")]
    MissingParent(u64),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Build thread panicked")]
    Panicked,
}

impl BuildError {
    pub fn log_error(&self) {
        match self {
            BuildError::InputClosed => {
                error!(target: "engine::build", "Input queue closed before end of input");
            }
            BuildError::Codec(e) => {
                error!(target: "engine::build", "Malformed input row: {}", e);
                debug!(target: "engine::build", "Codec error details: {:?}", e);
            }
            BuildError::Measure { cuboid, source } => {
                error!(target: "engine::build", cuboid_id = *cuboid, "Measure merge failed: {}", source);
            }
            BuildError::Sink(e) => {
                error!(target: "engine::build", "Sink failed: {}", e);
                debug!(target: "engine::build", "Sink error details: {:?}", e);
            }
            other => {
                error!(target: "engine::build", "Build failed: {}", other);
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Sampling percentage must be in (0, 100], got {0}")]
    InvalidSamplingPercentage(i64),

    #[error("No cuboid statistics to plan from")]
    EmptyStatistics,

    #[error("Invalid planner configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt statistics resource: {0}")]
    Corrupt(String),
}

/// Failure reported by one partition visit.
#[derive(Debug, Clone, Error)]
pub enum VisitError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Remote exception: {0}")]
    Remote(String),

    #[error("Remote controller reported a failure without a cause")]
    ControllerFailed,

    #[error("Unknown partition {0}")]
    UnknownPartition(u16),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Error when visiting partition {partition}: {source}")]
    Visit {
        partition: u16,
        #[source]
        source: VisitError,
    },

    #[error("Failed to decompress block from partition {partition}: {reason}")]
    Decompress { partition: u16, reason: String },

    #[error("Failed to decode record block: {0}")]
    Decode(#[from] CodecError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] bincode::Error),

    #[error("Visiting partitions timed out after {0:?}")]
    Timeout(Duration),

    #[error("Visiting partitions was interrupted: {0}")]
    Interrupted(String),
}

impl ScanError {
    pub fn log_error(&self) {
        match self {
            ScanError::Visit { partition, source } => {
                error!(target: "engine::scan", partition = *partition, "Partition visit failed: {}", source);
                debug!(target: "engine::scan", "Visit error details: {:?}", source);
            }
            ScanError::Timeout(limit) => {
                error!(target: "engine::scan", "Scan timed out after {:?}", limit);
            }
            other => {
                error!(target: "engine::scan", "Scan failed: {}", other);
                debug!(target: "engine::scan", "Scan error details: {:?}", other);
            }
        }
    }
}
