use std::collections::BTreeMap;

use crate::engine::errors::SinkError;
use crate::engine::schema::Record;

/// Destination of build output. `write` may be called many times per cuboid;
/// `flush` once at the end of each build round. A writer must accept several
/// rounds.
pub trait CuboidWriter {
    fn write(&mut self, cuboid_id: u64, record: &Record) -> Result<(), SinkError>;
    fn flush(&mut self) -> Result<(), SinkError>;
}

impl<W: CuboidWriter + ?Sized> CuboidWriter for &mut W {
    fn write(&mut self, cuboid_id: u64, record: &Record) -> Result<(), SinkError> {
        (**self).write(cuboid_id, record)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

/// Keeps every record in memory, grouped by cuboid. Each round replaces the
/// previous one's output.
#[derive(Debug, Default)]
pub struct CollectingWriter {
    pending: BTreeMap<u64, Vec<Record>>,
    flushed: BTreeMap<u64, Vec<Record>>,
    rounds: usize,
}

impl CollectingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output of the last flushed round.
    pub fn cuboids(&self) -> &BTreeMap<u64, Vec<Record>> {
        &self.flushed
    }

    pub fn records(&self, cuboid_id: u64) -> &[Record] {
        self.flushed
            .get(&cuboid_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

impl CuboidWriter for CollectingWriter {
    fn write(&mut self, cuboid_id: u64, record: &Record) -> Result<(), SinkError> {
        self.pending
            .entry(cuboid_id)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.flushed = std::mem::take(&mut self.pending);
        self.rounds += 1;
        Ok(())
    }
}
