use crossbeam::channel::{Receiver, Sender, bounded};

use crate::engine::errors::BuildError;

/// Rows in flat-table column order. An empty batch marks the end of input.
pub type RowBatch = Vec<Vec<String>>;

/// Bounded queue between a feeder and the builder. `send` blocks while the
/// queue is full, the builder blocks while it is empty.
pub fn input_queue(capacity: usize) -> (Feeder, Receiver<RowBatch>) {
    let (tx, rx) = bounded(capacity.max(1));
    (Feeder { tx }, rx)
}

#[derive(Clone)]
pub struct Feeder {
    tx: Sender<RowBatch>,
}

impl Feeder {
    pub fn send_batch(&self, batch: RowBatch) -> Result<(), BuildError> {
        // An empty batch would end the round early
        if batch.is_empty() {
            return Ok(());
        }
        self.tx.send(batch).map_err(|_| BuildError::InputClosed)
    }

    pub fn send_row(&self, row: Vec<String>) -> Result<(), BuildError> {
        self.send_batch(vec![row])
    }

    /// Ends the current round. The feeder stays usable for the next one.
    pub fn finish(&self) -> Result<(), BuildError> {
        self.tx.send(Vec::new()).map_err(|_| BuildError::InputClosed)
    }
}
