use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam::channel::Receiver;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::engine::build::memory::MemoryBudget;
use crate::engine::build::queue::RowBatch;
use crate::engine::build::table::CuboidTable;
use crate::engine::build::writer::CuboidWriter;
use crate::engine::codec::FlatRowEncoder;
use crate::engine::cuboid::CuboidScheduler;
use crate::engine::errors::{BuildError, CodecError};
use crate::engine::schema::GtInfo;
use crate::shared::config::BuildConfig;

const LOG_TARGET: &str = "engine::build::builder";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub input_rows: u64,
    /// Number of arrival-order splits the input was cut into (1 = single pass)
    pub splits: usize,
    pub cuboids: usize,
    pub records_written: u64,
}

type Partial = FxHashMap<u64, CuboidTable>;

/// Build round running on its own thread.
pub struct BuildTask<W> {
    handle: thread::JoinHandle<Result<(BuildSummary, W), BuildError>>,
}

impl<W> BuildTask<W> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the round. A panic on the build thread becomes
    /// [`BuildError::Panicked`].
    pub fn join(self) -> Result<(BuildSummary, W), BuildError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                let err = BuildError::Panicked;
                err.log_error();
                Err(err)
            }
        }
    }
}

/// Builds every scheduled cuboid from a stream of flat rows.
///
/// The base cuboid is aggregated straight from the input; every other cuboid
/// is rolled up from its spanning parent, one generation at a time on a fixed
/// worker pool.
pub struct InMemCubeBuilder {
    info: Arc<GtInfo>,
    scheduler: Arc<CuboidScheduler>,
    encoder: FlatRowEncoder,
    budget: MemoryBudget,
    pool: rayon::ThreadPool,
}

impl InMemCubeBuilder {
    pub fn new(
        scheduler: Arc<CuboidScheduler>,
        encoder: FlatRowEncoder,
        config: &BuildConfig,
    ) -> Result<Self, BuildError> {
        let info = Arc::new(encoder.gt_info()?);
        if info.dimension_count() != scheduler.dimension_count() {
            return Err(BuildError::Codec(CodecError::InvalidDescriptor(format!(
                "scheduler covers {} dimensions, cube has {}",
                scheduler.dimension_count(),
                info.dimension_count()
            ))));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency.max(1))
            .thread_name(|i| format!("cube-build-{i}"))
            .build()
            .map_err(|e| BuildError::WorkerPool(e.to_string()))?;

        Ok(Self {
            info,
            scheduler,
            encoder,
            budget: MemoryBudget::from_config(config),
            pool,
        })
    }

    pub fn with_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn info(&self) -> &Arc<GtInfo> {
        &self.info
    }

    pub fn scheduler(&self) -> &Arc<CuboidScheduler> {
        &self.scheduler
    }

    pub fn concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Consumes `input` up to the end-of-input marker, writes every cuboid to
    /// `sink` and flushes it once. Records already written are not retracted
    /// when the build fails.
    pub fn build<W: CuboidWriter + ?Sized>(
        &self,
        input: &Receiver<RowBatch>,
        sink: &mut W,
    ) -> Result<BuildSummary, BuildError> {
        let started = Instant::now();
        info!(
            target: LOG_TARGET,
            cuboids = self.scheduler.cuboid_count(),
            threads = self.concurrency(),
            "Build round started"
        );

        let result = self.run(input, sink);
        match &result {
            Ok(summary) => info!(
                target: LOG_TARGET,
                input_rows = summary.input_rows,
                splits = summary.splits,
                records = summary.records_written,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Build round finished"
            ),
            Err(e) => e.log_error(),
        }
        result
    }

    /// Runs [`build`](Self::build) on a dedicated thread; the sink is handed
    /// back by [`BuildTask::join`] on success.
    pub fn build_as_task<W>(
        self: &Arc<Self>,
        input: Receiver<RowBatch>,
        mut sink: W,
    ) -> Result<BuildTask<W>, BuildError>
    where
        W: CuboidWriter + Send + 'static,
    {
        let builder = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("cube-build".to_string())
            .spawn(move || {
                let summary = builder.build(&input, &mut sink)?;
                Ok((summary, sink))
            })
            .map_err(|e| BuildError::WorkerPool(e.to_string()))?;
        Ok(BuildTask { handle })
    }

    fn run<W: CuboidWriter + ?Sized>(
        &self,
        input: &Receiver<RowBatch>,
        sink: &mut W,
    ) -> Result<BuildSummary, BuildError> {
        let (mut splits, input_rows) = match self.ingest(input) {
            Ok(v) => v,
            Err(e) => {
                drain_round(input);
                return Err(e);
            }
        };

        let mut summary = BuildSummary {
            input_rows,
            splits: splits.len(),
            cuboids: self.scheduler.cuboid_count(),
            records_written: 0,
        };

        if splits.len() == 1 {
            let base = splits.pop().unwrap_or_else(|| CuboidTable::new(self.info.base_cuboid()));
            let mut written = 0u64;
            self.derive_lattice(
                base,
                &mut |table| {
                    written += write_table(table, sink)?;
                    Ok(())
                },
                &mut |_released| {},
            )?;
            summary.records_written = written;
        } else {
            let merged = self.build_splits(splits)?;
            for cuboid in self.scheduler.build_order() {
                if let Some(table) = merged.get(cuboid) {
                    summary.records_written += write_table(table, sink)?;
                }
            }
        }

        sink.flush()?;
        Ok(summary)
    }

    /// Aggregates the input into base tables. A table is sealed as its own
    /// split whenever it outgrows the memory budget.
    fn ingest(&self, input: &Receiver<RowBatch>) -> Result<(Vec<CuboidTable>, u64), BuildError> {
        let base = self.info.base_cuboid();
        let mut splits = Vec::new();
        let mut current = CuboidTable::new(base);
        let mut rows = 0u64;

        loop {
            let batch = input.recv().map_err(|_| BuildError::InputClosed)?;
            if batch.is_empty() {
                break;
            }
            for row in &batch {
                current.add(self.encoder.encode_row(row)?)?;
                rows += 1;
                if self.budget.is_exceeded(current.estimated_bytes()) {
                    info!(
                        target: LOG_TARGET,
                        split = splits.len(),
                        groups = current.len(),
                        estimated_bytes = current.estimated_bytes(),
                        "Base table over budget, sealing split"
                    );
                    splits.push(std::mem::replace(&mut current, CuboidTable::new(base)));
                }
            }
        }

        if !current.is_empty() || splits.is_empty() {
            splits.push(current);
        }
        debug!(target: LOG_TARGET, rows, splits = splits.len(), "Input drained");
        Ok((splits, rows))
    }

    /// Builds each split's lattice on its own and merges the partial results
    /// pairwise. Partials of equal rank are merged as soon as both exist, so at
    /// most log2(splits) partials are alive.
    fn build_splits(&self, splits: Vec<CuboidTable>) -> Result<Partial, BuildError> {
        let mut stack: Vec<(u32, Partial)> = Vec::new();

        for (idx, split) in splits.into_iter().enumerate() {
            let mut partial = Partial::default();
            self.derive_lattice(split, &mut |_| Ok(()), &mut |table| {
                partial.insert(table.cuboid(), table);
            })?;
            debug!(target: LOG_TARGET, split = idx, "Split lattice built");

            let mut entry = (0u32, partial);
            while stack.last().is_some_and(|(rank, _)| *rank == entry.0) {
                if let Some((rank, top)) = stack.pop() {
                    entry = (rank + 1, merge_partials(top, entry.1)?);
                }
            }
            stack.push(entry);
        }

        stack
            .into_iter()
            .map(|(_, partial)| partial)
            .try_fold(Partial::default(), merge_partials)
    }

    /// Materializes every scheduled cuboid below `base`. `on_complete` sees each
    /// table once it is fully built; `on_release` receives it once all of its
    /// spanning children exist.
    fn derive_lattice(
        &self,
        base: CuboidTable,
        on_complete: &mut dyn FnMut(&CuboidTable) -> Result<(), BuildError>,
        on_release: &mut dyn FnMut(CuboidTable),
    ) -> Result<(), BuildError> {
        let mut live: FxHashMap<u64, CuboidTable> = FxHashMap::default();
        let mut pending_children: FxHashMap<u64, usize> = FxHashMap::default();

        self.complete(base, &mut live, &mut pending_children, on_complete, on_release)?;

        for generation in self.scheduler.generations().into_iter().skip(1) {
            let derived = self.pool.install(|| {
                generation
                    .par_iter()
                    .map(|&cuboid| {
                        let parent = self
                            .scheduler
                            .parent_of(cuboid)
                            .and_then(|p| live.get(&p))
                            .ok_or(BuildError::MissingParent(cuboid))?;
                        parent.rollup(cuboid)
                    })
                    .collect::<Result<Vec<_>, BuildError>>()
            })?;

            for table in derived {
                let parent = self.scheduler.parent_of(table.cuboid());
                self.complete(table, &mut live, &mut pending_children, on_complete, on_release)?;

                let Some(parent) = parent else { continue };
                if let Entry::Occupied(mut remaining) = pending_children.entry(parent) {
                    *remaining.get_mut() -= 1;
                    if *remaining.get() == 0 {
                        remaining.remove();
                        if let Some(done) = live.remove(&parent) {
                            on_release(done);
                        }
                    }
                }
            }
        }

        if !live.is_empty() {
            warn!(target: LOG_TARGET, tables = live.len(), "Tables left after lattice walk");
            for (_, table) in live.drain() {
                on_release(table);
            }
        }
        Ok(())
    }

    fn complete(
        &self,
        table: CuboidTable,
        live: &mut FxHashMap<u64, CuboidTable>,
        pending_children: &mut FxHashMap<u64, usize>,
        on_complete: &mut dyn FnMut(&CuboidTable) -> Result<(), BuildError>,
        on_release: &mut dyn FnMut(CuboidTable),
    ) -> Result<(), BuildError> {
        debug!(
            target: LOG_TARGET,
            cuboid_id = table.cuboid(),
            rows = table.len(),
            "Cuboid materialized"
        );
        on_complete(&table)?;

        let children = self.scheduler.spanning_children(table.cuboid()).len();
        if children == 0 {
            on_release(table);
        } else {
            pending_children.insert(table.cuboid(), children);
            live.insert(table.cuboid(), table);
        }
        Ok(())
    }
}

fn write_table<W: CuboidWriter + ?Sized>(table: &CuboidTable, sink: &mut W) -> Result<u64, BuildError> {
    let mut written = 0u64;
    for record in table.sorted_records() {
        sink.write(table.cuboid(), &record)?;
        written += 1;
    }
    Ok(written)
}

fn merge_partials(mut into: Partial, from: Partial) -> Result<Partial, BuildError> {
    for (cuboid, table) in from {
        match into.entry(cuboid) {
            Entry::Occupied(mut existing) => existing.get_mut().merge_from(table)?,
            Entry::Vacant(slot) => {
                slot.insert(table);
            }
        }
    }
    Ok(into)
}

/// Discards the rest of a failed round so a blocked feeder can finish.
fn drain_round(input: &Receiver<RowBatch>) {
    while let Ok(batch) = input.recv() {
        if batch.is_empty() {
            break;
        }
    }
}
