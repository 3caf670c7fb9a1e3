use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::engine::codec::{CompressionCodec, Lz4Codec};
use crate::engine::errors::ScanError;
use crate::engine::plan::PartitionLayout;
use crate::engine::scan::request::{GtScanRequest, prepare_raw_scans};
use crate::engine::scan::scanner::RecordScanner;
use crate::engine::scan::transport::{VisitRequest, VisitTransport};
use crate::engine::schema::GtInfo;
use crate::shared::config::ScanConfig;

const LOG_TARGET: &str = "engine::scan::coordinator";

/// Decompressed blocks of one RawScan, tagged with the RawScan's position.
type Collected = Arc<Mutex<Vec<(usize, Vec<Vec<u8>>)>>>;

/// Fans a cuboid scan out to every partition holding the cuboid and gathers
/// the returned blocks.
pub struct ScanCoordinator {
    info: Arc<GtInfo>,
    layout: Arc<PartitionLayout>,
    transport: Arc<dyn VisitTransport>,
    codec: Arc<dyn CompressionCodec>,
    timeout: Duration,
}

impl ScanCoordinator {
    pub fn new(
        info: Arc<GtInfo>,
        layout: Arc<PartitionLayout>,
        transport: Arc<dyn VisitTransport>,
        config: &ScanConfig,
    ) -> Self {
        Self {
            info,
            layout,
            transport,
            codec: Arc::new(Lz4Codec),
            timeout: Duration::from_secs(config.visit_timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Visits every partition concurrently and returns a scanner over all
    /// records once each visit has succeeded. The first failure, or the
    /// timeout expiring, fails the whole scan; visits still in flight are
    /// detached and their results dropped.
    pub async fn scan(&self, request: &GtScanRequest) -> Result<RecordScanner, ScanError> {
        let started = Instant::now();
        let result = self.fan_out(request).await;
        match &result {
            Ok(scanner) => info!(
                target: LOG_TARGET,
                cuboid_id = request.cuboid_id,
                blocks = scanner.block_count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Scan gathered"
            ),
            Err(e) => e.log_error(),
        }
        result
    }

    async fn fan_out(&self, request: &GtScanRequest) -> Result<RecordScanner, ScanError> {
        let raw_scans = prepare_raw_scans(&self.info, &self.layout, request)?;
        let projection = request.projection();
        let scan_request = request.clone().with_blocks(projection);

        info!(
            target: LOG_TARGET,
            cuboid_id = request.cuboid_id,
            partitions = raw_scans.len(),
            "Dispatching scan"
        );

        let collected: Collected = Arc::new(Mutex::new(Vec::with_capacity(raw_scans.len())));
        let mut tasks = JoinSet::new();

        for (idx, raw) in raw_scans.into_iter().enumerate() {
            let visit = VisitRequest::encode(&scan_request, &raw)?;
            let partition = raw.partition;
            let transport = Arc::clone(&self.transport);
            let codec = Arc::clone(&self.codec);
            let collected = Arc::clone(&collected);

            tasks.spawn(async move {
                let responses = transport
                    .visit(partition, visit)
                    .await
                    .map_err(|source| ScanError::Visit { partition, source })?;

                let mut blocks = Vec::with_capacity(responses.len());
                for response in responses {
                    let block = codec.decompress(&response.compressed_rows).map_err(|e| {
                        ScanError::Decompress {
                            partition,
                            reason: e.to_string(),
                        }
                    })?;
                    blocks.push(block);
                }

                debug!(
                    target: LOG_TARGET,
                    partition,
                    blocks = blocks.len(),
                    "Partition visited"
                );
                collected.lock().push((idx, blocks));
                Ok::<(), ScanError>(())
            });
        }

        let gathered = match tokio::time::timeout(self.timeout, join_all(&mut tasks)).await {
            Ok(result) => result,
            Err(_) => Err(ScanError::Timeout(self.timeout)),
        };
        if let Err(e) = gathered {
            tasks.detach_all();
            return Err(e);
        }

        let mut parts = std::mem::take(&mut *collected.lock());
        parts.sort_by_key(|(idx, _)| *idx);
        let data = parts.into_iter().flat_map(|(_, blocks)| blocks).collect();

        Ok(RecordScanner::new(
            Arc::clone(&self.info),
            request.cuboid_id,
            projection,
            data,
        ))
    }
}

async fn join_all(tasks: &mut JoinSet<Result<(), ScanError>>) -> Result<(), ScanError> {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(ScanError::Interrupted(e.to_string())),
        }
    }
    Ok(())
}
