use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::errors::VisitError;
use crate::engine::scan::request::{GtScanRequest, RawScan};

/// Payload sent to a partition endpoint. Both parts are bincode encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRequest {
    pub scan_request: Vec<u8>,
    pub raw_scan: Vec<u8>,
}

impl VisitRequest {
    pub fn encode(scan: &GtScanRequest, raw: &RawScan) -> Result<Self, bincode::Error> {
        Ok(Self {
            scan_request: bincode::serialize(scan)?,
            raw_scan: bincode::serialize(raw)?,
        })
    }

    pub fn decode(&self) -> Result<(GtScanRequest, RawScan), bincode::Error> {
        Ok((
            bincode::deserialize(&self.scan_request)?,
            bincode::deserialize(&self.raw_scan)?,
        ))
    }
}

/// One compressed block of encoded records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitResponse {
    pub compressed_rows: Vec<u8>,
}

/// Executes a RawScan on the endpoint owning `partition`.
#[async_trait]
pub trait VisitTransport: Send + Sync {
    async fn visit(
        &self,
        partition: u16,
        request: VisitRequest,
    ) -> Result<Vec<VisitResponse>, VisitError>;
}
