use sysinfo::System;
use tracing::info;

use crate::shared::config::BuildConfig;

const LOG_TARGET: &str = "engine::build::memory";

/// Upper bound on the estimated size of one base table. Once ingestion crosses
/// it, the builder seals the table and continues into a new split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryBudget {
    limit_bytes: u64,
}

impl MemoryBudget {
    pub fn new(limit_bytes: u64) -> Self {
        Self {
            limit_bytes: limit_bytes.max(1),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            limit_bytes: u64::MAX,
        }
    }

    /// Explicit cap from config, else a share of currently available memory.
    pub fn from_config(cfg: &BuildConfig) -> Self {
        if let Some(limit) = cfg.max_base_table_bytes {
            return Self::new(limit);
        }
        let mut system = System::new();
        system.refresh_memory();
        let available = system.available_memory();
        let fraction = cfg.memory_fraction.clamp(0.01, 1.0);
        let limit = (available as f64 * fraction) as u64;

        info!(
            target: LOG_TARGET,
            available_memory_mb = available / (1024 * 1024),
            limit_mb = limit / (1024 * 1024),
            "Derived base table budget from system memory"
        );

        if limit == 0 {
            Self::unlimited()
        } else {
            Self::new(limit)
        }
    }

    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }

    pub fn is_exceeded(&self, estimated_bytes: u64) -> bool {
        estimated_bytes > self.limit_bytes
    }
}
