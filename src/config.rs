use std::time::Duration;

/// Policy knobs recognized by the approval engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Requests at or below this amount skip human review. `0` disables
    /// auto-approval entirely.
    pub auto_approve_threshold_cents: u64,
    /// Maximum request creations allowed in the trailing hour. `0` permits
    /// nothing.
    pub rate_limit_per_hour: u32,
    /// Upper bound on a single transfer executor call. A timed-out transfer
    /// is recorded as failed.
    pub transfer_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_approve_threshold_cents: 0,
            rate_limit_per_hour: 10,
            transfer_timeout: Duration::from_secs(30),
        }
    }
}
