//! Outbound ports (driven ports): hooks the service calls out to, rather
//! than ones that call in.

/// A sink for the handful of counters worth exposing to an operator. The
/// core never decides how these are aggregated or exported — that is the
/// job of whatever adapter implements this trait.
pub trait MetricsSink: Send + Sync {
    /// A packet or branch failed cryptographic verification.
    fn verify_failed(&self);
    /// A packet was dropped as a replay (outside the window and not in
    /// the cumulative ring).
    fn replay_rejected(&self);
    /// An UPDATE Msg-2 referenced a sequence number with no cached entry.
    fn update_cache_miss(&self);
    /// A chain or tree transition was applied to an SA.
    fn anchor_transitioned(&self);
}

/// A `MetricsSink` that discards everything; the default for callers
/// that don't care.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn verify_failed(&self) {}
    fn replay_rejected(&self) {}
    fn update_cache_miss(&self) {}
    fn anchor_transitioned(&self) {}
}
