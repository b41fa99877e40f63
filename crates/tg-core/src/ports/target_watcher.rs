use std::sync::Arc;

/// Re-checks whether a step's target currently exists.
pub type TargetProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Host-owned watcher that polls a step's target while a session is active.
///
/// 宿主持有的目标元素监视器，仅在会话激活时运行。
///
/// # Behavior / 行为
/// - `watch()` replaces any running watch.
/// - `stop()` is idempotent and takes effect immediately.
pub trait TargetWatcherPort: Send + Sync {
    fn watch(&self, step_id: &str, probe: TargetProbe) -> Result<(), TargetWatcherError>;

    fn stop(&self);

    fn is_running(&self) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum TargetWatcherError {
    #[error("no async runtime available to drive the watcher")]
    NoRuntime,

    #[error("failed to start watcher: {0}")]
    StartFailed(String),
}
