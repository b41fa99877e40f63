mod interval_watcher;

pub use interval_watcher::IntervalTargetWatcher;
