use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Advisory progress channel of one task execution
///
/// Reported percentages are clamped to 100 and never decrease: a value lower
/// than the last one reported is dropped.
#[derive(Clone)]
pub struct ProgressTracker {
    last: Arc<AtomicU8>,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self {
            last: Arc::new(AtomicU8::new(0)),
            callback: Some(Arc::new(callback)),
        }
    }

    /// Tracker that only remembers the last value
    pub fn silent() -> Self {
        Self {
            last: Arc::new(AtomicU8::new(0)),
            callback: None,
        }
    }

    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.last.fetch_max(percent, Ordering::SeqCst);
        if percent < previous {
            return;
        }
        if let Some(callback) = &self.callback {
            callback(percent);
        }
    }

    /// Report `done` of `total` items; an empty batch counts as complete
    pub fn report_items(&self, done: usize, total: usize) {
        self.report(percent_of(done as u64, total as u64));
    }

    /// Last reported percentage
    pub fn current(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("current", &self.current())
            .finish()
    }
}

/// Integer percentage of `done / total`, 100 when `total` is zero
pub fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
