//! Operator toggles shared between the refresh loop and its caller

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

/// Auto-refresh and developer-mode switches
///
/// Cloning yields another handle to the same switches, so a signal handler
/// can disable auto-refresh while a session is running.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    auto_refresh: Arc<AtomicBool>,
    dev_mode: Arc<AtomicBool>,
}

impl Controls {
    pub fn new(auto_refresh: bool, dev_mode: bool) -> Self {
        Self {
            auto_refresh: Arc::new(AtomicBool::new(auto_refresh)),
            dev_mode: Arc::new(AtomicBool::new(dev_mode)),
        }
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.auto_refresh.load(Ordering::SeqCst)
    }

    pub fn enable_auto_refresh(&self) {
        debug!("Controls::enable_auto_refresh: called");
        self.auto_refresh.store(true, Ordering::SeqCst);
    }

    pub fn disable_auto_refresh(&self) {
        debug!("Controls::disable_auto_refresh: called");
        self.auto_refresh.store(false, Ordering::SeqCst);
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode.load(Ordering::SeqCst)
    }

    pub fn set_dev_mode(&self, enabled: bool) {
        debug!(enabled, "Controls::set_dev_mode: called");
        self.dev_mode.store(enabled, Ordering::SeqCst);
    }
}
