//! User-visible notices raised by the navigation guard

use std::sync::{Arc, Mutex};

/// A blocked navigation the user should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForbiddenNotice {
    /// Path the user tried to open
    pub path: String,
    /// Role that was missing
    pub role: String,
    pub message: String,
}

/// Surface for forbidden notices (toast, alert, log line)
pub trait Notifier: Send + Sync {
    fn forbidden(&self, notice: &ForbiddenNotice);
}

/// Default notifier: writes the notice to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn forbidden(&self, notice: &ForbiddenNotice) {
        log::warn!("{} (path: {}, missing role: {})", notice.message, notice.path, notice.role);
    }
}

/// Notifier that keeps every notice, for callers that render them later
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<ForbiddenNotice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far, oldest first
    pub fn notices(&self) -> Vec<ForbiddenNotice> {
        self.notices.lock().expect("notice lock poisoned").clone()
    }

    /// Take and clear the received notices
    pub fn drain(&self) -> Vec<ForbiddenNotice> {
        std::mem::take(&mut *self.notices.lock().expect("notice lock poisoned"))
    }
}

impl Notifier for RecordingNotifier {
    fn forbidden(&self, notice: &ForbiddenNotice) {
        self.notices.lock().expect("notice lock poisoned").push(notice.clone());
    }
}
