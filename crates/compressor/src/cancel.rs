//! Cooperative cancellation.
//!
//! The Ctrl-C task sets the flag; the pipeline polls it between jobs and the
//! encoder polls it while ffmpeg runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Shared single-writer cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Spawns a task that raises `flag` on the first Ctrl-C.
///
/// Once installed, Ctrl-C no longer kills the process; the pipeline stops
/// after the current job resolves.
pub fn install_ctrl_c_handler(flag: CancelFlag) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current file");
            flag.cancel();
        }
    })
}
