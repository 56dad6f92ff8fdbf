//! Run accounting.
//!
//! One `RunStats` lives for exactly one pipeline run. It is mutated only by
//! the scanner and the pipeline driver and reported once at the end.

use tracing::info;

/// Counters and byte totals for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Files with a matching extension.
    pub found: u64,
    /// Files matched by an ignore rule.
    pub ignored: u64,
    /// Files skipped because their name carries the compression marker.
    pub already_compressed: u64,
    /// Jobs that completed.
    pub compressed: u64,
    /// Sum of source sizes of completed jobs.
    pub original_bytes: u64,
    /// Sum of output sizes of completed jobs.
    pub compressed_bytes: u64,
    /// The run stopped early on operator interrupt.
    pub cancelled: bool,
}

impl RunStats {
    pub fn record_found(&mut self) {
        self.found += 1;
    }

    pub fn record_ignored(&mut self) {
        self.ignored += 1;
    }

    pub fn record_already_compressed(&mut self) {
        self.already_compressed += 1;
    }

    /// Counts one completed job and adds its sizes to the running totals.
    pub fn record_compressed(&mut self, original_bytes: u64, compressed_bytes: u64) {
        self.compressed += 1;
        self.original_bytes += original_bytes;
        self.compressed_bytes += compressed_bytes;
    }

    /// Bytes saved so far. Zero if the outputs grew.
    pub fn saved_bytes(&self) -> u64 {
        self.original_bytes.saturating_sub(self.compressed_bytes)
    }

    /// Files that were neither skipped nor compressed.
    ///
    /// Zero for every run that finished without cancellation or failure.
    pub fn unaccounted(&self) -> u64 {
        self.found
            .saturating_sub(self.ignored + self.already_compressed + self.compressed)
    }

    /// Logs the end-of-run summary.
    pub fn log_summary(&self) {
        if self.cancelled {
            info!("Run cancelled - summary covers completed jobs only");
        }
        info!("Videos found: {}", self.found);
        info!("Videos ignored: {}", self.ignored);
        info!("Videos already compressed: {}", self.already_compressed);
        info!("Videos compressed: {}", self.compressed);
        info!("Uncompressed space: {}", format_bytes(self.original_bytes));
        info!("Compressed space: {}", format_bytes(self.compressed_bytes));
        info!("Saved space: {}", format_bytes(self.saved_bytes()));
    }
}

/// Formats a byte count using binary units.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
