//! Per-document progress on stderr

use std::io::{self, Write};

/// Simple progress reporter for CLI commands
pub struct ProgressReporter {
    total: usize,
    processed: usize,
    enabled: bool,
}

impl ProgressReporter {
    pub fn new(total: usize, enabled: bool) -> Self {
        Self {
            total,
            processed: 0,
            enabled,
        }
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    pub fn set_message(&self, msg: &str) {
        if !self.enabled {
            return;
        }
        eprint!("\r[{}/{}] {:<60}", self.processed, self.total, msg);
        io::stderr().flush().ok();
    }

    pub fn increment(&mut self) {
        self.processed += 1;
    }

    pub fn finish(&self) {
        if self.enabled && self.total > 0 {
            eprintln!("\rDone ({}/{}){:<60}", self.processed, self.total, "");
        }
    }
}
