/// Outcome of one [`ProgressMonitor::observe`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stuck: bool,
    /// Consecutive observations without growth, including this one.
    pub flat_count: u32,
}

/// Detects when the store has stopped growing.
///
/// It cannot tell an exhausted timeline from one that is slow to render; a
/// larger threshold or a longer delay between iterations are the only knobs.
#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    threshold: u32,
    last_size: usize,
    flat_count: u32,
}

impl ProgressMonitor {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            last_size: 0,
            flat_count: 0,
        }
    }

    pub fn observe(&mut self, current_size: usize) -> Progress {
        if current_size == self.last_size {
            self.flat_count += 1;
        } else {
            self.flat_count = 0;
        }
        self.last_size = current_size;

        Progress {
            stuck: self.flat_count >= self.threshold,
            flat_count: self.flat_count,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
