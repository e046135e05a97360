//! Redraw request deduplication.
//!
//! Any number of redraw requests between two frames collapse into one. The
//! frame always draws the latest state, so nothing is lost by dropping the
//! extra requests.

#[cfg(test)]
#[path = "redraw_test.rs"]
mod redraw_test;

#[derive(Debug, Clone, Default)]
pub struct RedrawScheduler {
    pending: bool,
    requested: u64,
    frames: u64,
}

impl RedrawScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a redraw. Returns `true` only when no frame was pending, i.e.
    /// when the caller should actually schedule one.
    pub fn request(&mut self) -> bool {
        self.requested += 1;
        !std::mem::replace(&mut self.pending, true)
    }

    /// Called when the scheduled frame fires. Returns whether a redraw was
    /// pending; the flag is cleared either way.
    pub fn take_frame(&mut self) -> bool {
        let pending = std::mem::take(&mut self.pending);
        if pending {
            self.frames += 1;
        }
        pending
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Total requests seen and frames actually drawn.
    #[must_use]
    pub fn counts(&self) -> (u64, u64) {
        (self.requested, self.frames)
    }
}
