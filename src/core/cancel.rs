//! Cooperative cancellation for recognition runs.

use crate::core::errors::{OCRError, OcrResult, ProcessingStage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable flag shared between a running recognizer and its owner.
///
/// The recognizer polls it at every stage boundary and between decoded
/// samples; it never interrupts a sample mid-decode.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Creates a flag that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clears a previous cancellation request.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`OCRError::Cancelled`] if cancellation was requested
    /// before `stage` starts.
    pub fn check(&self, stage: ProcessingStage) -> OcrResult<()> {
        if self.is_cancelled() {
            Err(OCRError::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = CancellationFlag::new();
        let other = flag.clone();
        assert!(flag.check(ProcessingStage::Decode).is_ok());

        other.cancel();
        assert!(flag.is_cancelled());
        let err = flag.check(ProcessingStage::Decode).unwrap_err();
        assert!(err.is_cancelled());

        flag.reset();
        assert!(!other.is_cancelled());
    }
}
