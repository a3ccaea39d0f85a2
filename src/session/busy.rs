//! Advisory busy flags.
//!
//! The loading overlay and the disabled verify button are both a shared
//! boolean that the presentation layer can watch while a collaborator call is
//! pending. Holding the flag goes through [`BusyFlag::hold`], whose guard
//! clears it on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::FlowError;

#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raise the flag. Fails with [`FlowError::Busy`] if it is already held.
    pub fn hold(&self) -> Result<BusyGuard, FlowError> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FlowError::Busy)?;
        Ok(BusyGuard(self.0.clone()))
    }
}

/// Clears its flag when dropped.
#[derive(Debug)]
#[must_use = "the flag is released as soon as the guard is dropped"]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
