//! Cooperative cancellation and progress reporting.
//!
//! A [`Cookie`] is a small block of atomics behind an `Arc`. The thread that
//! drives a long-running operation (display list replay, document layout)
//! polls [`Cookie::is_aborted`] at command boundaries and bumps the progress
//! counter; any other thread holding a [`Cookie::share`]d handle may call
//! [`Cookie::abort`] or read progress at any time.
//!
//! ```rust
//! use folio_core::Cookie;
//!
//! let cookie = Cookie::new();
//! let remote = cookie.share();
//! cookie.set_progress_max(10);
//! for _ in 0..3 {
//!     cookie.inc_progress();
//! }
//! assert_eq!(remote.progress_percent(), 30);
//! remote.abort();
//! assert!(cookie.is_aborted());
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Sentinel stored in `progress_max` while no maximum is set.
const UNSET: u64 = u64::MAX;

#[derive(Debug)]
struct CookieState {
    abort: AtomicBool,
    progress: AtomicU64,
    progress_max: AtomicU64,
    errors: AtomicU64,
    incomplete: AtomicBool,
}

impl CookieState {
    fn seeded(snapshot: &CookieProgress) -> Self {
        Self {
            abort: AtomicBool::new(snapshot.aborted),
            progress: AtomicU64::new(snapshot.progress),
            progress_max: AtomicU64::new(snapshot.progress_max.unwrap_or(UNSET)),
            errors: AtomicU64::new(snapshot.errors),
            incomplete: AtomicBool::new(snapshot.incomplete),
        }
    }
}

/// Point-in-time view of a cookie's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CookieProgress {
    pub progress: u64,
    pub progress_max: Option<u64>,
    pub errors: u64,
    pub aborted: bool,
    pub incomplete: bool,
}

/// Shared cancellation/progress token.
///
/// `Clone` produces an *independent* cookie seeded with the current counters.
/// Use [`Cookie::share`] for a second handle onto the same token.
#[derive(Debug)]
pub struct Cookie {
    inner: Arc<CookieState>,
}

impl Default for Cookie {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Cookie {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::new(CookieState::seeded(&self.progress())),
        }
    }
}

impl Cookie {
    #[must_use = "creates a new Cookie"]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CookieState::seeded(&CookieProgress::default())),
        }
    }

    /// Another handle onto the same underlying token.
    #[must_use = "returns a shared handle"]
    pub fn share(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Whether both handles refer to the same token.
    #[must_use = "returns whether the cookies are shared"]
    pub fn same_token(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Clear every counter and flag so the cookie can drive a new operation.
    pub fn reset(&self) {
        let s = &self.inner;
        s.abort.store(false, Ordering::SeqCst);
        s.progress.store(0, Ordering::SeqCst);
        s.progress_max.store(UNSET, Ordering::SeqCst);
        s.errors.store(0, Ordering::SeqCst);
        s.incomplete.store(false, Ordering::SeqCst);
    }

    /// Request cancellation. Stays set until [`Cookie::reset`].
    pub fn abort(&self) {
        log::debug!("cookie abort requested");
        self.inner.abort.store(true, Ordering::SeqCst);
    }

    #[inline]
    #[must_use = "returns whether abort was requested"]
    pub fn is_aborted(&self) -> bool {
        self.inner.abort.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn inc_progress(&self) {
        self.inner.progress.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_progress(&self, value: u64) {
        self.inner.progress.store(value, Ordering::SeqCst);
    }

    #[inline]
    pub fn inc_errors(&self) {
        self.inner.errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_errors(&self, value: u64) {
        self.inner.errors.store(value, Ordering::SeqCst);
    }

    #[must_use = "returns whether errors were recorded"]
    pub fn has_errors(&self) -> bool {
        self.inner.errors.load(Ordering::SeqCst) > 0
    }

    pub fn set_progress_max(&self, max: u64) {
        // u64::MAX is the unset sentinel; one less is indistinguishable in practice.
        self.inner
            .progress_max
            .store(max.min(UNSET - 1), Ordering::SeqCst);
    }

    pub fn clear_progress_max(&self) {
        self.inner.progress_max.store(UNSET, Ordering::SeqCst);
    }

    /// Set the maximum only if none is set yet. Returns the effective maximum.
    pub fn init_progress_max(&self, max: u64) -> u64 {
        let max = max.min(UNSET - 1);
        match self.inner.progress_max.compare_exchange(
            UNSET,
            max,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => max,
            Err(current) => current,
        }
    }

    /// Mark that the operation stopped early for a recoverable reason other
    /// than cancellation.
    pub fn set_incomplete(&self, incomplete: bool) {
        self.inner.incomplete.store(incomplete, Ordering::SeqCst);
    }

    #[must_use = "returns the incomplete flag"]
    pub fn is_incomplete(&self) -> bool {
        self.inner.incomplete.load(Ordering::SeqCst)
    }

    /// All counters read together.
    #[must_use = "returns a progress snapshot"]
    pub fn progress(&self) -> CookieProgress {
        let s = &self.inner;
        let max = s.progress_max.load(Ordering::SeqCst);
        CookieProgress {
            progress: s.progress.load(Ordering::SeqCst),
            progress_max: (max != UNSET).then_some(max),
            errors: s.errors.load(Ordering::SeqCst),
            aborted: s.abort.load(Ordering::SeqCst),
            incomplete: s.incomplete.load(Ordering::SeqCst),
        }
    }

    /// Percentage complete in `0..=100`; `0` when no maximum is set or the
    /// maximum is zero.
    #[must_use = "returns the completion percentage"]
    pub fn progress_percent(&self) -> u32 {
        let snap = self.progress();
        match snap.progress_max {
            Some(max) if max > 0 => {
                let pct = u128::from(snap.progress) * 100 / u128::from(max);
                u32::try_from(pct.min(100)).unwrap_or(100)
            }
            _ => 0,
        }
    }

    /// Completion in `0.0..=1.0`; `0.0` when no maximum is set or it is zero.
    #[must_use = "returns the completion fraction"]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f32 {
        let snap = self.progress();
        match snap.progress_max {
            Some(max) if max > 0 => (snap.progress as f64 / max as f64).min(1.0) as f32,
            _ => 0.0,
        }
    }

    /// Steps left before completion, `None` without a maximum.
    #[must_use = "returns the remaining step count"]
    pub fn progress_remaining(&self) -> Option<u64> {
        let snap = self.progress();
        snap.progress_max
            .map(|max| max.saturating_sub(snap.progress))
    }

    /// Progress has reached a set maximum.
    #[must_use = "returns whether the operation is complete"]
    pub fn is_complete(&self) -> bool {
        let snap = self.progress();
        snap.progress_max.is_some_and(|max| snap.progress >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_three_of_ten() {
        let c = Cookie::new();
        c.set_progress_max(10);
        c.inc_progress();
        c.inc_progress();
        c.inc_progress();
        assert_eq!(c.progress_percent(), 30);
        assert!(!c.is_complete());
        assert_eq!(c.progress_remaining(), Some(7));
    }

    #[test]
    fn test_percent_without_max_is_zero() {
        let c = Cookie::new();
        c.inc_progress();
        assert_eq!(c.progress_percent(), 0);
        assert!(!c.is_complete());
        assert_eq!(c.progress_remaining(), None);
        c.set_progress_max(0);
        assert_eq!(c.progress_percent(), 0);
        assert!(c.is_complete());
    }

    #[test]
    fn test_percent_saturates() {
        let c = Cookie::new();
        c.set_progress_max(4);
        c.set_progress(9);
        assert_eq!(c.progress_percent(), 100);
        assert!((c.progress_fraction() - 1.0).abs() < f32::EPSILON);
        assert_eq!(c.progress_remaining(), Some(0));
    }

    #[test]
    fn test_abort_sticks_until_reset() {
        let c = Cookie::new();
        assert!(!c.is_aborted());
        c.abort();
        assert!(c.is_aborted());
        assert!(c.is_aborted());
        c.reset();
        assert!(!c.is_aborted());
        assert_eq!(c.progress(), CookieProgress::default());
    }

    #[test]
    fn test_share_sees_same_state() {
        let c = Cookie::new();
        let remote = c.share();
        assert!(c.same_token(&remote));
        remote.abort();
        assert!(c.is_aborted());
    }

    #[test]
    fn test_clone_is_independent() {
        let c = Cookie::new();
        c.set_progress_max(5);
        c.inc_progress();
        c.inc_errors();
        let copy = c.clone();
        assert!(!c.same_token(&copy));
        assert_eq!(copy.progress(), c.progress());
        copy.inc_progress();
        copy.abort();
        assert_eq!(c.progress().progress, 1);
        assert!(!c.is_aborted());
    }

    #[test]
    fn test_incomplete_is_distinct_from_not_complete() {
        let c = Cookie::new();
        c.set_progress_max(3);
        assert!(!c.is_complete());
        assert!(!c.is_incomplete());
        c.set_incomplete(true);
        assert!(c.is_incomplete());
    }

    #[test]
    fn test_errors() {
        let c = Cookie::new();
        assert!(!c.has_errors());
        c.inc_errors();
        assert!(c.has_errors());
        c.set_errors(0);
        assert!(!c.has_errors());
    }

    #[test]
    fn test_init_progress_max_keeps_existing() {
        let c = Cookie::new();
        assert_eq!(c.init_progress_max(8), 8);
        assert_eq!(c.init_progress_max(20), 8);
        c.clear_progress_max();
        assert_eq!(c.progress().progress_max, None);
    }

    #[test]
    fn test_abort_from_other_thread() {
        let c = Cookie::new();
        let remote = c.share();
        std::thread::spawn(move || remote.abort()).join().unwrap();
        assert!(c.is_aborted());
    }
}
