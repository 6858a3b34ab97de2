//! Ray tracing statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the counters since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Rays passed to `trace`
    pub rays: u64,
    /// Traced rays that hit something
    pub hits: u64,
    /// Shadow rays passed to `is_occluded`
    pub shadow_rays: u64,
    /// Shadow rays that were blocked
    pub occluded: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rays ({} hits), {} shadow rays ({} occluded)",
            self.rays, self.hits, self.shadow_rays, self.occluded
        )
    }
}

/// Live counters, safe to bump from many tracing threads at once.
///
/// Each counter is exact. A snapshot taken while other threads trace may
/// combine counters read at slightly different moments.
#[derive(Debug, Default)]
pub(crate) struct Statistics {
    rays: AtomicU64,
    hits: AtomicU64,
    shadow_rays: AtomicU64,
    occluded: AtomicU64,
}

impl Statistics {
    pub fn record_ray(&self, hit: bool) {
        self.rays.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_shadow_ray(&self, occluded: bool) {
        self.shadow_rays.fetch_add(1, Ordering::Relaxed);
        if occluded {
            self.occluded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> Stats {
        Stats {
            rays: self.rays.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            shadow_rays: self.shadow_rays.load(Ordering::Relaxed),
            occluded: self.occluded.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.rays.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.shadow_rays.store(0, Ordering::Relaxed);
        self.occluded.store(0, Ordering::Relaxed);
    }
}
