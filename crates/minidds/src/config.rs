// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! minidds Global Configuration - Single Source of Truth
//!
//! This module centralizes the limits and defaults used by the directory and
//! its endpoints. **NEVER hardcode them elsewhere!**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (domain range, defaults, limits)
//! - **Level 2 (Dynamic)**: `RuntimeConfig`, one per `TopicDirectory`, seeded
//!   from the environment and adjustable at runtime
//!
//! # Example
//!
//! ```
//! use minidds::config::{RuntimeConfig, DEFAULT_HISTORY_DEPTH};
//!
//! let config = RuntimeConfig::new();
//! assert_eq!(config.default_history_depth(), DEFAULT_HISTORY_DEPTH);
//!
//! config.set_default_history_depth(32);
//! assert_eq!(config.default_history_depth(), 32);
//! ```

use arc_swap::ArcSwap;
use std::sync::Arc;

// =======================================================================
// Domains and topics
// =======================================================================

/// Maximum domain ID (DDS domain_id valid range: 0..=232)
pub const MAX_DOMAIN_ID: u32 = 232;

/// Domain used when none is given on the command line.
pub const DEFAULT_DOMAIN_ID: u32 = 0;

/// Topic used by the hello-world tool when none is given.
pub const DEFAULT_TOPIC_NAME: &str = "HelloWorld";

/// Maximum topic name length in bytes.
pub const MAX_TOPIC_NAME_LEN: usize = 256;

// =======================================================================
// Reader history
// =======================================================================

/// Default reader history depth (KEEP_LAST 10).
pub const DEFAULT_HISTORY_DEPTH: usize = 10;

/// Upper bound accepted for a reader history depth.
///
/// Keeps a misconfigured reader from pinning unbounded memory.
pub const MAX_HISTORY_DEPTH: usize = 1024;

// =======================================================================
// Samples
// =======================================================================

/// Maximum encoded sample size (64 KiB).
pub const MAX_SAMPLE_SIZE: usize = 65536;

/// Environment override for the default history depth.
pub const ENV_HISTORY_DEPTH: &str = "MINIDDS_HISTORY_DEPTH";

/// Environment override for the maximum encoded sample size.
pub const ENV_MAX_SAMPLE_SIZE: &str = "MINIDDS_MAX_SAMPLE_SIZE";

/// Snapshot of the tunable limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Depth used by `Participant::default_qos()`.
    pub default_history_depth: usize,
    /// Largest payload a writer accepts.
    pub max_sample_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default_history_depth: DEFAULT_HISTORY_DEPTH,
            max_sample_size: MAX_SAMPLE_SIZE,
        }
    }
}

/// Runtime configuration shared by a directory and its endpoints.
///
/// Reads are a single atomic load (`ArcSwap`), so the write path can consult
/// the limits on every sample.
#[derive(Clone)]
pub struct RuntimeConfig {
    limits: Arc<ArcSwap<Limits>>,
}

impl RuntimeConfig {
    /// Create a config with compile-time defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create a config from explicit limits.
    #[must_use]
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits: Arc::new(ArcSwap::from_pointee(limits)),
        }
    }

    /// Create a config from defaults overridden by `MINIDDS_*` environment
    /// variables. Unparsable or out-of-range values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut limits = Limits::default();

        if let Some(depth) = read_env_usize(ENV_HISTORY_DEPTH) {
            if (1..=MAX_HISTORY_DEPTH).contains(&depth) {
                limits.default_history_depth = depth;
            } else {
                log::warn!(
                    "[config] {}={} out of range 1..={}, keeping {}",
                    ENV_HISTORY_DEPTH,
                    depth,
                    MAX_HISTORY_DEPTH,
                    limits.default_history_depth
                );
            }
        }

        if let Some(size) = read_env_usize(ENV_MAX_SAMPLE_SIZE) {
            if size > 0 {
                limits.max_sample_size = size;
            } else {
                log::warn!("[config] {}=0 ignored", ENV_MAX_SAMPLE_SIZE);
            }
        }

        Self::with_limits(limits)
    }

    /// Current limits snapshot.
    #[inline]
    #[must_use]
    pub fn limits(&self) -> Limits {
        **self.limits.load()
    }

    #[inline]
    #[must_use]
    pub fn default_history_depth(&self) -> usize {
        self.limits.load().default_history_depth
    }

    #[inline]
    #[must_use]
    pub fn max_sample_size(&self) -> usize {
        self.limits.load().max_sample_size
    }

    /// Change the default history depth (clamped to `1..=MAX_HISTORY_DEPTH`).
    pub fn set_default_history_depth(&self, depth: usize) {
        let depth = depth.clamp(1, MAX_HISTORY_DEPTH);
        self.limits.rcu(|current| Limits {
            default_history_depth: depth,
            ..**current
        });
    }

    /// Change the maximum encoded sample size.
    pub fn set_max_sample_size(&self, size: usize) {
        self.limits.rcu(|current| Limits {
            max_sample_size: size.max(1),
            ..**current
        });
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("limits", &self.limits())
            .finish()
    }
}

fn read_env_usize(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[config] ignoring {}='{}': not an integer", key, raw);
            None
        }
    }
}
