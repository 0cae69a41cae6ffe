// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! QoS policies.
//!
//! Only reader history is configurable: every reader keeps the last N
//! samples and drops the oldest unread one on overflow. Delivery is always
//! best-effort to the readers matched at publish time.

use crate::config::{DEFAULT_HISTORY_DEPTH, MAX_HISTORY_DEPTH};
use crate::dds::{Error, Result};

/// History policy
///
/// Determines how many samples a reader keeps in its queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum History {
    /// Keep last N samples (bounded queue, drops oldest)
    KeepLast(u32),
}

impl Default for History {
    fn default() -> Self {
        Self::KeepLast(DEFAULT_HISTORY_DEPTH as u32)
    }
}

/// Endpoint QoS.
///
/// Validated at writer/reader creation (fail-fast on invalid config).
///
/// # Examples
///
/// ```
/// use minidds::{History, QoS};
///
/// let qos = QoS::default();
/// assert_eq!(qos.history, History::KeepLast(10));
///
/// assert!(QoS::keep_last(0).validate().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct QoS {
    /// History policy
    pub history: History,
}

impl QoS {
    /// Keep the last `depth` samples.
    pub fn keep_last(depth: u32) -> Self {
        Self {
            history: History::KeepLast(depth),
        }
    }

    /// Queue capacity implied by the history policy.
    pub fn depth(&self) -> usize {
        match self.history {
            History::KeepLast(n) => n as usize,
        }
    }

    /// Validate QoS configuration
    ///
    /// - History::KeepLast(n) where 0 < n <= MAX_HISTORY_DEPTH
    pub fn validate(&self) -> Result<()> {
        match self.history {
            History::KeepLast(0) => Err(Error::InvalidQos(
                "History::KeepLast(n) requires n > 0".to_string(),
            )),
            History::KeepLast(n) if n as usize > MAX_HISTORY_DEPTH => Err(Error::InvalidQos(
                format!("History::KeepLast({}) exceeds {}", n, MAX_HISTORY_DEPTH),
            )),
            History::KeepLast(_) => Ok(()),
        }
    }
}
