//! Per-OS minute counts.
//!
//! This module contains the unit of measurement for the whole crate:
//! - [`RunnerOs`] - The three billable runner classes
//! - [`UsageByOs`] - Minutes keyed by runner class

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Runner OS
// ============================================================================

/// Runner OS class used by GitHub for billing minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunnerOs {
    /// Ubuntu (Linux) runners.
    Ubuntu,
    /// macOS runners.
    Macos,
    /// Windows runners.
    Windows,
}

impl RunnerOs {
    /// All runner classes, in report column order.
    pub const ALL: [RunnerOs; 3] = [RunnerOs::Ubuntu, RunnerOs::Macos, RunnerOs::Windows];

    /// Returns the key GitHub uses for this class in billing payloads.
    pub fn key(self) -> &'static str {
        match self {
            RunnerOs::Ubuntu => "UBUNTU",
            RunnerOs::Macos => "MACOS",
            RunnerOs::Windows => "WINDOWS",
        }
    }

    /// Parses a billing key. Unknown classes (larger runners and the like)
    /// return `None` and are left for the caller to skip.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "UBUNTU" => Some(RunnerOs::Ubuntu),
            "MACOS" => Some(RunnerOs::Macos),
            "WINDOWS" => Some(RunnerOs::Windows),
            _ => None,
        }
    }

    /// Returns the display name used in report headers.
    pub fn display_name(self) -> &'static str {
        match self {
            RunnerOs::Ubuntu => "Ubuntu",
            RunnerOs::Macos => "MacOS",
            RunnerOs::Windows => "Windows",
        }
    }
}

impl fmt::Display for RunnerOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// Usage By OS
// ============================================================================

/// Minutes consumed, one bucket per runner class.
///
/// The shape is fixed: there is no way to create a fourth bucket. Counts are
/// unsigned, so negative values must be rejected where raw data enters
/// (see [`UsageByOs::from_signed`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageByOs {
    /// Ubuntu minutes.
    #[serde(rename = "UBUNTU", default)]
    pub ubuntu: u64,
    /// macOS minutes.
    #[serde(rename = "MACOS", default)]
    pub macos: u64,
    /// Windows minutes.
    #[serde(rename = "WINDOWS", default)]
    pub windows: u64,
}

impl UsageByOs {
    /// Creates usage from explicit per-OS minutes.
    pub const fn new(ubuntu: u64, macos: u64, windows: u64) -> Self {
        Self {
            ubuntu,
            macos,
            windows,
        }
    }

    /// All buckets at zero.
    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Builds usage from signed counts.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if any count is negative. Negative
    /// minutes mean the upstream data is corrupt; they are never clamped.
    pub fn from_signed(ubuntu: i64, macos: i64, windows: i64) -> Result<Self, CoreError> {
        let convert = |os: RunnerOs, value: i64| {
            u64::try_from(value).map_err(|_| {
                CoreError::InvalidData(format!("negative minute count {value} for {os}"))
            })
        };
        Ok(Self {
            ubuntu: convert(RunnerOs::Ubuntu, ubuntu)?,
            macos: convert(RunnerOs::Macos, macos)?,
            windows: convert(RunnerOs::Windows, windows)?,
        })
    }

    /// Returns the minutes for one runner class.
    pub fn get(&self, os: RunnerOs) -> u64 {
        match os {
            RunnerOs::Ubuntu => self.ubuntu,
            RunnerOs::Macos => self.macos,
            RunnerOs::Windows => self.windows,
        }
    }

    /// Returns true if every bucket is zero.
    pub fn is_zero(&self) -> bool {
        self.ubuntu == 0 && self.macos == 0 && self.windows == 0
    }

    /// Key-wise addition that fails instead of wrapping.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if any bucket would overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, CoreError> {
        let add = |os: RunnerOs| {
            self.get(os).checked_add(other.get(os)).ok_or_else(|| {
                CoreError::InvalidData(format!("minute count overflow for {os}"))
            })
        };
        Ok(Self {
            ubuntu: add(RunnerOs::Ubuntu)?,
            macos: add(RunnerOs::Macos)?,
            windows: add(RunnerOs::Windows)?,
        })
    }

    /// Key-wise sum of many values, failing on overflow.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if any bucket would overflow.
    pub fn checked_sum<I>(values: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = Self>,
    {
        values.into_iter().try_fold(Self::zero(), Self::checked_add)
    }

    /// Applies `f` to every bucket.
    pub fn map(self, f: impl Fn(u64) -> u64) -> Self {
        Self::new(f(self.ubuntu), f(self.macos), f(self.windows))
    }
}

impl fmt::Display for UsageByOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UBUNTU: {}, MACOS: {}, WINDOWS: {}",
            self.ubuntu, self.macos, self.windows
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
