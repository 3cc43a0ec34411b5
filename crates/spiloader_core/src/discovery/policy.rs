//! Discovery strictness and duplicate handling policies.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// What to do when a manifest line or provider construction fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the whole discovery call.
    #[default]
    FailFast,
    /// Log the failure and continue with the next entry.
    Skip,
}

/// How repeated provider lines inside one manifest are treated.
///
/// Applied per manifest only; repeats across roots always yield repeated
/// instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Every line counts.
    #[default]
    Preserve,
    /// Adjacent identical lines collapse into one.
    CollapseConsecutive,
    /// Only the first occurrence of each id counts.
    UniquePerRoot,
}

/// Policy bundle for one discovery engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryPolicy {
    pub on_malformed: ErrorPolicy,
    pub on_instantiation_error: ErrorPolicy,
    pub duplicates: DuplicatePolicy,
}

impl ErrorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailFast => "fail_fast",
            Self::Skip => "skip",
        }
    }
}

impl DuplicatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::CollapseConsecutive => "collapse_consecutive",
            Self::UniquePerRoot => "unique_per_root",
        }
    }
}

impl Display for ErrorPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for DuplicatePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(Self::FailFast),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unsupported error policy `{other}`; expected fail_fast|skip"
            )),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "preserve" => Ok(Self::Preserve),
            "collapse_consecutive" => Ok(Self::CollapseConsecutive),
            "unique_per_root" => Ok(Self::UniquePerRoot),
            other => Err(format!(
                "unsupported duplicate policy `{other}`; expected preserve|collapse_consecutive|unique_per_root"
            )),
        }
    }
}
