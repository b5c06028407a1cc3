//! Run configuration.
//!
//! Everything is read from `RIGHTSIZER_*` environment variables; unset
//! variables keep the defaults of a plain run.

use crate::error::RightsizerError;
use crate::policy::{DEFAULT_MANAGED_BY_LABEL, DEFAULT_TARGET, DEFAULT_THRESHOLD, PolicyEngine, ReductionRule};
use crate::quantity::parse_cpu;
use crate::rollout::VerifySettings;
use std::env;
use std::time::Duration;

pub const THRESHOLD_VAR: &str = "RIGHTSIZER_THRESHOLD";
pub const TARGET_VAR: &str = "RIGHTSIZER_TARGET";
pub const REDUCTION_VAR: &str = "RIGHTSIZER_REDUCTION";
pub const MANAGED_BY_LABEL_VAR: &str = "RIGHTSIZER_MANAGED_BY_LABEL";
pub const GRACE_SECONDS_VAR: &str = "RIGHTSIZER_GRACE_SECONDS";
pub const VERIFY_ATTEMPTS_VAR: &str = "RIGHTSIZER_VERIFY_ATTEMPTS";
pub const CONFLICT_RETRIES_VAR: &str = "RIGHTSIZER_CONFLICT_RETRIES";
pub const ASSUME_YES_VAR: &str = "RIGHTSIZER_ASSUME_YES";

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub policy: PolicyEngine,
    pub verify: VerifySettings,
    /// Extra read-modify-write attempts after a conflicting update.
    pub conflict_retries: u32,
    /// Skip the confirmation prompt.
    pub assume_yes: bool,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, RightsizerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RightsizerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let threshold = match get(THRESHOLD_VAR) {
            Some(text) => parse_cpu(&text).map_err(|e| invalid(THRESHOLD_VAR, e))?,
            None => DEFAULT_THRESHOLD,
        };
        let target = match get(TARGET_VAR) {
            Some(text) => parse_cpu(&text).map_err(|e| invalid(TARGET_VAR, e))?,
            None => DEFAULT_TARGET,
        };
        let rule = match get(REDUCTION_VAR).as_deref() {
            None | Some("fixed") => ReductionRule::Fixed(target),
            Some("proportional") => ReductionRule::PROPORTIONAL_DEFAULT,
            Some(other) => {
                return Err(invalid(REDUCTION_VAR, format!("expected fixed or proportional, got {}", other)));
            }
        };
        let managed_by_label = get(MANAGED_BY_LABEL_VAR).unwrap_or_else(|| DEFAULT_MANAGED_BY_LABEL.to_string());

        let defaults = VerifySettings::default();
        let grace_period = match get(GRACE_SECONDS_VAR) {
            Some(text) => Duration::from_secs(parse_number(GRACE_SECONDS_VAR, &text)?),
            None => defaults.grace_period,
        };
        let attempts = match get(VERIFY_ATTEMPTS_VAR) {
            Some(text) => {
                let attempts = parse_number(VERIFY_ATTEMPTS_VAR, &text)?;
                if attempts == 0 {
                    return Err(invalid(VERIFY_ATTEMPTS_VAR, "must be at least 1"));
                }
                u32::try_from(attempts).map_err(|e| invalid(VERIFY_ATTEMPTS_VAR, e))?
            }
            None => defaults.attempts,
        };
        let conflict_retries = match get(CONFLICT_RETRIES_VAR) {
            Some(text) => u32::try_from(parse_number(CONFLICT_RETRIES_VAR, &text)?)
                .map_err(|e| invalid(CONFLICT_RETRIES_VAR, e))?,
            None => 0,
        };
        let assume_yes = match get(ASSUME_YES_VAR) {
            Some(text) => parse_bool(ASSUME_YES_VAR, &text)?,
            None => false,
        };

        Ok(Self {
            policy: PolicyEngine {
                threshold,
                rule,
                managed_by_label,
            },
            verify: VerifySettings {
                grace_period,
                attempts,
            },
            conflict_retries,
            assume_yes,
        })
    }
}

fn invalid(key: &str, reason: impl std::fmt::Display) -> RightsizerError {
    RightsizerError::InvalidConfig(format!("{}: {}", key, reason))
}

fn parse_number(key: &str, text: &str) -> Result<u64, RightsizerError> {
    text.parse::<u64>()
        .map_err(|e| invalid(key, format!("{:?} is not a non-negative integer ({})", text, e)))
}

fn parse_bool(key: &str, text: &str) -> Result<bool, RightsizerError> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(invalid(key, format!("{:?} is not a boolean", text))),
    }
}
