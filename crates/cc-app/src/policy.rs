//! Runtime policies derived from [`AppConfig`].
//!
//! The config DTO carries raw values; a zero means "not configured" and is
//! replaced by the default here.

use std::time::Duration;

use cc_core::{AppConfig, CredentialError, ValidationError};

pub const DEFAULT_RETRY_CEILING: u32 = 5;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(200);
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ENTRY_LEN: usize = 10_000;
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

/// Retry behaviour of the live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionPolicy {
    /// Consecutive failures tolerated before the view is flagged degraded.
    pub retry_ceiling: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for SubscriptionPolicy {
    fn default() -> Self {
        Self {
            retry_ceiling: DEFAULT_RETRY_CEILING,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
        }
    }
}

impl SubscriptionPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        let defaults = Self::default();
        let ms = |value: u64, fallback: Duration| {
            if value == 0 {
                fallback
            } else {
                Duration::from_millis(value)
            }
        };
        let backoff_base = ms(config.backoff_base_ms, defaults.backoff_base);
        Self {
            retry_ceiling: if config.retry_ceiling == 0 {
                defaults.retry_ceiling
            } else {
                config.retry_ceiling
            },
            backoff_base,
            backoff_max: ms(config.backoff_max_ms, defaults.backoff_max).max(backoff_base),
        }
    }

    /// Delay before retry number `attempt` (1-based): exponential, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(1u32 << exponent)
            .min(self.backoff_max)
    }

    pub fn is_degraded(&self, consecutive_failures: u32) -> bool {
        consecutive_failures > self.retry_ceiling
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPolicy {
    pub max_len: usize,
}

impl Default for EntryPolicy {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_ENTRY_LEN,
        }
    }
}

impl EntryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.max_entry_len {
            0 => Self::default(),
            max_len => Self { max_len },
        }
    }

    /// Whitespace-only text is empty; the stored text is never trimmed.
    pub fn check(&self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let len = text.chars().count();
        if len > self.max_len {
            return Err(ValidationError::TextTooLong {
                len,
                max: self.max_len,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_len: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_PASSWORD_LEN,
        }
    }
}

impl PasswordPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.min_password_len {
            0 => Self::default(),
            min_len => Self { min_len },
        }
    }

    pub fn check(&self, password: &str) -> Result<(), CredentialError> {
        if password.chars().count() < self.min_len {
            return Err(CredentialError::WeakPassword {
                min_len: self.min_len,
            });
        }
        Ok(())
    }
}
