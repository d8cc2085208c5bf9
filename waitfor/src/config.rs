//! Configuration types for the waitfor crate
//!
//! [`WaitForOptions`] controls how long a poller keeps checking its resolver,
//! how often it checks, and whether giving up is reported as an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaitForError};

/// Polling interval used when none is configured.
pub const DEFAULT_FREQUENCY: Duration = Duration::from_millis(10);

/// Timeout used by [`WaitForOptions::default`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Options that dictate how a poller behaves
///
/// Serialises with integer millisecond fields, so a JSON document such as
/// `{ "timeout": 1000, "silent": true, "frequency": 50 }` maps directly onto
/// it. Only `timeout` is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForOptions {
    /// How long to keep checking before giving up
    /// Default: 1000 ms
    #[serde(with = "millis")]
    pub timeout: Duration,

    /// Stop quietly at the timeout instead of reporting an error
    /// Default: false
    #[serde(default)]
    pub silent: bool,

    /// How often to re-check the resolver after the first check fails
    /// Default: 10 ms
    #[serde(with = "millis", default = "default_frequency")]
    pub frequency: Duration,
}

fn default_frequency() -> Duration {
    DEFAULT_FREQUENCY
}

impl Default for WaitForOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            silent: false,
            frequency: DEFAULT_FREQUENCY,
        }
    }
}

impl WaitForOptions {
    /// Create options with the given timeout and default values for everything else
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    /// Options for slow conditions: 30 second timeout, checked every 100 ms
    pub fn patient() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            frequency: Duration::from_millis(100),
            ..Default::default()
        }
    }

    /// Options for conditions expected almost immediately: 200 ms timeout, checked every 1 ms
    pub fn eager() -> Self {
        Self {
            timeout: Duration::from_millis(200),
            frequency: Duration::from_millis(1),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_frequency(mut self, frequency: Duration) -> Self {
        self.frequency = frequency;
        self
    }

    /// Normalise and validate the options
    ///
    /// A zero frequency falls back to [`DEFAULT_FREQUENCY`]. A zero timeout
    /// is rejected.
    pub fn normalized(self) -> Result<Self> {
        let options = Self {
            frequency: if self.frequency.is_zero() {
                DEFAULT_FREQUENCY
            } else {
                self.frequency
            },
            ..self
        };
        options.validate()?;
        Ok(options)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(WaitForError::Configuration(
                "timeout must be greater than 0".to_string(),
            ));
        }

        if self.frequency.is_zero() {
            return Err(WaitForError::Configuration(
                "frequency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Serde helpers for durations stored as integer milliseconds
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
