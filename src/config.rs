//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Which collaborator backs profiles, reviews and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process maps. Intended for local development and tests.
    Memory,
    /// A Supabase project (PostgREST + GoTrue).
    Supabase,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "supabase" => Ok(Self::Supabase),
            other => Err(format!("Unknown backend: {other}")),
        }
    }
}

/// Connection settings for the Supabase backend.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Service key sent as `apikey` and as the bearer for table access.
    pub service_key: SecretString,
    /// Per-request timeout. A timed out write is reported, never retried.
    pub request_timeout: Duration,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    pub backend: StoreBackend,
    /// Present when `backend` is `Supabase`.
    pub supabase: Option<SupabaseConfig>,
    /// Access token registered for the demo user in memory mode.
    pub dev_token: String,
    /// Capacity of the onboarding-completed broadcast channel.
    pub event_capacity: usize,
    /// Wizards untouched for this long are dropped by the idle sweep.
    pub wizard_idle: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            backend: StoreBackend::Memory,
            supabase: None,
            dev_token: "dev-token".to_string(),
            event_capacity: 64,
            wizard_idle: Duration::from_secs(60 * 60),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("SPOTLY_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "SPOTLY_PORT".to_string(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            None => defaults.port,
        };

        let backend = match lookup("SPOTLY_BACKEND") {
            Some(raw) => raw
                .parse::<StoreBackend>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "SPOTLY_BACKEND".to_string(),
                    message,
                })?,
            None => defaults.backend,
        };

        let wizard_idle = match lookup("SPOTLY_WIZARD_IDLE_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: "SPOTLY_WIZARD_IDLE_SECS".to_string(),
                    message: format!("'{raw}' is not a whole number of seconds"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "SPOTLY_WIZARD_IDLE_SECS".to_string(),
                        message: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.wizard_idle,
        };

        let supabase = match backend {
            StoreBackend::Memory => None,
            StoreBackend::Supabase => Some(supabase_config(&lookup)?),
        };

        Ok(Self {
            port,
            backend,
            supabase,
            dev_token: lookup("SPOTLY_DEV_TOKEN").unwrap_or(defaults.dev_token),
            event_capacity: defaults.event_capacity,
            wizard_idle,
        })
    }
}

fn supabase_config<F>(lookup: &F) -> Result<SupabaseConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let url = lookup("SUPABASE_URL").ok_or_else(|| ConfigError::MissingRequired {
        key: "SUPABASE_URL".to_string(),
        hint: "Set it to the project URL, e.g. https://<ref>.supabase.co".to_string(),
    })?;
    let service_key = lookup("SUPABASE_SERVICE_KEY").ok_or_else(|| ConfigError::MissingRequired {
        key: "SUPABASE_SERVICE_KEY".to_string(),
        hint: "Copy the service_role key from the project API settings".to_string(),
    })?;

    let timeout_secs: u64 = match lookup("SPOTLY_REQUEST_TIMEOUT_SECS") {
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            key: "SPOTLY_REQUEST_TIMEOUT_SECS".to_string(),
            message: format!("'{raw}' is not a whole number of seconds"),
        })?,
        None => 10,
    };
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: "SPOTLY_REQUEST_TIMEOUT_SECS".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    Ok(SupabaseConfig {
        url: url.trim_end_matches('/').to_string(),
        service_key: SecretString::from(service_key),
        request_timeout: Duration::from_secs(timeout_secs),
    })
}
