//! Configuration loading and typed config structures for the Enroll server.
//!
//! The configuration lives in `enroll-config.yaml` in the working directory
//! (or wherever `ENROLL_CONFIG` points). Every field has a default, so a
//! missing default file simply yields the built-in activity catalog on
//! `0.0.0.0:8000`.
//!
//! Environment variables override file values after parsing:
//! - `HOST` overrides `server.host`
//! - `PORT` overrides `server.port`

use std::path::Path;

use enroll_types::{ActivitySpec, ParticipantId};
use serde::Deserialize;
use validator::ValidateEmail;

use crate::server::ServerConfig;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "enroll-config.yaml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "ENROLL_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A seed participant is not an email address while
    /// `service.require_email_shape` is set.
    #[error("seed participant {participant:?} for {activity} is not a valid email address")]
    InvalidParticipant {
        /// The activity.
        activity: String,
        /// The rejected identifier.
        participant: String,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for environment variable {key}: {reason}")]
    InvalidEnv {
        /// The variable name.
        key: String,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Request-handling settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// The fixed activity catalog, in display order.
    #[serde(default = "default_activities")]
    pub activities: Vec<ActivitySpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            service: ServiceConfig::default(),
            activities: default_activities(),
        }
    }
}

impl AppConfig {
    /// Load configuration the way the binary does.
    ///
    /// Reads the file named by `ENROLL_CONFIG` if set, otherwise
    /// [`DEFAULT_CONFIG_PATH`] if it exists, otherwise starts from
    /// defaults. Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly named file is missing, the
    /// file is not valid YAML, a seed participant is not an email address,
    /// or an override is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::read(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::read(Path::new(DEFAULT_CONFIG_PATH))?
            }
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if an override is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidParticipant`] if a seed participant fails the
    /// email check.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate_seeds()?;
        Ok(config)
    }

    /// Hold seed participants to the same email rule as requests.
    ///
    /// Blank and untrimmed identifiers are rejected by the store itself.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParticipant`] for the first seed
    /// participant that is not an email address, when
    /// `service.require_email_shape` is set.
    pub fn validate_seeds(&self) -> Result<(), ConfigError> {
        if !self.service.require_email_shape {
            return Ok(());
        }
        for spec in &self.activities {
            if let Some(bad) = spec
                .participants
                .iter()
                .find(|participant| !participant.as_str().validate_email())
            {
                return Err(ConfigError::InvalidParticipant {
                    activity: spec.name.clone(),
                    participant: bad.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Apply `HOST` and `PORT` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `PORT` is not a valid port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `PORT` is not a valid port.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    key: String::from("PORT"),
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }
}

/// Request-handling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Reject participant identifiers that are not email-shaped.
    #[serde(default = "default_require_email_shape")]
    pub require_email_shape: bool,

    /// Capacity of the roster event broadcast channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            require_email_shape: default_require_email_shape(),
            event_buffer: default_event_buffer(),
        }
    }
}

const fn default_require_email_shape() -> bool {
    true
}

const fn default_event_buffer() -> usize {
    256
}

/// The built-in Mergington High School activity catalog.
pub fn default_activities() -> Vec<ActivitySpec> {
    [
        (
            "Chess Club",
            "Learn strategies and compete in chess tournaments",
            "Fridays, 3:30 PM - 5:00 PM",
            12,
            ["michael@mergington.edu", "daniel@mergington.edu"],
        ),
        (
            "Programming Class",
            "Learn programming fundamentals and build software projects",
            "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
            20,
            ["emma@mergington.edu", "sophia@mergington.edu"],
        ),
        (
            "Gym Class",
            "Physical education and sports activities",
            "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
            30,
            ["john@mergington.edu", "olivia@mergington.edu"],
        ),
        (
            "Soccer Team",
            "Join the school soccer team and compete in matches",
            "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
            22,
            ["liam@mergington.edu", "noah@mergington.edu"],
        ),
        (
            "Basketball Team",
            "Practice and play basketball with the school team",
            "Wednesdays and Fridays, 3:30 PM - 5:00 PM",
            15,
            ["ava@mergington.edu", "mia@mergington.edu"],
        ),
        (
            "Art Club",
            "Explore your creativity through painting and drawing",
            "Thursdays, 3:30 PM - 5:00 PM",
            15,
            ["amelia@mergington.edu", "harper@mergington.edu"],
        ),
        (
            "Drama Club",
            "Act, direct, and produce plays and performances",
            "Mondays and Wednesdays, 4:00 PM - 5:30 PM",
            20,
            ["ella@mergington.edu", "scarlett@mergington.edu"],
        ),
        (
            "Math Club",
            "Solve challenging problems and participate in math competitions",
            "Tuesdays, 3:30 PM - 4:30 PM",
            10,
            ["james@mergington.edu", "benjamin@mergington.edu"],
        ),
        (
            "Debate Team",
            "Develop public speaking and argumentation skills",
            "Fridays, 4:00 PM - 5:30 PM",
            12,
            ["charlotte@mergington.edu", "henry@mergington.edu"],
        ),
    ]
    .into_iter()
    .map(
        |(name, description, schedule, max_participants, participants)| ActivitySpec {
            name: name.to_owned(),
            description: description.to_owned(),
            schedule: schedule.to_owned(),
            max_participants,
            participants: participants.into_iter().map(ParticipantId::from).collect(),
        },
    )
    .collect()
}
