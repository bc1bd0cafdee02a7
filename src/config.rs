//! Agent configuration.
//!
//! Settings are read from a TOML, YAML or JSON file (chosen by extension) and
//! may be overridden by `WARPLINK_*` environment variables, e.g.
//! `WARPLINK_SERVER_ADDRESS=collector.example.net:7443`.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    client::DEFAULT_QUEUE_CAPACITY,
    codec::{DEFAULT_MAX_FRAME_LENGTH, LENGTH_HEADER_SIZE},
    dial::DEFAULT_DIAL_TIMEOUT,
    tls::ClientTlsFiles,
};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "WARPLINK";

/// Where log output goes.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogDestination {
    /// Standard output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
    /// The local syslog daemon.
    Syslog,
}

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),
    /// The file extension is not one of `toml`, `yaml`, `yml`, `json`.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),
    /// The file could not be parsed into settings.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// A value is present but unusable.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending setting.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

fn default_retry_interval_secs() -> u64 { 5 }

fn default_read_timeout_secs() -> u64 { 120 }

fn default_dial_timeout_secs() -> u64 { DEFAULT_DIAL_TIMEOUT.as_secs() }

fn default_queue_capacity() -> usize { DEFAULT_QUEUE_CAPACITY }

fn default_max_frame_length() -> usize { DEFAULT_MAX_FRAME_LENGTH }

/// Complete agent settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Identity stamped into every outbound message.
    pub host: String,
    /// `host:port` of the server.
    pub server_address: String,
    /// PEM client certificate chain.
    pub cert_path: PathBuf,
    /// PEM private key for the client certificate.
    pub private_key_path: PathBuf,
    /// PEM CA bundle used to verify the server.
    pub ca_cert_path: PathBuf,
    /// Log output destination.
    #[serde(default)]
    pub log_destination: LogDestination,
    /// Delay between failed dial attempts.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    /// Inactivity deadline applied to each read.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Bound on TCP connect plus TLS handshake.
    #[serde(default = "default_dial_timeout_secs")]
    pub dial_timeout_secs: u64,
    /// Capacity of each of the inbound and outbound queues.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Largest frame accepted or sent, header included.
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
}

impl Settings {
    /// Load settings from `path`, applying environment overrides.
    ///
    /// The result is not validated; call [`Settings::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, has an unknown
    /// extension, or does not deserialize.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml" | "yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let loaded = Config::builder()
            .add_source(File::from(path).format(format))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(loaded.try_deserialize()?)
    }

    /// Check that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.host.trim().is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        let Some((server, port)) = self.server_address.rsplit_once(':') else {
            return Err(invalid("server_address", "expected host:port"));
        };
        if server.is_empty() {
            return Err(invalid("server_address", "missing host"));
        }
        if !matches!(port.parse::<u16>(), Ok(port) if port != 0) {
            return Err(invalid("server_address", format!("bad port {port:?}")));
        }
        for (field, path) in [
            ("cert_path", &self.cert_path),
            ("private_key_path", &self.private_key_path),
            ("ca_cert_path", &self.ca_cert_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }
        if self.retry_interval_secs == 0 {
            return Err(invalid("retry_interval_secs", "must be at least 1"));
        }
        if self.read_timeout_secs == 0 {
            return Err(invalid("read_timeout_secs", "must be at least 1"));
        }
        if self.dial_timeout_secs == 0 {
            return Err(invalid("dial_timeout_secs", "must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity", "must be at least 1"));
        }
        if self.max_frame_length <= LENGTH_HEADER_SIZE {
            return Err(invalid(
                "max_frame_length",
                format!("must exceed the {LENGTH_HEADER_SIZE}-byte header"),
            ));
        }
        Ok(())
    }

    /// Delay between failed dial attempts.
    #[must_use]
    pub fn retry_interval(&self) -> Duration { Duration::from_secs(self.retry_interval_secs) }

    /// Inactivity deadline applied to each read.
    #[must_use]
    pub fn read_timeout(&self) -> Duration { Duration::from_secs(self.read_timeout_secs) }

    /// Bound on each dial attempt.
    #[must_use]
    pub fn dial_timeout(&self) -> Duration { Duration::from_secs(self.dial_timeout_secs) }

    /// Certificate material locations.
    #[must_use]
    pub fn tls_files(&self) -> ClientTlsFiles {
        ClientTlsFiles {
            cert: self.cert_path.clone(),
            private_key: self.private_key_path.clone(),
            ca_cert: self.ca_cert_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn settings() -> Settings {
        Settings {
            host: "agent-1".into(),
            server_address: "collector.example.net:7443".into(),
            cert_path: "/etc/warplink/client.pem".into(),
            private_key_path: "/etc/warplink/client.key".into(),
            ca_cert_path: "/etc/warplink/ca.pem".into(),
            log_destination: LogDestination::Stderr,
            retry_interval_secs: 5,
            read_timeout_secs: 120,
            dial_timeout_secs: 30,
            queue_capacity: 100,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }

    #[rstest]
    fn accepts_complete_settings(settings: Settings) {
        settings.validate().expect("settings are valid");
        assert_eq!(settings.retry_interval(), Duration::from_secs(5));
        assert_eq!(settings.read_timeout(), Duration::from_secs(120));
        assert_eq!(settings.dial_timeout(), Duration::from_secs(30));
    }

    #[rstest]
    #[case::empty_host(|s: &mut Settings| s.host = "  ".into(), "host")]
    #[case::no_port(|s: &mut Settings| s.server_address = "collector".into(), "server_address")]
    #[case::zero_port(|s: &mut Settings| s.server_address = "collector:0".into(), "server_address")]
    #[case::no_server(|s: &mut Settings| s.server_address = ":7443".into(), "server_address")]
    #[case::no_cert(|s: &mut Settings| s.cert_path = PathBuf::new(), "cert_path")]
    #[case::zero_retry(|s: &mut Settings| s.retry_interval_secs = 0, "retry_interval_secs")]
    #[case::zero_dial(|s: &mut Settings| s.dial_timeout_secs = 0, "dial_timeout_secs")]
    #[case::zero_queue(|s: &mut Settings| s.queue_capacity = 0, "queue_capacity")]
    #[case::tiny_frames(|s: &mut Settings| s.max_frame_length = 4, "max_frame_length")]
    fn rejects_unusable_values(
        mut settings: Settings,
        #[case] mutate: fn(&mut Settings),
        #[case] expected_field: &str,
    ) {
        mutate(&mut settings);
        match settings.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid {expected_field}, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Settings::from_file("/nonexistent/agent.toml").expect_err("missing file");
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
