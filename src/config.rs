//! Configuration management for the password server
//!
//! Built-in defaults, overridden by an optional `config.toml`, overridden by
//! `PASSWD_SRV_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::crypt::SaltSource;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    // ═══ SOCKET ═══
    /// Unix socket the server listens on
    pub socket_path: String,

    /// How long a client may take to send its request frame
    pub request_timeout_secs: u64,

    // ═══ HOST DATABASES ═══
    /// Shadow password database
    pub shadow_path: String,

    /// Lock file guarding the shadow database
    pub shadow_lock_path: String,

    /// How long to wait for the shadow lock
    pub lock_timeout_secs: u64,

    /// passwd database used to map uids to account names
    pub passwd_path: String,

    /// Login definitions holding ENCRYPT_METHOD
    pub login_defs_path: String,

    // ═══ AUTHORIZATION ═══
    /// Account allowed to act for any user
    pub admin_user: String,

    // ═══ ACCOUNT TOOLS ═══
    pub useradd_program: String,
    pub userdel_program: String,
    pub primary_group: String,
    pub supplementary_groups: String,
    pub login_shell: String,

    // ═══ HASHING ═══
    /// `seeded` (host crypt convention) or `os` (system CSPRNG)
    pub salt_source: SaltSource,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: "/var/run/passwd-srv/passwd-srv.sock".to_string(),
            request_timeout_secs: 10,
            shadow_path: "/etc/shadow".to_string(),
            shadow_lock_path: "/etc/shadow.lock".to_string(),
            lock_timeout_secs: 15,
            passwd_path: "/etc/passwd".to_string(),
            login_defs_path: "/etc/login.defs".to_string(),
            admin_user: "ops".to_string(),
            useradd_program: "/usr/sbin/useradd".to_string(),
            userdel_program: "/usr/sbin/userdel".to_string(),
            primary_group: "ops_netop".to_string(),
            supplementary_groups: "ovsdb-client".to_string(),
            login_shell: "/usr/bin/vtysh".to_string(),
            salt_source: SaltSource::Seeded,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&["/etc/passwd-srv/config", "config"])
    }

    /// Same as `load`, with explicit config file locations (first found wins)
    pub fn load_from(config_paths: &[&str]) -> Result<Self, ConfigError> {
        let defaults = ServiceConfig::default();
        let mut builder = Config::builder()
            .set_default("socket_path", defaults.socket_path)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("shadow_path", defaults.shadow_path)?
            .set_default("shadow_lock_path", defaults.shadow_lock_path)?
            .set_default("lock_timeout_secs", defaults.lock_timeout_secs as i64)?
            .set_default("passwd_path", defaults.passwd_path)?
            .set_default("login_defs_path", defaults.login_defs_path)?
            .set_default("admin_user", defaults.admin_user)?
            .set_default("useradd_program", defaults.useradd_program)?
            .set_default("userdel_program", defaults.userdel_program)?
            .set_default("primary_group", defaults.primary_group)?
            .set_default("supplementary_groups", defaults.supplementary_groups)?
            .set_default("login_shell", defaults.login_shell)?
            .set_default("salt_source", "seeded")?;

        if let Some(path) = config_paths
            .iter()
            .find(|p| PathBuf::from(format!("{}.toml", p)).exists())
        {
            builder = builder.add_source(File::with_name(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix("PASSWD_SRV"))
            .build()?;

        let config: ServiceConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("socket_path", &self.socket_path),
            ("shadow_path", &self.shadow_path),
            ("shadow_lock_path", &self.shadow_lock_path),
            ("passwd_path", &self.passwd_path),
            ("login_defs_path", &self.login_defs_path),
            ("useradd_program", &self.useradd_program),
            ("userdel_program", &self.userdel_program),
        ];
        for (name, value) in paths {
            if value.is_empty() {
                return Err(ConfigError::Message(format!("{} cannot be empty", name)));
            }
        }

        if self.admin_user.is_empty() {
            return Err(ConfigError::Message("admin_user cannot be empty".into()));
        }

        if self.lock_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "lock_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.shadow_lock_path == self.shadow_path {
            return Err(ConfigError::Message(
                "shadow_lock_path must differ from shadow_path".into(),
            ));
        }

        Ok(())
    }

    /// Get the lock wait as Duration
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    /// Get the request read limit as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn socket_path(&self) -> PathBuf {
        PathBuf::from(&self.socket_path)
    }
}
