//! Deployment configuration.
//!
//! Loaded from a JSON file when one is given, otherwise from the
//! environment (`PROJECT_NAME`, `ENVIRONMENT`, `SECRET_HOOKS_DIR`). Missing
//! fields take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HookError, Result};
use crate::policy::{PolicyConfig, SecretTypePolicy};
use crate::rotation::RotationOptions;
use crate::triggers::TriggerContext;

pub const ENV_PROJECT_NAME: &str = "PROJECT_NAME";
pub const ENV_ENVIRONMENT: &str = "ENVIRONMENT";
pub const ENV_STORE_DIR: &str = "SECRET_HOOKS_DIR";

/// Directory under `$HOME` used when no store directory is configured.
pub const DEFAULT_STORE_DIR_NAME: &str = ".secret-hooks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub project_name: String,
    pub environment: String,
    pub store_dir: Option<PathBuf>,
    pub product_name: String,
    pub support_email: String,
    pub reject_unknown_shapes: bool,
    pub policy: PolicyConfig,
}

impl Default for HooksConfig {
    fn default() -> Self {
        let ctx = TriggerContext::default();
        Self {
            project_name: ctx.project_name,
            environment: ctx.environment,
            store_dir: None,
            product_name: ctx.product_name,
            support_email: ctx.support_email,
            reject_unknown_shapes: false,
            policy: PolicyConfig::default(),
        }
    }
}

impl HooksConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(name) = lookup(ENV_PROJECT_NAME).filter(|v| !v.is_empty()) {
            config.project_name = name;
        }
        if let Some(env) = lookup(ENV_ENVIRONMENT).filter(|v| !v.is_empty()) {
            config.environment = env;
        }
        if let Some(dir) = lookup(ENV_STORE_DIR).filter(|v| !v.is_empty()) {
            config.store_dir = Some(PathBuf::from(dir));
        }
        config
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| HookError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    /// File config if a path is given, environment otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_name.trim().is_empty() {
            return Err(HookError::InvalidConfig("project_name must not be empty".into()));
        }
        SecretTypePolicy::new(self.policy.clone())?;
        Ok(())
    }

    /// Configured store directory, or `~/.secret-hooks`.
    pub fn store_dir(&self) -> PathBuf {
        if let Some(dir) = &self.store_dir {
            return dir.clone();
        }
        let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        home.join(DEFAULT_STORE_DIR_NAME)
    }

    pub fn trigger_context(&self) -> TriggerContext {
        TriggerContext {
            project_name: self.project_name.clone(),
            environment: self.environment.clone(),
            product_name: self.product_name.clone(),
            support_email: self.support_email.clone(),
        }
    }

    pub fn policy(&self) -> Result<SecretTypePolicy> {
        SecretTypePolicy::new(self.policy.clone())
    }

    pub fn rotation_options(&self) -> RotationOptions {
        RotationOptions {
            reject_unknown_shapes: self.reject_unknown_shapes,
        }
    }
}
