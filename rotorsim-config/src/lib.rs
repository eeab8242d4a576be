//! # Rotorsim Configuration System
//!
//! Layered configuration for the equipment simulator.
//!
//! ## Features
//! - **Profiles**: every deployment starts from a named preset
//! - **Validation**: signal parameters are checked before the engine sees them
//! - **Environment Awareness**: per-environment YAML and `ROTORSIM_*` overrides

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod simulator;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use simulator::{Profile, SimulatorConfig};
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/rotorsim.yaml";
const ENV_PREFIX: &str = "ROTORSIM_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct RotorsimConfig {
    /// Signal model, tick rate and seed.
    #[validate(nested)]
    pub simulator: SimulatorConfig,

    /// Logging settings.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl RotorsimConfig {
    /// Defaults for `profile`, without touching files or the environment.
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            simulator: SimulatorConfig::for_profile(profile),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Profile defaults (`profile` argument, else `simulator.profile` from
    ///    the layers below, else baseline)
    /// 2. `config/rotorsim.yaml`
    /// 3. `config/<ROTORSIM_ENV>.yaml`
    /// 4. `ROTORSIM_*` environment variables, `__` separating nested keys
    pub fn load(profile: Option<Profile>) -> Result<Self, ConfigError> {
        let mut overlays = Figment::new().merge(Yaml::file(BASE_FILE));

        if let Ok(env) = std::env::var("ROTORSIM_ENV") {
            overlays = overlays.merge(Yaml::file(format!("config/{}.yaml", env)));
        }

        Self::resolve(overlays.merge(env_provider()), profile)
    }

    /// Load configuration from a specific file, still honouring `ROTORSIM_*`
    /// environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(
        path: P,
        profile: Option<Profile>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let overlays = Figment::new().merge(Yaml::file(path)).merge(env_provider());
        Self::resolve(overlays, profile)
    }

    fn resolve(overlays: Figment, profile: Option<Profile>) -> Result<Self, ConfigError> {
        let profile = match profile {
            Some(profile) => profile,
            None => match overlays.extract_inner::<Profile>("simulator.profile") {
                Ok(profile) => profile,
                Err(e) if e.missing() => Profile::default(),
                Err(e) => return Err(e.into()),
            },
        };

        let config: Self = Figment::from(Serialized::defaults(Self::for_profile(profile)))
            .merge(overlays)
            .merge(Serialized::default("simulator.profile", profile))
            .extract()?;
        config.validate()?;
        Ok(config)
    }
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).ignore(&["env"]).split("__")
}
