use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::packer::PackerConfig;

/// Complete application configuration, loaded from environment variables or
/// default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub packer: PackerEnvConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment
    /// variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            packer: PackerEnvConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("PACK_MY_VAN_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse PACK_MY_VAN_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    Self::DEFAULT_HOST
                        .parse::<IpAddr>()
                        .expect("Default host must be valid"),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("PACK_MY_VAN_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    eprintln!(
                        "⚠️ PACK_MY_VAN_API_PORT must not be 0. Using {}.",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    eprintln!(
                        "⚠️ Could not parse PACK_MY_VAN_API_PORT ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for the packing computation.
#[derive(Clone, Debug)]
pub struct PackerEnvConfig {
    packing: PackerConfig,
}

impl PackerEnvConfig {
    const SPACE_EPSILON_VAR: &'static str = "PACK_MY_VAN_PACKER_SPACE_EPSILON";
    const GRAVITY_STEP_VAR: &'static str = "PACK_MY_VAN_PACKER_GRAVITY_STEP";
    const CYLINDER_CLEARANCE_VAR: &'static str = "PACK_MY_VAN_PACKER_CYLINDER_CLEARANCE";
    const SPHERE_CLEARANCE_VAR: &'static str = "PACK_MY_VAN_PACKER_SPHERE_CLEARANCE";
    const RESOLVE_MARGIN_VAR: &'static str = "PACK_MY_VAN_PACKER_RESOLVE_MARGIN";
    const SEPARATION_MARGIN_VAR: &'static str = "PACK_MY_VAN_PACKER_SEPARATION_MARGIN";
    const CORRECTION_ROUNDS_VAR: &'static str = "PACK_MY_VAN_PACKER_CORRECTION_ROUNDS";

    fn from_env() -> Self {
        let space_epsilon = load_f64_with_warning(
            Self::SPACE_EPSILON_VAR,
            PackerConfig::DEFAULT_SPACE_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted space tolerance may cause numerical instabilities",
        );

        let gravity_step = load_f64_with_warning(
            Self::GRAVITY_STEP_VAR,
            PackerConfig::DEFAULT_GRAVITY_STEP,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted gravity step trades settling precision for speed",
        );

        let cylinder_clearance = load_f64_with_warning(
            Self::CYLINDER_CLEARANCE_VAR,
            PackerConfig::DEFAULT_CYLINDER_CLEARANCE,
            |value| value >= 0.0,
            "must not be negative",
            "Warning: Adjusted cylinder clearance may let rounded shapes touch visually",
        );

        let sphere_clearance = load_f64_with_warning(
            Self::SPHERE_CLEARANCE_VAR,
            PackerConfig::DEFAULT_SPHERE_CLEARANCE,
            |value| value >= 0.0,
            "must not be negative",
            "Warning: Adjusted sphere clearance may let rounded shapes touch visually",
        );

        let resolve_margin = load_f64_with_warning(
            Self::RESOLVE_MARGIN_VAR,
            PackerConfig::DEFAULT_RESOLVE_MARGIN,
            |value| value >= 0.0,
            "must not be negative",
            "Warning: Adjusted resolve margin may cause the correction pass to oscillate",
        );

        let separation_margin = load_f64_with_warning(
            Self::SEPARATION_MARGIN_VAR,
            PackerConfig::DEFAULT_SEPARATION_MARGIN,
            |value| value >= 0.0,
            "must not be negative",
            "Warning: Adjusted separation margin may leave corrected items closer together",
        );

        let max_correction_rounds = load_usize_with_warning(
            Self::CORRECTION_ROUNDS_VAR,
            PackerConfig::DEFAULT_MAX_CORRECTION_ROUNDS,
            |value| value > 0,
            "must be greater than 0",
        );

        let packing = PackerConfig::builder()
            .space_epsilon(space_epsilon)
            .gravity_step(gravity_step)
            .cylinder_clearance(cylinder_clearance)
            .sphere_clearance(sphere_clearance)
            .resolve_margin(resolve_margin)
            .separation_margin(separation_margin)
            .max_correction_rounds(max_correction_rounds)
            .build();

        Self { packing }
    }

    /// Returns the configured PackerConfig.
    pub fn packer_config(&self) -> PackerConfig {
        self.packing
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !validator(value) {
                    eprintln!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        println!("⚠️ {} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

fn load_usize_with_warning(
    var_name: &str,
    default: usize,
    validator: impl Fn(usize) -> bool,
    invalid_hint: &str,
) -> usize {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<usize>() {
            Ok(value) => {
                if !validator(value) {
                    eprintln!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    value
                }
            }
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}
