use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use crate::model::Container;
use crate::packaging::{ACCESSORY_BOX_DIMS, PackagingConfig, PackagingPolicy};
use crate::placement::PlacementConfig;
use crate::types::Vec3;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub catalog: CatalogConfig,
    pub packaging: PackagingEnvConfig,
    pub placement: PlacementEnvConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            catalog: CatalogConfig::from_env(),
            packaging: PackagingEnvConfig::from_env(),
            placement: PlacementEnvConfig::from_env(),
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
    const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("CUBAGE_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    "⚠️ Could not parse CUBAGE_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (Self::DEFAULT_BIND_IP, Self::DEFAULT_HOST.to_string())
            }
        };

        let port = match env_string("CUBAGE_API_PORT") {
            Some(raw) => parse_port(&raw).unwrap_or(Self::DEFAULT_PORT),
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
}

/// Location of the product catalog file.
#[derive(Clone, Debug)]
pub struct CatalogConfig {
    path: PathBuf,
}

impl CatalogConfig {
    const DEFAULT_PATH: &'static str = "catalog.json";

    fn from_env() -> Self {
        Self {
            path: env_string("CUBAGE_CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_PATH)),
        }
    }

    /// Path of the JSON catalog loaded at startup.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Packaging policy and surrogate box shape.
#[derive(Clone, Debug)]
pub struct PackagingEnvConfig {
    packaging: PackagingConfig,
}

impl PackagingEnvConfig {
    const POLICY_VAR: &'static str = "CUBAGE_PACKAGING_POLICY";
    const BOX_LENGTH_VAR: &'static str = "CUBAGE_ACCESSORY_BOX_LENGTH";
    const BOX_WIDTH_VAR: &'static str = "CUBAGE_ACCESSORY_BOX_WIDTH";
    const BOX_HEIGHT_VAR: &'static str = "CUBAGE_ACCESSORY_BOX_HEIGHT";

    fn from_env() -> Self {
        let policy = env_string(Self::POLICY_VAR)
            .and_then(|raw| parse_policy(&raw, Self::POLICY_VAR))
            .unwrap_or_default();

        let accessory_box = Vec3::new(
            load_f64_with_warning(
                Self::BOX_LENGTH_VAR,
                ACCESSORY_BOX_DIMS.x,
                is_positive_finite,
                "must be a positive number",
                "Accessory box length changed, packaging counts will differ",
            ),
            load_f64_with_warning(
                Self::BOX_WIDTH_VAR,
                ACCESSORY_BOX_DIMS.y,
                is_positive_finite,
                "must be a positive number",
                "Accessory box width changed, packaging counts will differ",
            ),
            load_f64_with_warning(
                Self::BOX_HEIGHT_VAR,
                ACCESSORY_BOX_DIMS.z,
                is_positive_finite,
                "must be a positive number",
                "Accessory box height changed, packaging counts will differ",
            ),
        );

        Self {
            packaging: PackagingConfig {
                policy,
                accessory_box,
            },
        }
    }

    /// Returns the configured PackagingConfig.
    pub fn packaging_config(&self) -> PackagingConfig {
        self.packaging
    }
}

/// Default container and placement heuristic settings.
#[derive(Clone, Debug)]
pub struct PlacementEnvConfig {
    container: Container,
    placement: PlacementConfig,
}

impl PlacementEnvConfig {
    /// Internal size and payload of a 20 ft ISO container.
    pub const DEFAULT_CONTAINER: Container = Container {
        dims: Vec3::new(5.898, 2.352, 2.393),
        max_weight: 28_200.0,
    };

    const LENGTH_VAR: &'static str = "CUBAGE_CONTAINER_LENGTH";
    const WIDTH_VAR: &'static str = "CUBAGE_CONTAINER_WIDTH";
    const HEIGHT_VAR: &'static str = "CUBAGE_CONTAINER_HEIGHT";
    const MAX_WEIGHT_VAR: &'static str = "CUBAGE_CONTAINER_MAX_WEIGHT";
    const EPSILON_VAR: &'static str = "CUBAGE_PLACEMENT_EPSILON";
    const ALLOW_ROTATION_VAR: &'static str = "CUBAGE_PLACEMENT_ALLOW_ROTATIONS";
    const DISTRIBUTE_VAR: &'static str = "CUBAGE_PLACEMENT_DISTRIBUTE";

    fn from_env() -> Self {
        let defaults = Self::DEFAULT_CONTAINER;
        let dims = Vec3::new(
            load_f64_with_warning(
                Self::LENGTH_VAR,
                defaults.dims.x,
                is_positive_finite,
                "must be a positive number",
                "Using a non-standard container length",
            ),
            load_f64_with_warning(
                Self::WIDTH_VAR,
                defaults.dims.y,
                is_positive_finite,
                "must be a positive number",
                "Using a non-standard container width",
            ),
            load_f64_with_warning(
                Self::HEIGHT_VAR,
                defaults.dims.z,
                is_positive_finite,
                "must be a positive number",
                "Using a non-standard container height",
            ),
        );
        let max_weight = load_f64_with_warning(
            Self::MAX_WEIGHT_VAR,
            defaults.max_weight,
            |value| value >= 0.0 && value.is_finite(),
            "must be a non-negative number",
            "Using a non-standard container payload",
        );
        let container = Container::new(dims, max_weight).unwrap_or(defaults);

        let epsilon = load_f64_with_warning(
            Self::EPSILON_VAR,
            PlacementConfig::DEFAULT_EPSILON,
            is_valid_epsilon,
            "must be greater than 0 and at most 1e-6",
            "Adjusted tolerances may cause numerical instabilities",
        );

        let allow_item_rotation = env_string(Self::ALLOW_ROTATION_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ALLOW_ROTATION_VAR))
            .unwrap_or(PlacementConfig::DEFAULT_ALLOW_ITEM_ROTATION);

        let distribute = env_string(Self::DISTRIBUTE_VAR)
            .and_then(|raw| parse_bool(&raw, Self::DISTRIBUTE_VAR))
            .unwrap_or(PlacementConfig::DEFAULT_DISTRIBUTE);

        let placement = PlacementConfig::builder()
            .epsilon(epsilon)
            .allow_item_rotation(allow_item_rotation)
            .distribute(distribute)
            .build();

        Self {
            container,
            placement,
        }
    }

    /// Container used when a request does not name one.
    pub fn default_container(&self) -> Container {
        self.container
    }

    /// Returns the configured PlacementConfig.
    pub fn placement_config(&self) -> PlacementConfig {
        self.placement
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
            tracing::warn!("⚠️ Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn is_positive_finite(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

fn is_valid_epsilon(value: f64) -> bool {
    value > 0.0 && value <= PlacementConfig::MAX_EPSILON
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) => {
            tracing::warn!(
                "⚠️ CUBAGE_API_PORT must not be 0. Using {}.",
                ApiConfig::DEFAULT_PORT
            );
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                "⚠️ Could not parse CUBAGE_API_PORT ('{}'): {}. Using {}.",
                raw,
                err,
                ApiConfig::DEFAULT_PORT
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            tracing::warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name,
                other
            );
            None
        }
    }
}

fn parse_policy(raw: &str, var_name: &str) -> Option<PackagingPolicy> {
    match raw.parse::<PackagingPolicy>() {
        Ok(policy) => Some(policy),
        Err(err) => {
            tracing::warn!("⚠️ {} ignored: {}. Using default value.", var_name, err);
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
                    tracing::warn!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name,
                        raw,
                        invalid_hint,
                        default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        tracing::info!("⚠️ {} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                tracing::warn!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name,
                    raw,
                    err,
                    default
                );
                default
            }
        },
        None => default,
    }
}
