use crate::core::{FitterConfig, OptimizerConfig, RigidTransform};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub cors: CorsSettings,
    #[serde(default)]
    pub fitting: FittingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSettings {
    /// GeoJSON file of bicycle-parking nodes, read on every request
    #[serde(default = "default_dataset_path")]
    pub path: String,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self { path: default_dataset_path() }
    }
}

fn default_dataset_path() -> String { "public/bavaria_bike_nodes.geojson".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins; `"*"` allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self { allowed_origins: default_allowed_origins() }
    }
}

impl CorsSettings {
    /// Only an explicit `"*"` entry opens the service; an empty list allows no origin
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

fn default_allowed_origins() -> Vec<String> { vec!["*".to_string()] }

#[derive(Debug, Clone, Deserialize)]
pub struct FittingSettings {
    #[serde(default = "default_num_points")]
    pub num_points: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_ftol")]
    pub ftol: f64,
    #[serde(default = "default_gtol")]
    pub gtol: f64,
    #[serde(default = "default_history")]
    pub history: usize,
    #[serde(default = "default_max_evaluations")]
    pub max_evaluations: usize,
    #[serde(default = "default_gradient_step")]
    pub gradient_step: f64,
    #[serde(default)]
    pub initial_guess: InitialGuessConfig,
}

impl Default for FittingSettings {
    fn default() -> Self {
        Self {
            num_points: default_num_points(),
            max_iterations: default_max_iterations(),
            ftol: default_ftol(),
            gtol: default_gtol(),
            history: default_history(),
            max_evaluations: default_max_evaluations(),
            gradient_step: default_gradient_step(),
            initial_guess: InitialGuessConfig::default(),
        }
    }
}

fn default_num_points() -> usize { 200 }
fn default_max_iterations() -> usize { 1000 }
fn default_ftol() -> f64 { 1e-12 }
fn default_gtol() -> f64 { 1e-12 }
fn default_history() -> usize { 10 }
fn default_max_evaluations() -> usize { 15_000 }
fn default_gradient_step() -> f64 { 1e-8 }

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InitialGuessConfig {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_rotation")]
    pub rotation: f64,
    #[serde(default = "default_offset")]
    pub tx: f64,
    #[serde(default = "default_offset")]
    pub ty: f64,
}

impl Default for InitialGuessConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            rotation: default_rotation(),
            tx: default_offset(),
            ty: default_offset(),
        }
    }
}

fn default_scale() -> f64 { 0.10 }
fn default_rotation() -> f64 { 0.01 }
fn default_offset() -> f64 { 2.5 }

impl FittingSettings {
    /// Fitter configuration described by these settings
    pub fn fitter_config(&self) -> FitterConfig {
        let guess = &self.initial_guess;
        FitterConfig {
            num_points: self.num_points,
            optimizer: OptimizerConfig {
                initial_guess: RigidTransform::new(guess.scale, guess.rotation, guess.tx, guess.ty),
                max_iterations: self.max_iterations,
                ftol: self.ftol,
                gtol: self.gtol,
                history: self.history,
                max_evaluations: self.max_evaluations,
                gradient_step: self.gradient_step,
                bounds: None,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with HEARTFIT)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., HEARTFIT__DATASET__PATH -> dataset.path
            .add_source(Self::environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()?;

        settings.try_deserialize()
    }

    fn environment() -> Environment {
        Environment::with_prefix("HEARTFIT")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("cors.allowed_origins")
            .try_parsing(true)
    }
}
