//! Configuration management for the prediction service

use crate::bounds::Bounds;
use crate::types::field::InputField;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub audit_log: AuditLogConfig,
    pub metrics: MetricsConfig,
    /// Selectable projects, in display order
    pub projects: Vec<ProjectConfig>,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Console logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Audit log for invalid inputs and unrealistic predictions
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditLogConfig {
    pub path: PathBuf,
}

/// Prediction metrics reporting
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Seconds between periodic summaries, 0 disables them
    pub report_interval_secs: u64,
}

/// One selectable prediction task
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub name: String,
    /// Serialized regressor (JSON)
    pub model_path: PathBuf,
    /// Ordered training feature names (JSON array)
    pub features_path: PathBuf,
    /// Plausibility range of the predicted value
    pub bounds: Bounds,
    /// Form widgets, in display order
    #[serde(default)]
    pub inputs: Vec<InputField>,
}

impl AppConfig {
    /// Load `config/config.toml` (optional) plus `PREDICTO__*` environment overrides
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/config").required(false))
            .add_source(
                Environment::with_prefix("PREDICTO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.projects.is_empty() {
            bail!("No projects configured");
        }

        let mut names = HashSet::new();
        for project in &self.projects {
            if !names.insert(project.name.as_str()) {
                bail!("Project '{}' is configured twice", project.name);
            }
            if project.bounds.min > project.bounds.max {
                bail!(
                    "Project '{}' has inverted bounds ({}, {})",
                    project.name,
                    project.bounds.min,
                    project.bounds.max
                );
            }
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            audit_log: AuditLogConfig::default(),
            metrics: MetricsConfig::default(),
            projects: default_projects(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs/input_errors.log"),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 300,
        }
    }
}

fn project(name: &str, stem: &str, bounds: Bounds, inputs: Vec<InputField>) -> ProjectConfig {
    ProjectConfig {
        name: name.to_string(),
        model_path: PathBuf::from(format!("models/{}_best_model.json", stem)),
        features_path: PathBuf::from(format!("models/{}_features.json", stem)),
        bounds,
        inputs,
    }
}

/// The three projects shipped with the application
pub fn default_projects() -> Vec<ProjectConfig> {
    vec![
        project(
            "Laptop Prices",
            "laptop",
            Bounds::new(100.0, 6920.0),
            vec![
                InputField::choice("Company", "Company", &["Dell", "HP", "Lenovo", "Apple"]),
                InputField::choice("TypeName", "Type", &["Ultrabook", "Gaming", "Notebook"]),
                InputField::integer("Ram", "RAM (GB)", 4, 128, 8, 1),
                InputField::integer("SSD", "SSD (GB)", 32, 4000, 512, 32),
                InputField::integer("HDD", "HDD (GB)", 0, 6000, 0, 500),
                InputField::number("Weight", "Weight (kg)", 0.5, 5.0, 1.5, 0.1),
                InputField::number("Inches", "Screen Size (inches)", 10.0, 18.0, 13.3, 0.1),
                InputField::choice("Touch", "Touchscreen", &["Yes", "No"]),
            ],
        ),
        project(
            "Mobile Prices",
            "mobile",
            Bounds::new(50.0, 2000.0),
            vec![
                InputField::choice(
                    "Brand",
                    "Brand",
                    &["Samsung", "Apple", "Xiaomi", "OnePlus", "Google"],
                ),
                InputField::integer("RAM", "RAM (GB)", 1, 24, 8, 1),
                InputField::integer("Storage", "Storage (GB)", 16, 1024, 128, 16),
                InputField::integer("Battery", "Battery (mAh)", 1000, 7000, 4500, 100),
                InputField::number("Screen", "Screen Size (inches)", 4.0, 7.5, 6.5, 0.1),
                InputField::integer("Camera", "Main Camera (MP)", 2, 200, 48, 1),
            ],
        ),
        project(
            "Crypto Prices",
            "crypto",
            Bounds::new(0.0, 100000.0),
            vec![
                InputField::choice("Symbol", "Coin", &["BTC", "ETH", "SOL", "ADA"]),
                InputField::number("Open", "Open (USD)", 0.0, 200000.0, 100.0, 0.01),
                InputField::number("High", "High (USD)", 0.0, 200000.0, 105.0, 0.01),
                InputField::number("Low", "Low (USD)", 0.0, 200000.0, 95.0, 0.01),
                InputField::number("Volume", "Volume (USD)", 0.0, 1.0e12, 1.0e6, 1000.0),
            ],
        ),
    ]
}
