use signsos_model::{ClassSet, ModelError};
use std::env;
use std::path::PathBuf;

const DEFAULT_MODEL_PATH: &str = "models/hand_sign_model.onnx";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub metrics_port: Option<u16>,
    pub model_path: PathBuf,
    pub classes: ClassSet,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = var("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?;

        let metrics_port = var("METRICS_PORT")
            .map(|p| p.parse::<u16>())
            .transpose()
            .map_err(|_| ConfigError::InvalidValue("METRICS_PORT".to_string()))?;

        let classes = match var("CLASSES") {
            Some(list) => ClassSet::parse_list(&list).map_err(ConfigError::Classes)?,
            None => ClassSet::default(),
        };

        Ok(Config {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            metrics_port,
            model_path: var("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            classes,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
    Classes(ModelError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(var) => write!(f, "Invalid value for: {}", var),
            ConfigError::Classes(err) => write!(f, "Invalid CLASSES: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}
