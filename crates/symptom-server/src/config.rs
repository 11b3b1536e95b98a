use std::path::{Path, PathBuf};

use symptom_engine::DataPaths;
use symptom_engine::overrides::OverrideTable;
use symptom_engine::rules::{DEFAULT_TOP_N, ScoringRules};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: String,
    pub overrides_path: Option<String>,
    pub top_n: usize,
    pub redis_url: Option<String>,
}

impl Config {
    /// Required:
    /// - `SYMPTOM_DATA_DIR` (directory holding Training.csv and the five reference tables)
    ///
    /// Optional:
    /// - `SYMPTOM_OVERRIDES_PATH` (JSON override rules; default: built-in rule table)
    /// - `SYMPTOM_TOP_N` (default: 5)
    /// - `REDIS_URL`
    pub fn from_env() -> Result<Self, AppError> {
        let data_dir = std::env::var("SYMPTOM_DATA_DIR").map_err(|_| {
            AppError::Config("SYMPTOM_DATA_DIR environment variable is required".to_string())
        })?;

        let top_n = match std::env::var("SYMPTOM_TOP_N") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("SYMPTOM_TOP_N must be a positive integer, got '{raw}'"))
                })?,
            Err(_) => DEFAULT_TOP_N,
        };

        let config = Self {
            data_dir,
            overrides_path: std::env::var("SYMPTOM_OVERRIDES_PATH").ok(),
            top_n,
            redis_url: std::env::var("REDIS_URL").ok(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        let paths = self.data_paths();
        let missing = paths.missing();
        if !missing.is_empty() {
            let list: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            return Err(AppError::Config(format!(
                "required data files not found: {}",
                list.join(", ")
            )));
        }
        if let Some(path) = &self.overrides_path {
            if !Path::new(path).exists() {
                return Err(AppError::Config(format!("override rules not found: {path}")));
            }
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).to_path_buf()
    }

    pub fn data_paths(&self) -> DataPaths {
        DataPaths::in_dir(&self.data_dir())
    }

    pub fn scoring_rules(&self) -> Result<ScoringRules, AppError> {
        let mut rules = ScoringRules::default().with_top_n(self.top_n);
        if let Some(path) = &self.overrides_path {
            rules = rules.with_overrides(OverrideTable::load(Path::new(path))?);
        }
        Ok(rules)
    }

    /// Distinguishes cache entries produced under different data or rules.
    pub fn cache_namespace(&self) -> String {
        format!(
            "{}|{}|{}",
            self.data_dir,
            self.overrides_path.as_deref().unwrap_or("builtin"),
            self.top_n
        )
    }
}
