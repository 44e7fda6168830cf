use pa_rust::StatsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("statistics fault: {0}")]
    Stats(#[from] StatsError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scenario parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid scenario: {0}")]
    Config(String),
}
