use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read template {path}: {source}")]
    TemplateIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template: {0}")]
    TemplateParse(#[from] serde_yaml::Error),

    #[error("invalid template: {0}")]
    Validation(String),

    #[error("invalid date token \"{0}\": expected YYYY-MM-DD, \"now\" or \"<N>_days_ago\"")]
    InvalidDateToken(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
