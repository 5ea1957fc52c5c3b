use super::types::*;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Job '{0}' not found")]
    JobNotFound(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate the configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.storage.bucket.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.bucket must not be empty".to_string(),
        ));
    }

    if config.global.schedule.split_whitespace().count() != 5 {
        return Err(ConfigError::ValidationError(format!(
            "invalid cron schedule format (expected 5 fields): {}",
            config.global.schedule
        )));
    }

    if config.log_sets.is_empty() && config.jobs.is_empty() {
        return Err(ConfigError::ValidationError(
            "No log sets or jobs defined".to_string(),
        ));
    }

    for (name, set) in &config.log_sets {
        validate_log_set(name, set)?;
    }

    for (name, job) in &config.jobs {
        validate_job(name, job)?;
    }

    Ok(())
}

fn validate_log_set(name: &str, set: &LogSetConfig) -> Result<()> {
    if set.subdirs.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "Log set '{}': no subdirs listed",
            name
        )));
    }

    if set.prefix.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "Log set '{}': prefix must not be empty",
            name
        )));
    }

    Ok(())
}

fn validate_job(name: &str, job: &JobConfig) -> Result<()> {
    if job.prefix().trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "Job '{}': prefix must not be empty",
            name
        )));
    }

    match job {
        JobConfig::Directory(dir) => {
            if dir.source.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Job '{}': source must not be empty",
                    name
                )));
            }
        }
        JobConfig::Mongodb(mongo) => {
            match (&mongo.password, &mongo.password_file) {
                (Some(_), Some(_)) => {
                    return Err(ConfigError::ValidationError(format!(
                        "Job '{}': set either password or password_file, not both",
                        name
                    )));
                }
                (None, None) => {
                    return Err(ConfigError::ValidationError(format!(
                        "Job '{}': password or password_file is required",
                        name
                    )));
                }
                (None, Some(file)) => {
                    if !super::expand_tilde(file).exists() {
                        return Err(ConfigError::ValidationError(format!(
                            "Job '{}': password file does not exist: {:?}",
                            name, file
                        )));
                    }
                }
                (Some(_), None) => {}
            }

            if mongo.username.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Job '{}': username must not be empty",
                    name
                )));
            }
        }
    }

    Ok(())
}

/// Look up a job by name
pub fn find_job<'a>(config: &'a Config, name: &str) -> Result<&'a JobConfig> {
    config
        .jobs
        .get(name)
        .ok_or_else(|| ConfigError::JobNotFound(name.to_string()))
}
