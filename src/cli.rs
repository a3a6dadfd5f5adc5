use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "promptline")]
#[command(version, about = "Chat with a text-generation endpoint from the terminal")]
pub struct Cli {
    /// Base URL of the generation service (the client posts to <URL>/generate)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Maximum generation length sent with each prompt
    #[arg(long)]
    pub max_length: Option<u32>,

    /// Sampling temperature between 0 and 1
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Path to the config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the effective settings back to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Command-line flags take precedence over config file values
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(max_length) = self.max_length {
            config.max_length = max_length;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "promptline",
            "--base-url",
            "http://10.0.0.5:8000",
            "--temperature",
            "0.2",
        ])
        .unwrap();
        let mut config = Config::new();

        cli.apply_to(&mut config);

        assert_eq!(config.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_length, 1000);
    }

    #[test]
    fn test_no_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["promptline"]).unwrap();
        let mut config = Config {
            max_length: 42,
            ..Config::new()
        };

        cli.apply_to(&mut config);

        assert_eq!(config.max_length, 42);
        assert!(!cli.save_config);
        assert!(cli.config.is_none());
    }
}
