//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "timekeeper")]
#[command(about = "A speech timer server that signals green, orange and red thresholds")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// JSON file holding the saved presets
    #[arg(long, default_value = "presets.json")]
    pub presets: PathBuf,

    /// Interval between timer samples, in milliseconds
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(10..=1000))]
    pub tick_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["timekeeper"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.presets, PathBuf::from("presets.json"));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "timekeeper", "-p", "8080", "--host", "0.0.0.0", "--tick-ms", "250", "-v",
        ])
        .unwrap();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn rejects_out_of_range_tick() {
        assert!(Config::try_parse_from(["timekeeper", "--tick-ms", "0"]).is_err());
    }
}
