//! Command-line interface definitions for the dashboard proxy.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All arguments can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for the dashboard proxy.
///
/// # Examples
///
/// ```sh
/// # Built-in sources, listening on 0.0.0.0:3000
/// FIRMS_MAP_KEY=abc123 dashboard_proxy
///
/// # Custom sources and bind address
/// dashboard_proxy -b 127.0.0.1:8080 -c ./sources.yaml --firms-key abc123
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address the HTTP server listens on
    #[arg(short, long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Optional path to a YAML file describing upstream sources
    #[arg(short, long, env = "DASHBOARD_PROXY_CONFIG")]
    pub config: Option<String>,

    /// NASA FIRMS map key used for fire hotspot requests
    #[arg(long, env = "FIRMS_MAP_KEY", hide_env_values = true)]
    pub firms_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "dashboard_proxy",
            "--bind",
            "127.0.0.1:8080",
            "--config",
            "./sources.yaml",
            "--firms-key",
            "abc123",
        ]);

        assert_eq!(cli.bind, "127.0.0.1:8080");
        assert_eq!(cli.config.as_deref(), Some("./sources.yaml"));
        assert_eq!(cli.firms_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["dashboard_proxy", "-b", "[::1]:3000", "-c", "/tmp/s.yaml"]);

        assert_eq!(cli.bind, "[::1]:3000");
        assert_eq!(cli.config.as_deref(), Some("/tmp/s.yaml"));
    }
}
