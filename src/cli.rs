//! Command line interface for the `warplink` agent binary.

use std::path::PathBuf;

use clap::Parser;

/// Command line arguments for the `warplink` binary.
#[derive(Debug, Parser)]
#[command(
    name = "warplink",
    version,
    about = "Keep an agent connected to its server over mutual TLS"
)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(
        short,
        long,
        env = "WARPLINK_CONFIG",
        default_value = "/etc/warplink/agent.toml"
    )]
    pub config: PathBuf,

    /// Validate the configuration and certificate material, then exit.
    #[arg(long)]
    pub check: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn parses_config_and_check() {
        let cli = Cli::parse_from(["warplink", "--config", "/tmp/agent.json", "--check"]);
        assert_eq!(cli.config.to_str(), Some("/tmp/agent.json"));
        assert!(cli.check);
    }
}
