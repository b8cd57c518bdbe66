use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser, Debug)]
#[clap(
    name = "tnotes",
    version,
    about = "Personal notes identified by timestamps"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long = "conf", value_parser)]
    pub config: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the tnotes application
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_options() {
        let cli = Cli::parse_from(["tnotes", "-c", "/tmp/c.yml", "list", "-w", "-v", "20201117"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yml")));
        assert!(!cli.verbose);
        assert_eq!(
            cli.command,
            Commands::List {
                week: true,
                verbose: true,
                json: false,
                args: vec!["20201117".to_string()],
            }
        );
    }

    #[test]
    fn test_statistics_flags_conflict() {
        assert!(Cli::try_parse_from(["tnotes", "statistics", "-y", "-m"]).is_err());
        let cli = Cli::try_parse_from(["tnotes", "--verbose", "statistics", "-m"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Commands::Statistics {
                yearly: false,
                monthly: true
            }
        );
    }

    #[test]
    fn test_import_requires_files() {
        assert!(Cli::try_parse_from(["tnotes", "import"]).is_err());
    }
}
