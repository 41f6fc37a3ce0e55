use std::path::PathBuf;

use clap::Parser;
use tracing::error;

use warehouse_export::commands::{handle_command, Commands};
use warehouse_export::{logging, ExportConfig};

#[derive(Parser)]
#[command(name = "warehouse-export")]
#[command(about = "Export UnusedDataOrder usage statistics from the warehouse to CSV")]
struct Cli {
    #[arg(short, long, help = "Path to a YAML file with query and output settings")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Directory for the CSV files (overrides output_dir)")]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init();

    let mut export = match cli.config {
        Some(path) => match ExportConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                std::process::exit(1);
            }
        },
        None => ExportConfig::default(),
    };

    if let Some(dir) = cli.output_dir {
        export.output_dir = dir;
    }

    if let Err(e) = handle_command(cli.command, &export).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use warehouse_export::commands::InvalidPolicy;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_usage_buckets_skip() {
        let cli = Cli::try_parse_from(["warehouse-export", "usage-buckets", "--on-invalid", "skip"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::UsageBuckets {
                on_invalid: InvalidPolicy::Skip
            }
        ));
    }

    #[test]
    fn test_usage_buckets_aborts_by_default() {
        let cli = Cli::try_parse_from(["warehouse-export", "usage-buckets"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::UsageBuckets {
                on_invalid: InvalidPolicy::Abort
            }
        ));
    }

    #[test]
    fn test_parse_top_rows_with_overrides() {
        let cli = Cli::try_parse_from([
            "warehouse-export",
            "--config",
            "export.yaml",
            "-o",
            "out",
            "top-rows",
            "--limit",
            "10",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::TopRows { limit: Some(10) }));
        assert_eq!(cli.config, Some(PathBuf::from("export.yaml")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["warehouse-export", "usage-buckets", "--on-invalid", "ignore"]).is_err());
    }
}
