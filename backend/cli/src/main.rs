mod config_cmd;
mod recognize_cmd;
mod serve_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ocrgate")]
#[command(about = "ocrgate: loopback text recognition service")]
#[command(version)]
struct Cli {
    /// Config file (default: $OCRGATE_CONFIG_DIR/config.yaml or ~/.ocrgate/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the recognition service until Ctrl-C
    Serve {
        /// Port to bind on the loopback interface
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one image to a running service and print the payload
    Recognize {
        /// Image file on this machine
        path: PathBuf,
        /// Output shape: 1 text, 2 centers, 3 detailed
        #[arg(short = 't', long = "type", default_value_t = 1)]
        mode: i64,
        /// Port of the running service
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration and its validation report
    Config {
        /// Write the effective configuration to the config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| ocrgate_config::config_file_path(&ocrgate_config::config_dir()));

    match cli.command {
        Commands::Serve { port } => serve_cmd::run(&config_path, port).await,
        Commands::Recognize { path, mode, port } => {
            recognize_cmd::run(&config_path, &path, mode, port).await
        }
        Commands::Config { init } => config_cmd::run(&config_path, init).await,
    }
}
