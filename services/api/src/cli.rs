use crate::demo::{run_demo, DemoArgs};
use crate::infra::{run_import, ImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rotable_tracker::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Rotable Component Tracker",
    about = "Track rotable undercarriage components through QA, repair and service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Load a component register CSV export into the configured store
    Import(ImportArgs),
    /// Walk one component through a full workshop cycle in memory
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Import(args) => run_import(args),
        Command::Demo(args) => run_demo(args),
    }
}
