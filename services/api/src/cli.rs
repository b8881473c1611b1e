use crate::demo::{run_dashboard, run_demo, run_export, DashboardArgs, DemoArgs, ExportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dormhub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "DormHub",
    about = "Run and demonstrate the DormHub property-management service",
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
    /// Print dashboard statistics for the seeded dataset or a snapshot file
    Dashboard(DashboardArgs),
    /// Walk through tenant placement and payment flows against the seed data
    Demo(DemoArgs),
    /// Print the seeded dataset as a storage-schema JSON snapshot
    Export(ExportArgs),
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
        Command::Dashboard(args) => run_dashboard(args),
        Command::Demo(args) => run_demo(args),
        Command::Export(args) => run_export(args),
    }
}
