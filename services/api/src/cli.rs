use crate::demo::{run_demo, run_replay, DemoArgs, ReplayArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use survey_tally::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Survey Tally",
    about = "Serve weighted surveys or drive concurrent submissions from the command line",
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
    /// Seed the sample survey and fire concurrent submissions from a worker pool
    Demo(DemoArgs),
    /// Seed the sample survey and replay submissions from a CSV export
    Replay(ReplayArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Replay(args) => run_replay(args),
    }
}
