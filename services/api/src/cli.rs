use crate::report::{print_factors, run_diagnose, run_recommend, DiagnoseArgs, RecommendArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use district_match::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "District Match",
    about = "Recommend Seoul districts from a lifestyle survey, over HTTP or the command line",
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
    /// Rank districts for a set of survey answers
    Recommend(RecommendArgs),
    /// List the factors that weigh most against one or every district
    Diagnose(DiagnoseArgs),
    /// Print the survey questions in answer order
    Factors,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured influence table path
    #[arg(long)]
    pub(crate) influence_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Recommend(args) => run_recommend(args),
        Command::Diagnose(args) => run_diagnose(args),
        Command::Factors => {
            print_factors();
            Ok(())
        }
    }
}
