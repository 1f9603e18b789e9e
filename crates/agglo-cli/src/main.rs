pub mod cli;
pub mod cmd;
pub mod error;
pub mod io;
pub mod session;

pub use cli::{Cli, Command, OutputFormat, QueueArg, StatArg};

use clap::Parser;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = dispatch(&cli);

    if let Err(e) = result {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}

/// Dispatches the parsed CLI arguments to the appropriate command handler.
fn dispatch(cli: &Cli) -> Result<(), error::CliError> {
    match &cli.command {
        Command::Init => cmd::init::run(),

        Command::Run {
            file,
            thresholds,
            find_fragments,
            stat,
            quantile,
            bins,
            max_vector_samples,
            queue,
            queue_bins,
            export_graph,
        } => cmd::run::run(cmd::run::RunArgs {
            file,
            thresholds,
            find_fragments: *find_fragments,
            stat: *stat,
            quantile: *quantile,
            bins: *bins,
            max_vector_samples: *max_vector_samples,
            queue: *queue,
            queue_bins: *queue_bins,
            export_graph: *export_graph,
            format: cli.format,
            verbose: cli.verbose,
            max_file_size: cli.max_file_size,
        }),

        Command::Serve => cmd::serve::run(),
    }
}
