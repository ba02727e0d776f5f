use clap::Parser;
use log::*;

use castoff::{Result, cli, command, error::Error};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("castoff")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .map_err(|e| Error::Config(format!("failed to initialize logger: {e}")))?;

    Ok(())
}

async fn run(args: &cli::Args) -> Result<()> {
    match &args.command {
        cli::Command::Init => command::init::execute(args),
        cli::Command::Release(release_args) => {
            command::release::execute(args, release_args).await
        }
    }
}

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    if let Err(err) = initialize_logger(args.debug) {
        eprintln!("{err}");
        std::process::exit(1);
    }

    if let Err(err) = run(&args).await {
        error!("{err}");
        for hint in err.hints() {
            info!("hint: {hint}");
        }
        std::process::exit(1);
    }
}
