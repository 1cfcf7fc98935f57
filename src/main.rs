use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use review_themes::classify::{self, ClassifyOptions};
use review_themes::cli::{Cli, CliCommand};
use review_themes::completion::OpenAiClient;
use review_themes::config::{Config, load_env_files, resolve_api_key};
use review_themes::error::Result;
use review_themes::session::Session;
use review_themes::{flagging, reformulate};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_env_filter(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    load_env_files();
    let config = Config::load(cli)?;
    info!(?config, "config loaded");

    let api_key = resolve_api_key(&config.api_key_env)?;
    let client = OpenAiClient::new(&config.api_base, api_key, config.timeout);
    let session = Session::from_config(client, &config);
    info!(model = session.model(), "review-themes starting");

    match cli.command {
        CliCommand::Classify(ref args) => {
            let options = ClassifyOptions::resolve(args.strategy, &config, args.max_themes);
            let column = args.column.as_deref().unwrap_or(&config.column);
            classify::run(
                &session,
                Path::new(&args.input),
                args.sheet.as_deref(),
                column,
                Path::new(&args.output),
                &options,
            )?;
        }
        CliCommand::Flag(ref args) => {
            let column = args.column.as_deref().unwrap_or(&config.column);
            let threshold = args.threshold.unwrap_or(config.flag_threshold);
            flagging::run(
                &session,
                Path::new(&args.input),
                args.sheet.as_deref(),
                column,
                Path::new(&args.output),
                threshold,
            )?;
        }
        CliCommand::Reformulate(ref args) => {
            reformulate::run(
                &session,
                Path::new(&args.input),
                &args.sheet,
                Path::new(&args.guidelines),
                Path::new(&args.output),
            )?;
        }
    }

    Ok(())
}
