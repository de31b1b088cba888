use clap::Parser;
use tracing_subscriber::EnvFilter;

use storefront_probe::cli::commands::{RunOptions, cmd_eval, cmd_rules, cmd_run};
use storefront_probe::cli::config::{Cli, Commands, load_config};

/// Map `-v` count to a filter; RUST_LOG wins when set.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            spec,
            format,
            output,
            trace,
            poll_timeout_ms,
        } => {
            let options = RunOptions::resolve(
                &config,
                &spec,
                format.as_deref(),
                output.as_deref(),
                trace.as_deref(),
                poll_timeout_ms,
            );
            if !cmd_run(&options, &config)? {
                std::process::exit(1);
            }
        }
        Commands::Eval { rule, text, file } => {
            if !cmd_eval(&rule, text.as_deref(), file.as_deref())? {
                std::process::exit(1);
            }
        }
        Commands::Rules => cmd_rules(),
    }

    Ok(())
}
