use clap::Parser;
use screen_tagging::cli::commands::{cmd_rules, cmd_tag, cmd_text};
use screen_tagging::cli::config::{Cli, Commands, build_source_settings, load_config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());

    // Resolve vision settings: CLI > config > defaults
    let settings = build_source_settings(
        &config,
        cli.vision_endpoint.as_deref(),
        cli.vision_model.as_deref(),
    );

    match cli.command {
        Commands::Tag {
            images,
            source,
            format,
            output,
            trace_file,
        } => {
            let source = source.unwrap_or_else(|| config.tag.source.clone());
            let format = format.unwrap_or_else(|| config.tag.format.clone());
            let trace_file = trace_file.or_else(|| config.tag.trace_file.clone());

            let report = cmd_tag(
                &images,
                &source,
                &format,
                output.as_deref(),
                trace_file.as_deref(),
                &settings,
                cli.verbose,
            )?;

            if let Some(path) = output {
                eprintln!(
                    "Wrote {} rows ({} skipped images) to {}",
                    report.events.len(),
                    report.skipped.len(),
                    path
                );
            }
        }
        Commands::Text { file } => {
            cmd_text(file.as_deref())?;
        }
        Commands::Rules => cmd_rules(),
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise -v raises the level from warn.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
