use anyhow::Result;
use audiosig::audio::WavAudioSource;
use audiosig::cli::{Cli, Commands, ConfigAction};
use audiosig::config::{Config, FingerprintConfig, OutputFormat};
use audiosig::fingerprint::ChromaprintBackend;
use audiosig::output::render;
use audiosig::{AudiosigError, ChunkResult, compute_fingerprints, fingerprint_source};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = audiosig::logging::init(cli.verbose, cli.quiet) {
        eprintln!("{}", format!("Warning: {}", e).yellow());
    }
    tracing::debug!("audiosig {}", audiosig::version_string());

    match &cli.command {
        None => {
            let config = cli.apply_overrides(load_config(cli.config.as_deref())?);
            config.fingerprint.validate()?;
            if cli.files.is_empty() {
                Cli::command().print_help()?;
                std::process::exit(2);
            }
            if !fingerprint_files(&cli.files, &config) {
                std::process::exit(1);
            }
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, &cli)?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "audiosig",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/audiosig/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        // Load from custom path
        Config::load(path)?
    } else {
        // Try default path, fall back to defaults
        match Config::default_path() {
            Some(default_path) => Config::load_or_default(&default_path)?,
            None => Config::default(),
        }
    };

    // Apply environment variable overrides
    Ok(config.with_env_overrides()?)
}

/// Fingerprint every input and print the results.
///
/// Returns true when every input produced at least one fingerprint.
fn fingerprint_files(files: &[String], config: &Config) -> bool {
    let mut all_ok = true;
    let mut printed_any = false;

    for name in files {
        let (chunks, error) = match fingerprint_one(name, &config.fingerprint) {
            Ok(chunks) => (chunks, None),
            Err(e) => (e.partial_results().to_vec(), Some(e)),
        };

        let text = render(
            name,
            &chunks,
            config.output.format,
            config.fingerprint.is_chunked(),
        );
        if !text.is_empty() {
            if printed_any && config.output.format == OutputFormat::Text {
                println!();
            }
            println!("{}", text);
            printed_any = true;
        }

        if let Some(e) = error {
            report_error(name, &e);
            all_ok = false;
        } else if !chunks.iter().any(ChunkResult::has_fingerprint) {
            report_error(name, &AudiosigError::EmptyFingerprint);
            all_ok = false;
        }
    }

    all_ok
}

fn fingerprint_one(name: &str, config: &FingerprintConfig) -> audiosig::Result<Vec<ChunkResult>> {
    if name == "-" {
        let source = WavAudioSource::from_stdin()?;
        fingerprint_source(source, ChromaprintBackend::new(), config)
    } else {
        compute_fingerprints(name, config)
    }
}

fn report_error(name: &str, error: &AudiosigError) {
    let message = format!("ERROR: {}: {}", name, error);
    if std::io::stderr().is_terminal() {
        if error.is_soft() {
            eprintln!("{}", message.yellow());
        } else {
            eprintln!("{}", message.red());
        }
    } else {
        eprintln!("{}", message);
    }
}

fn handle_config_command(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = cli.apply_overrides(load_config(cli.config.as_deref())?);
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => match cli.config.clone().or_else(Config::default_path) {
            Some(path) => println!("{}", path.display()),
            None => {
                eprintln!("{}", "No configuration directory on this platform".red());
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
