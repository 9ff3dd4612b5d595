//! `caplog` - CLI for captainslog
//!
//! This binary watches the screenshot folder, shows the current location, and
//! inspects configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use captainslog::cli::{panel, Cli, Command, ConfigCommand, ProcessCommand, WatchCommand};
use captainslog::{init_logging, AnnotateOutcome, Config, Monitor, Pipeline, SidecarRecord};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("could not load configuration")?;

    if cli.command.needs_game_files() {
        config
            .check_paths()
            .context("game files are missing; check the [paths] configuration")?;
    }

    // Execute the command
    match cli.command {
        Command::Watch(cmd) => handle_watch(config, &cmd).await,
        Command::Status(cmd) => handle_status(&config, cmd.json).await,
        Command::Process(cmd) => handle_process(&config, &cmd).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn handle_watch(mut config: Config, cmd: &WatchCommand) -> Result<()> {
    if cmd.skip_latest {
        config.monitor.process_latest_on_start = false;
    }
    let process_images = config.monitor.process_images && !cmd.no_images;

    println!(
        "Watching {} (stop with Ctrl+C)",
        config.screenshots_dir().display()
    );
    let mut monitor = Monitor::from_config(&config, process_images);
    monitor.run().await.context("monitor stopped unexpectedly")?;
    println!("Stopped watching.");
    Ok(())
}

async fn handle_status(config: &Config, json: bool) -> Result<()> {
    let snapshot = Pipeline::from_config(config, false)
        .locate()
        .await
        .context("could not determine the current location")?;

    if json {
        let record = SidecarRecord::new(&snapshot, chrono::Local::now());
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", panel::render(&snapshot, panel::DEFAULT_WIDTH));
    }
    Ok(())
}

async fn handle_process(config: &Config, cmd: &ProcessCommand) -> Result<()> {
    if !cmd.screenshot.is_file() {
        bail!("screenshot not found: {}", cmd.screenshot.display());
    }

    let process_images = config.monitor.process_images && !cmd.no_image;
    let report = Pipeline::from_config(config, process_images)
        .process(&cmd.screenshot)
        .await
        .with_context(|| format!("could not process {}", cmd.screenshot.display()))?;

    println!("Sidecar: {}", report.sidecar.path().display());
    match &report.image {
        Some(AnnotateOutcome::Written(path) | AnnotateOutcome::AlreadyExists(path)) => {
            println!("Image:   {}", path.display());
        }
        Some(AnnotateOutcome::Failed) => bail!("annotation failed; see the log for details"),
        None => {}
    }
    if !report.produced_output() {
        info!("Nothing new to write");
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Paths]");
                println!("  Screenshots:        {}", config.screenshots_dir().display());
                println!("  Journals:           {}", config.journal_dir().display());
                println!("  Status file:        {}", config.status_file().display());
                println!("  Extension:          {}", config.screenshot_extension());
                println!();
                println!("[Monitor]");
                println!("  Poll interval:      {:?}", config.poll_interval());
                println!("  Freshness window:   {:?}", config.freshness_window());
                println!(
                    "  Latest on start:    {}",
                    config.monitor.process_latest_on_start
                );
                println!("  Process images:     {}", config.monitor.process_images);
                println!("  Beep:               {}", config.monitor.beep);
                println!();
                println!("[Image]");
                println!("  Scale divisor:      {}", config.image.scale_divisor);
                println!("  Resample:           {:?}", config.image.resample);
                println!("  Format:             {}", config.image.format.extension());
                println!("  Delete source:      {}", config.image.delete_source);
                println!();
                println!("[Overlay]");
                println!("  Draw text:          {}", config.overlay.draw_text);
                println!("  Position:           {:?}", config.overlay.position);
                println!("  Font size:          {}", config.overlay.font_size);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
