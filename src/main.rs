#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod config;
mod data_provider;
mod error;
mod file_data_provider;
mod frame;
mod generator;
mod history;
mod pose_file;
mod rays;
mod sample;
mod telemetry;
mod ui;
mod viewport;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use crate::config::{Args, Config};
use crate::telemetry::TelemetryState;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    let config = Config::from_args(&args).context("invalid configuration")?;
    log::info!("{:?}", config);

    let rt = tokio::runtime::Runtime::new().context("unable to create runtime")?;
    // the poll task is spawned from the UI thread
    let _enter = rt.enter();

    let state = Arc::new(TelemetryState::from_config(&config));

    ui::init(config, state).map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}
