//! # PLC Simulator
//!
//! Runs the scan engine, the Modbus/TCP server and the supervisory HTTP API
//! against one shared process image.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: Modbus on 127.0.0.1:1502, HTTP on 0.0.0.0:8000, 100 ms scan
//! plc
//!
//! # From a config file, overriding the Modbus port
//! plc --config config/plc.toml --modbus-port 5020
//!
//! # Verbose JSON logs
//! plc -v --json
//! ```
//!
//! Startup order: image, scan engine, Modbus listener, HTTP listener. Any
//! failure before the engine starts ticking aborts with exit status 1.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use plc_api::{Supervisor, build_router, spawn_state_broadcaster};
use plc_common::prelude::{ConfigLoader, LogLevel, PlcConfig, ProcessImage};
use plc_modbus::{ModbusServer, build_store, spawn_mirror_task};
use plc_scan::ScanEngine;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// PLC scan-cycle simulator
#[derive(Parser, Debug)]
#[command(name = "plc")]
#[command(version)]
#[command(about = "PLC scan-cycle simulator with Modbus/TCP and a supervisory API")]
#[command(long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the Modbus/TCP listen port.
    #[arg(long, value_name = "PORT")]
    modbus_port: Option<u16>,

    /// Override the HTTP listen address, e.g. 127.0.0.1:8080.
    #[arg(long, value_name = "ADDR")]
    http_bind: Option<String>,

    /// Override the scan period in milliseconds.
    #[arg(long, value_name = "MS")]
    scan_period_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, LogLevel::default());
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    if let Err(e) = run(config).await {
        error!("PLC startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Load the file (if any), apply CLI overrides, validate.
fn load_config(args: &Args) -> Result<PlcConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => PlcConfig::load(path)?,
        None => PlcConfig::default(),
    };
    if let Some(port) = args.modbus_port {
        config.modbus.set_port(port)?;
    }
    if let Some(bind) = &args.http_bind {
        config.api.bind = bind.clone();
    }
    if let Some(period) = args.scan_period_ms {
        config.scan.period_ms = period;
    }
    config.validate()?;
    Ok(config)
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.as_directive().parse().unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // A second init (config error path) is a no-op.
    if args.json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}

async fn run(config: PlcConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    let image = Arc::new(ProcessImage::new(config.memory));
    let engine = ScanEngine::new(Arc::clone(&image), config.scan.period())?;

    // Bind both listeners before the engine starts so a port conflict aborts
    // startup cleanly.
    let (store, mirror) = build_store(config.modbus.backing, Arc::clone(&image));
    let modbus = ModbusServer::bind(config.modbus.bind_addr()?, store).await?;

    let http_addr: SocketAddr = config.api.bind_addr()?;
    let http_listener = TcpListener::bind(http_addr)
        .await
        .map_err(|e| format!("failed to bind HTTP listener on {http_addr}: {e}"))?;
    info!("Supervisory API listening on http://{}", http_listener.local_addr()?);

    engine.start()?;

    let mirror_task = mirror.map(|store| spawn_mirror_task(store, config.modbus.mirror_period()));

    let supervisor = Arc::new(Supervisor::new(
        Arc::clone(&image),
        config.scan.period(),
        config.api.state_window,
    ));
    let broadcaster = spawn_state_broadcaster(Arc::clone(&supervisor), config.api.push_interval());
    let router = build_router(supervisor);

    let mut modbus_task = tokio::spawn(modbus.serve());
    let mut http_task = tokio::spawn(async move { axum::serve(http_listener, router).await });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = &mut modbus_task => {
            match result {
                Ok(Ok(())) => warn!("Modbus server exited"),
                Ok(Err(e)) => error!("Modbus server failed: {}", e),
                Err(e) => error!("Modbus server task panicked: {}", e),
            }
        }
        result = &mut http_task => {
            match result {
                Ok(Ok(())) => warn!("HTTP server exited"),
                Ok(Err(e)) => error!("HTTP server failed: {}", e),
                Err(e) => error!("HTTP server task panicked: {}", e),
            }
        }
    }

    modbus_task.abort();
    http_task.abort();
    broadcaster.abort();
    if let Some(task) = mirror_task {
        task.abort();
    }

    engine.stop()?;
    let stats = engine.stats();
    info!(
        "Shutdown complete after {} scan cycles ({} faulted, {} timing violations)",
        stats.cycle_count, stats.faulted_cycles, stats.timing_violations
    );
    Ok(())
}
