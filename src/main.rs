//! Router service binary.
//!
//! Loads the service configuration, builds the model router, and serves the
//! HTTP API. When started with `--config`, the file is watched and
//! performance-table edits take effect without a restart.
//!
//! ```bash
//! orchestra-router --config router.toml
//! orchestra-router --schema > router.schema.json
//! ```
//!
//! ## Environment Variables
//!
//! - `LOG_FORMAT=json` — structured JSON output (overrides the config file)
//! - `RUST_LOG=info` — log level filter (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use orchestra_router::config::{self, loader, watcher::ConfigWatcher, ServiceConfig};
use orchestra_router::{init_tracing_with_format, metrics, web_api, IntentClassifier};
use tracing::{info, warn};

/// Parsed command-line arguments.
struct Args {
    config_path: Option<PathBuf>,
    port: Option<u16>,
    print_schema: bool,
}

/// Parse command-line arguments manually (no external arg parser dependency).
///
/// # Returns
///
/// - `Ok(Args)` on success
/// - `Err(String)` with a usage message on failure
fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut port = None;
    let mut print_schema = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    return Err("--config requires a value".to_string());
                }
                config_path = Some(PathBuf::from(&args[i]));
            }
            "--port" | "-p" => {
                i += 1;
                if i >= args.len() {
                    return Err("--port requires a value".to_string());
                }
                port = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("invalid port: {}", args[i]))?,
                );
            }
            "--schema" => {
                print_schema = true;
            }
            "--help" | "-h" => {
                return Err(usage());
            }
            other => {
                return Err(format!("unknown argument: {other}\n{}", usage()));
            }
        }
        i += 1;
    }

    Ok(Args {
        config_path,
        port,
        print_schema,
    })
}

fn usage() -> String {
    [
        "Usage: orchestra-router [OPTIONS]",
        "",
        "Options:",
        "  --config, -c <FILE>   Service config TOML (default: built-in catalog)",
        "  --port, -p <PORT>     Override server.port",
        "  --schema              Print the config JSON Schema and exit",
        "  --help, -h            Show this help message",
    ]
    .join("\n")
}

#[tokio::main]
async fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(1);
        }
    };

    if args.print_schema {
        match config::export_schema() {
            Ok(schema) => {
                println!("{schema}");
                return;
            }
            Err(e) => {
                eprintln!("Failed to export schema: {e}");
                std::process::exit(1);
            }
        }
    }

    let mut service_config = match &args.config_path {
        Some(path) => match loader::load_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                std::process::exit(1);
            }
        },
        None => ServiceConfig::default(),
    };
    if let Some(port) = args.port {
        service_config.server.port = port;
    }

    let log_format = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| service_config.observability.log_format.as_str().to_string());
    let _ = init_tracing_with_format(&log_format);

    if service_config.observability.metrics_enabled {
        if let Err(e) = metrics::init_metrics() {
            warn!(error = %e, "metrics disabled");
        }
    }

    let (router, feed) = service_config.build_router();
    let router = Arc::new(router);
    let classifier = Arc::new(IntentClassifier::new(router.catalog()));

    info!(
        models = router.catalog().len(),
        samples = router.performance().snapshot().len(),
        config = ?args.config_path,
        "router initialised"
    );

    // Held for the lifetime of the process; dropping it stops the watch.
    let _watch = match &args.config_path {
        Some(path) => match ConfigWatcher::new(path.clone(), feed, router.catalog().clone()) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!(error = %e, "config hot-reload unavailable");
                None
            }
        },
        None => None,
    };

    if let Err(e) = web_api::start_server(service_config.server, router, classifier).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
