use anyhow::{Context, Result};
use csv_etl::{config::Config, pipeline};
use std::{env, fs, path::PathBuf, process::exit};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_CONFIG: &str = "config.yaml";

fn main() {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    // config first: it names the log directory
    let cfg = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    };

    let stamp = pipeline::run_stamp();
    let guard = match init_logging(&cfg, &stamp) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit(1);
        }
    };

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    info!(config = %config_path.display(), "startup");
    let code = match pipeline::run_at(&cfg, &stamp) {
        Ok(out) => {
            info!(path = %out.display(), "done");
            0
        }
        // the failing stage has already logged the full error chain
        Err(_) => 1,
    };
    // exit skips destructors; flush the log file first
    drop(guard);
    exit(code);
}

/// Stderr plus `<logs>/<stamp>.log`. The returned guard flushes the file on drop.
fn init_logging(cfg: &Config, stamp: &str) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    fs::create_dir_all(&cfg.logs)
        .with_context(|| format!("creating log dir {}", cfg.logs.display()))?;
    let file_appender = tracing_appender::rolling::never(&cfg.logs, format!("{}.log", stamp));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_target(false).with_filter(filter());
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing subscriber")?;
    Ok(guard)
}
