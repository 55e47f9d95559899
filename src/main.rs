use anyhow::{Context, Result};
use memprobe::commands::{CommandFacade, CommandService, ServeExit};
use memprobe::config::{load_config, Config};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("failed to load configuration")?;

    // Initialize logging; stdout is reserved for protocol responses
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting memprobe v{}", env!("CARGO_PKG_VERSION"));
    info!("Architecture: {}", std::env::consts::ARCH);

    run(config).await
}

#[cfg(any(target_os = "linux", windows))]
async fn run(config: Config) -> Result<()> {
    use memprobe::process::NativeProcessApi;
    use std::sync::Arc;

    let facade = CommandFacade::from_config(Arc::new(NativeProcessApi::default()), &config)
        .context("failed to start scan engine")?;
    serve(CommandService::new(facade)).await
}

#[cfg(not(any(target_os = "linux", windows)))]
async fn run(_config: Config) -> Result<()> {
    anyhow::bail!("memprobe has no process backend for {}", std::env::consts::OS)
}

/// Serves JSON-lines requests on stdio until EOF or Ctrl+C
#[cfg_attr(not(any(target_os = "linux", windows)), allow(dead_code))]
async fn serve<A: memprobe::ProcessApi>(service: CommandService<A>) -> Result<()> {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    info!("memprobe ready, reading commands from stdin");
    let exit = service
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown)
        .await
        .context("stdio transport failed")?;

    match exit {
        ServeExit::Eof => {
            service.facade().detach();
            info!("Shutting down memprobe");
            Ok(())
        }
        ServeExit::Interrupted => {
            // A running scan cannot be cancelled and the runtime would wait
            // for it on drop; the OS releases the target handle on exit
            info!("Shutting down memprobe after interrupt");
            std::process::exit(130)
        }
    }
}
