use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sora_exporter::args::Args;
use sora_exporter::collector::SoraCollector;
use sora_exporter::server::{bind, serve, Exporter};
use sora_exporter::version::Version;

#[tokio::main]
async fn main() -> ExitCode {
    sora_exporter::logging::init();
    let args = Args::parse();

    if args.version {
        return match Version::current().to_json() {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                tracing::error!(%error, "failed to encode version");
                ExitCode::FAILURE
            }
        };
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "failed to listen");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let listener = bind(args.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.listen_addr))?;
    tracing::info!(
        listen_addr = %listener.local_addr()?,
        metrics_path = %args.metrics_path,
        sora_url = %args.sora_url,
        timeout = ?args.timeout,
        "starting sora exporter"
    );

    let collector = SoraCollector::new(args.config());
    let exporter = Arc::new(Exporter::new(collector, args.metrics_path, Version::current()));
    serve(listener, exporter, shutdown_signal()).await;

    tracing::info!("sora exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
