use std::sync::Arc;

use serialhttp_bridge::{http, Bridge};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cmd::link::open_bridge;
use crate::cmd::ServeArgs;
use crate::exit::{io_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    if !args.path.starts_with('/') {
        return Err(CliError::new(
            USAGE,
            format!("--path must start with '/', got {:?}", args.path),
        ));
    }

    let bridge = Arc::new(open_bridge(&args.link)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime start failed", err))?;

    runtime.block_on(serve(bridge, &args.bind, &args.path))
}

async fn serve(bridge: Arc<Bridge>, bind: &str, path: &str) -> CliResult<i32> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| io_error(&format!("bind {bind} failed"), err))?;

    let cancel = CancellationToken::new();
    let router = http::router(bridge, cancel.clone(), path);

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(err) => error!(error = %err, "failed to listen for shutdown signal"),
        }
        on_signal.cancel();
    });

    let shutdown = cancel.clone();
    http::serve(listener, router, async move { shutdown.cancelled().await })
        .await
        .map_err(|err| io_error("http endpoint failed", err))?;

    info!("http endpoint stopped");
    Ok(SUCCESS)
}
