//! HTTP(S) front end.
//!
//! One wildcard `GET` route hands the request path and `Authorization`
//! header to the [`Dispatcher`] on the blocking pool and turns the typed
//! [`Reply`] into a response.

pub mod auth;
mod dispatch;
pub mod error;
pub mod listing;
pub mod tls;

use crate::error::{ErrorKind, Result};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::routing::get;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use exn::{OptionExt, ResultExt};
use litepub_config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub use crate::dispatch::{Dispatcher, Reply};

/// How long in-flight requests get to finish after a shutdown signal.
pub const GRACE_PERIOD: Duration = Duration::from_secs(10);

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/*path", get(document))
        .with_state(dispatcher)
        .layer(TraceLayer::new_for_http())
}

async fn index(State(dispatcher): State<Arc<Dispatcher>>, headers: HeaderMap) -> Reply {
    handle(dispatcher, String::new(), &headers).await
}

async fn document(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Reply {
    handle(dispatcher, path, &headers).await
}

async fn handle(dispatcher: Arc<Dispatcher>, path: String, headers: &HeaderMap) -> Reply {
    let authorization = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string);
    tokio::task::spawn_blocking(move || dispatcher.dispatch(&path, authorization.as_deref()))
        .await
        .unwrap_or_else(|e| {
            let err = exn::Exn::from(e).raise(ErrorKind::Worker);
            tracing::error!("{err:?}");
            Reply::Failed(error::describe(err.frame()))
        })
}

/// Serve until Ctrl-C (or SIGTERM), over TLS unless disabled.
pub async fn serve(config: &Config) -> Result<()> {
    let dispatcher = Arc::new(Dispatcher::new(&config.content)?);
    let app = router(dispatcher);
    let server = &config.server;
    let listen = format!("{}:{}", server.host, server.port);
    let addr = tokio::net::lookup_host((server.host.as_str(), server.port))
        .await
        .or_raise(|| ErrorKind::Address(listen.clone()))?
        .next()
        .ok_or_raise(|| ErrorKind::Address(listen.clone()))?;

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    if server.tls.enabled {
        let tls = RustlsConfig::from_pem_file(&server.tls.cert, &server.tls.key).await.or_raise(|| ErrorKind::Tls {
            cert: server.tls.cert.clone(),
            key: server.tls.key.clone(),
        })?;
        tracing::info!("Litepub running on https://{addr}");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .or_raise(|| ErrorKind::Serve(addr))?;
    } else {
        tracing::warn!("TLS disabled, credentials will travel in clear text");
        tracing::info!("Litepub running on http://{addr}");
        axum_server::bind(addr)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .or_raise(|| ErrorKind::Serve(addr))?;
    }
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
    handle.graceful_shutdown(Some(GRACE_PERIOD));
}
