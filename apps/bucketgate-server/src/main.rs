//! BucketGate server: S3 request routing and authorization in front of a
//! storage backend.
//!
//! Every request is resolved to a bucket and key, matched against the fixed
//! route table, and gated on the permissions its route requires. Operation
//! handlers are not part of this binary; authorized requests are answered
//! with `NotImplemented`.
//!
//! # Usage
//!
//! ```text
//! GATEWAY_DOMAINS=s3.example.com GATEWAY_POLICY_FILE=grants.json bucketgate-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:17410` | Bind address |
//! | `GATEWAY_DOMAINS` | *(empty)* | Comma-separated virtual-hosting domains |
//! | `ACCESS_KEY` / `SECRET_KEY` | *(unset)* | Static credential; its owner gets full access |
//! | `GATEWAY_POLICY_FILE` | *(unset)* | JSON array of grants, overrides the owner policy |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use bucketgate_auth::{
    AccessKeyExtractor, CredentialExtractor, PolicyEvaluator, StaticCredentialProvider,
    StaticPolicyEvaluator,
};
use bucketgate_core::GatewayConfig;
use bucketgate_http::dispatch::{NotImplementedHandler, OperationHandler};
use bucketgate_http::service::{GatewayHttpConfig, GatewayHttpService};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the [`GatewayHttpConfig`] from the application [`GatewayConfig`].
fn build_http_config(config: &GatewayConfig) -> Result<GatewayHttpConfig> {
    Ok(GatewayHttpConfig {
        domains: config.domains.clone(),
        extractor: build_extractor(config),
        evaluator: build_evaluator(config)?,
    })
}

fn build_extractor(config: &GatewayConfig) -> Arc<dyn CredentialExtractor> {
    let credentials = match (&config.access_key, &config.secret_key) {
        (Some(access_key), Some(secret_key)) => {
            info!(access_key = %access_key, "configured static credential");
            vec![(access_key.clone(), secret_key.clone())]
        }
        (Some(access_key), None) => {
            warn!(access_key = %access_key, "access key configured without a secret key, ignoring");
            Vec::new()
        }
        _ => Vec::new(),
    };
    let provider = StaticCredentialProvider::new(credentials);
    Arc::new(AccessKeyExtractor::new(Arc::new(provider)))
}

/// Pick the policy: a grants file, else full access for the configured owner,
/// else everything allowed.
fn build_evaluator(config: &GatewayConfig) -> Result<Arc<dyn PolicyEvaluator>> {
    if let Some(path) = &config.policy_file {
        let evaluator = StaticPolicyEvaluator::from_file(path)
            .with_context(|| format!("failed to load policy file {path}"))?;
        info!(path = %path, grants = evaluator.len(), "loaded policy grants");
        return Ok(Arc::new(evaluator));
    }

    if let (Some(access_key), Some(_)) = (&config.access_key, &config.secret_key) {
        info!(access_key = %access_key, "granting full access to the configured owner");
        return Ok(Arc::new(StaticPolicyEvaluator::owners([access_key.clone()])));
    }

    warn!("no credentials or policy configured, every request will be authorized");
    Ok(Arc::new(StaticPolicyEvaluator::allow_all()))
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<H: OperationHandler>(
    listener: TcpListener,
    service: GatewayHttpService<H>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Query the health endpoint of a running gateway.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;
    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /_health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env();

    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        domains = ?config.domains,
        policy_file = ?config.policy_file,
        version = VERSION,
        "starting BucketGate",
    );

    let http_config = build_http_config(&config)?;
    let service = GatewayHttpService::new(NotImplementedHandler, http_config);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
