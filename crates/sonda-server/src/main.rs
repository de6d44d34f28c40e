mod convert;
mod error;
mod inspect_service;
mod publish_service;

use std::sync::Arc;

use sonda_core::{Inspector, Publisher, RocksDbTransport, SondaConfig};
use sonda_proto::sonda_inspect_server::SondaInspectServer;
use sonda_proto::sonda_publish_server::SondaPublishServer;
use tonic::transport::Server;
use tracing::{info, warn};

use inspect_service::InspectService;
use publish_service::PublishService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, loaded_from) = match SondaConfig::discover() {
        Ok(found) => found,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    sonda_core::telemetry::init_tracing(&config.telemetry);

    match loaded_from {
        Some(path) => info!(path, "loaded configuration"),
        None => info!("no config file found, using defaults"),
    }
    if config.transport.queue_name.trim().is_empty() {
        warn!("transport.queue_name is not set; queue operations will fail");
    }

    let data_dir = std::env::var("SONDA_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let transport = Arc::new(RocksDbTransport::open(&data_dir)?);

    let inspector = Arc::new(Inspector::new(transport.clone(), &config));
    let publisher = Arc::new(Publisher::new(transport, &config));

    let addr = config.server.listen_addr.parse()?;
    info!(%addr, %data_dir, "starting gRPC server");

    Server::builder()
        .add_service(SondaInspectServer::new(InspectService::new(inspector)))
        .add_service(SondaPublishServer::new(PublishService::new(publisher)))
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    info!("gRPC server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    info!("received shutdown signal");
}
