pub mod client_info;
pub mod config;
pub mod errors;
pub mod event;
pub mod metrics_defs;
pub mod payload;
pub mod pixel;
pub mod relay;
pub mod service;
pub mod transport;
pub mod user_data;

#[cfg(test)]
mod testutils;

use crate::errors::RelayError;
use crate::pixel::PixelScript;
use crate::relay::PurchaseRelay;
use crate::service::RelayService;
use crate::transport::ReqwestTransport;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

pub async fn run(config: config::Config) -> Result<(), RelayError> {
    config.validate()?;
    let client_ip_headers = config.client_ip_header_names()?;

    if !config.graph.is_complete() {
        tracing::warn!(
            "Graph API credentials are not configured; purchase requests will fail until they are"
        );
    }

    let relay = Arc::new(PurchaseRelay::new(
        config.graph.clone(),
        client_ip_headers,
        Arc::new(ReqwestTransport::default()),
    ));
    let pixel = PixelScript::new(config.graph.pixel_id());

    let relay_service = RelayService::new(
        relay.clone(),
        pixel,
        config.purchase_path.as_str(),
        config.pixel_path.as_str(),
        config.max_body_size,
    );
    let admin_service = AdminService::<_, RelayError>::new(move || relay.is_ready());

    tracing::info!(
        purchase_path = %config.purchase_path,
        pixel_path = %config.pixel_path,
        "Starting purchase relay"
    );

    let relay_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        relay_service,
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(relay_task, admin_task)?;
    Ok(())
}
