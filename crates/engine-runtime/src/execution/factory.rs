use crate::{error::MigrationError, execution::executor::Endpoints};
use connectors::{
    http::client::HttpRemoteClient,
    remote::{RemoteReader, RemoteWriter},
};
use engine_config::settings::{EndpointSettings, validated::ValidatedSettings};
use std::sync::Arc;
use tracing::debug;

fn create_client(
    component: &'static str,
    endpoint: &EndpointSettings,
) -> Result<Arc<HttpRemoteClient>, MigrationError> {
    debug!(component, url = %endpoint.url, "Creating remote client");
    HttpRemoteClient::new(endpoint.url.trim(), &endpoint.client)
        .map(Arc::new)
        .map_err(|source| MigrationError::Initialization { component, source })
}

pub fn create_reader(endpoint: &EndpointSettings) -> Result<Arc<dyn RemoteReader>, MigrationError> {
    Ok(create_client("reader", endpoint)?)
}

pub fn create_writer(endpoint: &EndpointSettings) -> Result<Arc<dyn RemoteWriter>, MigrationError> {
    Ok(create_client("writer", endpoint)?)
}

pub fn create_progress_reader(
    endpoint: &EndpointSettings,
) -> Result<Arc<dyn RemoteReader>, MigrationError> {
    Ok(create_client("progress-metric", endpoint)?)
}

/// Builds HTTP clients for every endpoint the validated settings name.
pub fn create_endpoints(settings: &ValidatedSettings) -> Result<Endpoints, MigrationError> {
    let progress = settings
        .progress
        .as_ref()
        .map(create_progress_reader)
        .transpose()?;

    Ok(Endpoints {
        reader: create_reader(&settings.reader)?,
        writer: create_writer(&settings.writer)?,
        progress,
    })
}
