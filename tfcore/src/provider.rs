//! Provider trait: the registry the host consumes at handshake time
//!
//! A provider resolves its own configuration once, builds the shared client
//! registry, and afterwards acts as a factory for resource and data source
//! adapters keyed by type name. Adapters receive their clients by injection
//! from the configured provider; there is no package-level client state.

use crate::data_source::DataSource;
use crate::error::Result;
use crate::resource::Resource;
use crate::schema::Schema;
use crate::types::{Config, Diagnostics};
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Resolve provider configuration (credentials, region, endpoints) and
    /// build the shared service clients. Called once before any adapter.
    async fn configure(&mut self, config: Config) -> Diagnostics;

    /// Instantiate the resource adapter registered under `type_name`.
    /// Fails with a resource-not-found error for unknown names and with a
    /// not-configured error before `configure` has succeeded.
    async fn create_resource(&self, type_name: &str) -> Result<Box<dyn Resource>>;

    /// Instantiate the data source adapter registered under `type_name`.
    async fn create_data_source(&self, type_name: &str) -> Result<Box<dyn DataSource>>;

    /// Schema of the provider's own configuration block.
    fn provider_schema(&self) -> Schema;

    /// Resource schemas for host introspection, keyed by type name.
    fn resource_schemas(&self) -> HashMap<String, Schema>;

    /// Data source schemas for host introspection, keyed by type name.
    fn data_source_schemas(&self) -> HashMap<String, Schema>;
}
