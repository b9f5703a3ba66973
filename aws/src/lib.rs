//! AWS provider
//!
//! Maps Terraform-style resource and data source types onto AWS service
//! APIs. The provider is configured once per run; configuration resolves
//! the region and credential chain and builds the shared client registry
//! that every adapter borrows.

pub mod client;
pub mod data_sources;
pub mod resources;

use crate::client::ClientRegistry;
use async_trait::async_trait;
use std::collections::HashMap;
use tfcore::{
    AttributeBuilder, Config, DataSource, Diagnostics, Provider, Resource, Result, Schema,
    SchemaBuilder, TfError,
};

use data_sources::caller_identity::CallerIdentityDataSource;
use data_sources::outpost::OutpostDataSource;
use resources::iam_role::IamRoleResource;
use resources::wafv2::rule_group::RuleGroupResource;

#[derive(Default)]
pub struct AwsProvider {
    registry: Option<ClientRegistry>,
}

impl AwsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider wired to preconstructed clients, bypassing configure.
    pub fn with_registry(registry: ClientRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .attribute(
                AttributeBuilder::string("region")
                    .description("AWS region; falls back to AWS_REGION or AWS_DEFAULT_REGION")
                    .optional(),
            )
            .attribute(
                AttributeBuilder::string("profile")
                    .description("Shared credentials profile name")
                    .optional(),
            )
            .attribute(
                AttributeBuilder::number("max_retries")
                    .description("Maximum API attempts per SDK call")
                    .optional(),
            )
            .build()
    }

    fn registry(&self) -> Result<ClientRegistry> {
        self.registry
            .clone()
            .ok_or(TfError::ProviderNotConfigured)
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Region from the provider block, else the conventional environment
/// variables in precedence order.
fn resolve_region(config: &Config) -> Result<Option<String>> {
    Ok(config
        .optional_string("region")?
        .or_else(|| env_non_empty("AWS_REGION"))
        .or_else(|| env_non_empty("AWS_DEFAULT_REGION")))
}

#[async_trait]
impl Provider for AwsProvider {
    async fn configure(&mut self, config: Config) -> Diagnostics {
        let mut diagnostics = Self::schema_static().validate(&config);
        if diagnostics.has_errors() {
            return diagnostics;
        }

        let region = match resolve_region(&config) {
            Ok(region) => region,
            Err(e) => {
                diagnostics.add_attribute_error("region", "invalid region value", Some(e.to_string()));
                return diagnostics;
            }
        };
        if region.is_none() {
            diagnostics.add_attribute_error(
                "region",
                "no AWS region configured",
                Some("Set the 'region' attribute or the AWS_REGION environment variable".to_string()),
            );
            return diagnostics;
        }

        let profile = match config.optional_string("profile") {
            Ok(profile) => profile.or_else(|| env_non_empty("AWS_PROFILE")),
            Err(e) => {
                diagnostics.add_attribute_error("profile", "invalid profile value", Some(e.to_string()));
                return diagnostics;
            }
        };
        let max_retries = match config.optional_i64("max_retries") {
            Ok(v) => v.map(|v| v as u32),
            Err(e) => {
                diagnostics.add_attribute_error(
                    "max_retries",
                    "invalid max_retries value",
                    Some(e.to_string()),
                );
                return diagnostics;
            }
        };

        match client::sdk::build_registry(region, profile, max_retries).await {
            Ok(registry) => {
                tracing::info!("AWS provider configured");
                self.registry = Some(registry);
            }
            Err(e) => {
                diagnostics.add_error("failed to configure AWS clients".to_string(), Some(e.to_string()));
            }
        }
        diagnostics
    }

    async fn create_resource(&self, type_name: &str) -> Result<Box<dyn Resource>> {
        let registry = self.registry()?;
        match type_name {
            "aws_iam_role" => Ok(Box::new(IamRoleResource::new(registry))),
            "aws_wafv2_rule_group" => Ok(Box::new(RuleGroupResource::new(registry))),
            _ => Err(TfError::ResourceNotFound(type_name.to_string())),
        }
    }

    async fn create_data_source(&self, type_name: &str) -> Result<Box<dyn DataSource>> {
        let registry = self.registry()?;
        match type_name {
            "aws_caller_identity" => Ok(Box::new(CallerIdentityDataSource::new(registry))),
            "aws_outposts_outpost" => Ok(Box::new(OutpostDataSource::new(registry))),
            _ => Err(TfError::DataSourceNotFound(type_name.to_string())),
        }
    }

    fn provider_schema(&self) -> Schema {
        Self::schema_static()
    }

    fn resource_schemas(&self) -> HashMap<String, Schema> {
        HashMap::from([
            (
                "aws_iam_role".to_string(),
                IamRoleResource::schema_static(),
            ),
            (
                "aws_wafv2_rule_group".to_string(),
                RuleGroupResource::schema_static(),
            ),
        ])
    }

    fn data_source_schemas(&self) -> HashMap<String, Schema> {
        HashMap::from([
            (
                "aws_caller_identity".to_string(),
                CallerIdentityDataSource::schema_static(),
            ),
            (
                "aws_outposts_outpost".to_string(),
                OutpostDataSource::schema_static(),
            ),
        ])
    }
}
