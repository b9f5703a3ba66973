//! `aws_caller_identity` data source
//!
//! Resolves the identity the configured credentials belong to. Takes no
//! arguments; every attribute is computed from STS.

use crate::client::ClientRegistry;
use async_trait::async_trait;
use tfcore::{
    AttributeBuilder, Config, DataSource, Result, Schema, SchemaBuilder, State, TfError,
};

pub struct CallerIdentityDataSource {
    registry: ClientRegistry,
}

impl CallerIdentityDataSource {
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .attribute(
                AttributeBuilder::string("id")
                    .description("AWS account ID of the caller")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("account_id")
                    .description("AWS account ID of the caller")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("arn")
                    .description("ARN of the calling identity")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("user_id")
                    .description("Unique identifier of the calling entity")
                    .computed(),
            )
            .build()
    }
}

#[async_trait]
impl DataSource for CallerIdentityDataSource {
    fn type_name(&self) -> &str {
        "aws_caller_identity"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, _config: Config) -> Result<State> {
        let identity = self
            .registry
            .sts
            .get_caller_identity()
            .await
            .map_err(|e| TfError::remote("reading caller identity", e))?;
        tracing::debug!(account_id = %identity.account_id, "resolved caller identity");

        let mut state = State::new();
        state.set_id(&identity.account_id);
        state.set_string("account_id", &identity.account_id);
        state.set_string("arn", &identity.arn);
        state.set_string("user_id", &identity.user_id);
        Ok(state)
    }
}
