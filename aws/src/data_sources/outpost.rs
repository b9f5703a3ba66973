//! `aws_outposts_outpost` data source
//!
//! Looks up a single Outpost by any combination of id, arn, name, and
//! owner_id. The ListOutposts API has no server-side filters, so the
//! client pages through the full listing and the filtering happens here.

use crate::client::{ClientRegistry, Outpost};
use async_trait::async_trait;
use tfcore::{
    require_single, AttributeBuilder, Config, DataSource, Result, Schema, SchemaBuilder, State,
    TfError,
};

pub struct OutpostDataSource {
    registry: ClientRegistry,
}

impl OutpostDataSource {
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .attribute(
                AttributeBuilder::string("id")
                    .description("Identifier of the Outpost")
                    .optional()
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("arn")
                    .description("ARN of the Outpost")
                    .optional()
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("name")
                    .description("Name of the Outpost")
                    .optional()
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("owner_id")
                    .description("AWS account ID of the Outpost owner")
                    .optional()
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("availability_zone")
                    .description("Availability zone of the Outpost")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("availability_zone_id")
                    .description("Availability zone ID of the Outpost")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("site_id")
                    .description("Site identifier of the Outpost")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("description")
                    .description("Description of the Outpost")
                    .computed(),
            )
            .build()
    }

    fn matches(outpost: &Outpost, filters: &Filters) -> bool {
        let field_matches = |filter: &Option<String>, actual: &str| match filter {
            Some(wanted) => wanted == actual,
            None => true,
        };
        field_matches(&filters.id, &outpost.id)
            && field_matches(&filters.arn, &outpost.arn)
            && field_matches(&filters.name, &outpost.name)
            && field_matches(&filters.owner_id, &outpost.owner_id)
    }
}

struct Filters {
    id: Option<String>,
    arn: Option<String>,
    name: Option<String>,
    owner_id: Option<String>,
}

#[async_trait]
impl DataSource for OutpostDataSource {
    fn type_name(&self) -> &str {
        "aws_outposts_outpost"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn read(&self, config: Config) -> Result<State> {
        let filters = Filters {
            id: config.optional_string("id")?,
            arn: config.optional_string("arn")?,
            name: config.optional_string("name")?,
            owner_id: config.optional_string("owner_id")?,
        };

        let outposts = self
            .registry
            .outposts
            .list_outposts()
            .await
            .map_err(|e| TfError::remote("listing Outposts", e))?;

        let matches: Vec<Outpost> = outposts
            .into_iter()
            .filter(|o| Self::matches(o, &filters))
            .collect();
        let outpost = require_single(matches, "Outposts Outpost")?;
        tracing::debug!(id = %outpost.id, "matched outpost");

        let mut state = State::new();
        state.set_id(&outpost.id);
        state.set_string("arn", &outpost.arn);
        state.set_string("name", &outpost.name);
        state.set_string("owner_id", &outpost.owner_id);
        state.set_string("availability_zone", &outpost.availability_zone);
        state.set_string("availability_zone_id", &outpost.availability_zone_id);
        state.set_string("site_id", &outpost.site_id);
        if let Some(description) = &outpost.description {
            state.set_string("description", description);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stubs::{stub_registry, StubOutposts};
    use std::sync::Arc;

    fn outpost(id: &str, name: &str, owner: &str) -> Outpost {
        Outpost {
            id: id.to_string(),
            arn: format!("arn:aws:outposts:us-west-2:{}:outpost/{}", owner, id),
            owner_id: owner.to_string(),
            name: name.to_string(),
            availability_zone: "us-west-2a".to_string(),
            availability_zone_id: "usw2-az1".to_string(),
            site_id: "os-0123".to_string(),
            description: Some("rack 4".to_string()),
        }
    }

    fn ds_with(outposts: Vec<Outpost>) -> OutpostDataSource {
        let mut registry = stub_registry();
        registry.outposts = Arc::new(StubOutposts::returning(outposts));
        OutpostDataSource::new(registry)
    }

    #[tokio::test]
    async fn read_by_name_returns_full_state() {
        let ds = ds_with(vec![
            outpost("op-1", "east-rack", "111111111111"),
            outpost("op-2", "west-rack", "111111111111"),
        ]);
        let mut config = Config::new();
        config.set_string("name", "west-rack");

        let state = ds.read(config).await.unwrap();

        assert_eq!(state.id().unwrap(), "op-2");
        assert_eq!(state.get_string("availability_zone").unwrap(), "us-west-2a");
        assert_eq!(state.get_string("site_id").unwrap(), "os-0123");
        assert_eq!(state.get_string("description").unwrap(), "rack 4");
    }

    #[tokio::test]
    async fn filters_combine_conjunctively() {
        let ds = ds_with(vec![
            outpost("op-1", "rack", "111111111111"),
            outpost("op-2", "rack", "222222222222"),
        ]);
        let mut config = Config::new();
        config.set_string("name", "rack");
        config.set_string("owner_id", "222222222222");

        let state = ds.read(config).await.unwrap();

        assert_eq!(state.id().unwrap(), "op-2");
    }

    #[tokio::test]
    async fn no_match_reports_cardinality_error() {
        let ds = ds_with(vec![outpost("op-1", "rack", "111111111111")]);
        let mut config = Config::new();
        config.set_string("name", "absent");

        let err = ds.read(config).await.unwrap_err();

        assert!(err
            .to_string()
            .contains("no Outposts Outpost found matching criteria"));
    }

    #[tokio::test]
    async fn multiple_matches_report_cardinality_error() {
        let ds = ds_with(vec![
            outpost("op-1", "rack", "111111111111"),
            outpost("op-2", "rack", "111111111111"),
        ]);
        let mut config = Config::new();
        config.set_string("name", "rack");

        let err = ds.read(config).await.unwrap_err();

        assert!(err
            .to_string()
            .contains("multiple Outposts Outpost found matching criteria"));
    }
}
