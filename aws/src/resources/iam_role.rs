//! `aws_iam_role` resource
//!
//! IAM is globally consistent only eventually: a freshly created role (or
//! its trust policy principal) may not be visible to other services for a
//! couple of minutes. Create retries propagation-class failures under a
//! bounded policy before giving up.

use crate::client::{AwsError, ClientRegistry, CreateRole, Role};
use async_trait::async_trait;
use std::time::Duration;
use tfcore::validator::{NumberRangeValidator, StringLengthValidator, StringPatternValidator};
use tfcore::{
    retry_on, AttributeBuilder, AttributeType, Config, Resource, Result, RetryPolicy, Schema,
    SchemaBuilder, State, TfError, Value,
};

const PROPAGATION_TIMEOUT: Duration = Duration::from_secs(120);

pub struct IamRoleResource {
    registry: ClientRegistry,
    propagation: RetryPolicy,
}

impl IamRoleResource {
    pub fn new(registry: ClientRegistry) -> Self {
        Self {
            registry,
            propagation: RetryPolicy::new(PROPAGATION_TIMEOUT),
        }
    }

    #[cfg(test)]
    fn with_propagation(mut self, policy: RetryPolicy) -> Self {
        self.propagation = policy;
        self
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .attribute(
                AttributeBuilder::string("id")
                    .description("Name of the role")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("name")
                    .description("Name of the role")
                    .required()
                    .force_new()
                    .validator(StringLengthValidator {
                        min: Some(1),
                        max: Some(64),
                    })
                    .validator(StringPatternValidator {
                        pattern: regex::Regex::new(r"^[\w+=,.@-]+$")
                            .expect("static pattern compiles"),
                        description: "alphanumeric and +=,.@- characters".to_string(),
                    }),
            )
            .attribute(
                AttributeBuilder::string("assume_role_policy")
                    .description("Trust policy document granting AssumeRole")
                    .required()
                    .semantic_equals(|prior, config| match (prior, config) {
                        (Value::String(prior), Value::String(config)) => {
                            policies_equivalent(prior, config)
                        }
                        _ => prior == config,
                    }),
            )
            .attribute(
                AttributeBuilder::string("path")
                    .description("Path of the role")
                    .optional()
                    .computed()
                    .force_new(),
            )
            .attribute(
                AttributeBuilder::string("description")
                    .description("Description of the role")
                    .optional(),
            )
            .attribute(
                AttributeBuilder::number("max_session_duration")
                    .description("Maximum session duration in seconds")
                    .optional()
                    .computed()
                    .validator(NumberRangeValidator {
                        min: Some(3600.0),
                        max: Some(43200.0),
                    }),
            )
            .attribute(
                AttributeBuilder::map("tags", AttributeType::String)
                    .description("Tags applied to the role")
                    .optional(),
            )
            .attribute(
                AttributeBuilder::string("arn")
                    .description("ARN of the role")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("unique_id")
                    .description("Stable unique ID assigned by IAM")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("create_date")
                    .description("Creation timestamp of the role")
                    .computed(),
            )
            .build()
    }

    fn create_input(config: &Config) -> Result<CreateRole> {
        Ok(CreateRole {
            name: config.get_string("name")?,
            assume_role_policy: config.get_string("assume_role_policy")?,
            path: config.optional_string("path")?,
            description: config.optional_string("description")?,
            max_session_duration: config
                .optional_i64("max_session_duration")?
                .map(|v| v as i32),
            tags: config.optional_string_map("tags")?.unwrap_or_default(),
        })
    }

    fn role_to_state(role: &Role) -> State {
        let mut state = State::new();
        state.set_id(&role.name);
        state.set_string("name", &role.name);
        state.set_string("arn", &role.arn);
        state.set_string("unique_id", &role.role_id);
        state.set_string("path", &role.path);
        state.set_string("create_date", &role.create_date);
        state.set_string("assume_role_policy", &role.assume_role_policy);
        if let Some(description) = &role.description {
            state.set_string("description", description);
        }
        if let Some(duration) = role.max_session_duration {
            state.set_i64("max_session_duration", duration as i64);
        }
        if !role.tags.is_empty() {
            state.set_string_map("tags", &role.tags);
        }
        state
    }
}

/// Policy documents compare as JSON values, so formatting and key order
/// differences do not register as drift.
fn policies_equivalent(a: &str, b: &str) -> bool {
    match (
        serde_json::from_str::<serde_json::Value>(a),
        serde_json::from_str::<serde_json::Value>(b),
    ) {
        (Ok(left), Ok(right)) => left == right,
        _ => a == b,
    }
}

#[async_trait]
impl Resource for IamRoleResource {
    fn type_name(&self) -> &str {
        "aws_iam_role"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, config: Config) -> Result<State> {
        self.validate(&config).into_result()?;
        let input = Self::create_input(&config)?;
        tracing::info!(name = %input.name, "creating IAM role");

        let role = retry_on(&self.propagation, AwsError::is_retryable, || {
            let input = input.clone();
            async move { self.registry.iam.create_role(input).await }
        })
        .await
        .map_err(|e| TfError::remote(format!("creating IAM role {}", input.name), e))?;

        Ok(Self::role_to_state(&role))
    }

    async fn read(&self, state: State) -> Result<Option<State>> {
        let name = state.get_string("name").or_else(|_| state.id())?;
        match self.registry.iam.get_role(&name).await {
            Ok(role) => Ok(Some(Self::role_to_state(&role))),
            Err(e) if e.is_not_found() => {
                tracing::warn!(name = %name, "IAM role gone from remote, removing from state");
                Ok(None)
            }
            Err(e) => Err(TfError::remote(format!("reading IAM role {}", name), e)),
        }
    }

    async fn update(&self, prior: State, config: Config) -> Result<State> {
        self.validate(&config).into_result()?;
        let name = prior.get_string("name").or_else(|_| prior.id())?;

        let description = config.optional_string("description")?;
        let prior_duration = prior
            .optional_i64("max_session_duration")?
            .map(|v| v as i32);
        // Computed when unset, so an absent value inherits the remote one.
        let max_session_duration = config
            .optional_i64("max_session_duration")?
            .map(|v| v as i32)
            .or(prior_duration);
        let description_changed = description != prior.optional_string("description")?;
        let duration_changed = max_session_duration != prior_duration;
        if description_changed || duration_changed {
            self.registry
                .iam
                .update_role(&name, description, max_session_duration)
                .await
                .map_err(|e| TfError::remote(format!("updating IAM role {}", name), e))?;
        }

        let policy = config.get_string("assume_role_policy")?;
        let prior_policy = prior.get_string("assume_role_policy").unwrap_or_default();
        if !policies_equivalent(&policy, &prior_policy) {
            self.registry
                .iam
                .update_assume_role_policy(&name, &policy)
                .await
                .map_err(|e| {
                    TfError::remote(format!("updating trust policy of IAM role {}", name), e)
                })?;
        }

        let tags = config.optional_string_map("tags")?.unwrap_or_default();
        let prior_tags = prior.optional_string_map("tags")?.unwrap_or_default();
        if tags != prior_tags {
            let removed: Vec<String> = prior_tags
                .keys()
                .filter(|k| !tags.contains_key(*k))
                .cloned()
                .collect();
            if !removed.is_empty() {
                self.registry
                    .iam
                    .untag_role(&name, &removed)
                    .await
                    .map_err(|e| TfError::remote(format!("untagging IAM role {}", name), e))?;
            }
            if !tags.is_empty() {
                self.registry
                    .iam
                    .tag_role(&name, &tags)
                    .await
                    .map_err(|e| TfError::remote(format!("tagging IAM role {}", name), e))?;
            }
        }

        // Re-read so computed attributes reflect the post-update remote.
        let role = self
            .registry
            .iam
            .get_role(&name)
            .await
            .map_err(|e| TfError::remote(format!("reading IAM role {}", name), e))?;
        Ok(Self::role_to_state(&role))
    }

    async fn delete(&self, state: State) -> Result<()> {
        let name = state.get_string("name").or_else(|_| state.id())?;
        match self.registry.iam.delete_role(&name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::debug!(name = %name, "IAM role already deleted");
                Ok(())
            }
            Err(e) => Err(TfError::remote(format!("deleting IAM role {}", name), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stubs::{stub_registry, StubIam};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn sample_policy() -> String {
        r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"ec2.amazonaws.com"},"Action":"sts:AssumeRole"}]}"#
            .to_string()
    }

    fn sample_role(name: &str) -> Role {
        Role {
            name: name.to_string(),
            role_id: "AROAEXAMPLEID".to_string(),
            arn: format!("arn:aws:iam::123456789012:role/{}", name),
            path: "/".to_string(),
            create_date: "2026-08-29T10:00:00Z".to_string(),
            assume_role_policy: sample_policy(),
            description: None,
            max_session_duration: Some(3600),
            tags: HashMap::new(),
        }
    }

    fn valid_config(name: &str) -> Config {
        let mut config = Config::new();
        config.set_string("name", name);
        config.set_string("assume_role_policy", sample_policy());
        config
    }

    fn resource_with(iam: StubIam) -> (IamRoleResource, Arc<StubIam>) {
        let iam = Arc::new(iam);
        let mut registry = stub_registry();
        registry.iam = iam.clone();
        let resource = IamRoleResource::new(registry).with_propagation(
            RetryPolicy::new(Duration::from_millis(200)).with_backoff(
                Duration::from_millis(1),
                Duration::from_millis(5),
            ),
        );
        (resource, iam)
    }

    #[tokio::test]
    async fn create_returns_computed_state() {
        let iam = StubIam::default();
        iam.create_role.push(Ok(sample_role("deploy")));
        let (resource, _) = resource_with(iam);

        let state = resource.create(valid_config("deploy")).await.unwrap();

        assert_eq!(state.id().unwrap(), "deploy");
        assert_eq!(
            state.get_string("arn").unwrap(),
            "arn:aws:iam::123456789012:role/deploy"
        );
        assert_eq!(state.get_string("unique_id").unwrap(), "AROAEXAMPLEID");
        assert_eq!(state.get_string("path").unwrap(), "/");
    }

    #[tokio::test]
    async fn create_retries_through_propagation_failures() {
        let iam = StubIam::default();
        iam.create_role.push(Err(AwsError::Propagation {
            message: "Invalid principal in policy".to_string(),
        }));
        iam.create_role.push(Err(AwsError::Propagation {
            message: "Invalid principal in policy".to_string(),
        }));
        iam.create_role.push(Ok(sample_role("deploy")));
        let (resource, iam) = resource_with(iam);

        let state = resource.create(valid_config("deploy")).await.unwrap();

        assert_eq!(state.id().unwrap(), "deploy");
        assert_eq!(iam.create_role.calls(), 3);
    }

    #[tokio::test]
    async fn create_does_not_retry_plain_api_errors() {
        let iam = StubIam::default();
        iam.create_role.push(Err(AwsError::Api {
            code: "EntityAlreadyExists".to_string(),
            message: "Role with name deploy already exists".to_string(),
        }));
        let (resource, iam) = resource_with(iam);

        let err = resource.create(valid_config("deploy")).await.unwrap_err();

        assert!(err.to_string().contains("creating IAM role deploy"));
        assert_eq!(iam.create_role.calls(), 1);
    }

    #[tokio::test]
    async fn create_rejects_invalid_name_without_calling_remote() {
        let iam = StubIam::default();
        let (resource, iam) = resource_with(iam);
        let mut config = valid_config("bad name with spaces");

        let err = resource.create(config.clone()).await.unwrap_err();
        assert!(err.to_string().contains("name"));

        config.set_string("name", "x".repeat(70));
        let err = resource.create(config).await.unwrap_err();
        assert!(err.to_string().contains("64"));

        assert_eq!(iam.create_role.calls(), 0);
    }

    #[tokio::test]
    async fn read_missing_role_returns_none() {
        let iam = StubIam::default();
        iam.get_role.push(Err(AwsError::NotFound {
            message: "role deploy not found".to_string(),
        }));
        let (resource, _) = resource_with(iam);
        let state = IamRoleResource::role_to_state(&sample_role("deploy"));

        assert!(resource.read(state).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_skips_policy_call_for_reordered_json() {
        let iam = StubIam::default();
        iam.get_role.push(Ok(sample_role("deploy")));
        let (resource, iam) = resource_with(iam);

        let prior = IamRoleResource::role_to_state(&sample_role("deploy"));
        let mut config = valid_config("deploy");
        // Same document, different key order.
        config.set_string(
            "assume_role_policy",
            r#"{"Statement":[{"Action":"sts:AssumeRole","Effect":"Allow","Principal":{"Service":"ec2.amazonaws.com"}}],"Version":"2012-10-17"}"#,
        );

        resource.update(prior, config).await.unwrap();

        assert_eq!(iam.update_assume_role_policy.calls(), 0);
        assert_eq!(iam.update_role.calls(), 0);
    }

    #[tokio::test]
    async fn update_clears_removed_description() {
        let iam = StubIam::default();
        let mut refreshed = sample_role("deploy");
        refreshed.description = None;
        iam.get_role.push(Ok(refreshed));
        let (resource, iam) = resource_with(iam);

        let mut remote = sample_role("deploy");
        remote.description = Some("legacy deploy role".to_string());
        let prior = IamRoleResource::role_to_state(&remote);
        let config = valid_config("deploy");

        let state = resource.update(prior, config).await.unwrap();

        let updates = iam.role_updates.lock().unwrap();
        assert_eq!(updates.as_slice(), &[(None, Some(3600))]);
        assert!(state.optional_string("description").unwrap().is_none());
    }

    #[tokio::test]
    async fn update_reconciles_tags() {
        let iam = StubIam::default();
        iam.get_role.push(Ok(sample_role("deploy")));
        let (resource, iam) = resource_with(iam);

        let mut remote = sample_role("deploy");
        remote.tags =
            HashMap::from([("env".to_string(), "dev".to_string()), ("team".to_string(), "infra".to_string())]);
        let prior = IamRoleResource::role_to_state(&remote);

        let mut config = valid_config("deploy");
        let desired = HashMap::from([("env".to_string(), "prod".to_string())]);
        config.set_string_map("tags", &desired);

        resource.update(prior, config).await.unwrap();

        let untagged = iam.untagged.lock().unwrap();
        assert_eq!(untagged.as_slice(), &[vec!["team".to_string()]]);
        let tagged = iam.tagged.lock().unwrap();
        assert_eq!(tagged.as_slice(), &[desired]);
    }

    #[tokio::test]
    async fn delete_tolerates_already_deleted() {
        let iam = StubIam::default();
        iam.delete_role.push(Err(AwsError::NotFound {
            message: "role deploy not found".to_string(),
        }));
        let (resource, _) = resource_with(iam);
        let state = IamRoleResource::role_to_state(&sample_role("deploy"));

        resource.delete(state).await.unwrap();
    }

    #[test]
    fn name_and_path_force_replacement() {
        let schema = IamRoleResource::schema_static();
        assert!(schema.attributes.get("name").unwrap().force_new);
        assert!(schema.attributes.get("path").unwrap().force_new);
        assert!(!schema.attributes.get("description").unwrap().force_new);
    }
}
