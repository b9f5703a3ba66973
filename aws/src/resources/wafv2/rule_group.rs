//! `aws_wafv2_rule_group` resource
//!
//! WAFv2 mutations are optimistic-locked: every write must present the
//! lock token from the last read, and every successful write issues a new
//! one. State carries the token as a computed attribute so update and
//! delete can hand it back.

use crate::client::{
    AwsError, ClientRegistry, CreateRuleGroup, RuleAction, RuleGroupDetail, UpdateRuleGroup,
    WafRule, WafVisibilityConfig,
};
use crate::resources::wafv2::statement::Statement;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tfcore::validator::{NumberRangeValidator, OneOfValidator, StringLengthValidator};
use tfcore::{
    retry_on, AttributeBuilder, AttributeType, Config, Resource, Result, RetryPolicy, Schema,
    SchemaBuilder, State, TfError, Value,
};

const UNAVAILABLE_TIMEOUT: Duration = Duration::from_secs(300);

pub struct RuleGroupResource {
    registry: ClientRegistry,
    unavailable: RetryPolicy,
}

impl RuleGroupResource {
    pub fn new(registry: ClientRegistry) -> Self {
        Self {
            registry,
            unavailable: RetryPolicy::new(UNAVAILABLE_TIMEOUT),
        }
    }

    #[cfg(test)]
    fn with_unavailable(mut self, policy: RetryPolicy) -> Self {
        self.unavailable = policy;
        self
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .attribute(
                AttributeBuilder::string("id")
                    .description("Identifier assigned by WAFv2")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("name")
                    .description("Name of the rule group")
                    .required()
                    .force_new()
                    .validator(StringLengthValidator {
                        min: Some(1),
                        max: Some(128),
                    }),
            )
            .attribute(
                AttributeBuilder::string("scope")
                    .description("Whether the rule group is REGIONAL or CLOUDFRONT scoped")
                    .required()
                    .force_new()
                    .validator(OneOfValidator {
                        allowed: vec!["REGIONAL", "CLOUDFRONT"],
                    }),
            )
            .attribute(
                AttributeBuilder::number("capacity")
                    .description("Web ACL capacity units consumed by the rule group")
                    .required()
                    .force_new()
                    .validator(NumberRangeValidator {
                        min: Some(1.0),
                        max: None,
                    }),
            )
            .attribute(
                AttributeBuilder::string("description")
                    .description("Description of the rule group")
                    .optional(),
            )
            .attribute(
                AttributeBuilder::list("rule", AttributeType::Dynamic)
                    .description("Rules evaluated by the rule group, in priority order")
                    .optional(),
            )
            .attribute(
                AttributeBuilder::object(
                    "visibility_config",
                    HashMap::from([
                        ("cloudwatch_metrics_enabled".to_string(), AttributeType::Bool),
                        ("metric_name".to_string(), AttributeType::String),
                        ("sampled_requests_enabled".to_string(), AttributeType::Bool),
                    ]),
                )
                .description("CloudWatch metrics and sampling settings")
                .required(),
            )
            .attribute(
                AttributeBuilder::string("arn")
                    .description("ARN of the rule group")
                    .computed(),
            )
            .attribute(
                AttributeBuilder::string("lock_token")
                    .description("Optimistic-lock token from the last read")
                    .computed(),
            )
            .build()
    }

    fn create_input(config: &Config) -> Result<CreateRuleGroup> {
        Ok(CreateRuleGroup {
            name: config.get_string("name")?,
            scope: config.get_string("scope")?,
            capacity: config.get_i64("capacity")?,
            description: config.optional_string("description")?,
            rules: rules_from_config(config)?,
            visibility_config: visibility_from_map(
                &config.get_map("visibility_config")?,
                "visibility_config",
            )?,
        })
    }

    fn detail_to_state(detail: &RuleGroupDetail, scope: &str) -> State {
        let mut state = State::new();
        state.set_id(&detail.id);
        state.set_string("name", &detail.name);
        state.set_string("scope", scope);
        state.set_i64("capacity", detail.capacity);
        if let Some(description) = &detail.description {
            state.set_string("description", description);
        }
        state.set(
            "rule",
            Value::List(detail.rules.iter().map(rule_to_value).collect()),
        );
        state.set(
            "visibility_config",
            visibility_to_value(&detail.visibility_config),
        );
        state.set_string("arn", &detail.arn);
        state.set_string("lock_token", &detail.lock_token);
        state
    }

    async fn refresh(&self, name: &str, scope: &str, id: &str) -> Result<State> {
        let detail = self
            .registry
            .wafv2
            .get_rule_group(name, scope, id)
            .await
            .map_err(|e| TfError::remote(format!("reading WAFv2 rule group {}", name), e))?;
        Ok(Self::detail_to_state(&detail, scope))
    }
}

fn rules_from_config(config: &Config) -> Result<Vec<WafRule>> {
    let Some(items) = config.optional_list("rule")? else {
        return Ok(Vec::new());
    };
    items.iter().map(rule_from_value).collect()
}

fn map_field<'a>(map: &'a HashMap<String, Value>, key: &str, path: &str) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| TfError::MissingAttribute(format!("{}.{}", path, key)))
}

fn rule_from_value(value: &Value) -> Result<WafRule> {
    let map = value.as_map().ok_or_else(|| TfError::TypeMismatch {
        attribute: "rule".to_string(),
        expected: "map",
        actual: value.type_name(),
    })?;

    let name = map_field(map, "name", "rule")?
        .as_str()
        .ok_or_else(|| TfError::InvalidConfiguration("rule.name must be a string".to_string()))?
        .to_string();
    let priority = map_field(map, "priority", "rule")?
        .as_i64()
        .ok_or_else(|| {
            TfError::InvalidConfiguration("rule.priority must be a number".to_string())
        })?;
    let action = map_field(map, "action", "rule")?
        .as_str()
        .ok_or_else(|| TfError::InvalidConfiguration("rule.action must be a string".to_string()))?;
    let action = match action {
        "allow" => RuleAction::Allow,
        "block" => RuleAction::Block,
        "count" => RuleAction::Count,
        other => {
            return Err(TfError::InvalidConfiguration(format!(
                "rule.action must be allow, block, or count, got '{}'",
                other
            )))
        }
    };
    let statement = Statement::from_value(map_field(map, "statement", "rule")?)?;
    let visibility_config = match map_field(map, "visibility_config", "rule")? {
        Value::Map(inner) => visibility_from_map(inner, "rule.visibility_config")?,
        other => {
            return Err(TfError::TypeMismatch {
                attribute: "rule.visibility_config".to_string(),
                expected: "map",
                actual: other.type_name(),
            })
        }
    };

    Ok(WafRule {
        name,
        priority,
        action,
        statement,
        visibility_config,
    })
}

fn rule_to_value(rule: &WafRule) -> Value {
    let mut map = HashMap::new();
    map.insert("name".to_string(), Value::String(rule.name.clone()));
    map.insert("priority".to_string(), Value::Number(rule.priority as f64));
    map.insert(
        "action".to_string(),
        Value::String(rule.action.as_str().to_string()),
    );
    map.insert("statement".to_string(), rule.statement.to_value());
    map.insert(
        "visibility_config".to_string(),
        visibility_to_value(&rule.visibility_config),
    );
    Value::Map(map)
}

fn visibility_from_map(map: &HashMap<String, Value>, path: &str) -> Result<WafVisibilityConfig> {
    let bool_field = |key: &str| -> Result<bool> {
        map_field(map, key, path)?.as_bool().ok_or_else(|| {
            TfError::InvalidConfiguration(format!("{}.{} must be a bool", path, key))
        })
    };
    let metric_name = map_field(map, "metric_name", path)?
        .as_str()
        .ok_or_else(|| {
            TfError::InvalidConfiguration(format!("{}.metric_name must be a string", path))
        })?
        .to_string();

    Ok(WafVisibilityConfig {
        cloudwatch_metrics_enabled: bool_field("cloudwatch_metrics_enabled")?,
        metric_name,
        sampled_requests_enabled: bool_field("sampled_requests_enabled")?,
    })
}

fn visibility_to_value(vis: &WafVisibilityConfig) -> Value {
    let mut map = HashMap::new();
    map.insert(
        "cloudwatch_metrics_enabled".to_string(),
        Value::Bool(vis.cloudwatch_metrics_enabled),
    );
    map.insert(
        "metric_name".to_string(),
        Value::String(vis.metric_name.clone()),
    );
    map.insert(
        "sampled_requests_enabled".to_string(),
        Value::Bool(vis.sampled_requests_enabled),
    );
    Value::Map(map)
}

#[async_trait]
impl Resource for RuleGroupResource {
    fn type_name(&self) -> &str {
        "aws_wafv2_rule_group"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, config: Config) -> Result<State> {
        self.validate(&config).into_result()?;
        let input = Self::create_input(&config)?;
        tracing::info!(name = %input.name, scope = %input.scope, "creating WAFv2 rule group");

        // Referenced entities (IP sets, regex pattern sets) may still be
        // propagating when the rule group first references them.
        let summary = retry_on(&self.unavailable, AwsError::is_retryable, || {
            let input = input.clone();
            async move { self.registry.wafv2.create_rule_group(input).await }
        })
        .await
        .map_err(|e| TfError::remote(format!("creating WAFv2 rule group {}", input.name), e))?;

        self.refresh(&input.name, &input.scope, &summary.id).await
    }

    async fn read(&self, state: State) -> Result<Option<State>> {
        let name = state.get_string("name")?;
        let scope = state.get_string("scope")?;
        let id = state.id()?;
        match self.registry.wafv2.get_rule_group(&name, &scope, &id).await {
            Ok(detail) => Ok(Some(Self::detail_to_state(&detail, &scope))),
            Err(e) if e.is_not_found() => {
                tracing::warn!(name = %name, "WAFv2 rule group gone from remote, removing from state");
                Ok(None)
            }
            Err(e) => Err(TfError::remote(
                format!("reading WAFv2 rule group {}", name),
                e,
            )),
        }
    }

    async fn update(&self, prior: State, config: Config) -> Result<State> {
        self.validate(&config).into_result()?;
        let input = UpdateRuleGroup {
            name: prior.get_string("name")?,
            scope: prior.get_string("scope")?,
            id: prior.id()?,
            description: config.optional_string("description")?,
            rules: rules_from_config(&config)?,
            visibility_config: visibility_from_map(
                &config.get_map("visibility_config")?,
                "visibility_config",
            )?,
            lock_token: prior.get_string("lock_token")?,
        };

        retry_on(&self.unavailable, AwsError::is_retryable, || {
            let input = input.clone();
            async move { self.registry.wafv2.update_rule_group(input).await }
        })
        .await
        .map_err(|e| TfError::remote(format!("updating WAFv2 rule group {}", input.name), e))?;

        self.refresh(&input.name, &input.scope, &input.id).await
    }

    async fn delete(&self, state: State) -> Result<()> {
        let name = state.get_string("name")?;
        let scope = state.get_string("scope")?;
        let id = state.id()?;
        let lock_token = state.get_string("lock_token")?;
        match self
            .registry
            .wafv2
            .delete_rule_group(&name, &scope, &id, &lock_token)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::debug!(name = %name, "WAFv2 rule group already deleted");
                Ok(())
            }
            Err(e) => Err(TfError::remote(
                format!("deleting WAFv2 rule group {}", name),
                e,
            )),
        }
    }
}
