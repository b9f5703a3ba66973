//! Production client implementations over the AWS SDK
//!
//! This module is the only place that touches SDK types. It owns the
//! mapping from SDK service errors into the [`AwsError`] taxonomy and the
//! conversion between the typed WAFv2 statement model and SDK statement
//! structs.

use super::{
    AwsError, CallerIdentity, ClientRegistry, CreateRole, CreateRuleGroup, IamApi, Outpost,
    OutpostsApi, Role, RuleAction, RuleGroupDetail, RuleGroupSummary, StsApi, UpdateRuleGroup,
    WafRule, WafVisibilityConfig, Wafv2Api,
};
use crate::resources::wafv2::statement::{
    ByteMatch, FieldToMatch, GeoMatch, IpSetReference, Statement, TextTransformation,
};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_wafv2::types as waf;
use aws_smithy_types::date_time::Format;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use aws_smithy_types::error::operation::BuildError;
use aws_smithy_types::Blob;
use std::collections::HashMap;
use std::sync::Arc;

/// Build the provider-scoped client registry from the resolved provider
/// configuration. Credentials come from the default chain; region must be
/// resolvable or configuration fails.
pub async fn build_registry(
    region: Option<String>,
    profile: Option<String>,
    max_retries: Option<u32>,
) -> Result<ClientRegistry, AwsError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region));
    }
    if let Some(profile) = &profile {
        loader = loader.profile_name(profile);
    }
    if let Some(max_retries) = max_retries {
        loader = loader.retry_config(RetryConfig::standard().with_max_attempts(max_retries));
    }
    let config = loader.load().await;
    if config.region().is_none() {
        return Err(AwsError::Config(
            "no AWS region configured; set the provider 'region' attribute or the AWS_REGION environment variable".to_string(),
        ));
    }
    tracing::debug!(region = ?config.region(), "built AWS client registry");

    Ok(ClientRegistry {
        sts: Arc::new(SdkSts {
            client: aws_sdk_sts::Client::new(&config),
        }),
        iam: Arc::new(SdkIam {
            client: aws_sdk_iam::Client::new(&config),
        }),
        outposts: Arc::new(SdkOutposts {
            client: aws_sdk_outposts::Client::new(&config),
        }),
        wafv2: Arc::new(SdkWafv2 {
            client: aws_sdk_wafv2::Client::new(&config),
        }),
    })
}

/// Classify an SDK error by its service error code. Everything the
/// taxonomy does not single out propagates with code and message intact.
fn classify<E>(err: E) -> AwsError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    let code = err.code().unwrap_or("").to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err));

    match code.as_str() {
        "NoSuchEntity"
        | "NoSuchEntityException"
        | "NotFoundException"
        | "ResourceNotFoundException"
        | "WAFNonexistentItemException" => AwsError::NotFound { message },
        "Throttling" | "ThrottlingException" | "TooManyRequestsException"
        | "RequestLimitExceeded" => AwsError::Throttled { message },
        "WAFUnavailableEntityException" => AwsError::Propagation { message },
        // IAM reports a freshly created principal as malformed until it
        // has propagated.
        "MalformedPolicyDocument" | "MalformedPolicyDocumentException"
            if message.contains("Invalid principal") =>
        {
            AwsError::Propagation { message }
        }
        "" => AwsError::Api {
            code: "Unknown".to_string(),
            message,
        },
        _ => AwsError::Api { code, message },
    }
}

fn build_err(err: BuildError) -> AwsError {
    AwsError::Config(err.to_string())
}

struct SdkSts {
    client: aws_sdk_sts::Client,
}

#[async_trait]
impl StsApi for SdkSts {
    async fn get_caller_identity(&self) -> Result<CallerIdentity, AwsError> {
        let out = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(classify)?;
        Ok(CallerIdentity {
            account_id: out.account().unwrap_or_default().to_string(),
            arn: out.arn().unwrap_or_default().to_string(),
            user_id: out.user_id().unwrap_or_default().to_string(),
        })
    }
}

struct SdkOutposts {
    client: aws_sdk_outposts::Client,
}

#[async_trait]
impl OutpostsApi for SdkOutposts {
    async fn list_outposts(&self) -> Result<Vec<Outpost>, AwsError> {
        let mut outposts = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut req = self.client.list_outposts();
            if let Some(token) = &next_token {
                req = req.next_token(token);
            }
            let page = req.send().await.map_err(classify)?;
            for outpost in page.outposts() {
                outposts.push(Outpost {
                    id: outpost.outpost_id().unwrap_or_default().to_string(),
                    arn: outpost.outpost_arn().unwrap_or_default().to_string(),
                    owner_id: outpost.owner_id().unwrap_or_default().to_string(),
                    name: outpost.name().unwrap_or_default().to_string(),
                    availability_zone: outpost
                        .availability_zone()
                        .unwrap_or_default()
                        .to_string(),
                    availability_zone_id: outpost
                        .availability_zone_id()
                        .unwrap_or_default()
                        .to_string(),
                    site_id: outpost.site_id().unwrap_or_default().to_string(),
                    description: outpost.description().map(str::to_string),
                });
            }
            next_token = page.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(outposts)
    }
}

struct SdkIam {
    client: aws_sdk_iam::Client,
}

fn convert_role(role: &aws_sdk_iam::types::Role) -> Result<Role, AwsError> {
    // IAM returns the policy document URL-encoded.
    let raw_policy = role.assume_role_policy_document().unwrap_or_default();
    let assume_role_policy = urlencoding::decode(raw_policy)
        .map_err(|e| AwsError::Api {
            code: "InvalidPolicyEncoding".to_string(),
            message: e.to_string(),
        })?
        .into_owned();
    let create_date = role
        .create_date()
        .fmt(Format::DateTime)
        .map_err(|e| AwsError::Api {
            code: "InvalidTimestamp".to_string(),
            message: e.to_string(),
        })?;

    Ok(Role {
        name: role.role_name().to_string(),
        role_id: role.role_id().to_string(),
        arn: role.arn().to_string(),
        path: role.path().to_string(),
        create_date,
        assume_role_policy,
        description: role.description().map(str::to_string),
        max_session_duration: role.max_session_duration(),
        tags: role
            .tags()
            .iter()
            .map(|t| (t.key().to_string(), t.value().to_string()))
            .collect(),
    })
}

fn iam_tags(tags: &HashMap<String, String>) -> Result<Vec<aws_sdk_iam::types::Tag>, AwsError> {
    tags.iter()
        .map(|(k, v)| {
            aws_sdk_iam::types::Tag::builder()
                .key(k)
                .value(v)
                .build()
                .map_err(build_err)
        })
        .collect()
}

#[async_trait]
impl IamApi for SdkIam {
    async fn create_role(&self, input: CreateRole) -> Result<Role, AwsError> {
        let mut req = self
            .client
            .create_role()
            .role_name(&input.name)
            .assume_role_policy_document(&input.assume_role_policy);
        if let Some(path) = &input.path {
            req = req.path(path);
        }
        if let Some(description) = &input.description {
            req = req.description(description);
        }
        if let Some(duration) = input.max_session_duration {
            req = req.max_session_duration(duration);
        }
        if !input.tags.is_empty() {
            req = req.set_tags(Some(iam_tags(&input.tags)?));
        }

        let out = req.send().await.map_err(classify)?;
        let role = out.role().ok_or_else(|| AwsError::Api {
            code: "MissingRole".to_string(),
            message: "CreateRole response did not include a role".to_string(),
        })?;
        convert_role(role)
    }

    async fn get_role(&self, name: &str) -> Result<Role, AwsError> {
        let out = self
            .client
            .get_role()
            .role_name(name)
            .send()
            .await
            .map_err(classify)?;
        let role = out.role().ok_or_else(|| AwsError::NotFound {
            message: format!("IAM role {} not found", name),
        })?;
        convert_role(role)
    }

    async fn update_role(
        &self,
        name: &str,
        description: Option<String>,
        max_session_duration: Option<i32>,
    ) -> Result<(), AwsError> {
        // An omitted Description leaves the remote value in place, so a
        // cleared description is sent as an explicit empty string.
        let mut req = self
            .client
            .update_role()
            .role_name(name)
            .description(description.unwrap_or_default());
        if let Some(duration) = max_session_duration {
            req = req.max_session_duration(duration);
        }
        req.send().await.map_err(classify)?;
        Ok(())
    }

    async fn update_assume_role_policy(&self, name: &str, policy: &str) -> Result<(), AwsError> {
        self.client
            .update_assume_role_policy()
            .role_name(name)
            .policy_document(policy)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn tag_role(&self, name: &str, tags: &HashMap<String, String>) -> Result<(), AwsError> {
        self.client
            .tag_role()
            .role_name(name)
            .set_tags(Some(iam_tags(tags)?))
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn untag_role(&self, name: &str, keys: &[String]) -> Result<(), AwsError> {
        self.client
            .untag_role()
            .role_name(name)
            .set_tag_keys(Some(keys.to_vec()))
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> Result<(), AwsError> {
        self.client
            .delete_role()
            .role_name(name)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }
}

struct SdkWafv2 {
    client: aws_sdk_wafv2::Client,
}

fn statement_to_sdk(statement: &Statement) -> Result<waf::Statement, AwsError> {
    let builder = waf::Statement::builder();
    let builder = match statement {
        Statement::And(items) => builder.and_statement(
            waf::AndStatement::builder()
                .set_statements(Some(
                    items
                        .iter()
                        .map(statement_to_sdk)
                        .collect::<Result<Vec<_>, _>>()?,
                ))
                .build()
                .map_err(build_err)?,
        ),
        Statement::Or(items) => builder.or_statement(
            waf::OrStatement::builder()
                .set_statements(Some(
                    items
                        .iter()
                        .map(statement_to_sdk)
                        .collect::<Result<Vec<_>, _>>()?,
                ))
                .build()
                .map_err(build_err)?,
        ),
        Statement::Not(inner) => builder.not_statement(
            waf::NotStatement::builder()
                .statement(statement_to_sdk(inner)?)
                .build(),
        ),
        Statement::ByteMatch(m) => {
            let transformations = m
                .text_transformations
                .iter()
                .map(|t| {
                    waf::TextTransformation::builder()
                        .priority(t.priority as i32)
                        .r#type(waf::TextTransformationType::from(t.kind.as_str()))
                        .build()
                        .map_err(build_err)
                })
                .collect::<Result<Vec<_>, _>>()?;
            builder.byte_match_statement(
                waf::ByteMatchStatement::builder()
                    .search_string(Blob::new(m.search_string.as_bytes().to_vec()))
                    .positional_constraint(waf::PositionalConstraint::from(
                        m.positional_constraint.as_str(),
                    ))
                    .field_to_match(field_to_match_to_sdk(&m.field_to_match)?)
                    .set_text_transformations(Some(transformations))
                    .build()
                    .map_err(build_err)?,
            )
        }
        Statement::GeoMatch(m) => builder.geo_match_statement(
            waf::GeoMatchStatement::builder()
                .set_country_codes(Some(
                    m.country_codes
                        .iter()
                        .map(|c| waf::CountryCode::from(c.as_str()))
                        .collect(),
                ))
                .build(),
        ),
        Statement::IpSetReference(m) => builder.ip_set_reference_statement(
            waf::IpSetReferenceStatement::builder()
                .arn(&m.arn)
                .build()
                .map_err(build_err)?,
        ),
    };
    Ok(builder.build())
}

fn field_to_match_to_sdk(field: &FieldToMatch) -> Result<waf::FieldToMatch, AwsError> {
    let builder = waf::FieldToMatch::builder();
    let builder = match field {
        FieldToMatch::UriPath => builder.uri_path(waf::UriPath::builder().build()),
        FieldToMatch::QueryString => builder.query_string(waf::QueryString::builder().build()),
        FieldToMatch::Method => builder.method(waf::Method::builder().build()),
        FieldToMatch::Body => builder.body(waf::Body::builder().build()),
        FieldToMatch::SingleHeader { name } => builder.single_header(
            waf::SingleHeader::builder()
                .name(name)
                .build()
                .map_err(build_err)?,
        ),
    };
    Ok(builder.build())
}

fn statement_from_sdk(statement: &waf::Statement) -> Result<Statement, AwsError> {
    if let Some(and) = statement.and_statement() {
        return Ok(Statement::And(
            and.statements()
                .iter()
                .map(statement_from_sdk)
                .collect::<Result<Vec<_>, _>>()?,
        ));
    }
    if let Some(or) = statement.or_statement() {
        return Ok(Statement::Or(
            or.statements()
                .iter()
                .map(statement_from_sdk)
                .collect::<Result<Vec<_>, _>>()?,
        ));
    }
    if let Some(not) = statement.not_statement() {
        return Ok(Statement::Not(Box::new(statement_from_sdk(
            not.statement().ok_or_else(|| AwsError::Api {
                code: "MissingStatement".to_string(),
                message: "not statement missing inner statement".to_string(),
            })?,
        )?)));
    }
    if let Some(m) = statement.byte_match_statement() {
        return Ok(Statement::ByteMatch(ByteMatch {
            search_string: String::from_utf8_lossy(m.search_string().as_ref()).into_owned(),
            positional_constraint: m.positional_constraint().as_str().to_string(),
            field_to_match: field_to_match_from_sdk(m.field_to_match().ok_or_else(|| {
                AwsError::Api {
                    code: "MissingFieldToMatch".to_string(),
                    message: "byte match statement missing field_to_match".to_string(),
                }
            })?)?,
            text_transformations: m
                .text_transformations()
                .iter()
                .map(|t| TextTransformation {
                    priority: t.priority() as i64,
                    kind: t.r#type().as_str().to_string(),
                })
                .collect(),
        }));
    }
    if let Some(m) = statement.geo_match_statement() {
        return Ok(Statement::GeoMatch(GeoMatch {
            country_codes: m
                .country_codes()
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
        }));
    }
    if let Some(m) = statement.ip_set_reference_statement() {
        return Ok(Statement::IpSetReference(IpSetReference {
            arn: m.arn().to_string(),
        }));
    }
    Err(AwsError::Api {
        code: "UnsupportedStatement".to_string(),
        message: "rule statement type not supported by this provider".to_string(),
    })
}

fn field_to_match_from_sdk(field: &waf::FieldToMatch) -> Result<FieldToMatch, AwsError> {
    if field.uri_path().is_some() {
        return Ok(FieldToMatch::UriPath);
    }
    if field.query_string().is_some() {
        return Ok(FieldToMatch::QueryString);
    }
    if field.method().is_some() {
        return Ok(FieldToMatch::Method);
    }
    if field.body().is_some() {
        return Ok(FieldToMatch::Body);
    }
    if let Some(header) = field.single_header() {
        return Ok(FieldToMatch::SingleHeader {
            name: header.name().to_string(),
        });
    }
    Err(AwsError::Api {
        code: "UnsupportedFieldToMatch".to_string(),
        message: "field_to_match type not supported by this provider".to_string(),
    })
}

fn visibility_to_sdk(vis: &WafVisibilityConfig) -> Result<waf::VisibilityConfig, AwsError> {
    waf::VisibilityConfig::builder()
        .cloud_watch_metrics_enabled(vis.cloudwatch_metrics_enabled)
        .metric_name(&vis.metric_name)
        .sampled_requests_enabled(vis.sampled_requests_enabled)
        .build()
        .map_err(build_err)
}

fn visibility_from_sdk(vis: &waf::VisibilityConfig) -> WafVisibilityConfig {
    WafVisibilityConfig {
        cloudwatch_metrics_enabled: vis.cloud_watch_metrics_enabled(),
        metric_name: vis.metric_name().to_string(),
        sampled_requests_enabled: vis.sampled_requests_enabled(),
    }
}

fn rule_to_sdk(rule: &WafRule) -> Result<waf::Rule, AwsError> {
    let action = match rule.action {
        RuleAction::Allow => waf::RuleAction::builder()
            .allow(waf::AllowAction::builder().build())
            .build(),
        RuleAction::Block => waf::RuleAction::builder()
            .block(waf::BlockAction::builder().build())
            .build(),
        RuleAction::Count => waf::RuleAction::builder()
            .count(waf::CountAction::builder().build())
            .build(),
    };
    waf::Rule::builder()
        .name(&rule.name)
        .priority(rule.priority as i32)
        .action(action)
        .statement(statement_to_sdk(&rule.statement)?)
        .visibility_config(visibility_to_sdk(&rule.visibility_config)?)
        .build()
        .map_err(build_err)
}

fn rule_from_sdk(rule: &waf::Rule) -> Result<WafRule, AwsError> {
    let action = match rule.action() {
        Some(a) if a.block().is_some() => RuleAction::Block,
        Some(a) if a.count().is_some() => RuleAction::Count,
        _ => RuleAction::Allow,
    };
    Ok(WafRule {
        name: rule.name().to_string(),
        priority: rule.priority() as i64,
        action,
        statement: statement_from_sdk(rule.statement().ok_or_else(|| AwsError::Api {
            code: "MissingStatement".to_string(),
            message: "rule missing statement".to_string(),
        })?)?,
        visibility_config: visibility_from_sdk(rule.visibility_config().ok_or_else(|| {
            AwsError::Api {
                code: "MissingVisibilityConfig".to_string(),
                message: "rule missing visibility_config".to_string(),
            }
        })?),
    })
}

#[async_trait]
impl Wafv2Api for SdkWafv2 {
    async fn create_rule_group(
        &self,
        input: CreateRuleGroup,
    ) -> Result<RuleGroupSummary, AwsError> {
        let rules = input
            .rules
            .iter()
            .map(rule_to_sdk)
            .collect::<Result<Vec<_>, _>>()?;

        let out = self
            .client
            .create_rule_group()
            .name(&input.name)
            .scope(waf::Scope::from(input.scope.as_str()))
            .capacity(input.capacity)
            .set_description(input.description.clone())
            .set_rules(Some(rules))
            .visibility_config(visibility_to_sdk(&input.visibility_config)?)
            .send()
            .await
            .map_err(classify)?;

        let summary = out.summary().ok_or_else(|| AwsError::Api {
            code: "MissingSummary".to_string(),
            message: "CreateRuleGroup response did not include a summary".to_string(),
        })?;
        Ok(RuleGroupSummary {
            id: summary.id().unwrap_or_default().to_string(),
            arn: summary.arn().unwrap_or_default().to_string(),
            lock_token: summary.lock_token().unwrap_or_default().to_string(),
        })
    }

    async fn get_rule_group(
        &self,
        name: &str,
        scope: &str,
        id: &str,
    ) -> Result<RuleGroupDetail, AwsError> {
        let out = self
            .client
            .get_rule_group()
            .name(name)
            .scope(waf::Scope::from(scope))
            .id(id)
            .send()
            .await
            .map_err(classify)?;

        let group = out.rule_group().ok_or_else(|| AwsError::NotFound {
            message: format!("WAFv2 rule group {} not found", name),
        })?;
        Ok(RuleGroupDetail {
            id: group.id().to_string(),
            name: group.name().to_string(),
            arn: group.arn().to_string(),
            capacity: group.capacity(),
            description: group.description().map(str::to_string),
            rules: group
                .rules()
                .iter()
                .map(rule_from_sdk)
                .collect::<Result<Vec<_>, _>>()?,
            visibility_config: visibility_from_sdk(group.visibility_config().ok_or_else(
                || AwsError::Api {
                    code: "MissingVisibilityConfig".to_string(),
                    message: "rule group missing visibility_config".to_string(),
                },
            )?),
            lock_token: out.lock_token().unwrap_or_default().to_string(),
        })
    }

    async fn update_rule_group(&self, input: UpdateRuleGroup) -> Result<String, AwsError> {
        let rules = input
            .rules
            .iter()
            .map(rule_to_sdk)
            .collect::<Result<Vec<_>, _>>()?;

        let out = self
            .client
            .update_rule_group()
            .name(&input.name)
            .scope(waf::Scope::from(input.scope.as_str()))
            .id(&input.id)
            .set_description(input.description.clone())
            .set_rules(Some(rules))
            .visibility_config(visibility_to_sdk(&input.visibility_config)?)
            .lock_token(&input.lock_token)
            .send()
            .await
            .map_err(classify)?;
        Ok(out.next_lock_token().unwrap_or_default().to_string())
    }

    async fn delete_rule_group(
        &self,
        name: &str,
        scope: &str,
        id: &str,
        lock_token: &str,
    ) -> Result<(), AwsError> {
        self.client
            .delete_rule_group()
            .name(name)
            .scope(waf::Scope::from(scope))
            .id(id)
            .lock_token(lock_token)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }
}
