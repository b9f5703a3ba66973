//! AWS service clients
//!
//! One client per AWS service, handed out by the provider-scoped
//! [`ClientRegistry`]. Adapters depend on the per-service traits, never on
//! SDK types directly; the [`sdk`] module provides the production
//! implementations and owns the mapping from SDK errors into the
//! [`AwsError`] taxonomy.

pub mod sdk;
#[cfg(test)]
pub(crate) mod stubs;

use crate::resources::wafv2::statement::Statement;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Classified AWS control-plane errors.
///
/// `NotFound` is treated as "clear state" on Read and success on Delete;
/// `Propagation` and `Throttled` are the retryable classes; everything else
/// propagates to the host with its original code and message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AwsError {
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("dependency not yet propagated: {message}")]
    Propagation { message: String },

    #[error("request throttled: {message}")]
    Throttled { message: String },

    #[error("{code}: {message}")]
    Api { code: String, message: String },

    #[error("client configuration error: {0}")]
    Config(String),
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Predicate for the eventual-consistency retry loops.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AwsError::Propagation { .. } | AwsError::Throttled { .. }
        )
    }
}

/// Response of sts:GetCallerIdentity.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub account_id: String,
    pub arn: String,
    pub user_id: String,
}

#[async_trait]
pub trait StsApi: Send + Sync {
    async fn get_caller_identity(&self) -> Result<CallerIdentity, AwsError>;
}

/// One Outpost as returned by outposts:ListOutposts.
#[derive(Debug, Clone)]
pub struct Outpost {
    pub id: String,
    pub arn: String,
    pub owner_id: String,
    pub name: String,
    pub availability_zone: String,
    pub availability_zone_id: String,
    pub site_id: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait OutpostsApi: Send + Sync {
    /// Full listing; pagination is handled inside the client.
    async fn list_outposts(&self) -> Result<Vec<Outpost>, AwsError>;
}

/// An IAM role projection.
#[derive(Debug, Clone)]
pub struct Role {
    pub name: String,
    pub role_id: String,
    pub arn: String,
    pub path: String,
    pub create_date: String,
    /// URL-decoded JSON policy document.
    pub assume_role_policy: String,
    pub description: Option<String>,
    pub max_session_duration: Option<i32>,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct CreateRole {
    pub name: String,
    pub assume_role_policy: String,
    pub path: Option<String>,
    pub description: Option<String>,
    pub max_session_duration: Option<i32>,
    pub tags: HashMap<String, String>,
}

#[async_trait]
pub trait IamApi: Send + Sync {
    async fn create_role(&self, input: CreateRole) -> Result<Role, AwsError>;
    async fn get_role(&self, name: &str) -> Result<Role, AwsError>;
    /// Batches description and session duration into iam:UpdateRole.
    async fn update_role(
        &self,
        name: &str,
        description: Option<String>,
        max_session_duration: Option<i32>,
    ) -> Result<(), AwsError>;
    async fn update_assume_role_policy(&self, name: &str, policy: &str) -> Result<(), AwsError>;
    async fn tag_role(&self, name: &str, tags: &HashMap<String, String>) -> Result<(), AwsError>;
    async fn untag_role(&self, name: &str, keys: &[String]) -> Result<(), AwsError>;
    async fn delete_role(&self, name: &str) -> Result<(), AwsError>;
}

/// Terminal action of a WAFv2 rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    Allow,
    Block,
    Count,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Allow => "allow",
            RuleAction::Block => "block",
            RuleAction::Count => "count",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WafVisibilityConfig {
    pub cloudwatch_metrics_enabled: bool,
    pub metric_name: String,
    pub sampled_requests_enabled: bool,
}

/// One rule in a WAFv2 rule group, with its typed statement tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WafRule {
    pub name: String,
    pub priority: i64,
    pub action: RuleAction,
    pub statement: Statement,
    pub visibility_config: WafVisibilityConfig,
}

#[derive(Debug, Clone)]
pub struct CreateRuleGroup {
    pub name: String,
    pub scope: String,
    pub capacity: i64,
    pub description: Option<String>,
    pub rules: Vec<WafRule>,
    pub visibility_config: WafVisibilityConfig,
}

#[derive(Debug, Clone)]
pub struct UpdateRuleGroup {
    pub name: String,
    pub scope: String,
    pub id: String,
    pub description: Option<String>,
    pub rules: Vec<WafRule>,
    pub visibility_config: WafVisibilityConfig,
    pub lock_token: String,
}

/// What wafv2:CreateRuleGroup returns.
#[derive(Debug, Clone)]
pub struct RuleGroupSummary {
    pub id: String,
    pub arn: String,
    pub lock_token: String,
}

/// Full remote projection from wafv2:GetRuleGroup.
#[derive(Debug, Clone)]
pub struct RuleGroupDetail {
    pub id: String,
    pub name: String,
    pub arn: String,
    pub capacity: i64,
    pub description: Option<String>,
    pub rules: Vec<WafRule>,
    pub visibility_config: WafVisibilityConfig,
    pub lock_token: String,
}

#[async_trait]
pub trait Wafv2Api: Send + Sync {
    async fn create_rule_group(
        &self,
        input: CreateRuleGroup,
    ) -> Result<RuleGroupSummary, AwsError>;
    async fn get_rule_group(
        &self,
        name: &str,
        scope: &str,
        id: &str,
    ) -> Result<RuleGroupDetail, AwsError>;
    /// Returns the next lock token.
    async fn update_rule_group(&self, input: UpdateRuleGroup) -> Result<String, AwsError>;
    async fn delete_rule_group(
        &self,
        name: &str,
        scope: &str,
        id: &str,
        lock_token: &str,
    ) -> Result<(), AwsError>;
}

/// Provider-scoped client cache, passed into every adapter by the provider
/// instead of living in package-level state.
#[derive(Clone)]
pub struct ClientRegistry {
    pub sts: Arc<dyn StsApi>,
    pub iam: Arc<dyn IamApi>,
    pub outposts: Arc<dyn OutpostsApi>,
    pub wafv2: Arc<dyn Wafv2Api>,
}
