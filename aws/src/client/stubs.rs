//! Programmable in-memory clients for tests.
//!
//! Each stub holds a queue of canned responses per method and records the
//! arguments it was called with, so tests can script multi-call flows
//! (retry-until-propagated, read-after-update) and assert on what the
//! adapter actually sent.

use super::{
    AwsError, CallerIdentity, ClientRegistry, CreateRole, CreateRuleGroup, IamApi, Outpost,
    OutpostsApi, Role, RuleGroupDetail, RuleGroupSummary, StsApi, UpdateRuleGroup, Wafv2Api,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// FIFO queue of scripted results plus a consumed-call counter.
pub(crate) struct Responses<T> {
    queue: Mutex<VecDeque<Result<T, AwsError>>>,
    calls: AtomicUsize,
}

impl<T> Default for Responses<T> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T> Responses<T> {
    pub fn push(&self, result: Result<T, AwsError>) {
        self.queue.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn take(&self, method: &str) -> Result<T, AwsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(AwsError::Api {
                    code: "StubNotProgrammed".to_string(),
                    message: format!("no scripted response for {}", method),
                })
            })
    }

    /// For fire-and-forget methods where an unscripted call just succeeds.
    fn take_or_ok(&self, _method: &str) -> Result<T, AwsError>
    where
        T: Default,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(T::default()))
    }
}

#[derive(Default)]
pub(crate) struct StubSts {
    pub identity: Responses<CallerIdentity>,
}

impl StubSts {
    pub fn returning(identity: CallerIdentity) -> Self {
        let stub = Self::default();
        stub.identity.push(Ok(identity));
        stub
    }
}

#[async_trait]
impl StsApi for StubSts {
    async fn get_caller_identity(&self) -> Result<CallerIdentity, AwsError> {
        self.identity.take("get_caller_identity")
    }
}

#[derive(Default)]
pub(crate) struct StubOutposts {
    pub listings: Responses<Vec<Outpost>>,
}

impl StubOutposts {
    pub fn returning(outposts: Vec<Outpost>) -> Self {
        let stub = Self::default();
        stub.listings.push(Ok(outposts));
        stub
    }
}

#[async_trait]
impl OutpostsApi for StubOutposts {
    async fn list_outposts(&self) -> Result<Vec<Outpost>, AwsError> {
        self.listings.take("list_outposts")
    }
}

#[derive(Default)]
pub(crate) struct StubIam {
    pub create_role: Responses<Role>,
    pub get_role: Responses<Role>,
    pub update_role: Responses<()>,
    pub update_assume_role_policy: Responses<()>,
    pub tag_role: Responses<()>,
    pub untag_role: Responses<()>,
    pub delete_role: Responses<()>,
    pub created: Mutex<Vec<CreateRole>>,
    pub role_updates: Mutex<Vec<(Option<String>, Option<i32>)>>,
    pub updated_policies: Mutex<Vec<String>>,
    pub tagged: Mutex<Vec<HashMap<String, String>>>,
    pub untagged: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl IamApi for StubIam {
    async fn create_role(&self, input: CreateRole) -> Result<Role, AwsError> {
        self.created.lock().unwrap().push(input);
        self.create_role.take("create_role")
    }

    async fn get_role(&self, _name: &str) -> Result<Role, AwsError> {
        self.get_role.take("get_role")
    }

    async fn update_role(
        &self,
        _name: &str,
        description: Option<String>,
        max_session_duration: Option<i32>,
    ) -> Result<(), AwsError> {
        self.role_updates
            .lock()
            .unwrap()
            .push((description, max_session_duration));
        self.update_role.take_or_ok("update_role")
    }

    async fn update_assume_role_policy(&self, _name: &str, policy: &str) -> Result<(), AwsError> {
        self.updated_policies.lock().unwrap().push(policy.to_string());
        self.update_assume_role_policy
            .take_or_ok("update_assume_role_policy")
    }

    async fn tag_role(&self, _name: &str, tags: &HashMap<String, String>) -> Result<(), AwsError> {
        self.tagged.lock().unwrap().push(tags.clone());
        self.tag_role.take_or_ok("tag_role")
    }

    async fn untag_role(&self, _name: &str, keys: &[String]) -> Result<(), AwsError> {
        self.untagged.lock().unwrap().push(keys.to_vec());
        self.untag_role.take_or_ok("untag_role")
    }

    async fn delete_role(&self, _name: &str) -> Result<(), AwsError> {
        self.delete_role.take_or_ok("delete_role")
    }
}

#[derive(Default)]
pub(crate) struct StubWafv2 {
    pub create_rule_group: Responses<RuleGroupSummary>,
    pub get_rule_group: Responses<RuleGroupDetail>,
    pub update_rule_group: Responses<String>,
    pub delete_rule_group: Responses<()>,
    pub created: Mutex<Vec<CreateRuleGroup>>,
    pub updated: Mutex<Vec<UpdateRuleGroup>>,
    pub deleted_lock_tokens: Mutex<Vec<String>>,
}

#[async_trait]
impl Wafv2Api for StubWafv2 {
    async fn create_rule_group(
        &self,
        input: CreateRuleGroup,
    ) -> Result<RuleGroupSummary, AwsError> {
        self.created.lock().unwrap().push(input);
        self.create_rule_group.take("create_rule_group")
    }

    async fn get_rule_group(
        &self,
        _name: &str,
        _scope: &str,
        _id: &str,
    ) -> Result<RuleGroupDetail, AwsError> {
        self.get_rule_group.take("get_rule_group")
    }

    async fn update_rule_group(&self, input: UpdateRuleGroup) -> Result<String, AwsError> {
        self.updated.lock().unwrap().push(input);
        self.update_rule_group.take("update_rule_group")
    }

    async fn delete_rule_group(
        &self,
        _name: &str,
        _scope: &str,
        _id: &str,
        lock_token: &str,
    ) -> Result<(), AwsError> {
        self.deleted_lock_tokens
            .lock()
            .unwrap()
            .push(lock_token.to_string());
        self.delete_rule_group.take_or_ok("delete_rule_group")
    }
}

/// Registry wired to fresh, unscripted stubs. Tests swap in programmed
/// stubs for the services they drive.
pub(crate) fn stub_registry() -> ClientRegistry {
    ClientRegistry {
        sts: Arc::new(StubSts::default()),
        iam: Arc::new(StubIam::default()),
        outposts: Arc::new(StubOutposts::default()),
        wafv2: Arc::new(StubWafv2::default()),
    }
}
