//! Full lifecycle test against an in-memory remote service
//!
//! Exercises the adapter contract end to end: round-trip fidelity of
//! Create followed by Read, drift detection when the remote entity
//! disappears, idempotent delete, and force-new replacement planning.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tfcore::plan::{plan, PlannedAction};
use tfcore::resource::Resource;
use tfcore::schema::{AttributeBuilder, Schema, SchemaBuilder};
use tfcore::types::{AttributeMap, Config, State};
use tfcore::{Result, TfError};

/// The "remote service": a mutable map of entities keyed by name.
#[derive(Clone, Default)]
struct FakeService {
    entities: Arc<Mutex<HashMap<String, FakeEntity>>>,
}

#[derive(Clone)]
struct FakeEntity {
    name: String,
    description: Option<String>,
    arn: String,
}

impl FakeService {
    fn put(&self, entity: FakeEntity) {
        self.entities
            .lock()
            .unwrap()
            .insert(entity.name.clone(), entity);
    }

    fn get(&self, name: &str) -> Option<FakeEntity> {
        self.entities.lock().unwrap().get(name).cloned()
    }

    fn remove(&self, name: &str) -> bool {
        self.entities.lock().unwrap().remove(name).is_some()
    }
}

struct BucketResource {
    service: FakeService,
}

impl BucketResource {
    fn schema_static() -> Schema {
        SchemaBuilder::new()
            .attribute(AttributeBuilder::string("id").computed())
            .attribute(AttributeBuilder::string("name").required().force_new())
            .attribute(AttributeBuilder::string("description").optional())
            .attribute(AttributeBuilder::string("arn").computed())
            .build()
    }

    fn to_state(&self, entity: &FakeEntity) -> State {
        let mut state = AttributeMap::new();
        state.set_id(entity.name.clone());
        state.set_string("name", entity.name.clone());
        if let Some(d) = &entity.description {
            state.set_string("description", d.clone());
        }
        state.set_string("arn", entity.arn.clone());
        state
    }
}

#[async_trait]
impl Resource for BucketResource {
    fn type_name(&self) -> &str {
        "fake_bucket"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, config: Config) -> Result<State> {
        self.validate(&config).into_result()?;

        let name = config.get_string("name")?;
        let entity = FakeEntity {
            name: name.clone(),
            description: config.optional_string("description")?,
            arn: format!("arn:fake:::{}", name),
        };
        self.service.put(entity.clone());
        Ok(self.to_state(&entity))
    }

    async fn read(&self, state: State) -> Result<Option<State>> {
        let id = state.id()?;
        Ok(self.service.get(&id).map(|e| self.to_state(&e)))
    }

    async fn update(&self, prior: State, config: Config) -> Result<State> {
        let id = prior.id()?;
        let mut entity = self
            .service
            .get(&id)
            .ok_or_else(|| TfError::Message(format!("bucket {} not found", id)))?;
        entity.description = config.optional_string("description")?;
        self.service.put(entity.clone());
        Ok(self.to_state(&entity))
    }

    async fn delete(&self, state: State) -> Result<()> {
        // Already-gone deletes succeed.
        let _ = self.service.remove(&state.id()?);
        Ok(())
    }
}

fn config(name: &str, description: Option<&str>) -> Config {
    let mut config = AttributeMap::new();
    config.set_string("name", name);
    if let Some(d) = description {
        config.set_string("description", d);
    }
    config
}

#[tokio::test]
async fn read_after_create_round_trips_every_non_computed_field() {
    let resource = BucketResource {
        service: FakeService::default(),
    };
    let cfg = config("logs", Some("access logs"));

    let created = resource.create(cfg.clone()).await.unwrap();
    let read = resource.read(created).await.unwrap().unwrap();

    for (name, attr) in resource.schema().attributes {
        if attr.computed {
            continue;
        }
        assert_eq!(
            read.get(&name),
            cfg.get(&name),
            "round-trip mismatch for {}",
            name
        );
    }
    assert_eq!(read.id().unwrap(), "logs");
    assert_eq!(read.get_string("arn").unwrap(), "arn:fake:::logs");
}

#[tokio::test]
async fn create_fails_fast_on_invalid_config_without_remote_effect() {
    let service = FakeService::default();
    let resource = BucketResource {
        service: service.clone(),
    };

    let err = resource.create(AttributeMap::new()).await.unwrap_err();
    assert!(matches!(err, TfError::InvalidConfiguration(_)));
    assert!(service.entities.lock().unwrap().is_empty());
}

#[tokio::test]
async fn read_reports_remote_deletion_as_none() {
    let resource = BucketResource {
        service: FakeService::default(),
    };
    let state = resource.create(config("logs", None)).await.unwrap();

    // Entity vanishes out of band.
    resource.service.remove("logs");

    let read = resource.read(state).await.unwrap();
    assert!(read.is_none());
}

#[tokio::test]
async fn update_rewrites_in_place_attributes() {
    let resource = BucketResource {
        service: FakeService::default(),
    };
    let prior = resource.create(config("logs", Some("old"))).await.unwrap();

    let updated = resource
        .update(prior, config("logs", Some("new")))
        .await
        .unwrap();

    assert_eq!(updated.get_string("description").unwrap(), "new");
    assert_eq!(updated.id().unwrap(), "logs");
}

#[tokio::test]
async fn delete_twice_succeeds() {
    let resource = BucketResource {
        service: FakeService::default(),
    };
    let state = resource.create(config("logs", None)).await.unwrap();

    resource.delete(state.clone()).await.unwrap();
    resource.delete(state).await.unwrap();
}

#[tokio::test]
async fn changing_force_new_name_plans_replacement() {
    let resource = BucketResource {
        service: FakeService::default(),
    };
    let prior = resource.create(config("logs", None)).await.unwrap();
    let desired = config("metrics", None);

    match plan(&resource.schema(), Some(&prior), Some(&desired)) {
        PlannedAction::Replace { forced_by } => assert_eq!(forced_by, vec!["name".to_string()]),
        other => panic!("expected Replace, got {:?}", other),
    }

    let same = config("logs", None);
    assert_eq!(
        plan(&resource.schema(), Some(&prior), Some(&same)),
        PlannedAction::NoOp
    );
}
