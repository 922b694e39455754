use std::{
    any::Any,
    collections::HashMap,
    convert::AsRef,
    sync::{Arc, RwLock},
};

use tracing::trace;

use crate::{
    GateflowError, Result, ShareLock,
    model::ProcessModel,
    runtime::ProcessSnapshot,
    utils,
};

use super::{DbCollection, DbCollectionIden, StoreIden, data::*};

#[derive(Clone)]
pub struct DynDbSetRef<T>(Arc<dyn DbCollection<Item = T>>);

pub struct Store {
    collections: ShareLock<HashMap<StoreIden, Arc<dyn Any + Send + Sync + 'static>>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn collection<DATA>(&self) -> Result<Arc<dyn DbCollection<Item = DATA>>>
    where
        DATA: DbCollectionIden + Send + Sync + 'static,
    {
        let collections = self.collections.read()?;
        collections
            .get(&DATA::iden())
            .and_then(|c| c.downcast_ref::<DynDbSetRef<DATA>>())
            .map(|v| v.0.clone())
            .ok_or_else(|| GateflowError::Store(format!("fail to get collection: {}", DATA::iden().as_ref())))
    }

    pub fn register<DATA>(
        &self,
        collection: Arc<dyn DbCollection<Item = DATA> + Send + Sync + 'static>,
    ) -> Result<()>
    where
        DATA: DbCollectionIden + 'static,
    {
        let mut collections = self.collections.write()?;
        collections.insert(DATA::iden(), Arc::new(DynDbSetRef::<DATA>(collection)));
        Ok(())
    }

    pub fn workflows(&self) -> Result<Arc<dyn DbCollection<Item = Workflow>>> {
        self.collection()
    }

    pub fn snapshots(&self) -> Result<Arc<dyn DbCollection<Item = Snapshot>>> {
        self.collection()
    }

    /// Insert or replace a process model.
    pub fn deploy(
        &self,
        model: &ProcessModel,
    ) -> Result<bool> {
        trace!("store::deploy({})", model.id);
        if model.id.is_empty() {
            return Err(GateflowError::Workflow("missing id in workflow".into()));
        }
        let workflows = self.workflows()?;
        let text = model.to_json()?;
        match workflows.find(&model.id) {
            Ok(m) => workflows.update(&Workflow {
                id: model.id.clone(),
                name: model.name.clone(),
                desc: model.desc.clone(),
                data: text,
                create_time: m.create_time,
                update_time: utils::time::time_millis(),
            }),
            Err(_) => workflows.create(&Workflow {
                id: model.id.clone(),
                name: model.name.clone(),
                desc: model.desc.clone(),
                data: text,
                create_time: utils::time::time_millis(),
                update_time: 0,
            }),
        }
    }

    /// Load a deployed process model.
    pub fn model(
        &self,
        id: &str,
    ) -> Result<ProcessModel> {
        let workflow = self.workflows()?.find(id)?;
        ProcessModel::from_json(&workflow.data)
    }

    /// Insert or replace the snapshot of a process.
    pub fn save_snapshot(
        &self,
        snapshot: &ProcessSnapshot,
    ) -> Result<bool> {
        trace!("store::save_snapshot({})", snapshot.id);
        let snapshots = self.snapshots()?;
        let data = Snapshot {
            id: snapshot.id.clone(),
            wid: snapshot.workflow_id.clone(),
            status: snapshot.status.as_ref().to_string(),
            data: snapshot.to_json()?,
            timestamp: utils::time::time_millis(),
        };
        if snapshots.exists(&data.id)? { snapshots.update(&data) } else { snapshots.create(&data) }
    }

    pub fn load_snapshot(
        &self,
        pid: &str,
    ) -> Result<ProcessSnapshot> {
        let snapshot = self.snapshots()?.find(pid)?;
        ProcessSnapshot::from_json(&snapshot.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DbStore, MemStore};

    #[test]
    fn test_missing_collection() {
        let store = Store::new();
        assert!(matches!(store.workflows(), Err(GateflowError::Store(_))));
    }

    #[test]
    fn test_deploy_twice_keeps_create_time() {
        let store = Store::new();
        MemStore::new().init(&store).unwrap();
        let model = ProcessModel::from_json(r#"{"id":"w1","activities":[{"id":"a"}],"flows":[]}"#).unwrap();

        store.deploy(&model).unwrap();
        let first = store.workflows().unwrap().find("w1").unwrap();
        store.deploy(&model).unwrap();
        let second = store.workflows().unwrap().find("w1").unwrap();

        assert_eq!(first.create_time, second.create_time);
        assert!(second.update_time > 0);
        assert_eq!(store.model("w1").unwrap().id, "w1");
    }
}
