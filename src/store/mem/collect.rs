use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use tracing::trace;

use crate::{
    GateflowError, Result, ShareLock,
    store::{DbCollection, DbDocument},
};

/// In-memory collection keyed by document id.
#[derive(Debug)]
pub struct Collect<T> {
    name: String,
    docs: ShareLock<BTreeMap<String, T>>,
}

impl<T> Collect<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            docs: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> DbCollection for Collect<T>
where
    T: DbDocument + Clone + Send + Sync,
{
    type Item = T;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        Ok(self.docs.read()?.contains_key(id))
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        self.docs.read()?.get(id).cloned().ok_or_else(|| GateflowError::Store(format!("{} not found in {}", id, self.name)))
    }

    fn list(&self) -> Result<Vec<Self::Item>> {
        Ok(self.docs.read()?.values().cloned().collect())
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("{}::create({})", self.name, data.id());
        let mut docs = self.docs.write()?;
        if docs.contains_key(data.id()) {
            return Err(GateflowError::Store(format!("{} already exists in {}", data.id(), self.name)));
        }
        docs.insert(data.id().to_string(), data.clone());
        Ok(true)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("{}::update({})", self.name, data.id());
        let mut docs = self.docs.write()?;
        match docs.get_mut(data.id()) {
            Some(doc) => {
                *doc = data.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("{}::delete({})", self.name, id);
        Ok(self.docs.write()?.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::data::Workflow;

    fn workflow(name: &str) -> Workflow {
        Workflow {
            id: "w1".to_string(),
            name: name.to_string(),
            desc: String::new(),
            data: "{}".to_string(),
            create_time: 1,
            update_time: 0,
        }
    }

    #[test]
    fn test_collect_crud() {
        let c = Collect::new("workflows");
        assert!(!c.exists("w1").unwrap());
        assert!(c.create(&workflow("a")).unwrap());
        assert!(c.create(&workflow("a")).is_err());
        assert!(c.update(&workflow("b")).unwrap());
        assert_eq!(c.find("w1").unwrap().name, "b");
        assert_eq!(c.list().unwrap().len(), 1);
        assert!(c.delete("w1").unwrap());
        assert!(!c.delete("w1").unwrap());
        assert!(matches!(c.find("w1"), Err(GateflowError::Store(_))));
    }
}
