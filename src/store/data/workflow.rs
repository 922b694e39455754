use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, DbDocument, StoreIden};

/// A deployed process model, kept as its JSON text.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub data: String,
    pub create_time: i64,
    pub update_time: i64,
}

impl DbCollectionIden for Workflow {
    fn iden() -> StoreIden {
        StoreIden::Workflows
    }
}

impl DbDocument for Workflow {
    fn id(&self) -> &str {
        &self.id
    }
}
