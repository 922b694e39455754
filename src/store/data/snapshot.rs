use serde::{Deserialize, Serialize};

use crate::store::{DbCollectionIden, DbDocument, StoreIden};

/// A persisted process snapshot, keyed by process id.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub wid: String,
    pub status: String,
    pub data: String,
    pub timestamp: i64,
}

impl DbCollectionIden for Snapshot {
    fn iden() -> StoreIden {
        StoreIden::Snapshots
    }
}

impl DbDocument for Snapshot {
    fn id(&self) -> &str {
        &self.id
    }
}
