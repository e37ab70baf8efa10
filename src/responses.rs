//! Write acknowledgements returned by mutating endpoints.

use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<String>,
}

impl InsertAck {
    pub fn inserted(id: String) -> Self {
        Self {
            acknowledged: true,
            inserted_id: Some(id),
        }
    }

    /// Nothing was written, e.g. a duplicate registration
    pub fn rejected() -> Self {
        Self {
            acknowledged: false,
            inserted_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl From<bookstore_db::models::UpdateCount> for UpdateAck {
    fn from(count: bookstore_db::models::UpdateCount) -> Self {
        Self {
            acknowledged: true,
            matched_count: count.matched,
            modified_count: count.modified,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteAck {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}
