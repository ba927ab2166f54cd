use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A shared document administrators can grant, revoke or duplicate access to.
///
/// `key` is a short stable slug used inside control identifiers, so it must
/// not change between deployments or previously sent panels stop routing.
pub struct DocumentTarget {
    pub key: String,
    pub name: String,
    pub file_id: String,
}

impl DocumentTarget {
    pub fn new(key: impl Into<String>, name: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            file_id: file_id.into(),
        }
    }
}
