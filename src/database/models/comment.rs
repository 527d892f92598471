use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author: Uuid,
}

impl Comment {
    pub fn new(text: String, author: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            author,
        }
    }
}
