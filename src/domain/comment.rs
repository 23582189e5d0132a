use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Author;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub author: Author,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
