// src/models/group.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level organizational unit (faculty) students belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sub_groups: Vec<SubGroup>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Sub-division of a group (department).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubGroup {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Id of the owning group.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Group {
    /// Finds a department by id across this group.
    pub fn sub_group(&self, id: &str) -> Option<&SubGroup> {
        self.sub_groups.iter().find(|sg| sg.id == id)
    }
}
