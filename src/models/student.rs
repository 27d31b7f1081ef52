// src/models/student.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Student roster entry.
///
/// `reg_number` is the human-facing lookup key staff type into the
/// assignment form; it is unique but distinct from `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub reg_number: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Ids of assessments this student has been assigned.
    #[serde(default)]
    pub assessments: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
