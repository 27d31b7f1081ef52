// src/models/course.rs

use serde::{Deserialize, Serialize};

/// Course a given assessment examines.
///
/// Only ever sourced from the course listing or the initial assessment
/// fetch; mutation endpoints never echo it back, so the view layer
/// carries it across snapshot replacements (see `view::merge_snapshot`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub code: String,
    pub title: String,
}
