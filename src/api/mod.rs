// src/api/mod.rs

pub mod http;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::AdminError,
    models::{assessment::Assessment, assessment::Visibility, group::Group, student::Student},
};

pub use http::HttpSync;

/// Partial assessment update. Only the fields actually being changed
/// are serialized: the API distinguishes an absent key from an empty
/// value, so every field skips serialization when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Cohort targeting request. `group` and `sub_group` must be omitted
/// entirely (never sent as empty strings) when unset; the resolver is
/// responsible for stripping `group` under department-only targeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortAssignRequest {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_group: Option<String>,
}

/// Individual student targeting, additive to any cohort rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAssignRequest {
    pub students: Vec<String>,
}

/// One roster file plus the group/department it enrolls into.
#[derive(Debug, Clone)]
pub struct RosterUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub group: String,
    pub sub_group: String,
}

/// The remote REST API the admin client drives. One method per wire
/// operation; implementations attach the bearer credential and unwrap
/// the `{ "data": ... }` response envelope.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn fetch_assessment(&self, id: &str) -> Result<Assessment, AdminError>;

    async fn fetch_groups(&self) -> Result<Vec<Group>, AdminError>;

    /// PATCH of changed fields only; returns the server's authoritative
    /// assessment.
    async fn update_assessment(
        &self,
        id: &str,
        patch: &AssessmentPatch,
    ) -> Result<Assessment, AdminError>;

    /// Toggles `authorizedToStart` server side.
    async fn authorize_assessment(&self, id: &str) -> Result<Assessment, AdminError>;

    /// Ends the run. A staff-supplied reason travels in the body; when
    /// absent the server records its own default.
    async fn end_assessment(
        &self,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Assessment, AdminError>;

    async fn delete_assessment(&self, id: &str) -> Result<(), AdminError>;

    async fn assign_cohort(
        &self,
        id: &str,
        request: &CohortAssignRequest,
    ) -> Result<(), AdminError>;

    async fn assign_students(
        &self,
        id: &str,
        request: &StudentAssignRequest,
    ) -> Result<(), AdminError>;

    /// Directory search; the server matches loosely, so callers must
    /// filter for an exact registration number themselves.
    async fn search_students_by_reg_number(
        &self,
        reg_number: &str,
    ) -> Result<Vec<Student>, AdminError>;

    /// Binary results export. A 400 here means the results are not
    /// prepared yet and maps to [`AdminError::NotReady`].
    async fn export_results(&self, id: &str) -> Result<Vec<u8>, AdminError>;

    /// Multipart roster upload; returns the server's summary message.
    async fn bulk_upload_students(&self, upload: RosterUpload) -> Result<String, AdminError>;
}
