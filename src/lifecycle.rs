// src/lifecycle.rs

use chrono::NaiveDate;

use crate::{
    api::{AssessmentPatch, RemoteSync},
    error::AdminError,
    models::assessment::{Assessment, RunState, Visibility},
};

/// Default reason recorded when staff end a run without entering one.
pub const DEFAULT_END_REASON: &str = "Ended by administrator";

/// Drives the assessment state machine.
///
/// Every operation follows the same shape: validate locally, issue one
/// atomic remote call, and hand back the server's authoritative
/// assessment for the view to merge. On failure nothing is mutated, so
/// the caller's snapshot stays at the last known-good server state.
pub struct LifecycleController<'a> {
    sync: &'a dyn RemoteSync,
}

impl<'a> LifecycleController<'a> {
    pub fn new(sync: &'a dyn RemoteSync) -> Self {
        Self { sync }
    }

    pub async fn set_visibility(
        &self,
        current: &Assessment,
        status: Visibility,
    ) -> Result<Assessment, AdminError> {
        let patch = AssessmentPatch {
            status: Some(status),
            ..AssessmentPatch::default()
        };

        tracing::info!(id = %current.id, status = status.as_str(), "updating visibility");
        self.sync.update_assessment(&current.id, &patch).await
    }

    /// Parses staff input for the exam clock. Non-numeric and
    /// non-positive values are rejected before any network call.
    pub async fn set_duration(
        &self,
        current: &Assessment,
        raw_minutes: &str,
    ) -> Result<Assessment, AdminError> {
        let minutes: i64 = raw_minutes.trim().parse().map_err(|_| {
            AdminError::Validation("duration must be a whole number of minutes".to_string())
        })?;
        if minutes <= 0 {
            return Err(AdminError::Validation(
                "duration must be a positive number of minutes".to_string(),
            ));
        }

        let patch = AssessmentPatch {
            time_limit: Some(minutes),
            ..AssessmentPatch::default()
        };

        tracing::info!(id = %current.id, minutes, "updating time limit");
        self.sync.update_assessment(&current.id, &patch).await
    }

    pub async fn set_start_date(
        &self,
        current: &Assessment,
        raw_date: &str,
    ) -> Result<Assessment, AdminError> {
        let patch = AssessmentPatch {
            start_date: Some(parse_date(raw_date)?),
            ..AssessmentPatch::default()
        };

        self.sync.update_assessment(&current.id, &patch).await
    }

    pub async fn set_due_date(
        &self,
        current: &Assessment,
        raw_date: &str,
    ) -> Result<Assessment, AdminError> {
        let patch = AssessmentPatch {
            due_date: Some(parse_date(raw_date)?),
            ..AssessmentPatch::default()
        };

        self.sync.update_assessment(&current.id, &patch).await
    }

    /// Toggles `authorizedToStart`. Ending is the only terminal path,
    /// so toggling an already-ended assessment is a no-op: the current
    /// snapshot is returned unchanged and no request is issued.
    pub async fn authorize(&self, current: &Assessment) -> Result<Assessment, AdminError> {
        if current.end_reason.is_some() {
            tracing::warn!(id = %current.id, "authorize ignored: assessment already ended");
            return Ok(current.clone());
        }

        tracing::info!(
            id = %current.id,
            authorized = current.authorized_to_start,
            "toggling authorization"
        );
        self.sync.authorize_assessment(&current.id).await
    }

    /// Ends the run, terminally. Only an ongoing assessment can end;
    /// a second end is rejected here, before any network call.
    pub async fn end(
        &self,
        current: &Assessment,
        reason: Option<&str>,
    ) -> Result<Assessment, AdminError> {
        match current.run_state() {
            RunState::Ended => {
                return Err(AdminError::Validation(
                    "assessment has already ended".to_string(),
                ));
            }
            RunState::NotStarted => {
                return Err(AdminError::Validation(
                    "cannot end an assessment that was never started".to_string(),
                ));
            }
            RunState::Ongoing => {}
        }

        let reason = reason.unwrap_or(DEFAULT_END_REASON);
        tracing::info!(id = %current.id, reason, "ending assessment");
        self.sync.end_assessment(&current.id, Some(reason)).await
    }

    /// Permanently removes the assessment. Irreversible; the caller is
    /// expected to navigate away from the detail view afterwards.
    pub async fn delete(&self, current: &Assessment) -> Result<(), AdminError> {
        tracing::info!(id = %current.id, "deleting assessment");
        self.sync.delete_assessment(&current.id).await
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AdminError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AdminError::Validation(format!("'{}' is not a valid date (expected YYYY-MM-DD)", raw))
    })
}
