// src/assignment.rs

use validator::Validate;

use crate::{
    api::{CohortAssignRequest, RemoteSync, StudentAssignRequest},
    error::AdminError,
    models::student::Student,
};

/// Academic levels an assessment can target.
pub const LEVELS: [&str; 5] = ["100", "200", "300", "400", "500"];

/// Raw cohort targeting form, exactly as staff submit it. Validated
/// here at the boundary before anything touches the network.
#[derive(Debug, Clone, Default, Validate)]
pub struct CohortInput {
    /// Mandatory for any cohort assignment.
    #[validate(custom(function = validate_level))]
    pub level: Option<String>,
    /// Faculty id; suppressed entirely when `department_only` is set.
    pub group: Option<String>,
    /// Department id, narrowing `group` to one department.
    pub sub_group: Option<String>,
    /// Target the department across any faculty.
    pub department_only: bool,
}

fn validate_level(level: &String) -> Result<(), validator::ValidationError> {
    if LEVELS.contains(&level.trim()) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unknown_level"))
    }
}

/// Translates staff targeting rules into audience mutations against
/// the remote API.
pub struct AssignmentResolver<'a> {
    sync: &'a dyn RemoteSync,
}

impl<'a> AssignmentResolver<'a> {
    pub fn new(sync: &'a dyn RemoteSync) -> Self {
        Self { sync }
    }

    /// Builds the outgoing cohort request body. Unset criteria are
    /// dropped from the body altogether (the API treats an empty
    /// string as a value, not an absence), and `department_only`
    /// strips `group` even when one was selected in the form.
    pub fn build_cohort_request(input: &CohortInput) -> Result<CohortAssignRequest, AdminError> {
        let level = non_blank(input.level.as_deref()).ok_or_else(|| {
            AdminError::Validation("a level is required for cohort assignment".to_string())
        })?;
        input.validate()?;

        let group = if input.department_only {
            None
        } else {
            non_blank(input.group.as_deref())
        };

        Ok(CohortAssignRequest {
            level,
            group,
            sub_group: non_blank(input.sub_group.as_deref()),
        })
    }

    /// Validates and submits a cohort assignment.
    pub async fn assign_cohort(
        &self,
        assessment_id: &str,
        input: &CohortInput,
    ) -> Result<(), AdminError> {
        let request = Self::build_cohort_request(input)?;

        tracing::info!(
            id = %assessment_id,
            level = %request.level,
            group = ?request.group,
            sub_group = ?request.sub_group,
            "assigning cohort"
        );
        self.sync.assign_cohort(assessment_id, &request).await
    }

    /// Looks a student up by registration number and adds them to the
    /// assessment's audience. Independent of, and additive to, cohort
    /// targeting. An unknown registration number is a local failure:
    /// no assignment request is issued.
    pub async fn assign_by_reg_number(
        &self,
        assessment_id: &str,
        reg_number: &str,
    ) -> Result<Student, AdminError> {
        let reg_number = reg_number.trim();
        if reg_number.is_empty() {
            return Err(AdminError::Validation(
                "a registration number is required".to_string(),
            ));
        }

        // The directory search matches loosely; only an exact
        // registration number counts as a hit.
        let candidates = self.sync.search_students_by_reg_number(reg_number).await?;
        let student = candidates
            .into_iter()
            .find(|s| s.reg_number.eq_ignore_ascii_case(reg_number))
            .ok_or_else(|| {
                AdminError::Validation(format!(
                    "no student found with registration number '{}'",
                    reg_number
                ))
            })?;

        let request = StudentAssignRequest {
            students: vec![student.id.clone()],
        };

        tracing::info!(
            id = %assessment_id,
            student = %student.id,
            reg_number = %student.reg_number,
            "assigning individual student"
        );
        self.sync.assign_students(assessment_id, &request).await?;

        Ok(student)
    }
}

/// Trims and drops empty strings so they never reach a request body.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
