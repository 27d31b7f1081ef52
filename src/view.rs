// src/view.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::{
    api::RemoteSync,
    assignment::{AssignmentResolver, CohortInput},
    error::AdminError,
    lifecycle::LifecycleController,
    models::{
        assessment::{Assessment, RunState, Visibility},
        group::Group,
        student::Student,
    },
};

/// Every distinct user action a view can have in flight. Request state
/// is tracked per operation, not through one global busy flag, so
/// unrelated controls stay usable while one request is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchPage,
    UpdateStatus,
    UpdateDuration,
    UpdateSchedule,
    Authorize,
    End,
    Delete,
    AssignCohort,
    AssignStudent,
    Export,
    BulkUpload,
}

/// State of one operation, rendered by the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OpState {
    #[default]
    Idle,
    Pending,
    Failed(String),
}

/// Per-operation request state for one mounted view.
#[derive(Debug, Default)]
pub struct OpTracker {
    states: HashMap<Operation, OpState>,
}

impl OpTracker {
    pub fn state(&self, op: Operation) -> &OpState {
        self.states.get(&op).unwrap_or(&OpState::Idle)
    }

    pub fn is_pending(&self, op: Operation) -> bool {
        *self.state(op) == OpState::Pending
    }

    pub fn start(&mut self, op: Operation) {
        self.states.insert(op, OpState::Pending);
    }

    pub fn complete(&mut self, op: Operation) {
        self.states.insert(op, OpState::Idle);
    }

    /// Cancellation is benign teardown, never a user-visible failure;
    /// everything else leaves the operation in a failed state for the
    /// user to re-trigger.
    pub fn fail(&mut self, op: Operation, err: &AdminError) {
        if err.is_cancelled() {
            self.states.insert(op, OpState::Idle);
        } else {
            self.states.insert(op, OpState::Failed(err.to_string()));
        }
    }
}

/// One cancellation signal per mounted view. Cancelling aborts every
/// request the view still has in flight, together.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    async fn cancelled(&self) {
        while !self.is_cancelled() {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                break;
            }
            notified.await;
        }
    }

    /// Races a request against this signal. A fired signal resolves to
    /// [`AdminError::Cancelled`] and the request future is dropped.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, AdminError>
    where
        F: Future<Output = Result<T, AdminError>>,
    {
        if self.is_cancelled() {
            return Err(AdminError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(AdminError::Cancelled),
            result = fut => result,
        }
    }
}

/// Replaces the local snapshot with a mutation response.
///
/// Responses replace the snapshot wholesale (last response wins), with
/// one documented exception: fields the mutation endpoints never echo
/// back survive from the previous snapshot. That whitelist is exactly
/// `course`, which is only sourced from the initial fetch.
pub fn merge_snapshot(prev: &Assessment, mut response: Assessment) -> Assessment {
    if response.course.is_none() {
        response.course = prev.course.clone();
    }
    response
}

/// List-view tab filter over the derived run state. `None` is the
/// "all assessments" tab.
pub fn filter_by_run_state(
    assessments: &[Assessment],
    state: Option<RunState>,
) -> Vec<&Assessment> {
    assessments
        .iter()
        .filter(|a| state.is_none_or(|s| a.run_state() == s))
        .collect()
}

/// The assessment detail view: exclusive owner of one assessment
/// snapshot plus the read-only groups list fetched alongside it.
pub struct DetailView {
    pub assessment: Option<Assessment>,
    pub groups: Vec<Group>,
    pub ops: OpTracker,
    cancel: CancelSignal,
}

impl DetailView {
    pub fn new() -> Self {
        Self {
            assessment: None,
            groups: Vec::new(),
            ops: OpTracker::default(),
            cancel: CancelSignal::new(),
        }
    }

    /// The signal a host hands to teardown logic; cancelling it aborts
    /// all of this view's outstanding requests.
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Called on navigation away.
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    /// Initial page load: the assessment and the groups reference data.
    pub async fn load(&mut self, sync: &dyn RemoteSync, id: &str) -> Result<(), AdminError> {
        self.ops.start(Operation::FetchPage);

        let result = self
            .cancel
            .run(async {
                let assessment = sync.fetch_assessment(id).await?;
                let groups = sync.fetch_groups().await?;
                Ok((assessment, groups))
            })
            .await;

        match result {
            Ok((assessment, groups)) => {
                self.assessment = Some(assessment);
                self.groups = groups;
                self.ops.complete(Operation::FetchPage);
                Ok(())
            }
            Err(err) => {
                self.ops.fail(Operation::FetchPage, &err);
                Err(err)
            }
        }
    }

    /// Replaces the snapshot with a server response, preserving the
    /// externally-sourced whitelist.
    pub fn apply_response(&mut self, response: Assessment) {
        self.assessment = Some(match &self.assessment {
            Some(prev) => merge_snapshot(prev, response),
            None => response,
        });
    }

    pub async fn set_visibility(
        &mut self,
        sync: &dyn RemoteSync,
        status: Visibility,
    ) -> Result<(), AdminError> {
        let current = self.snapshot()?;
        let controller = LifecycleController::new(sync);

        self.ops.start(Operation::UpdateStatus);
        let result = self.cancel.run(controller.set_visibility(&current, status)).await;
        self.settle(Operation::UpdateStatus, result)
    }

    pub async fn set_duration(
        &mut self,
        sync: &dyn RemoteSync,
        raw_minutes: &str,
    ) -> Result<(), AdminError> {
        let current = self.snapshot()?;
        let controller = LifecycleController::new(sync);

        self.ops.start(Operation::UpdateDuration);
        let result = self
            .cancel
            .run(controller.set_duration(&current, raw_minutes))
            .await;
        self.settle(Operation::UpdateDuration, result)
    }

    pub async fn set_start_date(
        &mut self,
        sync: &dyn RemoteSync,
        raw_date: &str,
    ) -> Result<(), AdminError> {
        let current = self.snapshot()?;
        let controller = LifecycleController::new(sync);

        self.ops.start(Operation::UpdateSchedule);
        let result = self
            .cancel
            .run(controller.set_start_date(&current, raw_date))
            .await;
        self.settle(Operation::UpdateSchedule, result)
    }

    pub async fn set_due_date(
        &mut self,
        sync: &dyn RemoteSync,
        raw_date: &str,
    ) -> Result<(), AdminError> {
        let current = self.snapshot()?;
        let controller = LifecycleController::new(sync);

        self.ops.start(Operation::UpdateSchedule);
        let result = self
            .cancel
            .run(controller.set_due_date(&current, raw_date))
            .await;
        self.settle(Operation::UpdateSchedule, result)
    }

    pub async fn authorize(&mut self, sync: &dyn RemoteSync) -> Result<(), AdminError> {
        let current = self.snapshot()?;
        let controller = LifecycleController::new(sync);

        self.ops.start(Operation::Authorize);
        let result = self.cancel.run(controller.authorize(&current)).await;
        self.settle(Operation::Authorize, result)
    }

    pub async fn end(
        &mut self,
        sync: &dyn RemoteSync,
        reason: Option<&str>,
    ) -> Result<(), AdminError> {
        let current = self.snapshot()?;
        let controller = LifecycleController::new(sync);

        self.ops.start(Operation::End);
        let result = self.cancel.run(controller.end(&current, reason)).await;
        self.settle(Operation::End, result)
    }

    /// Irreversible. On success the snapshot is cleared; the host is
    /// expected to navigate away.
    pub async fn delete(&mut self, sync: &dyn RemoteSync) -> Result<(), AdminError> {
        let current = self.snapshot()?;
        let controller = LifecycleController::new(sync);

        self.ops.start(Operation::Delete);
        let result = self.cancel.run(controller.delete(&current)).await;

        match result {
            Ok(()) => {
                self.assessment = None;
                self.ops.complete(Operation::Delete);
                Ok(())
            }
            Err(err) => {
                self.ops.fail(Operation::Delete, &err);
                Err(err)
            }
        }
    }

    pub async fn assign_cohort(
        &mut self,
        sync: &dyn RemoteSync,
        input: &CohortInput,
    ) -> Result<(), AdminError> {
        let current = self.snapshot()?;
        let resolver = AssignmentResolver::new(sync);

        self.ops.start(Operation::AssignCohort);
        let result = self.cancel.run(resolver.assign_cohort(&current.id, input)).await;

        match result {
            Ok(()) => {
                self.ops.complete(Operation::AssignCohort);
                Ok(())
            }
            Err(err) => {
                self.ops.fail(Operation::AssignCohort, &err);
                Err(err)
            }
        }
    }

    pub async fn assign_by_reg_number(
        &mut self,
        sync: &dyn RemoteSync,
        reg_number: &str,
    ) -> Result<Student, AdminError> {
        let current = self.snapshot()?;
        let resolver = AssignmentResolver::new(sync);

        self.ops.start(Operation::AssignStudent);
        let result = self
            .cancel
            .run(resolver.assign_by_reg_number(&current.id, reg_number))
            .await;

        match result {
            Ok(student) => {
                self.ops.complete(Operation::AssignStudent);
                Ok(student)
            }
            Err(err) => {
                self.ops.fail(Operation::AssignStudent, &err);
                Err(err)
            }
        }
    }

    /// Downloads the prepared results file. [`AdminError::NotReady`]
    /// carries its own user-facing message.
    pub async fn export_results(&mut self, sync: &dyn RemoteSync) -> Result<Vec<u8>, AdminError> {
        let current = self.snapshot()?;

        self.ops.start(Operation::Export);
        let result = self.cancel.run(sync.export_results(&current.id)).await;

        match result {
            Ok(bytes) => {
                self.ops.complete(Operation::Export);
                Ok(bytes)
            }
            Err(err) => {
                self.ops.fail(Operation::Export, &err);
                Err(err)
            }
        }
    }

    fn snapshot(&self) -> Result<Assessment, AdminError> {
        self.assessment
            .clone()
            .ok_or_else(|| AdminError::Validation("no assessment loaded".to_string()))
    }

    fn settle(
        &mut self,
        op: Operation,
        result: Result<Assessment, AdminError>,
    ) -> Result<(), AdminError> {
        match result {
            Ok(response) => {
                self.apply_response(response);
                self.ops.complete(op);
                Ok(())
            }
            Err(err) => {
                self.ops.fail(op, &err);
                Err(err)
            }
        }
    }
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new()
    }
}
