//! # Issue Tracker
//!
//! Issues are stored inside the execution aggregate. An issue is appended once and resolved
//! at most once; nothing else about it ever changes.

use tracing::debug;

use super::actions::{NewIssue, ResolveIssue};
use super::ExecutionError;
use crate::model::{Execution, ExecutionStatus, Issue, IssueId, IssueResolution, IssueScope};

impl Execution {
    pub fn find_issue(&self, issue_id: IssueId) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == issue_id)
    }

    /// Appends an unresolved issue reported by `reported_by`.
    pub fn report_issue(
        &mut self,
        new: NewIssue,
        reported_by: &str,
    ) -> Result<IssueId, ExecutionError> {
        if matches!(
            self.status,
            ExecutionStatus::Completed | ExecutionStatus::Cancelled
        ) {
            return Err(ExecutionError::Precondition(format!(
                "issues cannot be reported on a {} execution",
                self.status
            )));
        }
        if new.description.trim().is_empty() {
            return Err(ExecutionError::Validation("description is required".to_string()));
        }
        if let Some(location) = &new.location {
            location.validate().map_err(ExecutionError::Validation)?;
        }
        let scoped = match new.scope {
            IssueScope::Delivery(id) => Some(id),
            IssueScope::Execution => None,
        };
        if let Some(foreign) = scoped
            .iter()
            .chain(new.affected_deliveries.iter())
            .find(|id| !self.delivery_ids.contains(id))
        {
            return Err(ExecutionError::Validation(format!(
                "{foreign} does not belong to execution {}",
                self.id
            )));
        }

        let id = IssueId::new();
        debug!(%id, severity = ?new.severity, "Issue reported");
        self.issues.push(Issue {
            id,
            scope: new.scope,
            issue_type: new.issue_type,
            severity: new.severity,
            description: new.description,
            location: new.location,
            affected_deliveries: new.affected_deliveries,
            reported_at: new.reported_at,
            reported_by: reported_by.to_string(),
            resolution: None,
        });
        Ok(id)
    }

    /// Resolves an open issue. A second resolution is a duplicate.
    pub fn resolve_issue(
        &mut self,
        resolve: ResolveIssue,
        resolved_by: &str,
    ) -> Result<IssueId, ExecutionError> {
        let issue = self
            .issues
            .iter_mut()
            .find(|issue| issue.id == resolve.issue_id)
            .ok_or_else(|| ExecutionError::NotFound(resolve.issue_id.to_string()))?;

        if let Some(resolution) = &issue.resolution {
            return Err(ExecutionError::DuplicateAction(format!(
                "issue {} already resolved at {}",
                issue.id, resolution.resolved_at
            )));
        }
        if resolve.notes.trim().is_empty() {
            return Err(ExecutionError::Validation("resolution notes are required".to_string()));
        }
        if resolve.resolved_at < issue.reported_at {
            return Err(ExecutionError::Validation(format!(
                "resolution ({}) precedes report ({})",
                resolve.resolved_at, issue.reported_at
            )));
        }

        issue.resolution = Some(IssueResolution {
            resolved_at: resolve.resolved_at,
            resolved_by: resolved_by.to_string(),
            notes: resolve.notes,
        });
        Ok(issue.id)
    }
}
