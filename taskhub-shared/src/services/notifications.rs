/// Deadline warnings
///
/// One scan finds open tasks whose deadline falls inside the warning window
/// and mails each assignee. Nothing records that a warning went out, so a
/// task stays eligible on every scan until its deadline passes.
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::ServiceResult;
use crate::mailer::{templates, Mailer};
use crate::services::views::DeadlineScan;
use crate::store::Store;

/// Default warning window
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, clock: Arc<dyn Clock>) -> Self {
        Self { store, mailer, clock }
    }

    /// Warns assignees of open tasks due within `window`
    ///
    /// Individual send failures are logged and counted; only a store failure
    /// aborts the scan.
    pub async fn check_deadlines(&self, window: Duration) -> ServiceResult<DeadlineScan> {
        let now = self.clock.now();
        let tasks = self.store.list_tasks_due_between(now, now + window).await?;

        let mut scan = DeadlineScan {
            flagged: tasks.len(),
            ..Default::default()
        };

        if tasks.is_empty() {
            tracing::debug!("No tasks approaching their deadline");
            return Ok(scan);
        }

        let assignee_ids: Vec<Uuid> = tasks.iter().map(|t| t.assignee_id).collect();
        let assignees: HashMap<Uuid, _> = self
            .store
            .find_users(&assignee_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut project_names: HashMap<Uuid, String> = HashMap::new();

        for task in &tasks {
            let Some(assignee) = assignees.get(&task.assignee_id) else {
                tracing::warn!(task_id = %task.id, assignee_id = %task.assignee_id, "Assignee not found");
                scan.failed += 1;
                continue;
            };

            if !project_names.contains_key(&task.project_id) {
                let name = self
                    .store
                    .find_project(task.project_id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_default();
                project_names.insert(task.project_id, name);
            }
            let project_name = project_names
                .get(&task.project_id)
                .map(String::as_str)
                .unwrap_or_default();

            tracing::info!(
                task_id = %task.id,
                assignee = %assignee.email,
                deadline = %task.deadline,
                "Task approaching deadline"
            );

            let email = templates::deadline_warning(
                &assignee.email,
                &assignee.full_name,
                &task.title,
                project_name,
                task.deadline,
            );

            match self.mailer.send(email).await {
                Ok(()) => scan.notified += 1,
                Err(e) => {
                    tracing::warn!(task_id = %task.id, error = %e, "Deadline warning not sent");
                    scan.failed += 1;
                }
            }
        }

        tracing::info!(
            flagged = scan.flagged,
            notified = scan.notified,
            failed = scan.failed,
            "Deadline scan finished"
        );

        Ok(scan)
    }
}
