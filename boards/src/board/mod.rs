// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod access;
pub mod cascade;
pub mod filters;
pub mod model;
pub mod ordering;
pub mod projection;
mod service;

pub use service::{
    AssigneeInput, BoardService, ColumnRemoval, FolderRemoval, MemberInput, MoveTaskInput,
    NewColumn, NewFolder, NewProject, NewTask, PositionInput, ProjectRemoval, ProjectStatusInput,
    RenameColumn, TaskRemoval, TaskUpdate,
};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{CommitReport, DocumentStore, StoreError, UnitOfWork};
use futures_util::future::BoxFuture;

/// Attempts per mutation before a stale read is reported as a conflict.
pub(crate) const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Writes planned from one read of the store, plus what the caller needs
/// once they are committed.
pub(crate) struct Planned<T> {
    pub unit: UnitOfWork,
    pub outcome: T,
}

impl<T> Planned<T> {
    pub fn new(unit: UnitOfWork, outcome: T) -> Self {
        Self { unit, outcome }
    }
}

/// Plans and commits a unit of work, re-planning from fresh reads when the
/// store reports that the state the plan was built on has changed.
pub(crate) async fn commit_with_retry<'a, T>(
    store: &'a dyn DocumentStore,
    mut plan: impl FnMut() -> BoxFuture<'a, ServiceResult<Planned<T>>>,
) -> ServiceResult<(T, CommitReport)> {
    let mut attempt = 1;
    loop {
        let Planned { unit, outcome } = plan().await?;
        let label = unit.label.clone();
        match store.commit(unit).await {
            Ok(report) => {
                log::debug!(
                    "Committed '{}' ({} steps, atomic: {})",
                    label,
                    report.applied,
                    report.atomic
                );
                return Ok((outcome, report));
            }
            Err(StoreError::Stale(reason)) if attempt < MAX_COMMIT_ATTEMPTS => {
                log::debug!(
                    "Re-planning '{}' after stale read on attempt {}: {}",
                    label,
                    attempt,
                    reason
                );
                attempt += 1;
            }
            Err(err) => return Err(report_failure(&label, err)),
        }
    }
}

fn report_failure(label: &str, err: StoreError) -> ServiceError {
    match err {
        StoreError::Partial {
            applied,
            total,
            cause,
            ..
        } => {
            log::error!(
                "'{}' was partially applied: {} of {} steps succeeded before: {}",
                label,
                applied,
                total,
                cause
            );
            ServiceError::internal(format!(
                "Operation '{}' failed after {} of {} steps",
                label, applied, total
            ))
        }
        StoreError::Stale(reason) => {
            log::warn!(
                "Giving up on '{}' after {} attempts: {}",
                label,
                MAX_COMMIT_ATTEMPTS,
                reason
            );
            StoreError::Stale(reason).into()
        }
        other => {
            log::warn!("'{}' failed: {}", label, other);
            other.into()
        }
    }
}
