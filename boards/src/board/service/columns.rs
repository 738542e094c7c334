// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::inputs::{NewColumn, PositionInput, RenameColumn};
use super::{BoardService, validated};
use crate::board::cascade::ColumnRemoval;
use crate::board::model::{Column, ColumnId, ProjectId, UserId};
use crate::board::ordering::{ReorderPlan, append_index, is_dense, plan_reorder};
use crate::board::projection::{ColumnView, column_view};
use crate::board::{Planned, commit_with_retry};
use crate::error::ServiceResult;
use crate::store::{Document, Precondition, UnitOfWork, WriteOp};
use chrono::Utc;

impl BoardService {
    pub async fn create_column(
        &self,
        user: UserId,
        project_id: ProjectId,
        input: NewColumn,
    ) -> ServiceResult<ColumnView> {
        validated(&input)?;
        let access = self.gate.project(user, project_id).await?;
        let name = input.name.trim().to_string();
        let project_id = access.project.id;
        let (column, _) = commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_column_append(project_id, name.clone()))
        })
        .await?;
        log::debug!(
            "Column {} appended to project {} at {}",
            column.id,
            project_id,
            column.order_index
        );
        Ok(column_view(&column))
    }

    async fn plan_column_append(
        &self,
        project_id: ProjectId,
        name: String,
    ) -> ServiceResult<Planned<Column>> {
        let project = self.load_project(project_id).await?;
        let siblings = self.store.columns_in_project(project.id).await?;
        let indices: Vec<u32> = siblings.iter().map(|column| column.order_index).collect();
        let column = Column::new(name, project.id, append_index(&indices));

        let mut unit = UnitOfWork::new(format!("append column to project {}", project_id));
        unit.push(WriteOp::Check(Precondition::ProjectExists(project.id)))
            .push(WriteOp::Check(Precondition::ColumnCount {
                project_id,
                count: siblings.len(),
            }))
            .push(WriteOp::Insert(Document::Column(column.clone())));
        Ok(Planned::new(unit, column))
    }

    pub async fn list_columns(
        &self,
        user: UserId,
        project_id: ProjectId,
    ) -> ServiceResult<Vec<ColumnView>> {
        let access = self.gate.project(user, project_id).await?;
        let columns = self.store.columns_in_project(access.project.id).await?;
        Ok(columns.iter().map(column_view).collect())
    }

    pub async fn rename_column(
        &self,
        user: UserId,
        column_id: ColumnId,
        input: RenameColumn,
    ) -> ServiceResult<ColumnView> {
        validated(&input)?;
        self.gate.column(user, column_id).await?;
        let name = input.name.trim().to_string();
        let (column, _) = commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_column_rename(column_id, name.clone()))
        })
        .await?;
        Ok(column_view(&column))
    }

    async fn plan_column_rename(
        &self,
        column_id: ColumnId,
        name: String,
    ) -> ServiceResult<Planned<Column>> {
        let observed = self.load_column(column_id).await?;
        let mut column = observed.clone();
        column.name = name;
        column.updated_at = Utc::now();

        let mut unit = UnitOfWork::new(format!("rename column {}", column_id));
        unit.push(WriteOp::Check(Precondition::Unchanged(Document::Column(
            observed,
        ))))
        .push(WriteOp::Replace(Document::Column(column.clone())));
        Ok(Planned::new(unit, column))
    }

    pub async fn reorder_column(
        &self,
        user: UserId,
        column_id: ColumnId,
        input: PositionInput,
    ) -> ServiceResult<ColumnView> {
        self.gate.column(user, column_id).await?;
        commit_with_retry(self.store.as_ref(), move || {
            Box::pin(self.plan_column_reorder(column_id, input.order_index))
        })
        .await?;
        let column = self.load_column(column_id).await?;
        Ok(column_view(&column))
    }

    async fn plan_column_reorder(
        &self,
        column_id: ColumnId,
        target: u32,
    ) -> ServiceResult<Planned<()>> {
        let column = self.load_column(column_id).await?;
        let siblings = self.store.columns_in_project(column.project_id).await?;
        let indices: Vec<u32> = siblings.iter().map(|sibling| sibling.order_index).collect();
        if !is_dense(&indices) {
            log::warn!(
                "Column order of project {} has drifted: {:?}",
                column.project_id,
                indices
            );
        }

        let mut unit = UnitOfWork::new(format!("reorder column {}", column_id));
        if let ReorderPlan::Move { shift, target } =
            plan_reorder(column.order_index, target, siblings.len())?
        {
            unit.push(WriteOp::Check(Precondition::ColumnAt {
                column_id,
                order_index: column.order_index,
            }))
            .push(WriteOp::Check(Precondition::ColumnCount {
                project_id: column.project_id,
                count: siblings.len(),
            }))
            .push(WriteOp::ShiftColumns {
                project_id: column.project_id,
                range: shift.range,
                delta: shift.delta,
            })
            .push(WriteOp::PlaceColumn {
                column_id,
                order_index: target,
            });
        }
        Ok(Planned::new(unit, ()))
    }

    /// Any project accessor may delete a column; its tasks move to the first
    /// remaining column, or go with it when it was the last one.
    pub async fn delete_column(
        &self,
        user: UserId,
        column_id: ColumnId,
    ) -> ServiceResult<ColumnRemoval> {
        self.gate.column(user, column_id).await?;
        self.cascade.delete_column(column_id).await
    }
}
