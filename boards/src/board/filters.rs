// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::{ColumnId, Priority, ProjectId, UserId};
use crate::error::{FieldError, ServiceError, ServiceResult};
use crate::store::TaskQuery;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

/// Optional task list filters as supplied by callers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub column_id: Option<ColumnId>,
    pub assignee_id: Option<UserId>,
    pub priority: Option<Priority>,
    pub due_date_from: Option<String>,
    pub due_date_to: Option<String>,
}

#[derive(Clone, Copy)]
enum DayEdge {
    Start,
    End,
}

fn parse_bound(field: &str, value: &str, edge: DayEdge) -> Result<DateTime<Utc>, FieldError> {
    let value = value.trim();
    if let Ok(moment) = DateTime::parse_from_rfc3339(value) {
        return Ok(moment.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        FieldError::new(field, "Expected a date (YYYY-MM-DD) or an RFC 3339 timestamp")
    })?;
    let time = match edge {
        DayEdge::Start => NaiveTime::MIN,
        DayEdge::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
    };
    Ok(date.and_time(time).and_utc())
}

impl TaskFilter {
    pub fn into_query(self, project_id: ProjectId) -> ServiceResult<TaskQuery> {
        let mut errors = Vec::new();
        let mut bound = |field: &str, value: Option<&String>, edge| match value {
            Some(value) => parse_bound(field, value, edge)
                .map_err(|error| errors.push(error))
                .ok(),
            None => None,
        };
        let due_from = bound("dueDateFrom", self.due_date_from.as_ref(), DayEdge::Start);
        let due_to = bound("dueDateTo", self.due_date_to.as_ref(), DayEdge::End);

        if let (Some(from), Some(to)) = (due_from, due_to)
            && from > to
        {
            errors.push(FieldError::new(
                "dueDateFrom",
                "dueDateFrom must not be later than dueDateTo",
            ));
        }
        if !errors.is_empty() {
            return Err(ServiceError::validation(errors));
        }

        Ok(TaskQuery {
            project_id,
            column_id: self.column_id,
            assignee: self.assignee_id,
            priority: self.priority,
            due_from,
            due_to,
        })
    }
}
