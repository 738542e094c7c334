// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Order index arithmetic for tasks within a column and columns within a project.
//!
//! Every function here is synchronous and side-effect free. Callers read the
//! sibling state, plan with these helpers and commit the resulting shifts and
//! placements as one unit of work.

use crate::error::{ServiceError, ServiceResult};
use crate::store::IndexRange;

/// Contiguous block of siblings moved by `delta` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub range: IndexRange,
    pub delta: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderPlan {
    Unchanged,
    Move { shift: Shift, target: u32 },
}

/// Index for an item appended to a container holding `existing`.
pub fn append_index(existing: &[u32]) -> u32 {
    existing.iter().max().map_or(0, |max| max + 1)
}

pub fn plan_reorder(old_index: u32, new_index: u32, count: usize) -> ServiceResult<ReorderPlan> {
    if !index_in_range(new_index, count) {
        return Err(ServiceError::bad_request(format!(
            "Order index {} is out of range (0..{})",
            new_index, count
        )));
    }
    if !index_in_range(old_index, count) {
        return Err(ServiceError::internal(format!(
            "Current order index {} exceeds sibling count {}",
            old_index, count
        )));
    }

    let plan = match old_index.cmp(&new_index) {
        std::cmp::Ordering::Equal => ReorderPlan::Unchanged,
        std::cmp::Ordering::Less => ReorderPlan::Move {
            shift: Shift {
                range: IndexRange::between(old_index + 1, new_index),
                delta: -1,
            },
            target: new_index,
        },
        std::cmp::Ordering::Greater => ReorderPlan::Move {
            shift: Shift {
                range: IndexRange::between(new_index, old_index - 1),
                delta: 1,
            },
            target: new_index,
        },
    };
    Ok(plan)
}

/// Closes the gap left at `vacated`.
pub fn plan_removal(vacated: u32) -> Shift {
    Shift {
        range: IndexRange::starting_at(vacated + 1),
        delta: -1,
    }
}

/// New indices for relocated items, given in their old order, when appended
/// behind `destination_count` residents.
pub fn plan_relocation(destination_count: usize, relocated: &[u32]) -> Vec<u32> {
    let mut ranked: Vec<(usize, u32)> = relocated.iter().copied().enumerate().collect();
    ranked.sort_by_key(|(position, index)| (*index, *position));
    let mut assigned = vec![0; relocated.len()];
    for (rank, (position, _)) in ranked.into_iter().enumerate() {
        assigned[position] = (destination_count + rank) as u32;
    }
    assigned
}

/// True when `indices` is exactly `{0..n-1}`.
pub fn is_dense(indices: &[u32]) -> bool {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(position, index)| *index as usize == position)
}

fn index_in_range(index: u32, count: usize) -> bool {
    (index as usize) < count
}
