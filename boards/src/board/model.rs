// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value).map(Self)
            }
        }
    };
}

entity_id!(FolderId);
entity_id!(ProjectId);
entity_id!(ColumnId);
entity_id!(TaskId);
entity_id!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub description: String,
    pub owner: UserId,
    pub members: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: String, description: String, owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: FolderId::new(),
            name,
            description,
            owner,
            members: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self, user: UserId) -> bool {
        self.owner == user
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub folder_id: FolderId,
    pub owner: UserId,
    pub members: Vec<UserId>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// The project inherits its owner from the folder it is created in.
    pub fn new(name: String, description: String, folder: &Folder) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            name,
            description,
            folder_id: folder.id,
            owner: folder.owner,
            members: Vec::new(),
            status: ProjectStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self, user: UserId) -> bool {
        self.owner == user
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    pub project_id: ProjectId,
    pub order_index: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Column {
    pub fn new(name: String, project_id: ProjectId, order_index: u32) -> Self {
        let now = Utc::now();
        Self {
            id: ColumnId::new(),
            name,
            project_id,
            order_index,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Column names seeded into every new project, in board order.
pub const DEFAULT_COLUMNS: [&str; 4] = ["To Do", "In Progress", "Review", "Done"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub project_id: ProjectId,
    pub column_id: ColumnId,
    pub order_index: u32,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub assignees: Vec<UserId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_assigned(&self, user: UserId) -> bool {
        self.assignees.contains(&user)
    }
}

/// Pushes `user` unless already present, keeping first-seen order.
pub fn push_unique(list: &mut Vec<UserId>, user: UserId) -> bool {
    if list.contains(&user) {
        return false;
    }
    list.push(user);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_serialize_as_plain_uuid_strings() {
        let id = TaskId::new();
        let value = serde_json::to_value(id).unwrap();
        assert_eq!(value, json!(id.to_string()));
        let parsed: TaskId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn project_inherits_folder_owner() {
        let owner = UserId::new();
        let folder = Folder::new("Work".to_string(), String::new(), owner);
        let project = Project::new("Launch".to_string(), String::new(), &folder);
        assert_eq!(project.owner, owner);
        assert_eq!(project.folder_id, folder.id);
        assert_eq!(project.status, ProjectStatus::Active);
        assert!(project.members.is_empty());
    }

    #[test]
    fn enums_use_lowercase_wire_names() {
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), json!("high"));
        assert_eq!(
            serde_json::from_value::<ProjectStatus>(json!("archived")).unwrap(),
            ProjectStatus::Archived
        );
    }

    #[test]
    fn push_unique_rejects_repeats() {
        let user = UserId::new();
        let mut members = Vec::new();
        assert!(push_unique(&mut members, user));
        assert!(!push_unique(&mut members, user));
        assert_eq!(members.len(), 1);
    }
}
