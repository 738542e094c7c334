// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{IamError, User, UsersData, YamlUsersData};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use validator::ValidateEmail;

/// Source of the user directory. Users are provisioned by the credential
/// system; this service only reads them.
pub trait UserStore: Send + Sync {
    fn load(&self) -> Result<UsersData, IamError>;
}

pub struct FileUserStore {
    users_file: PathBuf,
}

impl FileUserStore {
    pub fn new(users_file: PathBuf) -> Result<Self, IamError> {
        if users_file.as_os_str().is_empty() {
            return Err(IamError::ConfigurationError(
                "Users file path is empty".to_string(),
            ));
        }

        Ok(Self { users_file })
    }

    fn parse_users(content: &str) -> Result<UsersData, IamError> {
        let yaml_users: YamlUsersData = serde_yaml::from_str(content)
            .map_err(|e| IamError::ParseError(format!("Failed to parse users file: {}", e)))?;

        let mut users_data = UsersData::new();
        for (id, yaml_user) in yaml_users {
            if yaml_user.name.trim().is_empty() {
                return Err(IamError::ParseError(format!("User {} has an empty name", id)));
            }
            if !yaml_user.email.validate_email() {
                return Err(IamError::ParseError(format!(
                    "User {} has an invalid email address",
                    id
                )));
            }
            users_data.insert(id, yaml_user.into_user(id));
        }

        Ok(users_data)
    }
}

impl UserStore for FileUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        let content = std::fs::read_to_string(&self.users_file)
            .map_err(|e| IamError::FileError(format!("Failed to read users file: {}", e)))?;
        Self::parse_users(&content)
    }
}

pub struct MemoryUserStore {
    users: Arc<RwLock<UsersData>>,
}

impl MemoryUserStore {
    pub fn from_users(users: Vec<User>) -> Self {
        let data = users.into_iter().map(|user| (user.id, user)).collect();
        Self {
            users: Arc::new(RwLock::new(data)),
        }
    }
}

impl UserStore for MemoryUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        match self.users.read() {
            Ok(guard) => Ok(guard.clone()),
            Err(poisoned) => {
                log::error!("MemoryUserStore lock poisoned on read; recovering");
                Ok(poisoned.into_inner().clone())
            }
        }
    }
}
