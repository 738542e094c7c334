// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::jwt::JwtService;
use super::store::{FileUserStore, UserStore};
use super::types::{IamError, Principal, User, UsersData};
use crate::board::model::UserId;
use crate::board::projection::{UserDirectory, UserSummary};
use crate::config::ValidatedConfig;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Token verification plus the read-only user directory.
pub struct UserServices {
    jwt_service: JwtService,
    users: RwLock<UsersData>,
}

impl UserServices {
    pub fn new(config: &ValidatedConfig, users_file: PathBuf) -> Result<Self, IamError> {
        let store = Arc::new(FileUserStore::new(users_file)?);
        Self::new_with_store(config, store)
    }

    pub fn new_with_store(
        config: &ValidatedConfig,
        store: Arc<dyn UserStore>,
    ) -> Result<Self, IamError> {
        let users = store.load()?;
        log::info!("Loaded {} user(s) into the directory", users.len());
        Ok(Self {
            jwt_service: JwtService::new(config),
            users: RwLock::new(users),
        })
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    fn with_users<T>(&self, f: impl FnOnce(&UsersData) -> T) -> T {
        match self.users.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => {
                log::error!("Users lock poisoned on read; recovering");
                f(&poisoned.into_inner())
            }
        }
    }

    pub fn get_user(&self, id: UserId) -> Option<User> {
        self.with_users(|users| users.get(&id).cloned())
    }

    pub fn user_exists(&self, id: UserId) -> bool {
        self.with_users(|users| users.contains_key(&id))
    }

    /// Verifies a bearer token and resolves it to a known user.
    /// Returns None when the token is invalid or the user no longer exists.
    pub fn authenticate(&self, token: &str) -> Option<Principal> {
        let claims = match self.jwt_service.verify_token(token) {
            Ok(claims) => claims,
            Err(err) => {
                log::debug!("Rejected bearer token: {}", err);
                return None;
            }
        };
        let user_id = match JwtService::subject(&claims) {
            Ok(user_id) => user_id,
            Err(err) => {
                log::warn!("{}", err);
                return None;
            }
        };
        let Some(user) = self.get_user(user_id) else {
            log::warn!("Token subject {} is not in the user directory", user_id);
            return None;
        };
        Some(Principal {
            user_id: user.id,
            name: user.name,
            email: user.email,
            token_id: claims.jti,
        })
    }
}

impl UserDirectory for UserServices {
    fn find_user(&self, id: UserId) -> Option<UserSummary> {
        self.get_user(id).map(|user| UserSummary {
            id: user.id,
            name: user.name,
            email: user.email,
        })
    }

    fn contains_user(&self, id: UserId) -> bool {
        self.user_exists(id)
    }
}
