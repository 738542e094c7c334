// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use actix_web::web;

use crate::board::BoardService;
use crate::config::ValidatedConfig;
use crate::gateway::MutationGateway;
use crate::iam::UserServices;
use crate::realtime::RoomRegistry;
use crate::realtime::ws::board_ws;
use crate::store::MemoryStore;

/// Shared services handed to every worker's `App`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserServices>,
    pub gateway: Arc<MutationGateway>,
}

impl AppState {
    pub fn new(config: &ValidatedConfig, users: Arc<UserServices>) -> Self {
        let store = Arc::new(MemoryStore::new(config.store.capabilities()));
        let board = BoardService::new(store, users.clone());
        let gateway = Arc::new(MutationGateway::new(board, Arc::new(RoomRegistry::new())));
        Self { users, gateway }
    }

    /// Registers the shared data, the `/api` routes and the push endpoint.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.users.clone()))
            .app_data(web::Data::from(self.gateway.clone()));
        crate::api::configure(cfg);
        cfg.route("/ws", web::get().to(board_ws));
    }
}
