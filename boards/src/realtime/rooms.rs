// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::protocol::ServerEvent;
use super::session_ids::SessionId;
use crate::board::model::ProjectId;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc::UnboundedSender;

pub type Outbox = UnboundedSender<ServerEvent>;

#[derive(Default)]
struct Rooms {
    members: HashMap<ProjectId, HashSet<SessionId>>,
    joined: HashMap<SessionId, HashSet<ProjectId>>,
    outboxes: HashMap<SessionId, Outbox>,
}

impl Rooms {
    fn remove_member(&mut self, project: ProjectId, session: SessionId) {
        if let Some(sessions) = self.members.get_mut(&project) {
            sessions.remove(&session);
            if sessions.is_empty() {
                self.members.remove(&project);
            }
        }
    }
}

/// Push sessions grouped into one room per project.
///
/// Every registered session owns an outbox; the transport drains it into
/// the socket. Delivery is best effort: nothing is queued for sessions that
/// are gone and nothing is replayed on join.
#[derive(Default)]
pub struct RoomRegistry {
    inner: RwLock<Rooms>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Rooms> {
        self.inner.read().unwrap_or_else(|poisoned| {
            log::error!("Room registry lock poisoned on read; recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Rooms> {
        self.inner.write().unwrap_or_else(|poisoned| {
            log::error!("Room registry lock poisoned on write; recovering");
            poisoned.into_inner()
        })
    }

    pub fn register(&self, session: SessionId, outbox: Outbox) {
        let mut rooms = self.write();
        rooms.outboxes.insert(session, outbox);
        rooms.joined.entry(session).or_default();
    }

    /// Returns false for sessions that are not registered.
    pub fn join(&self, session: SessionId, project: ProjectId) -> bool {
        let mut rooms = self.write();
        if !rooms.outboxes.contains_key(&session) {
            return false;
        }
        rooms.members.entry(project).or_default().insert(session);
        rooms.joined.entry(session).or_default().insert(project);
        log::debug!("Session {} joined room {}", session, project);
        true
    }

    /// Returns whether the session was in the room.
    pub fn leave(&self, session: SessionId, project: ProjectId) -> bool {
        let mut rooms = self.write();
        let was_member = rooms
            .joined
            .get_mut(&session)
            .is_some_and(|projects| projects.remove(&project));
        rooms.remove_member(project, session);
        if was_member {
            log::debug!("Session {} left room {}", session, project);
        }
        was_member
    }

    pub fn disconnect(&self, session: SessionId) {
        let mut rooms = self.write();
        rooms.outboxes.remove(&session);
        let projects = rooms.joined.remove(&session).unwrap_or_default();
        for project in &projects {
            rooms.remove_member(*project, session);
        }
        log::debug!(
            "Session {} disconnected from {} rooms",
            session,
            projects.len()
        );
    }

    /// Sends `event` to every session in the project's room and returns how
    /// many outboxes accepted it.
    pub fn broadcast(&self, project: ProjectId, event: &ServerEvent) -> usize {
        let rooms = self.read();
        let Some(sessions) = rooms.members.get(&project) else {
            return 0;
        };
        sessions
            .iter()
            .filter_map(|session| rooms.outboxes.get(session))
            .filter(|outbox| outbox.send(event.clone()).is_ok())
            .count()
    }

    pub fn send_to(&self, session: SessionId, event: ServerEvent) -> bool {
        self.read()
            .outboxes
            .get(&session)
            .is_some_and(|outbox| outbox.send(event).is_ok())
    }

    /// Drops every membership of a room whose project no longer exists.
    pub fn close_room(&self, project: ProjectId) {
        let mut rooms = self.write();
        if let Some(sessions) = rooms.members.remove(&project) {
            for session in sessions {
                if let Some(projects) = rooms.joined.get_mut(&session) {
                    projects.remove(&project);
                }
            }
        }
    }

    pub fn room_size(&self, project: ProjectId) -> usize {
        self.read()
            .members
            .get(&project)
            .map_or(0, |sessions| sessions.len())
    }

    pub fn session_count(&self) -> usize {
        self.read().outboxes.len()
    }
}
