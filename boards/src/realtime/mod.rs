// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Project rooms and the push transport that feeds them.

mod protocol;
mod rooms;
mod session_ids;
pub mod ws;

pub use protocol::{
    AuthOkPayload, ClientEvent, ColumnDeletedPayload, ErrorPayload, Intent, RoomPayload,
    ServerEvent, TaskDeletedPayload, WS_MAX_MESSAGE_BYTES, decode_client_event,
};
pub use rooms::{Outbox, RoomRegistry};
pub use session_ids::{SessionId, next_session_id};
