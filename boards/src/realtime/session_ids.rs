// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::atomic::{AtomicU32, Ordering};

/// Process-unique push session id; never zero.
pub type SessionId = u32;

static NEXT_SESSION_ID: AtomicU32 = AtomicU32::new(1);

pub fn next_session_id() -> SessionId {
    let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
    if id == 0 {
        // Wrapped around.
        NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
    } else {
        id
    }
}
