// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::protocol::{
    AuthOkPayload, ClientEvent, Intent, RoomPayload, ServerEvent, WS_MAX_MESSAGE_BYTES,
    decode_client_event,
};
use super::session_ids::{SessionId, next_session_id};
use crate::gateway::MutationGateway;
use crate::iam::{Principal, UserServices};
use actix_web::{HttpRequest, HttpResponse, Result, web};
use actix_ws::{AggregatedMessage, AggregatedMessageStream, Session};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

#[cfg(test)]
const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(500);
#[cfg(not(test))]
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn board_ws(
    req: HttpRequest,
    stream: web::Payload,
    gateway: web::Data<MutationGateway>,
    users: web::Data<UserServices>,
) -> Result<HttpResponse> {
    log::debug!("Push connection starting");
    let (response, session, message_stream) = actix_ws::handle(&req, stream)?;
    let message_stream = message_stream
        .max_frame_size(WS_MAX_MESSAGE_BYTES)
        .aggregate_continuations()
        .max_continuation_size(WS_MAX_MESSAGE_BYTES);
    let gateway = gateway.into_inner();
    let users = users.into_inner();

    actix_web::rt::spawn(async move {
        if let Err(err) = handle_ws_session(session, message_stream, gateway, users).await {
            log::warn!("Push session ended: {}", err);
        }
    });

    Ok(response)
}

async fn handle_ws_session(
    mut session: Session,
    mut messages: AggregatedMessageStream,
    gateway: Arc<MutationGateway>,
    users: Arc<UserServices>,
) -> Result<(), String> {
    let auth_text = match read_auth_frame(&mut session, &mut messages).await {
        Ok(text) => text,
        Err(err) => {
            log::warn!("Push auth frame read failed: {}", err);
            let _ = send_auth_error(&mut session, &err).await;
            return Err(err);
        }
    };
    let token = match decode_client_event(&auth_text) {
        Ok(ClientEvent::Auth(payload)) => payload.token,
        Ok(_) | Err(_) => {
            send_auth_error(&mut session, "First message must be auth").await?;
            return Err("First message must be auth".to_string());
        }
    };
    let Some(principal) = users.authenticate(&token) else {
        send_auth_error(&mut session, "Invalid or expired token").await?;
        return Err("Push auth rejected".to_string());
    };

    let ok = ServerEvent::AuthOk(AuthOkPayload {
        user_id: principal.user_id,
        name: principal.name.clone(),
    });
    send_event(&mut session, &ok).await?;

    let session_id = next_session_id();
    log::info!(
        "Push session {} authenticated as {}",
        session_id,
        principal.user_id
    );
    let (outbox, inbox) = unbounded_channel();
    gateway.rooms().register(session_id, outbox);
    actix_web::rt::spawn(forward_events(session.clone(), inbox, session_id));

    let connection = PushConnection {
        gateway: gateway.clone(),
        principal,
        session_id,
    };
    let result = connection.run(&mut session, &mut messages).await;

    // Dropping the outbox ends the forwarder once it has flushed.
    gateway.rooms().disconnect(session_id);
    let _ = session.close(None).await;
    log::info!("Push session {} closed", session_id);
    result
}

async fn read_auth_frame(
    session: &mut Session,
    messages: &mut AggregatedMessageStream,
) -> Result<String, String> {
    let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err("WebSocket auth timed out".to_string());
        }
        let remaining = deadline - now;
        let message = tokio::time::timeout(remaining, messages.next())
            .await
            .map_err(|_| "WebSocket auth timed out".to_string())?;
        let message = match message {
            Some(message) => message.map_err(|err| format!("WS error: {}", err))?,
            None => return Err("WebSocket closed before auth".to_string()),
        };
        match message {
            AggregatedMessage::Text(text) => return Ok(text.to_string()),
            AggregatedMessage::Binary(bytes) => {
                return String::from_utf8(bytes.to_vec())
                    .map_err(|_| "Auth message is not UTF-8".to_string());
            }
            AggregatedMessage::Ping(bytes) => {
                session.pong(&bytes).await.map_err(|err| err.to_string())?;
            }
            AggregatedMessage::Close(_) => return Err("WebSocket closed before auth".to_string()),
            _ => {}
        }
    }
}

async fn send_auth_error(session: &mut Session, message: &str) -> Result<(), String> {
    send_event(session, &ServerEvent::auth_error(message)).await?;
    session
        .clone()
        .close(None)
        .await
        .map_err(|err| err.to_string())
}

async fn send_event(session: &mut Session, event: &ServerEvent) -> Result<(), String> {
    let text = event.encode().map_err(|err| err.to_string())?;
    session.text(text).await.map_err(|err| err.to_string())
}

/// Drains a session's outbox into its socket.
async fn forward_events(
    mut session: Session,
    mut inbox: UnboundedReceiver<ServerEvent>,
    session_id: SessionId,
) {
    while let Some(event) = inbox.recv().await {
        if let Err(err) = send_event(&mut session, &event).await {
            log::debug!("Push session {} stopped forwarding: {}", session_id, err);
            break;
        }
    }
}

struct PushConnection {
    gateway: Arc<MutationGateway>,
    principal: Principal,
    session_id: SessionId,
}

impl PushConnection {
    async fn run(
        &self,
        session: &mut Session,
        messages: &mut AggregatedMessageStream,
    ) -> Result<(), String> {
        while let Some(message) = messages.next().await {
            let message = message.map_err(|err| format!("WS error: {}", err))?;
            match message {
                AggregatedMessage::Text(text) => self.handle_text(&text).await,
                AggregatedMessage::Binary(_) => {
                    self.reply(ServerEvent::task_error("Binary messages are not supported"));
                }
                AggregatedMessage::Ping(bytes) => {
                    session.pong(&bytes).await.map_err(|err| err.to_string())?;
                }
                AggregatedMessage::Close(_) => break,
                _ => {}
            }
        }
        Ok(())
    }

    /// Replies go through the session's own outbox so they stay ordered
    /// with room broadcasts.
    fn reply(&self, event: ServerEvent) {
        if !self.gateway.rooms().send_to(self.session_id, event) {
            log::debug!("Push session {} outbox is closed", self.session_id);
        }
    }

    async fn handle_text(&self, text: &str) {
        let event = match decode_client_event(text) {
            Ok(event) => event,
            Err(error) => {
                log::debug!("Push session {} sent an invalid message", self.session_id);
                self.reply(error);
                return;
            }
        };
        let user = self.principal.user_id;
        match Intent::from(event) {
            Intent::Auth(_) => self.reply(ServerEvent::task_error("Already authenticated")),
            Intent::Join(project_id) => {
                match self.gateway.join(user, self.session_id, project_id).await {
                    Ok(()) => self.reply(ServerEvent::Joined(RoomPayload { project_id })),
                    Err(err) => self.reply(ServerEvent::task_error(err.describe())),
                }
            }
            Intent::Leave(project_id) => {
                self.gateway.leave(self.session_id, project_id);
                self.reply(ServerEvent::Left(RoomPayload { project_id }));
            }
            Intent::Task(command) => {
                if let Err(err) = self.gateway.task(user, command).await {
                    log::debug!("Push task mutation by {} failed: {}", user, err);
                    self.reply(ServerEvent::task_error(err.describe()));
                }
            }
            Intent::Column(command) => {
                if let Err(err) = self.gateway.column(user, command).await {
                    log::debug!("Push column mutation by {} failed: {}", user, err);
                    self.reply(ServerEvent::column_error(err.describe()));
                }
            }
        }
    }
}
