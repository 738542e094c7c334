// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::HttpServer;
use awc::error::WsProtocolError;
use awc::ws::{Frame as ClientFrame, Message as ClientMessage};
use boards::app_state::AppState;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde_json::{Value, json};
use std::net::TcpListener;
use std::time::Duration;

pub async fn start_test_server(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");

    actix_web::rt::spawn(async move {
        let _ = HttpServer::new(move || super::build_test_app(state.clone()))
            .listen(listener)
            .expect("listen")
            .run()
            .await;
    });

    format!("http://{}", addr)
}

/// Next JSON event from the server, answering pings along the way.
pub async fn read_event<S, E>(framed: &mut S) -> Value
where
    S: Stream<Item = Result<ClientFrame, E>> + Sink<ClientMessage, Error = E> + Unpin,
    E: std::fmt::Debug,
{
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), framed.next())
            .await
            .expect("ws frame in time")
            .expect("ws frame")
            .expect("ws ok");
        match frame {
            ClientFrame::Text(bytes) => {
                return serde_json::from_slice(&bytes).expect("event json");
            }
            ClientFrame::Ping(bytes) => {
                framed.send(ClientMessage::Pong(bytes)).await.expect("pong");
            }
            ClientFrame::Close(_) => panic!("WebSocket closed"),
            _ => {}
        }
    }
}

/// Asserts that nothing arrives within a short window.
pub async fn expect_silence<S, E>(framed: &mut S)
where
    S: Stream<Item = Result<ClientFrame, E>> + Unpin,
    E: std::fmt::Debug,
{
    let next = tokio::time::timeout(Duration::from_millis(200), framed.next()).await;
    if let Ok(Some(Ok(ClientFrame::Text(bytes)))) = next {
        panic!("unexpected event: {}", String::from_utf8_lossy(&bytes));
    }
}

pub async fn send_event<S, E>(framed: &mut S, event: &str, data: Value)
where
    S: Sink<ClientMessage, Error = E> + Unpin,
    E: std::fmt::Debug,
{
    let text = json!({ "event": event, "data": data }).to_string();
    framed
        .send(ClientMessage::Text(text.into()))
        .await
        .expect("send event");
}

/// Opens a push session, authenticates it and joins the given project room.
pub async fn connect_and_join(
    base_url: &str,
    token: &str,
    project_id: &str,
) -> impl Stream<Item = Result<ClientFrame, WsProtocolError>>
+ Sink<ClientMessage, Error = WsProtocolError>
+ Unpin
+ use<> {
    let (_resp, mut framed) = awc::Client::new()
        .ws(format!("{}/ws", base_url))
        .connect()
        .await
        .expect("connect");

    send_event(&mut framed, "auth", json!({ "token": token })).await;
    let reply = read_event(&mut framed).await;
    assert_eq!(reply["event"], "auth:ok", "{}", reply);

    send_event(&mut framed, "task:join-project", json!(project_id)).await;
    let reply = read_event(&mut framed).await;
    assert_eq!(reply["event"], "task:joined", "{}", reply);
    framed
}
