// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

pub mod ws;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test};
use boards::app_state::AppState;
use boards::board::model::UserId;
use boards::config::{Config, ValidatedConfig};
use boards::iam::User;
use boards::iam::UserServices;
use boards::iam::middleware::JwtAuthMiddlewareFactory;
use boards::runtime_paths::RuntimePaths;
use serde_json::{Value, json};
use std::fs;
use std::sync::Arc;

const CONFIG_YAML: &str = "server:
  host: 127.0.0.1
  port: 8081
  workers: 1
auth:
  jwt:
    secret: integration-test-secret-with-enough-bytes
logging:
  level: debug
store:
  transactions: true
app:
  name: Test Boards
  description: Integration tests
";

pub struct TestHarness {
    pub root: tempfile::TempDir,
    pub config: ValidatedConfig,
    pub state: AppState,
    /// Owns every folder and project the tests create.
    pub owner: User,
    /// Added as a folder member by `seed_board`.
    pub member: User,
    pub outsider: User,
}

pub struct SeededBoard {
    pub folder_id: String,
    pub project_id: String,
    /// Default columns in order: To Do, In Progress, Review, Done.
    pub columns: Vec<String>,
}

fn user(name: &str) -> User {
    User {
        id: UserId::new(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(CONFIG_YAML)
    }

    pub fn without_transactions() -> Self {
        Self::with_config(&CONFIG_YAML.replace("transactions: true", "transactions: false"))
    }

    fn with_config(config_yaml: &str) -> Self {
        let root = tempfile::tempdir().expect("runtime root");
        let owner = user("Olivia");
        let member = user("Mateo");
        let outsider = user("Oscar");

        fs::write(root.path().join("config.yaml"), config_yaml).expect("write config");
        let users_yaml: String = [&owner, &member, &outsider]
            .iter()
            .map(|user| format!("{}:\n  name: {}\n  email: {}\n", user.id, user.name, user.email))
            .collect();
        fs::write(root.path().join("users.yaml"), users_yaml).expect("write users");

        let config = Config::load_and_validate(root.path()).expect("config");
        let runtime_paths = RuntimePaths::from_root(root.path()).expect("runtime paths");
        let users = Arc::new(
            UserServices::new(&config, runtime_paths.users_file.clone()).expect("user services"),
        );
        let state = AppState::new(&config, users);

        Self {
            root,
            config,
            state,
            owner,
            member,
            outsider,
        }
    }

    pub fn token(&self, user: &User) -> String {
        self.state
            .users
            .jwt_service()
            .create_token(user)
            .expect("jwt token")
    }

    pub fn owner_token(&self) -> String {
        self.token(&self.owner)
    }

    pub fn member_token(&self) -> String {
        self.token(&self.member)
    }

    pub fn outsider_token(&self) -> String {
        self.token(&self.outsider)
    }
}

pub fn build_test_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(JwtAuthMiddlewareFactory)
        .configure(move |cfg| state.configure(cfg))
}

pub fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header((AUTHORIZATION, format!("Bearer {}", token)))
}

/// Calls the app and decodes the JSON envelope.
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, json)
}

pub fn id_of(value: &Value) -> String {
    value["data"]["id"]
        .as_str()
        .expect("data.id string")
        .to_string()
}

/// Creates a folder shared with the member and a project with default columns.
pub async fn seed_board<S, B>(app: &S, harness: &TestHarness) -> SeededBoard
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let token = harness.owner_token();
    let (status, folder) = send(
        app,
        authed(test::TestRequest::post().uri("/api/folders"), &token)
            .set_json(json!({ "name": "Launch", "description": "Q3 launch" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", folder);
    let folder_id = id_of(&folder);

    let (status, _) = send(
        app,
        authed(
            test::TestRequest::post().uri(&format!("/api/folders/{}/members", folder_id)),
            &token,
        )
        .set_json(json!({ "userId": harness.member.id }))
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, project) = send(
        app,
        authed(
            test::TestRequest::post().uri(&format!("/api/folders/{}/projects", folder_id)),
            &token,
        )
        .set_json(json!({ "name": "Website" }))
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", project);
    let project_id = id_of(&project);

    let (status, columns) = send(
        app,
        authed(
            test::TestRequest::get().uri(&format!("/api/projects/{}/columns", project_id)),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let columns = columns["data"]
        .as_array()
        .expect("columns")
        .iter()
        .map(|column| column["id"].as_str().expect("column id").to_string())
        .collect();

    SeededBoard {
        folder_id,
        project_id,
        columns,
    }
}

pub async fn create_task<S, B>(
    app: &S,
    token: &str,
    board: &SeededBoard,
    column: usize,
    title: &str,
) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, task) = send(
        app,
        authed(
            test::TestRequest::post().uri(&format!("/api/projects/{}/tasks", board.project_id)),
            token,
        )
        .set_json(json!({ "columnId": board.columns[column], "title": title }))
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", task);
    id_of(&task)
}

/// Titles of a column's tasks in board order.
pub async fn column_titles<S, B>(
    app: &S,
    token: &str,
    board: &SeededBoard,
    column: usize,
) -> Vec<String>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let uri = format!(
        "/api/projects/{}/tasks?columnId={}",
        board.project_id, board.columns[column]
    );
    let (status, tasks) = send(
        app,
        authed(test::TestRequest::get().uri(&uri), token).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks["data"].as_array().expect("tasks");
    for (position, task) in tasks.iter().enumerate() {
        assert_eq!(task["orderIndex"], position as u64, "dense ordering");
    }
    tasks
        .iter()
        .map(|task| task["title"].as_str().expect("title").to_string())
        .collect()
}
