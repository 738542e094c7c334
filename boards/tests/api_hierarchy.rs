// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::{http::StatusCode, test};
use common::{authed, create_task, send};
use serde_json::json;

#[actix_web::test]
async fn folders_are_listed_for_owners_and_members_only() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;
    let board = common::seed_board(&app, &harness).await;

    for (token, expected) in [
        (harness.owner_token(), 1),
        (harness.member_token(), 1),
        (harness.outsider_token(), 0),
    ] {
        let (status, body) = send(
            &app,
            authed(test::TestRequest::get().uri("/api/folders"), &token).to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(expected));
    }

    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::get().uri(&format!("/api/folders/{}", board.folder_id)),
            &harness.outsider_token(),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn outsiders_see_not_found_for_everything_inside_a_project() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;
    let board = common::seed_board(&app, &harness).await;
    let task = create_task(&app, &harness.owner_token(), &board, 0, "Secret").await;
    let token = harness.outsider_token();

    let requests = [
        test::TestRequest::get().uri(&format!("/api/projects/{}", board.project_id)),
        test::TestRequest::get().uri(&format!("/api/projects/{}/tasks", board.project_id)),
        test::TestRequest::get().uri(&format!("/api/tasks/{}", task)),
        test::TestRequest::delete().uri(&format!("/api/tasks/{}", task)),
        test::TestRequest::delete().uri(&format!("/api/columns/{}", board.columns[0])),
    ];
    for request in requests {
        let (status, body) = send(&app, authed(request, &token).to_request()).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
        assert_eq!(body["success"], false);
    }
}

#[actix_web::test]
async fn ownership_is_required_for_status_and_deletion() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;
    let board = common::seed_board(&app, &harness).await;
    let status_uri = format!("/api/projects/{}/status", board.project_id);

    let (status, _) = send(
        &app,
        authed(test::TestRequest::patch().uri(&status_uri), &harness.member_token())
            .set_json(json!({ "status": "archived" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        authed(test::TestRequest::patch().uri(&status_uri), &harness.owner_token())
            .set_json(json!({ "status": "archived" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "archived");

    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::delete().uri(&format!("/api/folders/{}", board.folder_id)),
            &harness.member_token(),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn membership_rules() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;
    let board = common::seed_board(&app, &harness).await;
    let token = harness.owner_token();
    let members_uri = format!("/api/projects/{}/members", board.project_id);

    let cases = [
        (harness.outsider.id.to_string(), StatusCode::OK),
        (harness.outsider.id.to_string(), StatusCode::CONFLICT),
        (harness.owner.id.to_string(), StatusCode::BAD_REQUEST),
        (uuid::Uuid::new_v4().to_string(), StatusCode::NOT_FOUND),
    ];
    for (user_id, expected) in cases {
        let (status, body) = send(
            &app,
            authed(test::TestRequest::post().uri(&members_uri), &token)
                .set_json(json!({ "userId": user_id }))
                .to_request(),
        )
        .await;
        assert_eq!(status, expected, "{}", body);
    }

    // Project membership alone grants access to the project.
    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::get().uri(&format!("/api/projects/{}", board.project_id)),
            &harness.outsider_token(),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let remove = format!("{}/{}", members_uri, harness.outsider.id);
    let (status, _) = send(
        &app,
        authed(test::TestRequest::delete().uri(&remove), &token).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        authed(test::TestRequest::delete().uri(&remove), &token).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deleting_a_folder_removes_everything_beneath_it() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;
    let board = common::seed_board(&app, &harness).await;
    let survivor = common::seed_board(&app, &harness).await;
    let token = harness.owner_token();
    let task = create_task(&app, &token, &board, 1, "Doomed").await;
    let kept = create_task(&app, &token, &survivor, 1, "Kept").await;

    let (status, _) = send(
        &app,
        authed(
            test::TestRequest::delete().uri(&format!("/api/folders/{}", board.folder_id)),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for uri in [
        format!("/api/folders/{}", board.folder_id),
        format!("/api/projects/{}", board.project_id),
        format!("/api/tasks/{}", task),
    ] {
        let (status, _) = send(
            &app,
            authed(test::TestRequest::get().uri(&uri), &token).to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }

    let (status, _) = send(
        &app,
        authed(test::TestRequest::get().uri(&format!("/api/tasks/{}", kept)), &token).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn projects_are_listed_per_folder() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.state.clone())).await;
    let board = common::seed_board(&app, &harness).await;

    let (status, body) = send(
        &app,
        authed(
            test::TestRequest::get().uri(&format!("/api/folders/{}/projects", board.folder_id)),
            &harness.member_token(),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Website");
    assert_eq!(body["data"][0]["owner"]["name"], "Olivia");
    assert_eq!(body["data"][0]["status"], "active");
}
