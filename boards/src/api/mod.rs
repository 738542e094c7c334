// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::web;

mod columns;
pub mod envelope;
mod folders;
mod projects;
mod tasks;

pub use envelope::ApiResponse;

pub fn configure(cfg: &mut web::ServiceConfig) {
    envelope::extractor_configs(cfg);
    cfg.service(
        web::scope("/api")
            .route("/folders", web::post().to(folders::create_folder))
            .route("/folders", web::get().to(folders::list_folders))
            .route("/folders/{id}", web::get().to(folders::get_folder))
            .route("/folders/{id}", web::delete().to(folders::delete_folder))
            .route("/folders/{id}/members", web::post().to(folders::add_member))
            .route(
                "/folders/{id}/members/{user_id}",
                web::delete().to(folders::remove_member),
            )
            .route("/folders/{id}/projects", web::post().to(projects::create_project))
            .route("/folders/{id}/projects", web::get().to(projects::list_projects))
            .route("/projects/{id}", web::get().to(projects::get_project))
            .route("/projects/{id}", web::delete().to(projects::delete_project))
            .route("/projects/{id}/status", web::patch().to(projects::update_status))
            .route("/projects/{id}/members", web::post().to(projects::add_member))
            .route(
                "/projects/{id}/members/{user_id}",
                web::delete().to(projects::remove_member),
            )
            .route("/projects/{id}/tasks", web::post().to(tasks::create_task))
            .route("/projects/{id}/tasks", web::get().to(tasks::list_tasks))
            .route("/projects/{id}/columns", web::post().to(columns::create_column))
            .route("/projects/{id}/columns", web::get().to(columns::list_columns))
            .route("/tasks/{id}", web::get().to(tasks::get_task))
            .route("/tasks/{id}", web::put().to(tasks::update_task))
            .route("/tasks/{id}", web::delete().to(tasks::delete_task))
            .route("/tasks/{id}/move", web::patch().to(tasks::move_task))
            .route("/tasks/{id}/reorder", web::patch().to(tasks::reorder_task))
            .route("/tasks/{id}/assignees", web::post().to(tasks::add_assignee))
            .route(
                "/tasks/{id}/assignees/{user_id}",
                web::delete().to(tasks::remove_assignee),
            )
            .route("/columns/{id}", web::put().to(columns::rename_column))
            .route("/columns/{id}/reorder", web::patch().to(columns::reorder_column))
            .route("/columns/{id}", web::delete().to(columns::delete_column)),
    );
}
