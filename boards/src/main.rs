// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger};
use boards::app_state::AppState;
use boards::config::{Config, ValidatedConfig};
use boards::iam::UserServices;
use boards::iam::middleware::JwtAuthMiddlewareFactory;
use boards::runtime_paths::RuntimePaths;
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if matches!(parsed_args.mode, RunMode::Help) {
        print!("{}", help_text());
        return 0;
    }

    let config = match Config::load_and_validate(&parsed_args.runtime_root) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };
    let runtime_paths = match RuntimePaths::from_root(&parsed_args.runtime_root) {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("❌ {}", error);
            return 1;
        }
    };

    match System::new().block_on(run_server(config, runtime_paths)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

async fn run_server(config: ValidatedConfig, runtime_paths: RuntimePaths) -> std::io::Result<()> {
    // Configure logging with a stable format
    env_logger::Builder::from_default_env()
        .filter_level(config.log_level_filter())
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .map_err(|error| {
            eprintln!("❌ Failed to initialize logger: {}", error);
            std::io::Error::other(error.to_string())
        })?;

    log_startup_info(&config, &runtime_paths);

    let user_services = match UserServices::new(&config, runtime_paths.users_file.clone()) {
        Ok(services) => Arc::new(services),
        Err(error) => {
            eprintln!("❌ Failed to initialize user services: {}", error);
            eprintln!("❌ Application cannot start without user services.");
            return Err(std::io::Error::other(error.to_string()));
        }
    };
    info!("✅ User directory initialized successfully");

    let state = AppState::new(&config, user_services);
    info!("✅ Board services initialized successfully");

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(JwtAuthMiddlewareFactory)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .configure(|cfg| state.configure(cfg))
    })
    .workers(config.server.workers)
    .bind(config.server.address_tuple())?
    .run()
    .await
}

fn log_startup_info(config: &ValidatedConfig, runtime_paths: &RuntimePaths) {
    info!("Starting {} - {}", config.app.name, config.app.description);
    info!("Workers: {}", config.server.workers);
    info!(
        "Listening on {}:{}",
        config.server.host, config.server.port
    );
    info!(
        "Store transactions: {}",
        if config.store.transactions {
            "enabled"
        } else {
            "disabled"
        }
    );
    info!("Config file: {}", runtime_paths.config_file.display());
    info!("Users file: {}", runtime_paths.users_file.display());
    info!("Runtime root: {}", runtime_paths.root.display());
}

fn help_text() -> String {
    [
        "Usage: boards [-C <root>]",
        "",
        "Starts the board server using <root>/config.yaml and <root>/users.yaml.",
        "",
        "Options:",
        "  -C <root>    Runtime directory (default: current directory)",
        "  -h, --help   Show this help",
        "",
    ]
    .join("\n")
}

#[derive(Debug)]
enum RunMode {
    Serve,
    Help,
}

struct ParsedArgs {
    runtime_root: PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            runtime_root: PathBuf::from("."),
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else {
            return Err(format!("Unexpected argument: {}", arg));
        }
    }

    Ok(ParsedArgs {
        runtime_root: make_runtime_root_absolute(runtime_root)?,
        mode: RunMode::Serve,
    })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}
