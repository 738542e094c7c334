// This file is part of the product NoPressure Boards.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub users_file: PathBuf,
}

impl RuntimePaths {
    pub fn from_root(root: &Path) -> Result<Self, ConfigError> {
        let root_path = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        };

        if !root_path.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "Runtime root is not a directory: {}",
                root_path.display()
            )));
        }

        let root_canonical = root_path.canonicalize().map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to canonicalize runtime root '{}': {}",
                root_path.display(),
                e
            ))
        })?;

        let config_file = root_canonical.join("config.yaml");
        ensure_file_exists(&config_file, "Config file is missing")?;

        let users_file = root_canonical.join("users.yaml");
        ensure_file_exists(&users_file, "Users file is missing")?;

        Ok(Self {
            root: root_canonical,
            config_file,
            users_file,
        })
    }
}

fn ensure_file_exists(path: &Path, context: &str) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{}: {}",
            context,
            path.display()
        )))
    }
}
