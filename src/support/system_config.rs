//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Mailtree.
//
// Mailtree is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mailtree is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Mailtree. If not, see <http://www.gnu.org/licenses/>.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::support::error::Error;

/// The name of the configuration file within the system root.
pub const CONFIG_FILE_NAME: &str = "mailtree.toml";

/// The system-wide configuration for Mailtree.
///
/// This is stored in a file named `mailtree.toml` under the system root. It
/// is assembled once by the entry point and handed to
/// `Directory::open()`; nothing else reads it.
#[derive(Clone, Debug, Deserialize)]
pub struct SystemConfig {
    /// The users that may log in.
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserConfig {
    /// The login name.
    pub name: String,
    /// The password, in plain text.
    ///
    /// This is intended for local test servers. Do not put real credentials
    /// here.
    pub password: String,
    /// The directory holding the user's mailboxes.
    ///
    /// Relative paths are interpreted relative to the system root. If not
    /// given, defaults to a directory named after the user.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl UserConfig {
    /// Return the absolute mailbox root for this user.
    pub fn mail_root(&self, system_root: &Path) -> PathBuf {
        match self.root {
            Some(ref root) => system_root.join(root),
            None => system_root.join(&self.name),
        }
    }
}

impl SystemConfig {
    /// Load the configuration from `mailtree.toml` under `root`.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let raw = fs::read(root.join(CONFIG_FILE_NAME))?;
        Ok(toml::from_slice(&raw)?)
    }
}
