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

//! The per-directory state file.
//!
//! Each mailbox directory may hold a hidden `.mailtree.toml` recording what
//! the message files themselves cannot: the flags on each message, keyed by
//! file name, and whether the mailbox is subscribed. The file in the user's
//! root directory records the last UID validity handed out instead.
//!
//! A missing file means "no flags, not subscribed". An unreadable or
//! malformed one is logged and treated the same way.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use super::model::Flag;
use crate::support::error::Error;
use crate::support::file_ops;

/// The name of the state file within each mailbox directory.
pub const METADATA_FILE: &str = ".mailtree.toml";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MailboxMetadata {
    /// The most recent UID validity issued for the store. Only meaningful in
    /// the user's root directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid_validity: Option<u32>,
    pub subscribed: bool,
    /// Message file name to the flags on that message. Messages without
    /// flags have no entry.
    pub flags: BTreeMap<String, Vec<String>>,
}

impl MailboxMetadata {
    /// Read the state file in `dir`.
    pub fn load(dir: &Path, log_prefix: &str) -> Self {
        let path = dir.join(METADATA_FILE);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if io::ErrorKind::NotFound == e.kind() => {
                return MailboxMetadata::default()
            }
            Err(e) => {
                warn!(
                    "{} Failed to read {}: {}",
                    log_prefix,
                    path.display(),
                    e
                );
                return MailboxMetadata::default();
            }
        };

        match toml::from_slice(&data) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    "{} Ignoring malformed {}: {}",
                    log_prefix,
                    path.display(),
                    e
                );
                MailboxMetadata::default()
            }
        }
    }

    /// Atomically replace the state file in `dir` with this value.
    pub fn save(&self, dir: &Path) -> Result<(), Error> {
        let data = toml::to_vec(self)?;
        file_ops::spit(&dir.join(METADATA_FILE), &data)?;
        Ok(())
    }

    /// Return the flags recorded for `file_name`.
    ///
    /// Unrecognised system flags are dropped with a warning.
    pub fn flags_for(&self, file_name: &str, log_prefix: &str) -> Vec<Flag> {
        let raw = match self.flags.get(file_name) {
            Some(raw) => raw,
            None => return vec![],
        };

        let mut flags: Vec<Flag> = Vec::with_capacity(raw.len());
        for s in raw {
            match s.parse::<Flag>() {
                Ok(flag) => {
                    if !flags.contains(&flag) {
                        flags.push(flag);
                    }
                }
                Err(e) => warn!(
                    "{} Dropping flag {:?} on {}: {}",
                    log_prefix, s, file_name, e
                ),
            }
        }
        flags
    }

    /// Record `flags` for `file_name`.
    pub fn set_flags(&mut self, file_name: &str, flags: &[Flag]) {
        if flags.is_empty() {
            self.flags.remove(file_name);
        } else {
            self.flags.insert(
                file_name.to_owned(),
                flags.iter().map(Flag::to_string).collect(),
            );
        }
    }
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            MailboxMetadata::default(),
            MailboxMetadata::load(dir.path(), "")
        );

        let mut metadata = MailboxMetadata {
            subscribed: true,
            ..MailboxMetadata::default()
        };
        metadata.set_flags(
            "1_abc.eml",
            &[Flag::Seen, Flag::Keyword("$Junk".to_owned())],
        );
        metadata.set_flags("2_def.eml", &[Flag::Deleted]);
        metadata.set_flags("2_def.eml", &[]);
        metadata.save(dir.path()).unwrap();

        let loaded = MailboxMetadata::load(dir.path(), "");
        assert_eq!(metadata, loaded);
        assert_eq!(None, loaded.uid_validity);
        assert_eq!(
            vec![Flag::Seen, Flag::Keyword("$Junk".to_owned())],
            loaded.flags_for("1_abc.eml", "")
        );
        assert!(loaded.flags_for("2_def.eml", "").is_empty());
    }

    #[test]
    fn bad_content_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(METADATA_FILE), "subscribed = 42\n")
            .unwrap();
        assert_eq!(
            MailboxMetadata::default(),
            MailboxMetadata::load(dir.path(), "")
        );

        fs::write(
            dir.path().join(METADATA_FILE),
            "[flags]\n\"m\" = [\"\\\\Seen\", \"\\\\Bogus\", \"\\\\seen\"]\n",
        )
        .unwrap();
        let loaded = MailboxMetadata::load(dir.path(), "");
        assert_eq!(vec![Flag::Seen], loaded.flags_for("m", ""));
    }
}
