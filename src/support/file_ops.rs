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

//! Miscellaneous functions for working with files.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;
use std::time::SystemTime;

use chrono::prelude::*;

use crate::support::error::Error;

/// The mode with which mailbox directories are created.
pub const MAILBOX_DIR_MODE: u32 = 0o750;

/// Create the single directory `path` for a mailbox.
///
/// The parent must already exist.
pub fn create_mailbox_dir(path: &Path) -> io::Result<()> {
    fs::DirBuilder::new().mode(MAILBOX_DIR_MODE).create(path)
}

/// Write `data` into the file at `path`, atomically replacing anything
/// already there.
///
/// The file is staged in the same directory as `path`.
pub fn spit(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tf = tempfile::NamedTempFile::new_in(dir)?;
    tf.as_file_mut().write_all(data)?;
    tf.as_file_mut().sync_all()?;
    tf.persist(path)?;
    Ok(())
}

/// Return the modification time of the given metadata as a `DateTime`.
///
/// Falls back to the UNIX epoch if the platform can't report it.
pub fn mtime(md: &fs::Metadata) -> DateTime<FixedOffset> {
    let utc: DateTime<Utc> =
        md.modified().unwrap_or(SystemTime::UNIX_EPOCH).into();
    utc.into()
}

/// Set the modification time of `file` to `date`.
pub fn set_mtime(
    file: &fs::File,
    date: DateTime<FixedOffset>,
) -> io::Result<()> {
    file.set_modified(SystemTime::from(date))
}

pub trait IgnoreKinds {
    fn ignore_not_found(self) -> Self;
}

impl<R: Default> IgnoreKinds for Result<R, io::Error> {
    fn ignore_not_found(self) -> Self {
        match self {
            Ok(r) => Ok(r),
            Err(e) if io::ErrorKind::NotFound == e.kind() => Ok(R::default()),
            Err(e) => Err(e),
        }
    }
}

pub trait ErrorTransforms {
    type Coerced;
    fn on_exists(self, error: Error) -> Self::Coerced;
    fn on_not_found(self, error: Error) -> Self::Coerced;
}

impl<R, E: Into<Error>> ErrorTransforms for Result<R, E> {
    type Coerced = Result<R, Error>;

    /// Replace "already exists" errors with `error`.
    ///
    /// Renaming a directory onto a non-empty directory fails with `ENOTEMPTY`
    /// rather than `EEXIST`, so that is treated the same way.
    fn on_exists(self, error: Error) -> Result<R, Error> {
        match self.map_err(|e| e.into()) {
            Err(Error::Io(e)) if io::ErrorKind::AlreadyExists == e.kind() => {
                Err(error)
            }
            Err(Error::Io(e))
                if Some(nix::libc::ENOTEMPTY) == e.raw_os_error() =>
            {
                Err(error)
            }
            s => s,
        }
    }

    fn on_not_found(self, error: Error) -> Result<R, Error> {
        match self.map_err(|e| e.into()) {
            Err(Error::Io(e)) if io::ErrorKind::NotFound == e.kind() => {
                Err(error)
            }
            s => s,
        }
    }
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn error_transforms() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a");
        let b = root.path().join("b");
        create_mailbox_dir(&a).unwrap();
        create_mailbox_dir(&b).unwrap();
        fs::write(b.join("msg"), b"content").unwrap();

        assert_matches!(
            Err(Error::MailboxExists),
            create_mailbox_dir(&a).on_exists(Error::MailboxExists)
        );
        assert_matches!(
            Err(Error::MailboxExists),
            fs::rename(&a, &b).on_exists(Error::MailboxExists)
        );
        assert_matches!(
            Err(Error::NxMailbox),
            fs::rename(root.path().join("c"), &a).on_not_found(Error::NxMailbox)
        );

        assert!(fs::remove_file(root.path().join("nx"))
            .ignore_not_found()
            .is_ok());
    }

    #[test]
    fn spit_replaces_atomically() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("file");

        spit(&path, b"first").unwrap();
        spit(&path, b"second").unwrap();
        assert_eq!(b"second", &fs::read(&path).unwrap()[..]);
        // The staging file does not linger
        assert_eq!(1, fs::read_dir(root.path()).unwrap().count());
    }

    #[test]
    fn mtime_round_trip() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("file");
        let file = fs::File::create(&path).unwrap();

        let date = FixedOffset::east(3600).ymd(2020, 3, 4).and_hms(5, 6, 7);
        set_mtime(&file, date).unwrap();
        drop(file);

        let md = fs::metadata(&path).unwrap();
        assert_eq!(date, mtime(&md));
    }
}
