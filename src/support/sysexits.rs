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

//! Constants from `sysexits.h`

use crate::support::error::Error;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Sysexit(pub i32);

pub const EX_USAGE: Sysexit = Sysexit(64);
pub const EX_DATAERR: Sysexit = Sysexit(65);
pub const EX_NOINPUT: Sysexit = Sysexit(66);
pub const EX_NOUSER: Sysexit = Sysexit(67);
pub const EX_SOFTWARE: Sysexit = Sysexit(70);
pub const EX_CANTCREAT: Sysexit = Sysexit(73);
pub const EX_IOERR: Sysexit = Sysexit(74);
pub const EX_NOPERM: Sysexit = Sysexit(77);
pub const EX_CONFIG: Sysexit = Sysexit(78);

impl Sysexit {
    pub fn exit(self) -> ! {
        std::process::exit(self.0)
    }

    /// Choose the exit code that best describes `error`.
    pub fn for_error(error: &Error) -> Self {
        match *error {
            Error::NxMailbox | Error::NxMessage => EX_NOINPUT,
            Error::MailboxExists => EX_CANTCREAT,
            Error::UnsafeName
            | Error::NxFlag
            | Error::BadSequenceSet
            | Error::RenameIntoSelf => EX_DATAERR,
            Error::BadOperationOnInbox | Error::MailboxHasInferiors => {
                EX_NOPERM
            }
            Error::Unauthenticated => EX_NOUSER,
            Error::MailboxFull | Error::MetadataFormat(_) => EX_SOFTWARE,
            Error::Io(_) => EX_IOERR,
            Error::Config(_) => EX_CONFIG,
        }
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;

    #[test]
    fn error_exit_codes() {
        assert_eq!(EX_NOINPUT, Sysexit::for_error(&Error::NxMailbox));
        assert_eq!(
            EX_NOPERM,
            Sysexit::for_error(&Error::BadOperationOnInbox)
        );
        assert_eq!(
            EX_IOERR,
            Sysexit::for_error(&Error::Io(io::Error::new(
                io::ErrorKind::Other,
                "boom"
            )))
        );
    }
}
