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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsafe mailbox name")]
    UnsafeName,
    #[error("No such mailbox")]
    NxMailbox,
    #[error("Mailbox already exists")]
    MailboxExists,
    #[error("Operation not allowed on INBOX")]
    BadOperationOnInbox,
    #[error("Mailbox has child mailboxes")]
    MailboxHasInferiors,
    #[error("Cannot rename a mailbox into itself")]
    RenameIntoSelf,
    #[error("Bad user name or password")]
    Unauthenticated,
    #[error("Message file no longer exists")]
    NxMessage,
    #[error("Mailbox has run out of UIDs")]
    MailboxFull,
    #[error("Non-existent system flag")]
    NxFlag,
    #[error("Unparsable sequence set")]
    BadSequenceSet,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    MetadataFormat(#[from] toml::ser::Error),
}
