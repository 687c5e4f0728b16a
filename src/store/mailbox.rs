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

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use chrono::SubsecRound;
use log::{debug, info, warn};

use super::message::{clamp_size, MessageRecord};
use super::metadata::MailboxMetadata;
use super::model::*;
use super::parse::{MessageParser, SearchMatcher};
use super::user::UserStore;
use crate::support::error::Error;
use crate::support::file_ops::{self, IgnoreKinds};
use crate::support::safe_name::{is_message_file_name, is_safe_name};

/// Identifies a mailbox within the tree of one `UserStore`.
///
/// Ids are never reused while the store is open, so a stale id refers to
/// nothing rather than to some other mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MailboxId(pub(super) usize);

/// One node in the mailbox tree.
#[derive(Debug)]
pub struct MailboxNode {
    /// The local name of this mailbox. Empty for the root.
    pub(super) name: String,
    pub(super) parent: Option<MailboxId>,
    pub(super) children: Vec<MailboxId>,
    pub(super) subscribed: bool,
    pub(super) messages: Vec<MessageRecord>,
    /// The UID the next message added to this mailbox will get.
    ///
    /// This only ever increases, even when the highest message is expunged.
    pub(super) uid_next: Uid,
}

impl MailboxNode {
    pub(super) fn empty(name: String, parent: Option<MailboxId>) -> Self {
        MailboxNode {
            name,
            parent,
            children: vec![],
            subscribed: false,
            messages: vec![],
            uid_next: Uid::MIN,
        }
    }

    /// Load the mailbox stored at `path`, creating the directory if it does
    /// not exist.
    ///
    /// Returns the node along with the names of the child mailbox
    /// directories, in sorted order. Children are not loaded.
    ///
    /// Messages get UIDs in order of modification time, ties broken by file
    /// name. Flags and the subscription come from the mailbox's state file.
    /// The root mailbox (`parent` is `None`) never holds messages.
    pub(super) fn scan(
        name: String,
        parent: Option<MailboxId>,
        path: &Path,
        log_prefix: &str,
    ) -> Result<(Self, Vec<String>), Error> {
        let mut node = MailboxNode::empty(name, parent);

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if io::ErrorKind::NotFound == e.kind() => {
                info!(
                    "{} Creating missing mailbox directory {}",
                    log_prefix,
                    path.display()
                );
                file_ops::create_mailbox_dir(path)?;
                return Ok((node, vec![]));
            }
            Err(e) => return Err(e.into()),
        };

        let mut children = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_name = match entry.file_name().into_string() {
                Ok(n) => n,
                Err(n) => {
                    warn!(
                        "{} Ignoring non-UTF-8 name {:?} in {}",
                        log_prefix,
                        n,
                        path.display()
                    );
                    continue;
                }
            };

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                if is_safe_name(&file_name) {
                    children.push(file_name);
                } else {
                    debug!(
                        "{} Ignoring directory {:?} in {}",
                        log_prefix,
                        file_name,
                        path.display()
                    );
                }
            } else if file_type.is_file()
                && parent.is_some()
                && is_message_file_name(&file_name)
            {
                let md = entry.metadata()?;
                files.push((file_ops::mtime(&md), file_name, md.len()));
            }
        }

        children.sort();
        files.sort();

        if parent.is_none() {
            return Ok((node, children));
        }

        let metadata = MailboxMetadata::load(path, log_prefix);
        node.subscribed = metadata.subscribed;
        for (internal_date, file_name, len) in files {
            let uid = node.allocate_uid()?;
            node.messages.push(MessageRecord {
                uid,
                internal_date,
                size: clamp_size(len),
                flags: metadata.flags_for(&file_name, log_prefix),
                file_name,
            });
        }

        Ok((node, children))
    }

    /// The state file contents describing this mailbox.
    pub(super) fn metadata(&self) -> MailboxMetadata {
        let mut metadata = MailboxMetadata {
            subscribed: self.subscribed,
            ..MailboxMetadata::default()
        };
        for msg in &self.messages {
            metadata.set_flags(&msg.file_name, &msg.flags);
        }
        metadata
    }

    /// Drop the records of messages whose files under `dir` no longer exist.
    ///
    /// Returns the number of records dropped.
    pub(super) fn forget_missing(&mut self, dir: &Path) -> usize {
        let before = self.messages.len();
        self.messages
            .retain(|m| fs::symlink_metadata(dir.join(&m.file_name)).is_ok());
        before - self.messages.len()
    }

    /// Allocate the next UID.
    fn allocate_uid(&mut self) -> Result<Uid, Error> {
        let uid = self.uid_next;
        self.uid_next = uid.next().ok_or(Error::MailboxFull)?;
        Ok(uid)
    }

    /// Iterate the messages addressed by `ids`, along with their sequence
    /// numbers.
    fn matching<'a, ID: MessageId>(
        &'a self,
        ids: &'a SeqRange<ID>,
    ) -> impl Iterator<Item = (Seqnum, &'a MessageRecord)> + 'a {
        self.messages
            .iter()
            .enumerate()
            .map(|(ix, msg)| (Seqnum::from_index(ix), msg))
            .filter(move |&(seqnum, msg)| {
                ids.contains(ID::select(seqnum, msg.uid))
            })
    }

    fn first_unseen(&self) -> Option<Seqnum> {
        self.messages
            .iter()
            .position(|m| !m.has_flag(&Flag::Seen))
            .map(Seqnum::from_index)
    }

    /// The distinct flags set on any message, in order of first appearance.
    fn distinct_flags(&self) -> Vec<Flag> {
        let mut flags: Vec<Flag> = Vec::new();
        for flag in self.messages.iter().flat_map(|m| &m.flags) {
            if !flags.contains(flag) {
                flags.push(flag.clone());
            }
        }
        flags
    }
}

/// Write `data` into a new, uniquely-named message file under `dir`.
///
/// On success, returns the name of the file and its size. On failure, the
/// partial file is removed.
fn write_message_file(
    dir: &Path,
    uid: Uid,
    data: &mut dyn Read,
    internal_date: DateTime<FixedOffset>,
    log_prefix: &str,
) -> Result<(String, u32), Error> {
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{}_", uid.0.get()))
        .suffix(".eml")
        .tempfile_in(dir)?;
    let size = io::copy(data, &mut tmp)?;
    tmp.as_file().sync_all()?;
    let (file, path) = tmp.keep().map_err(|e| e.error)?;

    if let Err(e) = file_ops::set_mtime(&file, internal_date) {
        warn!(
            "{} Failed to set modification time of {}: {}",
            log_prefix,
            path.display(),
            e
        );
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((file_name, clamp_size(size)))
}

/// A read-only handle on one mailbox.
#[derive(Clone, Copy)]
pub struct Mailbox<'a> {
    pub(super) store: &'a UserStore,
    pub(super) id: MailboxId,
}

impl fmt::Debug for Mailbox<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Mailbox({:?})", self.name())
    }
}

impl<'a> Mailbox<'a> {
    fn node(&self) -> &'a MailboxNode {
        self.store.node(self.id)
    }

    pub fn id(&self) -> MailboxId {
        self.id
    }

    /// The full hierarchical name of this mailbox.
    pub fn name(&self) -> String {
        self.store.full_name(self.id)
    }

    /// The directory holding this mailbox's messages.
    pub fn path(&self) -> PathBuf {
        self.store.path(self.id)
    }

    pub fn is_subscribed(&self) -> bool {
        self.node().subscribed
    }

    pub fn has_children(&self) -> bool {
        !self.node().children.is_empty()
    }

    /// The number of messages in the mailbox.
    pub fn len(&self) -> usize {
        self.node().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node().messages.is_empty()
    }

    pub fn uid_next(&self) -> Uid {
        self.node().uid_next
    }

    pub fn uid_validity(&self) -> u32 {
        self.store.uid_validity()
    }

    pub fn messages(&self) -> &'a [MessageRecord] {
        &self.node().messages
    }

    /// Parse an IMAP UID set such as `1:5,7` or `3:*`.
    ///
    /// `*` stands for the greatest UID in the mailbox. UIDs which do not
    /// exist are allowed.
    pub fn parse_uids(&self, raw: &str) -> Result<SeqRange<Uid>, Error> {
        let max_uid =
            self.node().messages.last().map_or(Uid::MIN, |m| m.uid);
        SeqRange::parse(raw, max_uid).ok_or(Error::BadSequenceSet)
    }

    /// Return the sequence number of the message with the given UID.
    pub fn seqnum(&self, uid: Uid) -> Option<Seqnum> {
        self.node()
            .messages
            .binary_search_by_key(&uid, |m| m.uid)
            .ok()
            .map(Seqnum::from_index)
    }

    pub fn status(&self, request: &StatusRequest) -> StatusResponse {
        let node = self.node();

        StatusResponse {
            name: self.name(),
            messages: if request.messages {
                Some(node.messages.len())
            } else {
                None
            },
            recent: if request.recent { Some(0) } else { None },
            uidnext: if request.uidnext {
                Some(node.uid_next)
            } else {
                None
            },
            uidvalidity: if request.uidvalidity {
                Some(self.uid_validity())
            } else {
                None
            },
            unseen: if request.unseen {
                Some(
                    node.messages
                        .iter()
                        .filter(|m| !m.has_flag(&Flag::Seen))
                        .count(),
                )
            } else {
                None
            },
            flags: node.distinct_flags(),
            permanent_flags: PERMANENT_FLAGS.to_vec(),
            new_keywords: true,
            first_unseen: node.first_unseen(),
        }
    }

    /// Fetch the requested data for each message addressed by the request.
    ///
    /// Messages are visited in mailbox order. Content is only read when the
    /// item is pulled from the iterator. A message whose content cannot be
    /// read produces an `Err` for that message alone.
    pub fn fetch<ID, P>(
        self,
        request: &'a FetchRequest<ID>,
        parser: &'a P,
    ) -> impl Iterator<Item = Result<FetchedMessage<P>, MessageFailure>> + 'a
    where
        ID: MessageId,
        P: MessageParser + ?Sized,
        SeqRange<ID>: fmt::Debug,
    {
        let node = self.node();
        let log_prefix = self.store.log_prefix();
        let dir = self.path();

        node.matching(&request.ids).map(move |(seqnum, msg)| {
            msg.fetch(seqnum, &dir, request, parser).map_err(|error| {
                warn!(
                    "{} Failed to fetch UID {} from {}: {}",
                    log_prefix,
                    msg.uid.0.get(),
                    dir.display(),
                    error
                );
                MessageFailure {
                    uid: msg.uid,
                    error,
                }
            })
        })
    }

    /// Find the messages accepted by `matcher`.
    ///
    /// Hits are reported as `ID`s, in mailbox order. Messages the matcher
    /// fails on are left out of the hits and reported separately.
    pub fn search<ID: MessageId, M: SearchMatcher>(
        &self,
        mut matcher: M,
    ) -> SearchResponse<ID> {
        let dir = self.path();
        let mut response = SearchResponse {
            hits: vec![],
            failed: vec![],
        };

        for (ix, msg) in self.node().messages.iter().enumerate() {
            let seqnum = Seqnum::from_index(ix);
            let candidate = msg.search_candidate(seqnum);
            match matcher.matches(&candidate, &msg.content(&dir)) {
                Ok(true) => response.hits.push(ID::select(seqnum, msg.uid)),
                Ok(false) => (),
                Err(error) => {
                    warn!(
                        "{} Search failed on UID {} in {}: {}",
                        self.store.log_prefix(),
                        msg.uid.0.get(),
                        dir.display(),
                        error
                    );
                    response.failed.push(MessageFailure {
                        uid: msg.uid,
                        error,
                    });
                }
            }
        }

        response
    }
}

/// A read-write handle on one mailbox.
pub struct MailboxMut<'a> {
    pub(super) store: &'a mut UserStore,
    pub(super) id: MailboxId,
}

impl fmt::Debug for MailboxMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MailboxMut({:?})", self.view().name())
    }
}

impl<'a> MailboxMut<'a> {
    /// Borrow a read-only view of this mailbox.
    pub fn view(&self) -> Mailbox<'_> {
        Mailbox {
            store: self.store,
            id: self.id,
        }
    }

    pub fn id(&self) -> MailboxId {
        self.id
    }

    fn node_mut(&mut self) -> &mut MailboxNode {
        self.store.node_mut(self.id)
    }

    pub fn set_subscribed(&mut self, subscribed: bool) {
        self.node_mut().subscribed = subscribed;
        self.store.save_metadata(self.id);
    }

    /// Add a new message to the end of this mailbox.
    ///
    /// `date` is the internal date of the message, defaulting to the current
    /// time. Unknown flags are stored as given.
    pub fn append(
        &mut self,
        date: Option<DateTime<FixedOffset>>,
        flags: &[Flag],
        mut data: impl Read,
    ) -> Result<Uid, Error> {
        let date = date.unwrap_or_else(|| Utc::now().trunc_subsecs(0).into());
        let uid = self.view().uid_next();
        let next = uid.next().ok_or(Error::MailboxFull)?;
        let dir = self.view().path();

        let (file_name, size) = write_message_file(
            &dir,
            uid,
            &mut data,
            date,
            self.store.log_prefix(),
        )?;

        let mut message = MessageRecord {
            uid,
            internal_date: date,
            size,
            flags: vec![],
            file_name,
        };
        message.update_flags(flags, FlagOp::Replace);

        info!(
            "{} Appended UID {} ({} bytes) to {}",
            self.store.log_prefix(),
            uid.0.get(),
            size,
            self.view().name()
        );

        let node = self.node_mut();
        node.messages.push(message);
        node.uid_next = next;
        self.store.save_metadata(self.id);
        Ok(uid)
    }

    /// Modify the flags of the messages addressed by `request`.
    ///
    /// Returns the sequence numbers of the affected messages. Ids which do
    /// not address any message are ignored.
    pub fn store<ID: MessageId>(
        &mut self,
        request: &StoreRequest<'_, ID>,
    ) -> Vec<Seqnum>
    where
        SeqRange<ID>: fmt::Debug,
    {
        let mut touched = Vec::new();
        for (ix, msg) in self.node_mut().messages.iter_mut().enumerate() {
            let seqnum = Seqnum::from_index(ix);
            if request.ids.contains(ID::select(seqnum, msg.uid)) {
                msg.update_flags(request.flags, request.op);
                touched.push(seqnum);
            }
        }

        if !touched.is_empty() {
            self.store.save_metadata(self.id);
        }
        touched
    }

    /// Copy the messages addressed by `ids` to the end of the mailbox named
    /// `dest`, which may be this mailbox.
    ///
    /// Internal dates and flags are preserved. Messages which fail to copy
    /// are reported in the response; the rest are copied regardless.
    pub fn copy<ID: MessageId>(
        &mut self,
        ids: &SeqRange<ID>,
        dest: &str,
    ) -> Result<CopyResponse, Error> {
        let dest_id = self.store.find(dest)?;
        let src_dir = self.view().path();
        let dest_dir = self.store.path(dest_id);
        let dest_name = self.store.full_name(dest_id);

        let sources: Vec<MessageRecord> = self
            .view()
            .node()
            .matching(ids)
            .map(|(_, msg)| msg.clone())
            .collect();

        let mut response = CopyResponse {
            uid_validity: self.store.uid_validity(),
            ..CopyResponse::default()
        };

        for src in sources {
            match self.copy_one(&src, &src_dir, dest_id, &dest_dir) {
                Ok(new_uid) => {
                    response.from_uids.add(src.uid);
                    response.to_uids.add(new_uid);
                }
                Err(error) => {
                    warn!(
                        "{} Failed to copy UID {} to {}: {}",
                        self.store.log_prefix(),
                        src.uid.0.get(),
                        dest_name,
                        error
                    );
                    response.failed.push(MessageFailure {
                        uid: src.uid,
                        error,
                    });
                }
            }
        }

        if !response.to_uids.is_empty() {
            self.store.save_metadata(dest_id);
        }

        info!(
            "{} Copied {} message(s) from {} to {}",
            self.store.log_prefix(),
            response.from_uids.items(Uid::MAX).count(),
            self.view().name(),
            dest_name
        );

        Ok(response)
    }

    fn copy_one(
        &mut self,
        src: &MessageRecord,
        src_dir: &Path,
        dest_id: MailboxId,
        dest_dir: &Path,
    ) -> Result<Uid, Error> {
        let uid = self.store.node(dest_id).uid_next;
        let next = uid.next().ok_or(Error::MailboxFull)?;

        let mut reader = src.content(src_dir).open()?;
        let (file_name, size) = write_message_file(
            dest_dir,
            uid,
            &mut reader,
            src.internal_date,
            self.store.log_prefix(),
        )?;

        let dest = self.store.node_mut(dest_id);
        dest.messages.push(MessageRecord {
            uid,
            internal_date: src.internal_date,
            size,
            flags: src.flags.clone(),
            file_name,
        });
        dest.uid_next = next;
        Ok(uid)
    }

    /// Permanently remove every message flagged `\Deleted`.
    ///
    /// Messages are removed from the end of the mailbox towards the start. A
    /// message whose file cannot be removed stays in the mailbox and is
    /// reported as a failure; a file which is already gone counts as removed.
    pub fn expunge(&mut self) -> ExpungeResponse {
        let dir = self.view().path();
        let log_prefix = self.store.log_prefix().to_owned();
        let mut response = ExpungeResponse::default();

        let node = self.node_mut();
        for ix in (0..node.messages.len()).rev() {
            if !node.messages[ix].has_flag(&Flag::Deleted) {
                continue;
            }

            let uid = node.messages[ix].uid;
            match fs::remove_file(dir.join(&node.messages[ix].file_name))
                .ignore_not_found()
            {
                Ok(()) => {
                    node.messages.remove(ix);
                    response.expunged.push((Seqnum::from_index(ix), uid));
                }
                Err(e) => {
                    warn!(
                        "{} Failed to expunge UID {} from {}: {}",
                        log_prefix,
                        uid.0.get(),
                        dir.display(),
                        e
                    );
                    response.failed.push(MessageFailure {
                        uid,
                        error: e.into(),
                    });
                }
            }
        }

        if !response.expunged.is_empty() {
            self.store.save_metadata(self.id);
            info!(
                "{} Expunged {} message(s) from {}",
                log_prefix,
                response.expunged.len(),
                dir.display()
            );
        }

        response
    }
}
