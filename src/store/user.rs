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

use std::convert::TryFrom;
use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use log::{error, info, warn};

use super::mailbox::{Mailbox, MailboxId, MailboxMut, MailboxNode};
use super::metadata::MailboxMetadata;
use crate::support::error::Error;
use crate::support::file_ops::{self, ErrorTransforms, IgnoreKinds};
use crate::support::mailbox_paths::*;
use crate::support::safe_name::is_safe_name;

/// One entry in the result of `UserStore::list()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub id: MailboxId,
    /// The full hierarchical name of the mailbox.
    pub name: String,
    pub subscribed: bool,
    pub has_children: bool,
}

/// The mailbox hierarchy of one user.
///
/// Each mailbox is a directory under `root`, nested to match the hierarchy,
/// and each message is a file in its mailbox's directory. The whole tree is
/// loaded into memory when the store is opened; from then on, the in-memory
/// tree is authoritative and every change is applied to the filesystem and
/// the tree together.
///
/// Mailboxes live in an arena indexed by `MailboxId`. The root of the tree
/// corresponds to `root` itself; it has no name, holds no messages, and is
/// never returned by any lookup.
#[derive(Debug)]
pub struct UserStore {
    log_prefix: String,
    user_name: String,
    root: PathBuf,
    uid_validity: u32,
    nodes: Vec<Option<MailboxNode>>,
    root_id: MailboxId,
}

/// Choose the UID validity for a store opened now.
///
/// This is the number of seconds since 2020-01-01, but always greater than
/// `previous`, the last value issued for the same store.
fn next_uid_validity(previous: Option<u32>) -> u32 {
    let epoch = Utc.ymd(2020, 1, 1).and_hms(0, 0, 0);
    let secs = (Utc::now() - epoch).num_seconds().max(1);
    let now = u32::try_from(secs).unwrap_or(u32::MAX);
    match previous {
        Some(previous) => now.max(previous.wrapping_add(1)).max(1),
        None => now,
    }
}

impl UserStore {
    /// Open the store of `user_name` rooted at `root`.
    ///
    /// The whole directory tree is scanned. Missing directories, including
    /// `root` itself and `INBOX`, are created.
    ///
    /// Since UIDs are reassigned by every scan, each open gets a new UID
    /// validity, recorded in the root's state file.
    pub fn open(user_name: &str, root: PathBuf) -> Result<Self, Error> {
        fs::DirBuilder::new()
            .recursive(true)
            .mode(file_ops::MAILBOX_DIR_MODE)
            .create(&root)?;

        let log_prefix = format!("[{}]", user_name);
        let mut root_metadata = MailboxMetadata::load(&root, &log_prefix);
        let uid_validity = next_uid_validity(root_metadata.uid_validity);
        root_metadata.uid_validity = Some(uid_validity);
        if let Err(e) = root_metadata.save(&root) {
            warn!(
                "{} Failed to record UID validity in {}: {}",
                log_prefix,
                root.display(),
                e
            );
        }

        let mut this = UserStore {
            log_prefix,
            user_name: user_name.to_owned(),
            root,
            uid_validity,
            nodes: vec![],
            root_id: MailboxId(0),
        };

        let root = this.root.clone();
        this.root_id = this.load(None, String::new(), &root)?;

        if this.find(INBOX).is_err() {
            this.create(INBOX)?;
        }

        info!(
            "{} Opened mail store at {} with {} mailbox(es)",
            this.log_prefix,
            this.root.display(),
            this.list(false).len()
        );

        Ok(this)
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uid_validity(&self) -> u32 {
        self.uid_validity
    }

    pub(super) fn log_prefix(&self) -> &str {
        &self.log_prefix
    }

    pub(super) fn node(&self, id: MailboxId) -> &MailboxNode {
        self.nodes[id.0].as_ref().expect("Dangling MailboxId")
    }

    pub(super) fn node_mut(&mut self, id: MailboxId) -> &mut MailboxNode {
        self.nodes[id.0].as_mut().expect("Dangling MailboxId")
    }

    /// Write the state file of the mailbox `id`.
    ///
    /// Failures are logged and otherwise ignored.
    pub(super) fn save_metadata(&self, id: MailboxId) {
        let path = self.path(id);
        if let Err(e) = self.node(id).metadata().save(&path) {
            error!(
                "{} Failed to save state of {}: {}",
                self.log_prefix,
                self.full_name(id),
                e
            );
        }
    }

    /// Load the mailbox at `path` and everything under it into the arena.
    ///
    /// If anything in the subtree fails to load, the arena is left exactly
    /// as it was.
    fn load(
        &mut self,
        parent: Option<MailboxId>,
        name: String,
        path: &Path,
    ) -> Result<MailboxId, Error> {
        let mark = self.nodes.len();
        let result = self.load_subtree(parent, name, path);
        if result.is_err() {
            self.nodes.truncate(mark);
        }
        result
    }

    fn load_subtree(
        &mut self,
        parent: Option<MailboxId>,
        name: String,
        path: &Path,
    ) -> Result<MailboxId, Error> {
        let (node, child_names) =
            MailboxNode::scan(name, parent, path, &self.log_prefix)?;
        let id = MailboxId(self.nodes.len());
        self.nodes.push(Some(node));

        for child_name in child_names {
            let child_path = path.join(&child_name);
            let child = self.load_subtree(Some(id), child_name, &child_path)?;
            self.node_mut(id).children.push(child);
        }

        Ok(id)
    }

    /// The local names on the path from the root to `id`, root excluded.
    fn segments(&self, id: MailboxId) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut cursor = id;
        while let Some(parent) = self.node(cursor).parent {
            segments.push(self.node(cursor).name.as_str());
            cursor = parent;
        }
        segments.reverse();
        segments
    }

    pub(super) fn full_name(&self, id: MailboxId) -> String {
        self.segments(id).join(&*DELIMITER.to_string())
    }

    pub(super) fn path(&self, id: MailboxId) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(self.segments(id));
        path
    }

    fn child(&self, parent: MailboxId, name: &str) -> Option<MailboxId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).name == name)
    }

    /// Resolve the mailbox named `name`.
    ///
    /// Empty segments are ignored and a leading `INBOX` is matched
    /// case-insensitively. All other segments match exactly.
    pub fn find(&self, name: &str) -> Result<MailboxId, Error> {
        let mut cursor = self.root_id;
        let mut any = false;
        for segment in parse_mailbox_path(name) {
            cursor = self.child(cursor, segment).ok_or(Error::NxMailbox)?;
            any = true;
        }

        if any {
            Ok(cursor)
        } else {
            Err(Error::NxMailbox)
        }
    }

    pub fn mailbox(&self, name: &str) -> Result<Mailbox<'_>, Error> {
        let id = self.find(name)?;
        Ok(Mailbox { store: self, id })
    }

    pub fn mailbox_mut(&mut self, name: &str) -> Result<MailboxMut<'_>, Error> {
        let id = self.find(name)?;
        Ok(MailboxMut { store: self, id })
    }

    /// List every mailbox, or only subscribed ones, in hierarchical order.
    ///
    /// Each mailbox comes before its children; siblings are sorted by name.
    pub fn list(&self, subscribed_only: bool) -> Vec<ListEntry> {
        let mut entries = Vec::new();
        self.list_into(self.root_id, subscribed_only, &mut entries);
        entries
    }

    fn list_into(
        &self,
        id: MailboxId,
        subscribed_only: bool,
        dst: &mut Vec<ListEntry>,
    ) {
        let node = self.node(id);
        if id != self.root_id && (!subscribed_only || node.subscribed) {
            dst.push(ListEntry {
                id,
                name: self.full_name(id),
                subscribed: node.subscribed,
                has_children: !node.children.is_empty(),
            });
        }

        let mut children = node.children.clone();
        children.sort_by(|&a, &b| self.node(a).name.cmp(&self.node(b).name));
        for child in children {
            self.list_into(child, subscribed_only, dst);
        }
    }

    /// Like `list()`, but only returns mailboxes matching any of the given
    /// `LIST` patterns.
    pub fn list_matching<'a>(
        &self,
        patterns: impl IntoIterator<Item = &'a str>,
        subscribed_only: bool,
    ) -> Vec<ListEntry> {
        let matcher = mailbox_path_matcher(patterns);
        self.list(subscribed_only)
            .into_iter()
            .filter(|e| matcher(&e.name))
            .collect()
    }

    /// Create the mailbox `name`, along with any missing parents.
    ///
    /// Fails with `MailboxExists` if `name` itself already exists.
    pub fn create(&mut self, name: &str) -> Result<MailboxId, Error> {
        let segments: Vec<&str> = parse_mailbox_path(name).collect();
        if segments.is_empty() {
            return Err(Error::UnsafeName);
        }

        let (id, created) = self.create_path(&segments)?;
        if created.is_empty() {
            Err(Error::MailboxExists)
        } else {
            Ok(id)
        }
    }

    /// Ensure every mailbox along `segments` exists.
    ///
    /// Returns the id of the last one, and the ids of the mailboxes created by
    /// this call, parents first. On failure, nothing created by this call
    /// survives.
    fn create_path(
        &mut self,
        segments: &[&str],
    ) -> Result<(MailboxId, Vec<MailboxId>), Error> {
        if !segments.iter().all(|s| is_safe_name(s)) {
            return Err(Error::UnsafeName);
        }

        let mut cursor = self.root_id;
        let mut created = Vec::new();
        for &segment in segments {
            if let Some(child) = self.child(cursor, segment) {
                cursor = child;
                continue;
            }

            match self.create_child(cursor, segment) {
                Ok(child) => {
                    created.push(child);
                    cursor = child;
                }
                Err(e) => {
                    self.remove_created(&created);
                    return Err(e);
                }
            }
        }

        Ok((cursor, created))
    }

    fn create_child(
        &mut self,
        parent: MailboxId,
        name: &str,
    ) -> Result<MailboxId, Error> {
        let path = self.path(parent).join(name);
        file_ops::create_mailbox_dir(&path).on_exists(Error::MailboxExists)?;

        let id = MailboxId(self.nodes.len());
        self.nodes
            .push(Some(MailboxNode::empty(name.to_owned(), Some(parent))));
        self.node_mut(parent).children.push(id);

        info!("{} Created mailbox {}", self.log_prefix, self.full_name(id));
        Ok(id)
    }

    /// Undo `create_path()` for the mailboxes in `created`.
    fn remove_created(&mut self, created: &[MailboxId]) {
        for &id in created.iter().rev() {
            let path = self.path(id);
            if let Err(e) = fs::remove_dir(&path).ignore_not_found() {
                error!(
                    "{} Failed to remove {} while rolling back: {}",
                    self.log_prefix,
                    path.display(),
                    e
                );
            }
            self.detach(id);
            self.nodes[id.0] = None;
        }
    }

    /// Remove `id` from its parent's list of children.
    fn detach(&mut self, id: MailboxId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
    }

    /// Delete the mailbox `name` and every message in it.
    ///
    /// Mailboxes with children cannot be deleted, nor can `INBOX`.
    ///
    /// If the directory cannot be fully removed, the mailbox stays, minus
    /// whatever messages were removed before the failure.
    pub fn delete(&mut self, name: &str) -> Result<(), Error> {
        if is_inbox(name) {
            return Err(Error::BadOperationOnInbox);
        }

        let id = self.find(name)?;
        if !self.node(id).children.is_empty() {
            return Err(Error::MailboxHasInferiors);
        }

        let path = self.path(id);
        if let Err(e) = fs::remove_dir_all(&path).ignore_not_found() {
            let forgotten = self.node_mut(id).forget_missing(&path);
            error!(
                "{} Failed to delete {} ({} message(s) lost): {}",
                self.log_prefix,
                self.full_name(id),
                forgotten,
                e
            );
            if forgotten > 0 {
                self.save_metadata(id);
            }
            return Err(e.into());
        }

        info!(
            "{} Deleted mailbox {} ({} message(s))",
            self.log_prefix,
            self.full_name(id),
            self.node(id).messages.len()
        );

        self.detach(id);
        self.nodes[id.0] = None;
        Ok(())
    }

    /// Rename the mailbox `old` to `new`, along with all its children.
    ///
    /// Missing parents of `new` are created. If the operation fails, the
    /// hierarchy is left as it was, both in memory and on disk.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), Error> {
        if is_inbox(old) {
            return Err(Error::BadOperationOnInbox);
        }

        let id = self.find(old)?;
        let new_segments: Vec<&str> = parse_mailbox_path(new).collect();
        let (new_name, new_parent_segments) = match new_segments.split_last() {
            Some((&last, parents)) => (last, parents),
            None => return Err(Error::UnsafeName),
        };
        if !new_segments.iter().all(|s| is_safe_name(s)) {
            return Err(Error::UnsafeName);
        }
        if self.find(new).is_ok() {
            return Err(Error::MailboxExists);
        }

        let old_segments: Vec<String> =
            self.segments(id).into_iter().map(str::to_owned).collect();
        if new_segments.len() > old_segments.len()
            && old_segments.iter().zip(&new_segments).all(|(a, b)| a == b)
        {
            return Err(Error::RenameIntoSelf);
        }

        let (new_parent, created) = self.create_path(new_parent_segments)?;
        let result = self.move_node(id, new_parent, new_name);
        if result.is_err() {
            self.remove_created(&created);
        } else {
            info!(
                "{} Renamed mailbox {} to {}",
                self.log_prefix,
                old_segments.join(&*DELIMITER.to_string()),
                self.full_name(id)
            );
        }

        result
    }

    /// Move `id` under `new_parent` as `new_name`, in memory and on disk.
    ///
    /// On failure, the node's parent and name are restored.
    fn move_node(
        &mut self,
        id: MailboxId,
        new_parent: MailboxId,
        new_name: &str,
    ) -> Result<(), Error> {
        let old_path = self.path(id);
        let new_path = self.path(new_parent).join(new_name);
        if fs::symlink_metadata(&new_path).is_ok() {
            return Err(Error::MailboxExists);
        }

        let node = self.node(id);
        let old_parent = node.parent;
        let old_name = node.name.clone();

        self.relink(id, Some(new_parent), new_name.to_owned());
        match fs::rename(&old_path, &new_path)
            .on_exists(Error::MailboxExists)
            .on_not_found(Error::NxMailbox)
        {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    "{} Failed to move {} to {}: {}",
                    self.log_prefix,
                    old_path.display(),
                    new_path.display(),
                    e
                );
                self.relink(id, old_parent, old_name);
                Err(e)
            }
        }
    }

    fn relink(
        &mut self,
        id: MailboxId,
        parent: Option<MailboxId>,
        name: String,
    ) {
        self.detach(id);
        let node = self.node_mut(id);
        node.parent = parent;
        node.name = name;
        if let Some(parent) = parent {
            self.node_mut(parent).children.push(id);
        }
    }

    pub fn subscribe(&mut self, name: &str) -> Result<(), Error> {
        self.mailbox_mut(name)?.set_subscribed(true);
        Ok(())
    }

    pub fn unsubscribe(&mut self, name: &str) -> Result<(), Error> {
        self.mailbox_mut(name)?.set_subscribed(false);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::iter;

    use tempfile::TempDir;

    use super::*;
    use crate::store::model::*;

    fn set_up() -> (TempDir, UserStore) {
        let root = TempDir::new().unwrap();
        let store = UserStore::open("test", root.path().to_owned()).unwrap();
        (root, store)
    }

    fn names(store: &UserStore) -> Vec<String> {
        store.list(false).into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn open_creates_inbox() {
        let (root, store) = set_up();
        assert!(root.path().join("INBOX").is_dir());
        assert_eq!(vec!["INBOX"], names(&store));
        assert!(store.uid_validity() > 0);
        assert_eq!("test", store.user_name());
        assert_matches!(Err(Error::NxMailbox), store.find(""));
        assert_matches!(Err(Error::NxMailbox), store.find("/"));
        assert!(store.find("inbox").is_ok());
        assert!(store.find("/InBoX/").is_ok());
    }

    #[test]
    fn uid_validity_strictly_increases() {
        let root = TempDir::new().unwrap();
        let first = UserStore::open("test", root.path().to_owned())
            .unwrap()
            .uid_validity();
        let second = UserStore::open("test", root.path().to_owned())
            .unwrap()
            .uid_validity();
        assert!(second > first);

        let future = u32::MAX - 5;
        assert_eq!(future + 1, next_uid_validity(Some(future)));
        assert!(next_uid_validity(None) > 0);
    }

    #[test]
    fn open_creates_missing_root() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("deep").join("user");
        let store = UserStore::open("test", path.clone()).unwrap();
        assert!(path.join("INBOX").is_dir());
        assert_eq!(path, store.root());
    }

    #[test]
    fn create_intermediates() {
        let (root, mut store) = set_up();
        store.create("a/b/c").unwrap();
        assert_eq!(vec!["INBOX", "a", "a/b", "a/b/c"], names(&store));
        assert!(root.path().join("a/b/c").is_dir());

        for name in &["a", "a/b", "a/b/c"] {
            let mb = store.mailbox(name).unwrap();
            assert!(mb.is_empty());
            assert_eq!(Uid::MIN, mb.uid_next());
        }

        assert_matches!(Err(Error::MailboxExists), store.create("a/b"));
        assert_matches!(Err(Error::MailboxExists), store.create("a//b/"));
        assert_matches!(Err(Error::MailboxExists), store.create("inbox"));
        store.create("a/b/d").unwrap();
        store.create("INBOX/child").unwrap();
        assert!(root.path().join("INBOX/child").is_dir());
    }

    #[test]
    fn create_rejects_unsafe_names() {
        let (_root, mut store) = set_up();
        assert_matches!(Err(Error::UnsafeName), store.create(""));
        assert_matches!(Err(Error::UnsafeName), store.create("/"));
        assert_matches!(Err(Error::UnsafeName), store.create(".hidden"));
        assert_matches!(Err(Error::UnsafeName), store.create("a/#b"));
        assert_matches!(Err(Error::UnsafeName), store.create("a*"));
        assert_matches!(Err(Error::UnsafeName), store.create("a\\b"));
        assert_eq!(vec!["INBOX"], names(&store));
    }

    #[test]
    fn create_blocked_by_stray_file() {
        let (root, mut store) = set_up();
        store.create("x").unwrap();
        fs::write(root.path().join("x").join("y"), b"").unwrap();

        assert_matches!(Err(Error::MailboxExists), store.create("x/y/z"));
        assert_eq!(vec!["INBOX", "x"], names(&store));
        assert!(root.path().join("x").join("y").is_file());
    }

    #[test]
    fn list_order_and_subscriptions() {
        let (_root, mut store) = set_up();
        store.create("zeta").unwrap();
        store.create("alpha/two").unwrap();
        store.create("alpha/one").unwrap();

        assert_eq!(
            vec!["INBOX", "alpha", "alpha/one", "alpha/two", "zeta"],
            names(&store)
        );

        store.subscribe("alpha/two").unwrap();
        store.subscribe("zeta").unwrap();
        let subscribed: Vec<String> =
            store.list(true).into_iter().map(|e| e.name).collect();
        assert_eq!(vec!["alpha/two", "zeta"], subscribed);

        store.unsubscribe("zeta").unwrap();
        assert_eq!(1, store.list(true).len());
        assert_matches!(Err(Error::NxMailbox), store.subscribe("nx"));

        let alpha = store
            .list(false)
            .into_iter()
            .find(|e| "alpha" == e.name)
            .unwrap();
        assert!(alpha.has_children);
        assert!(!alpha.subscribed);
    }

    #[test]
    fn list_with_patterns() {
        let (_root, mut store) = set_up();
        store.create("work/todo/urgent").unwrap();
        store.create("play").unwrap();

        fn matched(store: &UserStore, pats: &[&str]) -> Vec<String> {
            store
                .list_matching(pats.iter().copied(), false)
                .into_iter()
                .map(|e| e.name)
                .collect()
        }

        assert_eq!(vec!["INBOX", "play", "work"], matched(&store, &["%"]));
        assert_eq!(
            vec!["work/todo", "work/todo/urgent"],
            matched(&store, &["work/*"])
        );
        assert_eq!(vec!["work/todo"], matched(&store, &["work/%"]));
        assert_eq!(vec!["INBOX", "play"], matched(&store, &["inbox", "p*"]));
        assert!(store
            .list_matching(iter::once("nothing"), false)
            .is_empty());
    }

    #[test]
    fn delete_mailbox() {
        let (root, mut store) = set_up();
        store.create("a/b").unwrap();
        store
            .mailbox_mut("a/b")
            .unwrap()
            .append(None, &[], &b"hello"[..])
            .unwrap();

        assert_matches!(Err(Error::MailboxHasInferiors), store.delete("a"));
        assert_eq!(vec!["INBOX", "a", "a/b"], names(&store));
        assert!(root.path().join("a").is_dir());

        assert_matches!(Err(Error::BadOperationOnInbox), store.delete("inbox"));
        assert_matches!(Err(Error::NxMailbox), store.delete("nx"));

        store.delete("a/b").unwrap();
        assert!(!root.path().join("a/b").exists());
        store.delete("a").unwrap();
        assert_eq!(vec!["INBOX"], names(&store));
        assert_matches!(Err(Error::NxMailbox), store.find("a"));

        // The name is free again
        store.create("a/b").unwrap();
        assert!(store.mailbox("a/b").unwrap().is_empty());
    }

    #[test]
    fn rename_moves_subtree() {
        let (root, mut store) = set_up();
        store.create("a/b").unwrap();
        store
            .mailbox_mut("a/b")
            .unwrap()
            .append(None, &[Flag::Seen], &b"hello"[..])
            .unwrap();

        store.rename("a", "x/y").unwrap();
        assert_eq!(vec!["INBOX", "x", "x/y", "x/y/b"], names(&store));
        assert!(root.path().join("x/y/b").is_dir());
        assert!(!root.path().join("a").exists());

        let moved = store.mailbox("x/y/b").unwrap();
        assert_eq!(1, moved.len());
        assert_eq!(vec![Flag::Seen], moved.messages()[0].flags);
        assert!(moved.path().join(&moved.messages()[0].file_name).is_file());
    }

    #[test]
    fn rename_errors() {
        let (_root, mut store) = set_up();
        store.create("a/b").unwrap();
        store.create("c").unwrap();

        assert_matches!(
            Err(Error::BadOperationOnInbox),
            store.rename("INBOX", "d")
        );
        assert_matches!(Err(Error::NxMailbox), store.rename("nx", "d"));
        assert_matches!(Err(Error::MailboxExists), store.rename("a", "c"));
        assert_matches!(Err(Error::MailboxExists), store.rename("c", "inbox"));
        assert_matches!(Err(Error::RenameIntoSelf), store.rename("a", "a/b/x"));
        assert_matches!(Err(Error::UnsafeName), store.rename("c", "d/.e"));
        assert_matches!(Err(Error::UnsafeName), store.rename("c", "/"));

        assert_eq!(vec!["INBOX", "a", "a/b", "c"], names(&store));
    }

    #[test]
    fn rename_rolls_back_failed_move() {
        let (root, mut store) = set_up();
        store.create("x").unwrap();

        // Pull the directory out from under the store so the move fails
        fs::remove_dir(root.path().join("x")).unwrap();

        assert_matches!(
            Err(Error::NxMailbox),
            store.rename("x", "new/sub")
        );
        assert_eq!(vec!["INBOX", "x"], names(&store));
        assert!(store.find("new").is_err());
        assert!(!root.path().join("new").exists());
        assert_eq!(root.path().join("x"), store.mailbox("x").unwrap().path());
    }

    #[test]
    fn rename_onto_stray_file() {
        let (root, mut store) = set_up();
        store.create("x").unwrap();

        // "y" exists on disk but not in the tree
        fs::write(root.path().join("y"), b"").unwrap();
        assert_matches!(Err(Error::MailboxExists), store.rename("x", "y"));
        assert_eq!(vec!["INBOX", "x"], names(&store));
        assert!(root.path().join("x").is_dir());
    }
}
