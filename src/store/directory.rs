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

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::{info, warn};
use secstr::SecStr;

use super::user::UserStore;
use crate::support::error::Error;
use crate::support::system_config::SystemConfig;

/// A shared handle on one user's store.
///
/// Every session for the same user shares the one lock.
pub type SharedUserStore = Arc<Mutex<UserStore>>;

struct Account {
    password: SecStr,
    store: SharedUserStore,
}

/// Maps login names to user stores.
///
/// The set of users is fixed when the directory is opened.
pub struct Directory {
    accounts: HashMap<String, Account>,
}

impl Directory {
    /// Open the store of every user in `config`.
    ///
    /// Relative user roots are resolved against `system_root`.
    pub fn open(
        config: &SystemConfig,
        system_root: &Path,
    ) -> Result<Self, Error> {
        let mut accounts = HashMap::new();
        for user in &config.users {
            if accounts.contains_key(&user.name) {
                warn!(
                    "Ignoring duplicate configuration for user {:?}",
                    user.name
                );
                continue;
            }

            let store =
                UserStore::open(&user.name, user.mail_root(system_root))?;
            accounts.insert(
                user.name.clone(),
                Account {
                    password: SecStr::new(user.password.as_bytes().to_vec()),
                    store: Arc::new(Mutex::new(store)),
                },
            );
        }

        info!("Loaded {} user(s)", accounts.len());
        Ok(Directory { accounts })
    }

    /// Check `password` for `user_name` and return that user's store.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub fn login(
        &self,
        user_name: &str,
        password: &str,
    ) -> Result<SharedUserStore, Error> {
        let given = SecStr::new(password.as_bytes().to_vec());
        match self.accounts.get(user_name) {
            Some(account) if account.password == given => {
                info!("[{}] Login succeeded", user_name);
                Ok(Arc::clone(&account.store))
            }
            _ => {
                warn!("Rejected login for {:?}", user_name);
                Err(Error::Unauthenticated)
            }
        }
    }

    /// Return the store of `user_name` without checking credentials.
    pub fn user(&self, user_name: &str) -> Result<SharedUserStore, Error> {
        self.accounts
            .get(user_name)
            .map(|a| Arc::clone(&a.store))
            .ok_or(Error::Unauthenticated)
    }

    /// The configured login names, in no particular order.
    pub fn user_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.accounts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;
    use crate::support::system_config::UserConfig;

    fn set_up() -> (TempDir, Directory) {
        let root = TempDir::new().unwrap();
        let config = SystemConfig {
            users: vec![
                UserConfig {
                    name: "alice".to_owned(),
                    password: "hunter2".to_owned(),
                    root: None,
                },
                UserConfig {
                    name: "bob".to_owned(),
                    password: "pass".to_owned(),
                    root: Some("elsewhere/bob".into()),
                },
            ],
        };
        let directory = Directory::open(&config, root.path()).unwrap();
        (root, directory)
    }

    #[test]
    fn login() {
        let (root, directory) = set_up();

        let alice = directory.login("alice", "hunter2").unwrap();
        assert_eq!("alice", alice.lock().unwrap().user_name());
        assert_eq!(root.path().join("alice"), alice.lock().unwrap().root());

        let bob = directory.login("bob", "pass").unwrap();
        assert!(root.path().join("elsewhere/bob/INBOX").is_dir());
        drop(bob);

        assert_matches!(
            Err(Error::Unauthenticated),
            directory.login("alice", "pass")
        );
        assert_matches!(
            Err(Error::Unauthenticated),
            directory.login("alice", "")
        );
        assert_matches!(
            Err(Error::Unauthenticated),
            directory.login("carol", "hunter2")
        );
        assert_matches!(
            Err(Error::Unauthenticated),
            directory.login("ALICE", "hunter2")
        );
    }

    #[test]
    fn sessions_share_store() {
        let (_root, directory) = set_up();

        let a = directory.login("alice", "hunter2").unwrap();
        let b = directory.user("alice").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        a.lock().unwrap().create("shared").unwrap();
        assert!(b.lock().unwrap().find("shared").is_ok());

        assert_matches!(Err(Error::Unauthenticated), directory.user("carol"));

        let mut names: Vec<&str> = directory.user_names().collect();
        names.sort();
        assert_eq!(vec!["alice", "bob"], names);
    }
}
