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
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{error, info, LevelFilter};
use structopt::StructOpt;

use mailtree::store::directory::Directory;
use mailtree::store::model::*;
use mailtree::store::user::UserStore;
use mailtree::support::error::Error;
use mailtree::support::sysexits::*;
use mailtree::support::system_config::{SystemConfig, CONFIG_FILE_NAME};

macro_rules! die {
    ($ex:expr, $($stuff:tt)*) => {{
        eprintln!($($stuff)*);
        $ex.exit()
    }}
}

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
struct Options {
    /// The directory containing `mailtree.toml` and optionally
    /// `logging.toml`.
    #[structopt(long, parse(from_os_str), default_value = ".")]
    root: PathBuf,

    /// Log debug messages. Ignored if `logging.toml` exists.
    #[structopt(short, long)]
    verbose: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Open every configured user's store and report what was found.
    ///
    /// Missing user directories and INBOXes are created.
    Check,
    /// List a user's mailboxes.
    List(ListSubcommand),
    /// Create a mailbox, along with any missing parents.
    Create(MailboxSubcommand),
    /// Delete a mailbox and every message in it.
    Delete(MailboxSubcommand),
    /// Rename a mailbox and everything under it.
    Rename(RenameSubcommand),
    /// Show the status of a mailbox.
    Status(MailboxSubcommand),
    Deliver(DeliverSubcommand),
    /// Add, remove, or replace the flags on messages in a mailbox.
    Flag(FlagSubcommand),
    /// Permanently remove messages flagged \Deleted from a mailbox.
    Expunge(MailboxSubcommand),
    /// Mark a mailbox as subscribed.
    Subscribe(MailboxSubcommand),
    /// Mark a mailbox as not subscribed.
    Unsubscribe(MailboxSubcommand),
}

#[derive(StructOpt)]
struct ListSubcommand {
    /// The user whose mailboxes to list.
    #[structopt(short, long)]
    user: String,

    /// Only list subscribed mailboxes.
    #[structopt(long)]
    subscribed: bool,

    /// Only list mailboxes matching these IMAP LIST patterns. `*` matches
    /// anything; `%` matches anything but the hierarchy delimiter.
    patterns: Vec<String>,
}

#[derive(StructOpt)]
struct MailboxSubcommand {
    /// The user owning the mailbox.
    #[structopt(short, long)]
    user: String,

    /// The IMAP name of the mailbox, e.g. `Archive/2020`.
    mailbox: String,
}

#[derive(StructOpt)]
struct RenameSubcommand {
    /// The user owning the mailbox.
    #[structopt(short, long)]
    user: String,

    /// The current name of the mailbox.
    old: String,

    /// The new name of the mailbox.
    new: String,
}

/// Deliver or import mail.
///
/// Each input is stored as one message, byte for byte, with the current time
/// as its internal date.
#[derive(StructOpt)]
struct DeliverSubcommand {
    /// Deliver to this user.
    #[structopt(short, long)]
    user: String,

    /// Deliver to this mailbox. This must be an IMAP mailbox name, not a UNIX
    /// path.
    #[structopt(short, long, default_value = "INBOX")]
    mailbox: String,

    /// Create the destination mailbox if it does not already exist.
    #[structopt(short, long)]
    create: bool,

    /// Add this IMAP flag (e.g., '\Flagged') or keyword to the delivered
    /// message(s). Can be passed multiple times.
    #[structopt(parse(try_from_str), short, long, number_of_values(1))]
    flag: Vec<Flag>,

    /// The files to deliver. "-" will read from stdin.
    #[structopt(parse(from_os_str), default_value = "-")]
    inputs: Vec<PathBuf>,
}

#[derive(StructOpt)]
struct FlagSubcommand {
    /// The user owning the mailbox.
    #[structopt(short, long)]
    user: String,

    /// The UIDs of the messages to modify, as an IMAP sequence set, e.g.
    /// `1:5,7` or `3:*`.
    #[structopt(long, default_value = "1:*")]
    uids: String,

    /// Remove the given flags instead of adding them.
    #[structopt(long, conflicts_with = "replace")]
    remove: bool,

    /// Replace the existing flags with the given ones.
    #[structopt(long)]
    replace: bool,

    /// The IMAP name of the mailbox.
    mailbox: String,

    /// The flags (e.g., '\Seen') or keywords to apply.
    #[structopt(parse(try_from_str))]
    flags: Vec<Flag>,
}

fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let options = Options::from_clap(&match Options::clap()
        .get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    init_logging(&options.root, options.verbose);

    let system_config = match SystemConfig::load(&options.root) {
        Ok(config) => config,
        Err(e) => die!(
            EX_CONFIG,
            "Error loading '{}': {}",
            options.root.join(CONFIG_FILE_NAME).display(),
            e
        ),
    };

    let directory = match Directory::open(&system_config, &options.root) {
        Ok(directory) => directory,
        Err(e) => die!(Sysexit::for_error(&e), "Error opening stores: {}", e),
    };

    if let Err(e) = run(&directory, options.command) {
        error!("{}", e);
        die!(Sysexit::for_error(&e), "{}", e);
    }
}

fn init_logging(root: &Path, verbose: bool) {
    let log_config_file = root.join("logging.toml");
    if log_config_file.is_file() {
        if let Err(e) = log4rs::init_file(
            &log_config_file,
            log4rs::file::Deserializers::new(),
        ) {
            die!(
                EX_CONFIG,
                "Error in '{}': {}",
                log_config_file.display(),
                e
            );
        }
    } else {
        init_simple_log(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    }
}

fn init_simple_log(level: LevelFilter) {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S%.3f)} [{l}][{t}] {m}{n}",
        )))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level));

    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                die!(EX_SOFTWARE, "Failed to initialise logging: {}", e);
            }
        }
        Err(e) => die!(EX_SOFTWARE, "Bad logging configuration: {}", e),
    }
}

fn run(directory: &Directory, command: Command) -> Result<(), Error> {
    match command {
        Command::Check => {
            let mut names: Vec<&str> = directory.user_names().collect();
            names.sort();
            for name in names {
                let store = directory.user(name)?;
                let store = lock(&store);
                let mailboxes = store.list(false);
                let messages: usize = mailboxes
                    .iter()
                    .filter_map(|e| store.mailbox(&e.name).ok())
                    .map(|mb| mb.len())
                    .sum();
                println!(
                    "{}: {} mailbox(es), {} message(s) in {}",
                    name,
                    mailboxes.len(),
                    messages,
                    store.root().display()
                );
            }
        }

        Command::List(cmd) => {
            let store = directory.user(&cmd.user)?;
            let store = lock(&store);
            let entries = if cmd.patterns.is_empty() {
                store.list(cmd.subscribed)
            } else {
                store.list_matching(
                    cmd.patterns.iter().map(String::as_str),
                    cmd.subscribed,
                )
            };

            for entry in entries {
                println!("{}", entry.name);
            }
        }

        Command::Create(cmd) => {
            let store = directory.user(&cmd.user)?;
            lock(&store).create(&cmd.mailbox)?;
        }

        Command::Delete(cmd) => {
            let store = directory.user(&cmd.user)?;
            lock(&store).delete(&cmd.mailbox)?;
        }

        Command::Rename(cmd) => {
            let store = directory.user(&cmd.user)?;
            lock(&store).rename(&cmd.old, &cmd.new)?;
        }

        Command::Status(cmd) => {
            let store = directory.user(&cmd.user)?;
            let store = lock(&store);
            let status =
                store.mailbox(&cmd.mailbox)?.status(&StatusRequest::all());
            print_status(&status);
        }

        Command::Deliver(cmd) => deliver(directory, cmd)?,

        Command::Flag(cmd) => {
            let store = directory.user(&cmd.user)?;
            let mut store = lock(&store);
            let mut mailbox = store.mailbox_mut(&cmd.mailbox)?;
            let uids = mailbox.view().parse_uids(&cmd.uids)?;
            let op = if cmd.replace {
                FlagOp::Replace
            } else if cmd.remove {
                FlagOp::Remove
            } else {
                FlagOp::Add
            };

            let touched = mailbox.store(&StoreRequest {
                ids: &uids,
                flags: &cmd.flags,
                op,
            });
            println!("Updated {} message(s)", touched.len());
        }

        Command::Expunge(cmd) => {
            let store = directory.user(&cmd.user)?;
            let mut store = lock(&store);
            let response = store.mailbox_mut(&cmd.mailbox)?.expunge();
            println!("Expunged {} message(s)", response.expunged.len());
            if let Some(failure) = response.failed.into_iter().next() {
                return Err(failure.error);
            }
        }

        Command::Subscribe(cmd) => {
            let store = directory.user(&cmd.user)?;
            lock(&store).subscribe(&cmd.mailbox)?;
        }

        Command::Unsubscribe(cmd) => {
            let store = directory.user(&cmd.user)?;
            lock(&store).unsubscribe(&cmd.mailbox)?;
        }
    }

    Ok(())
}

fn lock(
    store: &std::sync::Mutex<UserStore>,
) -> std::sync::MutexGuard<'_, UserStore> {
    match store.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn print_status(status: &StatusResponse) {
    fn flags(flags: &[Flag]) -> String {
        flags
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    println!("Mailbox:        {}", status.name);
    if let Some(messages) = status.messages {
        println!("Messages:       {}", messages);
    }
    if let Some(unseen) = status.unseen {
        println!("Unseen:         {}", unseen);
    }
    if let Some(uidnext) = status.uidnext {
        println!("UID next:       {}", u32::from(uidnext));
    }
    if let Some(uidvalidity) = status.uidvalidity {
        println!("UID validity:   {}", uidvalidity);
    }
    if let Some(first_unseen) = status.first_unseen {
        println!("First unseen:   {}", u32::from(first_unseen));
    }
    println!("Flags:          {}", flags(&status.flags));
    println!(
        "Permanent:      {}{}",
        flags(&status.permanent_flags),
        if status.new_keywords { " \\*" } else { "" }
    );
}

fn deliver(directory: &Directory, cmd: DeliverSubcommand) -> Result<(), Error> {
    let store = directory.user(&cmd.user)?;
    let mut store = lock(&store);

    if cmd.create {
        match store.create(&cmd.mailbox) {
            Ok(_) | Err(Error::MailboxExists) => (),
            Err(e) => return Err(e),
        }
    }

    let mut mailbox = store.mailbox_mut(&cmd.mailbox)?;
    for input in &cmd.inputs {
        let data: Box<dyn Read> = if Path::new("-") == input {
            Box::new(io::stdin())
        } else {
            Box::new(fs::File::open(input)?)
        };

        let uid = mailbox.append(None, &cmd.flag, data)?;
        info!(
            "Delivered {} to {} as UID {}",
            input.display(),
            cmd.mailbox,
            u32::from(uid)
        );
    }

    Ok(())
}
