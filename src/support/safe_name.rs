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

/// Determine whether the given mailbox name segment is "safe".
///
/// Every segment of a mailbox name is used verbatim as a directory name, so
/// this excludes empty names and anything that could traverse out of the
/// parent directory, as well as things that have special meaning within IMAP.
///
/// The same rule decides which directories are picked up as mailboxes when a
/// user's tree is scanned, so that hidden directories (`.git`, editor
/// droppings, etc) never show up as mailboxes.
///
/// This does not care about whether the name is ultimately a valid file name;
/// for that, we simply rely on the OS rejecting it.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty() &&
        // Block directory traversal through .. and hidden files on UNIX
        !name.starts_with('.') &&
        !name.contains('/') &&
        // Only a path separator on Windows, but always block since it has high
        // potential of causing problems
        !name.contains('\\') &&
        // Names beginning with # have special meaning in IMAP
        !name.starts_with('#') &&
        // Don't allow any ASCII control characters
        name.find(|c| c < ' ' || c == '\x7F').is_none() &&
        // * and % are LIST wildcards
        name.find(|c| c == '*' || c == '%').is_none()
}

/// Determine whether a regular file in a mailbox directory should be treated
/// as a message.
///
/// Hidden files are skipped, which also keeps half-written temporary files
/// from other tools out of the mailbox.
pub fn is_message_file_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.')
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_safe_name() {
        assert!(is_safe_name("foo"));
        assert!(is_safe_name("INBOX"));
        assert!(is_safe_name("Entwürfe"));
        assert!(is_safe_name("郵便"));
        assert!(is_safe_name("foo.bar"));
        assert!(is_safe_name("folder #1"));
        assert!(!is_safe_name(""));
        assert!(!is_safe_name("."));
        assert!(!is_safe_name(".."));
        assert!(!is_safe_name(".hidden"));
        assert!(!is_safe_name("foo/bar"));
        assert!(!is_safe_name("foo\\bar"));
        assert!(!is_safe_name("#news"));
        assert!(!is_safe_name("foo\0"));
        assert!(!is_safe_name("foo\r"));
        assert!(!is_safe_name("fo\x7Fo"));
        assert!(!is_safe_name("foo*bar"));
        assert!(!is_safe_name("foo%bar"));
    }

    #[test]
    fn test_is_message_file_name() {
        assert!(is_message_file_name("1_abcdef.eml"));
        assert!(is_message_file_name("1234567890.M1P2.host"));
        assert!(!is_message_file_name(".1_abcdef.eml"));
        assert!(!is_message_file_name(""));
    }
}
