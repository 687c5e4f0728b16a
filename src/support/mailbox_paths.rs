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

/// The hierarchy delimiter of mailbox names.
pub const DELIMITER: char = '/';

/// The name of the mailbox which always exists and cannot be removed.
pub const INBOX: &str = "INBOX";

/// Given a raw mailbox name, emit the segments that comprise the actual path.
///
/// This accounts for the path delimiter, empty segments, and the required
/// case-insensitivity of the root `inbox` mailbox.
///
/// It does not check for name safety.
pub fn parse_mailbox_path(path: &str) -> impl Iterator<Item = &str> + '_ {
    path.split(DELIMITER)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(ix, s)| {
            if 0 == ix && INBOX.eq_ignore_ascii_case(s) {
                INBOX
            } else {
                s
            }
        })
}

/// Returns whether `path` refers to the INBOX itself (not a child of it).
pub fn is_inbox(path: &str) -> bool {
    let mut parts = parse_mailbox_path(path);
    Some(INBOX) == parts.next() && parts.next().is_none()
}

/// Creates a predicate which identifies which normalised mailbox names match
/// any element of `patterns`, with pattern matching performed as per RFC 3501.
///
/// `*` matches any run of characters, including the delimiter; `%` matches
/// any run of characters other than the delimiter.
///
/// Each pattern is first normalised by `parse_mailbox_path`.
pub fn mailbox_path_matcher<'a>(
    patterns: impl IntoIterator<Item = &'a str>,
) -> impl Fn(&str) -> bool {
    let mut rx = "^(".to_owned();
    for (pattern_ix, pattern) in patterns.into_iter().enumerate() {
        if pattern_ix > 0 {
            rx.push('|');
        }

        for (part_ix, part) in parse_mailbox_path(pattern).enumerate() {
            if part_ix > 0 {
                rx.push(DELIMITER);
            }

            let mut start = 0;
            for end in part
                .match_indices(|c| '%' == c || '*' == c)
                .map(|(ix, _)| ix)
                .chain(part.len()..=part.len())
            {
                let chunk = &part[start..end];
                start = (end + 1).min(part.len());

                rx.push_str(&regex::escape(chunk));
                match part.get(end..end + 1) {
                    Some("*") => rx.push_str(".*"),
                    Some("%") => rx.push_str("[^/]*"),
                    _ => (),
                }
            }
        }
    }
    rx.push_str(")$");

    // Every literal chunk went through regex::escape, so this cannot fail
    let rx = regex::Regex::new(&rx).expect("Built invalid regex?");
    move |s| rx.is_match(s)
}

#[cfg(test)]
mod test {
    use std::iter;

    use super::*;

    #[test]
    fn test_parse_mailbox_path() {
        fn p(p: &'static str) -> Vec<&'static str> {
            parse_mailbox_path(p).collect()
        }

        assert_eq!(vec!["INBOX"], p("inbox"));
        assert_eq!(vec!["INBOX", "foo"], p("Inbox/foo"));
        assert_eq!(vec!["bar"], p("/bar"));
        assert_eq!(vec!["bar"], p("bar/"));
        assert_eq!(vec!["foo", "bar"], p("foo//bar"));
        assert_eq!(vec!["foo", "InBoX"], p("foo/InBoX"));
        assert!(p("").is_empty());
        assert!(p("/").is_empty());
    }

    #[test]
    fn test_is_inbox() {
        assert!(is_inbox("INBOX"));
        assert!(is_inbox("inbox"));
        assert!(is_inbox("/InBox/"));
        assert!(!is_inbox("INBOX/child"));
        assert!(!is_inbox("foo/INBOX"));
        assert!(!is_inbox(""));
    }

    #[test]
    fn test_mailbox_patterns() {
        fn matches(pat: &str, mb: &str) -> bool {
            mailbox_path_matcher(iter::once(pat))(mb)
        }

        assert!(matches("*", "INBOX"));
        assert!(matches("%", "INBOX"));
        assert!(matches("inbox", "INBOX"));

        assert!(matches("INB*X", "INBOX"));
        assert!(matches("INB*X", "INB/BOX"));
        assert!(!matches("INB*X", "INBOX/plugh"));
        assert!(matches("INB%X", "INBOX"));
        assert!(!matches("INB%X", "INB/BOX"));

        assert!(matches("work/*", "work/todo"));
        assert!(matches("work/*", "work/todo/urgent"));
        assert!(!matches("work/*", "work"));
        assert!(matches("work/%", "work/todo"));
        assert!(!matches("work/%", "work/todo/urgent"));

        assert!(matches("a.b", "a.b"));
        assert!(!matches("a.b", "axb"));

        let multi = mailbox_path_matcher(vec!["foo", "bar/%"]);
        assert!(multi("foo"));
        assert!(multi("bar/baz"));
        assert!(!multi("bar"));
    }
}
