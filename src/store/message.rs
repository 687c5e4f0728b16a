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
use std::fmt;
use std::path::Path;

use chrono::prelude::*;

use super::model::*;
use super::parse::{MessageContent, MessageParser, SearchCandidate};
use crate::support::error::Error;

/// The metadata of one stored message.
///
/// The content lives in `file_name` within the owning mailbox's directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageRecord {
    pub uid: Uid,
    pub internal_date: DateTime<FixedOffset>,
    pub size: u32,
    /// The flags on the message, without duplicates, in the order they were
    /// added.
    pub flags: Vec<Flag>,
    pub file_name: String,
}

/// Clamp a file length to the 32-bit size IMAP can report.
pub fn clamp_size(len: u64) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl MessageRecord {
    pub fn has_flag(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    /// Add `flag` if not already present. Returns whether anything changed.
    pub fn add_flag(&mut self, flag: &Flag) -> bool {
        if self.has_flag(flag) {
            false
        } else {
            self.flags.push(flag.clone());
            true
        }
    }

    /// Remove `flag` if present. Returns whether anything changed.
    pub fn remove_flag(&mut self, flag: &Flag) -> bool {
        let before = self.flags.len();
        self.flags.retain(|f| f != flag);
        before != self.flags.len()
    }

    /// Combine `flags` into this message's flags according to `op`.
    pub fn update_flags(&mut self, flags: &[Flag], op: FlagOp) {
        match op {
            FlagOp::Add => {
                for flag in flags {
                    self.add_flag(flag);
                }
            }
            FlagOp::Remove => {
                for flag in flags {
                    self.remove_flag(flag);
                }
            }
            FlagOp::Replace => {
                self.flags.clear();
                for flag in flags {
                    self.add_flag(flag);
                }
            }
        }
    }

    pub fn content(&self, dir: &Path) -> MessageContent {
        MessageContent::new(dir.join(&self.file_name))
    }

    pub fn search_candidate(&self, seqnum: Seqnum) -> SearchCandidate {
        SearchCandidate {
            seqnum,
            uid: self.uid,
            internal_date: self.internal_date,
            flags: self.flags.clone(),
            size: self.size,
        }
    }

    /// Build the fetch response for this message.
    ///
    /// Metadata is served from the record; everything else opens the backing
    /// file once per parser call.
    pub fn fetch<ID, P>(
        &self,
        seqnum: Seqnum,
        dir: &Path,
        request: &FetchRequest<ID>,
        parser: &P,
    ) -> Result<FetchedMessage<P>, Error>
    where
        P: MessageParser + ?Sized,
        SeqRange<ID>: fmt::Debug,
    {
        let mut fetched = FetchedMessage {
            seqnum,
            uid: if request.uid { Some(self.uid) } else { None },
            flags: if request.flags {
                Some(self.flags.clone())
            } else {
                None
            },
            rfc822size: if request.rfc822size {
                Some(self.size)
            } else {
                None
            },
            internal_date: if request.internal_date {
                Some(self.internal_date)
            } else {
                None
            },
            envelope: None,
            body: None,
            bodystructure: None,
            sections: Vec::with_capacity(request.sections.len()),
        };

        if !request.needs_content() {
            return Ok(fetched);
        }

        let content = self.content(dir);
        if request.envelope {
            fetched.envelope = Some(parser.envelope(&mut content.open()?)?);
        }
        if request.body {
            fetched.body =
                Some(parser.body_structure(&mut content.open()?, false)?);
        }
        if request.bodystructure {
            fetched.bodystructure =
                Some(parser.body_structure(&mut content.open()?, true)?);
        }
        for section in &request.sections {
            let data = parser.body_section(&mut content.open()?, section)?;
            fetched.sections.push((section.clone(), data));
        }

        Ok(fetched)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::store::parse::{BodySection, RawMessageParser};

    fn record() -> MessageRecord {
        MessageRecord {
            uid: Uid::u(3),
            internal_date: FixedOffset::east(0)
                .ymd(2020, 1, 2)
                .and_hms(3, 4, 5),
            size: 11,
            flags: vec![Flag::Seen],
            file_name: "3_abc.eml".to_owned(),
        }
    }

    #[test]
    fn flag_updates() {
        let mut r = record();

        r.update_flags(&[Flag::Flagged, Flag::Seen], FlagOp::Add);
        assert_eq!(vec![Flag::Seen, Flag::Flagged], r.flags);

        r.update_flags(&[Flag::Seen, Flag::Draft], FlagOp::Remove);
        assert_eq!(vec![Flag::Flagged], r.flags);

        r.update_flags(
            &[
                Flag::Keyword("$Junk".to_owned()),
                Flag::Keyword("$junk".to_owned()),
                Flag::Answered,
            ],
            FlagOp::Replace,
        );
        assert_eq!(
            vec![Flag::Keyword("$Junk".to_owned()), Flag::Answered],
            r.flags
        );

        r.update_flags(&[], FlagOp::Replace);
        assert!(r.flags.is_empty());
    }

    #[test]
    fn fetch_metadata_and_content() {
        let dir = TempDir::new().unwrap();
        let r = record();
        fs::write(dir.path().join(&r.file_name), b"A: b\r\n\r\nbody").unwrap();

        let request = FetchRequest::<Uid> {
            ids: SeqRange::just(Uid::u(3)),
            uid: true,
            flags: true,
            rfc822size: true,
            sections: vec![BodySection::default()],
            ..FetchRequest::default()
        };

        let fetched = r
            .fetch(Seqnum::u(1), dir.path(), &request, &RawMessageParser)
            .unwrap();
        assert_eq!(Some(Uid::u(3)), fetched.uid);
        assert_eq!(Some(vec![Flag::Seen]), fetched.flags);
        assert_eq!(Some(11), fetched.rfc822size);
        assert_eq!(None, fetched.internal_date);
        assert!(fetched.envelope.is_none());
        assert_eq!(1, fetched.sections.len());
        assert_eq!(b"A: b\r\n\r\nbody", &fetched.sections[0].1[..]);

        fs::remove_file(dir.path().join(&r.file_name)).unwrap();
        assert_matches!(
            Err(Error::NxMessage),
            r.fetch(Seqnum::u(1), dir.path(), &request, &RawMessageParser)
        );

        // Metadata-only requests never touch the file
        let request = FetchRequest::<Uid> {
            ids: SeqRange::just(Uid::u(3)),
            flags: true,
            ..FetchRequest::default()
        };
        assert!(r
            .fetch(Seqnum::u(1), dir.path(), &request, &RawMessageParser)
            .is_ok());
    }

    #[test]
    fn size_clamping() {
        assert_eq!(42, clamp_size(42));
        assert_eq!(u32::MAX, clamp_size(1 << 40));
    }
}
