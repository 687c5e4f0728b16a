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

//! The seams between the store and the code which understands message
//! content.
//!
//! The store only ever deals in raw bytes. Whatever needs to look inside a
//! message (envelopes, body structures, section extraction, search criteria)
//! goes through `MessageParser` or `SearchMatcher`, which are handed a reader
//! over the message file.

use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::prelude::*;

use super::model::{Flag, Seqnum, Uid};
use crate::support::error::Error;
use crate::support::file_ops::ErrorTransforms;

/// Describes which portion of a part to process.
///
/// The semantics of the values match IMAP's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LeafType {
    /// The entire part, headers and all.
    Full,
    /// The header block of the part, including the blank line which ends it.
    Headers,
    /// The content of the part following the header block.
    Text,
}

/// Identifies a particular portion of the message to fetch.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BodySection {
    /// Which subsection of the part to read.
    pub leaf_type: LeafType,
    /// Apply filtering to these header names.
    ///
    /// Only meaningful with `LeafType::Headers`. An empty filter keeps all
    /// headers.
    pub header_filter: Vec<String>,
    /// If true, discard headers matching `header_filter`.
    ///
    /// If false, keep only headers matching that filter.
    pub discard_matching_headers: bool,
    /// If set, slice the binary data produced by the above to this
    /// `(offset, length)` range, clamping each endpoint.
    pub partial: Option<(u64, u64)>,
}

impl Default for BodySection {
    fn default() -> Self {
        BodySection {
            leaf_type: LeafType::Full,
            header_filter: vec![],
            discard_matching_headers: false,
            partial: None,
        }
    }
}

impl BodySection {
    /// Apply the `partial` slice of this section to `data`.
    pub fn slice(&self, mut data: Vec<u8>) -> Vec<u8> {
        if let Some((offset, length)) = self.partial {
            let len = data.len() as u64;
            let start = offset.min(len) as usize;
            let end = offset.saturating_add(length).min(len) as usize;
            data.truncate(end);
            data.drain(..start);
        }

        data
    }
}

/// Interprets the content of messages on behalf of `FETCH`.
///
/// Every method is given a fresh reader positioned at the start of the
/// message.
pub trait MessageParser {
    type Envelope: fmt::Debug;
    type BodyStructure: fmt::Debug;

    /// Produce the envelope (summary of the main headers) of the message.
    fn envelope(
        &self,
        content: &mut dyn BufRead,
    ) -> Result<Self::Envelope, Error>;

    /// Produce the body structure of the message.
    ///
    /// `extended` selects `BODYSTRUCTURE` over the plain `BODY` form.
    fn body_structure(
        &self,
        content: &mut dyn BufRead,
        extended: bool,
    ) -> Result<Self::BodyStructure, Error>;

    /// Extract the bytes of `section`, including any partial slicing.
    fn body_section(
        &self,
        content: &mut dyn BufRead,
        section: &BodySection,
    ) -> Result<Vec<u8>, Error>;
}

/// A handle on the content of one message, opened on demand.
#[derive(Clone, Debug)]
pub struct MessageContent {
    path: PathBuf,
}

impl MessageContent {
    pub fn new(path: PathBuf) -> Self {
        MessageContent { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the message for reading.
    ///
    /// Fails with `NxMessage` if the file has gone away.
    pub fn open(&self) -> Result<BufReader<fs::File>, Error> {
        let file = fs::File::open(&self.path).on_not_found(Error::NxMessage)?;
        Ok(BufReader::new(file))
    }

    /// Read the whole message into memory.
    pub fn read_all(&self) -> Result<Vec<u8>, Error> {
        let mut data = Vec::new();
        self.open()?.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// The metadata of a message offered to a `SearchMatcher`.
#[derive(Clone, Debug)]
pub struct SearchCandidate {
    pub seqnum: Seqnum,
    pub uid: Uid,
    pub internal_date: DateTime<FixedOffset>,
    pub flags: Vec<Flag>,
    pub size: u32,
}

impl SearchCandidate {
    pub fn has_flag(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }
}

/// Decides whether a message matches a search.
///
/// The content is only opened if the matcher asks for it, so criteria which
/// only need metadata stay cheap.
pub trait SearchMatcher {
    fn matches(
        &mut self,
        candidate: &SearchCandidate,
        content: &MessageContent,
    ) -> Result<bool, Error>;
}

impl<F> SearchMatcher for F
where
    F: FnMut(&SearchCandidate, &MessageContent) -> Result<bool, Error>,
{
    fn matches(
        &mut self,
        candidate: &SearchCandidate,
        content: &MessageContent,
    ) -> Result<bool, Error> {
        self(candidate, content)
    }
}

/// A `MessageParser` which understands only the split between the header
/// block and the body.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawMessageParser;

/// The envelope produced by `RawMessageParser`: the unfolded values of the
/// headers which make up an IMAP envelope, or `None` for those absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawEnvelope {
    pub date: Option<String>,
    pub subject: Option<String>,
    pub from: Option<String>,
    pub sender: Option<String>,
    pub reply_to: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub in_reply_to: Option<String>,
    pub message_id: Option<String>,
}

/// The body structure produced by `RawMessageParser`, which always treats
/// the message as a single part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawBodyStructure {
    /// The `Content-Type` value, defaulting to `text/plain`.
    pub content_type: String,
    /// The `Content-Transfer-Encoding` value, defaulting to `7bit`.
    pub transfer_encoding: String,
    /// The size of the body in bytes.
    pub size: u64,
    /// The number of lines in the body.
    pub lines: u64,
    /// The `Content-Disposition` value, only for extended structures.
    pub disposition: Option<String>,
    /// The `Content-Language` value, only for extended structures.
    pub language: Option<String>,
}

/// The raw header block and body of a message.
struct Split {
    data: Vec<u8>,
    /// Offset of the first byte of the body, just past the blank line
    /// ending the headers.
    body_start: usize,
}

impl Split {
    fn read(content: &mut dyn BufRead) -> io::Result<Self> {
        let mut data = Vec::new();
        content.read_to_end(&mut data)?;

        let mut body_start = data.len();
        let mut line_start = 0;
        while line_start < data.len() {
            let line_end = data[line_start..]
                .iter()
                .position(|&b| b'\n' == b)
                .map_or(data.len(), |ix| line_start + ix + 1);
            let line = &data[line_start..line_end];
            if b"\n" == line || b"\r\n" == line {
                body_start = line_end;
                break;
            }
            line_start = line_end;
        }

        Ok(Split { data, body_start })
    }

    fn headers(&self) -> &[u8] {
        &self.data[..self.body_start]
    }

    fn body(&self) -> &[u8] {
        &self.data[self.body_start..]
    }

    /// Iterate the header fields as `(name, raw_field)` pairs, where
    /// `raw_field` includes continuation lines and line endings.
    fn fields(&self) -> Vec<(&str, &[u8])> {
        let headers = self.headers();
        let mut fields: Vec<(&str, &[u8])> = Vec::new();
        let mut field_start: Option<usize> = None;
        let mut line_start = 0;

        let mut finish = |start: Option<usize>, end: usize| {
            if let Some(start) = start {
                let raw = &headers[start..end];
                let name = raw
                    .iter()
                    .position(|&b| b':' == b)
                    .and_then(|colon| std::str::from_utf8(&raw[..colon]).ok())
                    .map(str::trim);
                if let Some(name) = name {
                    fields.push((name, raw));
                }
            }
        };

        while line_start < headers.len() {
            let line_end = headers[line_start..]
                .iter()
                .position(|&b| b'\n' == b)
                .map_or(headers.len(), |ix| line_start + ix + 1);
            let line = &headers[line_start..line_end];

            if b"\n" == line || b"\r\n" == line {
                break;
            }

            if !line.starts_with(b" ") && !line.starts_with(b"\t") {
                finish(field_start, line_start);
                field_start = Some(line_start);
            }

            line_start = line_end;
        }
        finish(field_start, line_start);

        fields
    }

    /// Return the unfolded value of the first header named `name`.
    fn header(&self, name: &str) -> Option<String> {
        self.fields()
            .into_iter()
            .find(|&(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, raw)| unfold_value(raw))
    }
}

fn unfold_value(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    let value = raw.splitn(2, ':').nth(1).unwrap_or("");
    value
        .split(|c| '\r' == c || '\n' == c)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl MessageParser for RawMessageParser {
    type Envelope = RawEnvelope;
    type BodyStructure = RawBodyStructure;

    fn envelope(
        &self,
        content: &mut dyn BufRead,
    ) -> Result<RawEnvelope, Error> {
        let split = Split::read(content)?;
        Ok(RawEnvelope {
            date: split.header("Date"),
            subject: split.header("Subject"),
            from: split.header("From"),
            sender: split.header("Sender"),
            reply_to: split.header("Reply-To"),
            to: split.header("To"),
            cc: split.header("Cc"),
            bcc: split.header("Bcc"),
            in_reply_to: split.header("In-Reply-To"),
            message_id: split.header("Message-ID"),
        })
    }

    fn body_structure(
        &self,
        content: &mut dyn BufRead,
        extended: bool,
    ) -> Result<RawBodyStructure, Error> {
        let split = Split::read(content)?;
        let body = split.body();
        let lines = body.iter().filter(|&&b| b'\n' == b).count() as u64
            + if body.is_empty() || body.ends_with(b"\n") {
                0
            } else {
                1
            };

        Ok(RawBodyStructure {
            content_type: split
                .header("Content-Type")
                .unwrap_or_else(|| "text/plain".to_owned()),
            transfer_encoding: split
                .header("Content-Transfer-Encoding")
                .unwrap_or_else(|| "7bit".to_owned()),
            size: body.len() as u64,
            lines,
            disposition: if extended {
                split.header("Content-Disposition")
            } else {
                None
            },
            language: if extended {
                split.header("Content-Language")
            } else {
                None
            },
        })
    }

    fn body_section(
        &self,
        content: &mut dyn BufRead,
        section: &BodySection,
    ) -> Result<Vec<u8>, Error> {
        let split = Split::read(content)?;
        let data = match section.leaf_type {
            LeafType::Full => split.data.clone(),
            LeafType::Text => split.body().to_vec(),
            LeafType::Headers if section.header_filter.is_empty() => {
                split.headers().to_vec()
            }
            LeafType::Headers => {
                let mut data = Vec::new();
                for (name, raw) in split.fields() {
                    let listed = section
                        .header_filter
                        .iter()
                        .any(|f| f.eq_ignore_ascii_case(name));
                    if listed != section.discard_matching_headers {
                        data.extend_from_slice(raw);
                    }
                }
                data.extend_from_slice(b"\r\n");
                data
            }
        };

        Ok(section.slice(data))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MESSAGE: &[u8] = concat!(
        "From: alice@example.com\r\n",
        "Subject: Hello\r\n",
        "  world\r\n",
        "To: bob@example.com\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "\r\n",
        "Line one\r\n",
        "Line two",
    )
    .as_bytes();

    fn section(
        parser: &RawMessageParser,
        section: BodySection,
    ) -> Result<Vec<u8>, Error> {
        parser.body_section(&mut &MESSAGE[..], &section)
    }

    #[test]
    fn raw_envelope() {
        let envelope = RawMessageParser.envelope(&mut &MESSAGE[..]).unwrap();
        assert_eq!(Some("alice@example.com".to_owned()), envelope.from);
        assert_eq!(Some("Hello world".to_owned()), envelope.subject);
        assert_eq!(Some("bob@example.com".to_owned()), envelope.to);
        assert_eq!(None, envelope.cc);
        assert_eq!(None, envelope.message_id);
    }

    #[test]
    fn raw_body_structure() {
        let bs = RawMessageParser
            .body_structure(&mut &MESSAGE[..], true)
            .unwrap();
        assert_eq!("text/plain; charset=utf-8", bs.content_type);
        assert_eq!("7bit", bs.transfer_encoding);
        assert_eq!(18, bs.size);
        assert_eq!(2, bs.lines);
        assert_eq!(None, bs.disposition);
    }

    #[test]
    fn raw_sections() {
        let parser = RawMessageParser;

        assert_eq!(
            MESSAGE,
            &section(&parser, BodySection::default()).unwrap()[..]
        );
        assert_eq!(
            b"Line one\r\nLine two",
            &section(
                &parser,
                BodySection {
                    leaf_type: LeafType::Text,
                    ..BodySection::default()
                }
            )
            .unwrap()[..]
        );

        let headers = section(
            &parser,
            BodySection {
                leaf_type: LeafType::Headers,
                ..BodySection::default()
            },
        )
        .unwrap();
        assert!(headers.starts_with(b"From: "));
        assert!(headers.ends_with(b"utf-8\r\n\r\n"));

        assert_eq!(
            b"Subject: Hello\r\n  world\r\n\r\n",
            &section(
                &parser,
                BodySection {
                    leaf_type: LeafType::Headers,
                    header_filter: vec!["subject".to_owned()],
                    ..BodySection::default()
                }
            )
            .unwrap()[..]
        );

        let not_subject = section(
            &parser,
            BodySection {
                leaf_type: LeafType::Headers,
                header_filter: vec!["Subject".to_owned()],
                discard_matching_headers: true,
                ..BodySection::default()
            },
        )
        .unwrap();
        assert!(!String::from_utf8(not_subject.clone())
            .unwrap()
            .contains("Subject"));
        assert!(not_subject.starts_with(b"From: "));

        assert_eq!(
            b"Line",
            &section(
                &parser,
                BodySection {
                    leaf_type: LeafType::Text,
                    partial: Some((0, 4)),
                    ..BodySection::default()
                }
            )
            .unwrap()[..]
        );
        assert!(section(
            &parser,
            BodySection {
                partial: Some((1000, 4)),
                ..BodySection::default()
            }
        )
        .unwrap()
        .is_empty());
    }

    #[test]
    fn folded_headers() {
        let data: &[u8] =
            b"Subject: one\r\n\ttwo\r\n three\r\nTo: x\r\n\r\nbody";
        let envelope = RawMessageParser.envelope(&mut &*data).unwrap();
        assert_eq!(Some("one two three".to_owned()), envelope.subject);
        assert_eq!(Some("x".to_owned()), envelope.to);

        let filtered = RawMessageParser
            .body_section(
                &mut &*data,
                &BodySection {
                    leaf_type: LeafType::Headers,
                    header_filter: vec!["to".to_owned()],
                    discard_matching_headers: true,
                    ..BodySection::default()
                },
            )
            .unwrap();
        assert_eq!(
            &b"Subject: one\r\n\ttwo\r\n three\r\n\r\n"[..],
            &filtered[..]
        );
    }

    #[test]
    fn headers_only_message() {
        let data = b"Subject: nothing else";
        let bs = RawMessageParser
            .body_structure(&mut &data[..], false)
            .unwrap();
        assert_eq!(0, bs.size);
        assert_eq!(0, bs.lines);
        assert_eq!(
            Some("nothing else".to_owned()),
            RawMessageParser.envelope(&mut &data[..]).unwrap().subject
        );
    }

    #[test]
    fn missing_content() {
        let content = MessageContent::new(PathBuf::from("/nonexistent/msg"));
        assert_matches!(Err(Error::NxMessage), content.open());
    }
}
