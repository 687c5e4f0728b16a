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

use std::collections::BTreeMap;
use std::convert::{TryFrom, TryInto};
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroU32;
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::str::FromStr;

use chrono::prelude::*;

use super::parse::{BodySection, MessageParser};
use crate::support::error::Error;

/// Uniquely identifies a message within a single mailbox.
///
/// UIDs start at 1 and increase monotonically as messages are added to the
/// mailbox. UIDs are never reused while the mailbox is loaded; a fresh scan
/// of the directory assigns them anew, which is why the store reports a new
/// UID validity every time it is opened.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Uid({})", self.0.get())
    }
}

// This isn't a useful default implementation, but is here so that things
// containing SeqRange<ID> can still derive Default.
impl Default for Uid {
    fn default() -> Self {
        Uid::MIN
    }
}

impl Uid {
    // Unsafe because new() isn't const for some reason
    pub const MIN: Self = unsafe { Uid(NonZeroU32::new_unchecked(1)) };
    pub const MAX: Self = unsafe { Uid(NonZeroU32::new_unchecked(u32::MAX)) };

    pub fn of(uid: u32) -> Option<Self> {
        NonZeroU32::new(uid).map(Uid)
    }

    pub fn next(self) -> Option<Self> {
        if Uid::MAX == self {
            None
        } else {
            Uid::of(self.0.get() + 1)
        }
    }

    #[cfg(test)]
    pub fn u(uid: u32) -> Self {
        Uid::of(uid).unwrap()
    }
}

impl TryFrom<u32> for Uid {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, ()> {
        Self::of(v).ok_or(())
    }
}

impl From<Uid> for u32 {
    fn from(uid: Uid) -> u32 {
        uid.0.get()
    }
}

/// The 1-based position of a message within the current listing of a
/// mailbox.
///
/// Unlike UIDs, sequence numbers shift whenever an earlier message is
/// expunged.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seqnum(pub NonZeroU32);

// This isn't a useful default implementation, but is here so that things
// containing SeqRange<ID> can still derive Default.
impl Default for Seqnum {
    fn default() -> Self {
        Seqnum::MIN
    }
}

impl Seqnum {
    // Unsafe because new() isn't const for some reason
    pub const MIN: Self = unsafe { Seqnum(NonZeroU32::new_unchecked(1)) };
    pub const MAX: Self =
        unsafe { Seqnum(NonZeroU32::new_unchecked(u32::MAX)) };

    pub fn of(seqnum: u32) -> Option<Self> {
        NonZeroU32::new(seqnum).map(Seqnum)
    }

    #[cfg(test)]
    pub fn u(seqnum: u32) -> Self {
        Seqnum::of(seqnum).unwrap()
    }

    /// Convert a 0-based list index into a sequence number.
    ///
    /// Mailboxes never hold anywhere near `u32::MAX` messages since UIDs would
    /// be exhausted first, so this saturates rather than failing.
    pub fn from_index(ix: usize) -> Self {
        ix.checked_add(1)
            .and_then(|n| n.try_into().ok())
            .and_then(Seqnum::of)
            .unwrap_or(Seqnum::MAX)
    }
}

impl TryFrom<u32> for Seqnum {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, ()> {
        Self::of(v).ok_or(())
    }
}

impl From<Seqnum> for u32 {
    fn from(seqnum: Seqnum) -> u32 {
        seqnum.0.get()
    }
}

impl fmt::Debug for Seqnum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Seqnum({})", self.0.get())
    }
}

/// The two ways a client can address messages: by sequence number or by UID.
///
/// Operations which take a `SeqRange<ID>` are generic over this, so that e.g.
/// `FETCH` and `UID FETCH` share one implementation.
pub trait MessageId:
    TryFrom<u32> + Into<u32> + Copy + PartialOrd + fmt::Debug + Send + Sync
{
    /// Select the identifier of this kind for the message at `seqnum` with
    /// `uid`.
    fn select(seqnum: Seqnum, uid: Uid) -> Self;
}

impl MessageId for Seqnum {
    fn select(seqnum: Seqnum, _: Uid) -> Self {
        seqnum
    }
}

impl MessageId for Uid {
    fn select(_: Seqnum, uid: Uid) -> Self {
        uid
    }
}

/// A "sequence set range" of sequence numbers or UIDs.
///
/// Internally, this is maintained as a minimal sorted set of inclusive ranges.
/// It does not maintain information on the original fragmentation, ordering,
/// or duplication.
///
/// The `Display` format puts this into minimal IMAP wire format. Note that
/// IMAP does not have a way to represent an empty sequence set. `Display`
/// produces an empty string in that case, which is invalid.
#[derive(Clone, PartialEq, Eq)]
pub struct SeqRange<T> {
    parts: BTreeMap<u32, u32>,
    _t: PhantomData<T>,
}

impl<T> SeqRange<T> {
    /// Create a new, empty range.
    pub fn new() -> Self {
        SeqRange {
            parts: BTreeMap::new(),
            _t: PhantomData,
        }
    }

    /// Return whether this range is empty (invalid for IMAP wire format).
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl<T: TryFrom<u32> + Into<u32> + PartialOrd> SeqRange<T> {
    /// Create a range containing just the given item.
    pub fn just(item: T) -> Self {
        let mut this = SeqRange::new();
        this.add(item);
        this
    }

    /// Create a range containing just a single, simple range.
    pub fn range(start: T, end: T) -> Self {
        let mut this = SeqRange::new();
        this.insert(start, end);
        this
    }

    /// Insert the given inclusive range into this sequence set.
    ///
    /// The endpoints may be given in either order.
    pub fn insert(&mut self, start_incl: T, end_incl: T) {
        let start: u32 = start_incl.into();
        let end: u32 = end_incl.into();
        self.insert_raw(start.min(end), start.max(end));
    }

    /// Insert a single item into this sequence set.
    pub fn add(&mut self, item: T) {
        let item: u32 = item.into();
        self.insert_raw(item, item);
    }

    fn insert_raw(&mut self, start_incl: u32, mut end_incl: u32) {
        // If this range overlaps any later ranges, fuse them.
        loop {
            let following = self
                .parts
                .range((Excluded(start_incl), Unbounded))
                .next()
                .map(|(&start, &end)| (start, end));

            if let Some((following_start, following_end)) = following {
                if following_start - 1 <= end_incl {
                    end_incl = end_incl.max(following_end);
                    self.parts.remove(&following_start);
                    continue;
                }
            }

            break;
        }

        let preceding = self
            .parts
            .range((Unbounded, Included(end_incl)))
            .next_back()
            .map(|(&start, &end)| (start, end));
        if let Some((preceding_start, preceding_end)) = preceding {
            if preceding_end.saturating_add(1) >= start_incl {
                // Overlap with the new range
                if start_incl < preceding_start {
                    self.parts.remove(&preceding_start);
                    self.parts.insert(start_incl, end_incl.max(preceding_end));
                } else {
                    self.parts
                        .insert(preceding_start, end_incl.max(preceding_end));
                }
                return;
            }
        }

        // No overlap
        self.parts.insert(start_incl, end_incl);
    }

    /// Return whether the given item is present in this set.
    pub fn contains(&self, v: T) -> bool {
        let v: u32 = v.into();
        self.parts
            .range(..=v)
            .next_back()
            .filter(|&(_, &end)| end >= v)
            .is_some()
    }

    /// Return an iterator to the items in this set.
    ///
    /// Invalid items and items greater than `max` are silently excluded.
    ///
    /// Items are delivered in strictly ascending order.
    pub fn items<'a>(
        &'a self,
        max: impl Into<u32>,
    ) -> impl Iterator<Item = T> + 'a {
        let max: u32 = max.into();
        self.parts
            .iter()
            .map(|(&start, &end)| (start, end))
            .filter(move |&(start, _)| start <= max)
            .flat_map(move |(start, end)| start..=end.min(max))
            .filter_map(|v| T::try_from(v).ok())
    }

    /// Parse the IMAP-format of the sequence set.
    ///
    /// `splat` is used as the value of elements which specify `*`.
    pub fn parse(raw: &str, splat: T) -> Option<Self> {
        fn do_parse(r: &str, splat: u32) -> Option<u32> {
            if "*" == r {
                Some(splat)
            } else {
                r.parse().ok()
            }
        }

        let splat = splat.into();

        let mut this = Self::new();
        for part in raw.split(',') {
            let mut subs = part.split(':');
            match (subs.next(), subs.next(), subs.next()) {
                (Some(only), None, None) => {
                    let only = do_parse(only, splat)?;
                    this.insert_raw(only, only);
                }
                (Some(start), Some(end), None) => {
                    let start = do_parse(start, splat)?;
                    let end = do_parse(end, splat)?;
                    // RFC 3501 allows the endpoints to be in either order for
                    // some reason
                    this.insert_raw(start.min(end), end.max(start));
                }
                _ => return None,
            }
        }

        Some(this)
    }
}

impl<T> fmt::Display for SeqRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (ix, (&start, &end)) in self.parts.iter().enumerate() {
            let delim = if 0 == ix { "" } else { "," };

            if start == end {
                write!(f, "{}{}", delim, start)?;
            } else {
                write!(f, "{}{}:{}", delim, start, end)?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for SeqRange<Seqnum> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[Seqnum {}]", self)
    }
}

impl fmt::Debug for SeqRange<Uid> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[Uid {}]", self)
    }
}

impl<T> Default for SeqRange<T> {
    fn default() -> Self {
        SeqRange::new()
    }
}

/// A message flag.
///
/// System flags are represented as top-level enum values. Keywords are in the
/// `Keyword` case.
///
/// The `Display` format of this type is the exact string value that would be
/// sent over the wire. `FromStr` does the reverse conversion, and also
/// understands non-standard casing of the system flags.
///
/// `\Recent` is not represented by this enum since it isn't _really_ a flag.
#[derive(Clone)]
pub enum Flag {
    Answered,
    Deleted,
    Draft,
    Flagged,
    Seen,
    Keyword(String),
}

/// The flags which can be stored permanently on any message.
///
/// In addition to these, arbitrary keywords are accepted (`\*`).
pub const PERMANENT_FLAGS: [Flag; 5] = [
    Flag::Answered,
    Flag::Flagged,
    Flag::Deleted,
    Flag::Seen,
    Flag::Draft,
];

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Flag::Answered => write!(f, "\\Answered"),
            Flag::Deleted => write!(f, "\\Deleted"),
            Flag::Draft => write!(f, "\\Draft"),
            Flag::Flagged => write!(f, "\\Flagged"),
            Flag::Seen => write!(f, "\\Seen"),
            Flag::Keyword(ref kw) => write!(f, "{}", kw),
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <Flag as fmt::Display>::fmt(self, f)
    }
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.eq_ignore_ascii_case("\\answered") {
            Ok(Flag::Answered)
        } else if s.eq_ignore_ascii_case("\\deleted") {
            Ok(Flag::Deleted)
        } else if s.eq_ignore_ascii_case("\\draft") {
            Ok(Flag::Draft)
        } else if s.eq_ignore_ascii_case("\\flagged") {
            Ok(Flag::Flagged)
        } else if s.eq_ignore_ascii_case("\\seen") {
            Ok(Flag::Seen)
        } else if s.starts_with('\\') {
            Err(Error::NxFlag)
        } else if !s.is_empty()
            && s.as_bytes().iter().copied().all(is_atom_char)
        {
            Ok(Flag::Keyword(s.to_owned()))
        } else {
            Err(Error::UnsafeName)
        }
    }
}

fn is_atom_char(ch: u8) -> bool {
    match ch {
        0..=b' ' => false,
        127..=255 => false,
        b'(' | b')' | b'{' | b'*' | b'%' | b'\\' | b'"' | b']' => false,
        _ => true,
    }
}

impl PartialEq for Flag {
    fn eq(&self, other: &Flag) -> bool {
        match (self, other) {
            (&Flag::Answered, &Flag::Answered) => true,
            (&Flag::Deleted, &Flag::Deleted) => true,
            (&Flag::Draft, &Flag::Draft) => true,
            (&Flag::Flagged, &Flag::Flagged) => true,
            (&Flag::Seen, &Flag::Seen) => true,
            // Keywords are compared ASCII-case-insensitively, which is what
            // clients expect even though RFC 3501 does not require it.
            (&Flag::Keyword(ref a), &Flag::Keyword(ref b)) => {
                a.eq_ignore_ascii_case(b)
            }
            _ => false,
        }
    }
}

impl Eq for Flag {}

/// How a flag update combines the listed flags with a message's current
/// flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagOp {
    /// `+FLAGS`: add every listed flag.
    Add,
    /// `-FLAGS`: remove every listed flag.
    Remove,
    /// `FLAGS`: the message ends up with exactly the listed flags.
    Replace,
}

/// Request information for `STORE` and `UID STORE`.
#[derive(Clone, Debug)]
pub struct StoreRequest<'a, ID>
where
    SeqRange<ID>: fmt::Debug,
{
    /// The message(s) to affect.
    pub ids: &'a SeqRange<ID>,
    /// The flags to control.
    pub flags: &'a [Flag],
    /// How to apply `flags`.
    pub op: FlagOp,
}

/// The `STATUS` command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusRequest {
    /// Return the number of messages.
    pub messages: bool,
    /// Return the number of \Recent messages.
    pub recent: bool,
    /// Return the next UID value
    pub uidnext: bool,
    /// Return the UID validity
    pub uidvalidity: bool,
    /// Return the number of not-\Seen messages.
    pub unseen: bool,
}

impl StatusRequest {
    /// A request for every field.
    pub fn all() -> Self {
        StatusRequest {
            messages: true,
            recent: true,
            uidnext: true,
            uidvalidity: true,
            unseen: true,
        }
    }
}

/// The `STATUS` response, which doubles as the data needed for `SELECT`.
///
/// The `Option` fields are only set if requested in the request. Those
/// fields' meanings correspond exactly to the fields of the same name in
/// `StatusRequest`. The remaining fields are always populated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusResponse {
    /// The mailbox being reported
    pub name: String,

    pub messages: Option<usize>,
    /// \Recent is not tracked, so this is always 0 when requested.
    pub recent: Option<usize>,
    pub uidnext: Option<Uid>,
    pub uidvalidity: Option<u32>,
    pub unseen: Option<usize>,

    /// The distinct flags present on any message, in order of first
    /// appearance.
    pub flags: Vec<Flag>,
    /// The flags which can be stored permanently.
    pub permanent_flags: Vec<Flag>,
    /// Whether clients may create new keywords (`\*` in `PERMANENTFLAGS`).
    pub new_keywords: bool,
    /// The sequence number of the first message without `\Seen`, if any.
    pub first_unseen: Option<Seqnum>,
}

/// Request information for `FETCH` and `UID FETCH`.
#[derive(Clone, Debug, Default)]
pub struct FetchRequest<ID>
where
    SeqRange<ID>: fmt::Debug,
{
    /// The ids to fetch.
    pub ids: SeqRange<ID>,
    /// Return UIDs?
    pub uid: bool,
    /// Return flags?
    pub flags: bool,
    /// Return "RFC 822 size"?
    pub rfc822size: bool,
    /// Return internal date?
    pub internal_date: bool,
    /// Return envelope?
    pub envelope: bool,
    /// Return the non-extensible `BODY` structure?
    pub body: bool,
    /// Return bodystructure?
    pub bodystructure: bool,
    /// Any sections to be fetched
    pub sections: Vec<BodySection>,
}

impl<ID> FetchRequest<ID>
where
    SeqRange<ID>: fmt::Debug,
{
    /// Whether answering this request needs the message content at all.
    pub fn needs_content(&self) -> bool {
        self.envelope
            || self.body
            || self.bodystructure
            || !self.sections.is_empty()
    }
}

/// The data fetched for one message.
///
/// Only the fields requested in the `FetchRequest` are populated.
pub struct FetchedMessage<P: MessageParser + ?Sized> {
    pub seqnum: Seqnum,
    pub uid: Option<Uid>,
    pub flags: Option<Vec<Flag>>,
    pub rfc822size: Option<u32>,
    pub internal_date: Option<DateTime<FixedOffset>>,
    pub envelope: Option<P::Envelope>,
    pub body: Option<P::BodyStructure>,
    pub bodystructure: Option<P::BodyStructure>,
    /// The requested sections, in request order.
    pub sections: Vec<(BodySection, Vec<u8>)>,
}

impl<P: MessageParser + ?Sized> fmt::Debug for FetchedMessage<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FetchedMessage")
            .field("seqnum", &self.seqnum)
            .field("uid", &self.uid)
            .field("flags", &self.flags)
            .field("rfc822size", &self.rfc822size)
            .field("internal_date", &self.internal_date)
            .field("envelope", &self.envelope)
            .field("body", &self.body)
            .field("bodystructure", &self.bodystructure)
            .field("sections", &self.sections.len())
            .finish()
    }
}

/// Records that an operation on one message of a batch failed.
///
/// Batch operations carry on with the remaining messages; these are returned
/// alongside the successful results so callers can see what was skipped.
#[derive(Debug)]
pub struct MessageFailure {
    pub uid: Uid,
    pub error: Error,
}

/// The response from the `SEARCH` (`ID` = `Seqnum`) or `UID SEARCH`
/// (`ID` = `Uid`) commands.
#[derive(Debug)]
pub struct SearchResponse<ID> {
    /// The matching ids, in mailbox order.
    pub hits: Vec<ID>,
    /// Messages which could not be evaluated and were excluded.
    pub failed: Vec<MessageFailure>,
}

/// The response from the `COPY` and `UID COPY` commands.
#[derive(Debug, Default)]
pub struct CopyResponse {
    /// The UID validity value of the destination mailbox.
    pub uid_validity: u32,
    /// The UID(s) of any copied message.
    pub from_uids: SeqRange<Uid>,
    /// The UID(s) of the new messages, parallel to `from_uids`.
    pub to_uids: SeqRange<Uid>,
    /// Messages which could not be copied.
    pub failed: Vec<MessageFailure>,
}

/// The response from `EXPUNGE`.
#[derive(Debug, Default)]
pub struct ExpungeResponse {
    /// The messages which were removed, in the order they were removed.
    ///
    /// Removal happens from the end of the mailbox towards the start, so each
    /// sequence number is valid in the state left by the previous removals,
    /// exactly as untagged `EXPUNGE` responses require.
    pub expunged: Vec<(Seqnum, Uid)>,
    /// `\Deleted` messages whose files could not be removed. They remain in
    /// the mailbox.
    pub failed: Vec<MessageFailure>,
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn assert_sr(
        expected_content: &[u32],
        expected_string: &str,
        seqrange: SeqRange<Uid>,
    ) {
        let actual: Vec<u32> =
            seqrange.items(u32::MAX).map(|u| u.0.get()).collect();
        assert_eq!(expected_content, &actual[..]);
        assert_eq!(expected_string, &seqrange.to_string());
    }

    #[test]
    fn seqrange_parsing() {
        assert_sr(&[1], "1", SeqRange::parse("1", Uid::u(10)).unwrap());
        assert_sr(&[10], "10", SeqRange::parse("*", Uid::u(10)).unwrap());
        assert_sr(&[1, 2], "1:2", SeqRange::parse("2:1", Uid::u(10)).unwrap());
        assert_sr(
            &[9, 10],
            "9:10",
            SeqRange::parse("*:9", Uid::u(10)).unwrap(),
        );
        assert_sr(
            &[1, 3, 5],
            "1,3,5",
            SeqRange::parse("3,5,1", Uid::u(10)).unwrap(),
        );
        assert_sr(
            &[1, 2, 3, 4],
            "1:4",
            SeqRange::parse("1,2:3,4", Uid::u(10)).unwrap(),
        );
        assert_sr(
            &[1, 2, 3, 4],
            "1:4",
            SeqRange::parse("2,4:1,3", Uid::u(10)).unwrap(),
        );

        assert!(SeqRange::parse("1:2:3", Uid::u(10)).is_none());
        assert!(SeqRange::parse("x", Uid::u(10)).is_none());
    }

    #[test]
    fn seqrange_items_respects_max_and_zero() {
        let sr: SeqRange<Uid> = SeqRange::parse("0:5", Uid::u(10)).unwrap();
        let items: Vec<u32> = sr.items(3u32).map(u32::from).collect();
        assert_eq!(vec![1, 2, 3], items);
    }

    #[test]
    fn seqrange_add() {
        let mut seqrange = SeqRange::new();
        seqrange.add(Uid::u(3));
        seqrange.add(Uid::u(1));
        assert_eq!("1,3", &seqrange.to_string());
        seqrange.add(Uid::u(2));
        assert_eq!("1:3", &seqrange.to_string());
        seqrange.add(Uid::MAX);
        assert_eq!(format!("1:3,{}", u32::MAX), seqrange.to_string());
        assert!(seqrange.contains(Uid::MAX));
        assert!(!seqrange.contains(Uid::u(4)));
        assert_eq!("7", SeqRange::just(Uid::u(7)).to_string());
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(Flag::Seen, "\\SEEN".parse::<Flag>().unwrap());
        assert_eq!(Flag::Deleted, "\\deleted".parse::<Flag>().unwrap());
        assert_eq!(
            Flag::Keyword("$Junk".to_owned()),
            "$junk".parse::<Flag>().unwrap()
        );
        assert_matches!(Err(Error::NxFlag), "\\Recent".parse::<Flag>());
        assert_matches!(Err(Error::UnsafeName), "foo bar".parse::<Flag>());
        assert_matches!(Err(Error::UnsafeName), "".parse::<Flag>());
        assert_eq!("\\Flagged", Flag::Flagged.to_string());
    }

    #[test]
    fn seqnum_index_conversion() {
        assert_eq!(Seqnum::u(1), Seqnum::from_index(0));
    }

    proptest! {
        #[test]
        fn seqrange_properties(
            ranges in prop::collection::vec((1u32..30, 1u32..=10), 1..=5)
        ) {
            let mut expected = Vec::new();
            let mut seqrange = SeqRange::new();

            for &(start, extent) in &ranges {
                seqrange.insert(Uid::u(start), Uid::u(start + extent));
                expected.extend(start..=start + extent);
            }

            expected.sort();
            expected.dedup();

            let actual: Vec<u32> = seqrange.items(u32::MAX).map(
                |u| u.0.get()).collect();
            assert_eq!(expected, actual);

            for i in 1..50 {
                assert_eq!(
                    expected.contains(&i),
                    seqrange.contains(Uid::u(i)),
                    "Bad contains result for {}",
                    i
                );
            }

            assert_eq!(
                seqrange,
                SeqRange::parse(&seqrange.to_string(), Uid::MAX).unwrap());
        }
    }
}
