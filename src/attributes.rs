//! The attribute coercion layer.
//!
//! TMX attributes come off the wire as strings but are stored on the typed
//! tree already coerced: integers for `i`/`x`/`usagecount`, structured
//! date-times for the `*date` attributes, and fixed literal sets for
//! `segtype`/`pos`/`assoc`. This module owns those conversions in both
//! directions, plus the wire-name quirks (`o-encoding`, `o-tmf`, and the
//! `xml:lang` namespaced attribute).
//!
//! Everything here is pure; no I/O and no state.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{error::Error, node::Node};

/// Wire name of the `xmllang` field: the `lang` attribute in the predeclared
/// `xml:` namespace (`http://www.w3.org/XML/1998/namespace`).
pub const XML_LANG: &str = "xml:lang";

/// The URI bound to the `xml:` prefix by the XML specification itself.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Wire name of the `oencoding` field.
pub const O_ENCODING: &str = "o-encoding";

/// Wire name of the `otmf` field.
pub const O_TMF: &str = "o-tmf";

/// The exact date-time shape TMX 1.4 uses, e.g. `20020101T163812Z`.
pub const DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// A TMX date-time attribute value (`creationdate`, `changedate`,
/// `lastusagedate`).
///
/// Wraps a naive date-time; TMX dates are always expressed in UTC with a
/// literal `Z` suffix, so no offset is stored. `Display` re-emits the exact
/// wire format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TmxDate(pub NaiveDateTime);

impl TmxDate {
    /// Builds a date from calendar components, `None` if out of range.
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        chrono::NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .map(TmxDate)
    }

    fn parse(attribute: &'static str, raw: &str) -> Result<Self, Error> {
        NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
            .map(TmxDate)
            .map_err(|_| Error::InvalidAttributeFormat {
                attribute,
                value: raw.to_string(),
            })
    }
}

impl From<NaiveDateTime> for TmxDate {
    fn from(value: NaiveDateTime) -> Self {
        TmxDate(value)
    }
}

impl Display for TmxDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for TmxDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The attribute name is unknown here; the read helpers go through
        // `TmxDate::parse` so their errors name the actual attribute.
        Self::parse("date", s)
    }
}

/// The segmentation kind declared on `<header>` and `<tu>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segtype {
    Block,
    Paragraph,
    Sentence,
    Phrase,
}

impl Segtype {
    const ALLOWED: &'static str = "block, paragraph, sentence or phrase";

    pub fn as_str(&self) -> &'static str {
        match self {
            Segtype::Block => "block",
            Segtype::Paragraph => "paragraph",
            Segtype::Sentence => "sentence",
            Segtype::Phrase => "phrase",
        }
    }
}

impl Display for Segtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Segtype {
    type Err = Error;

    /// Case-insensitive match against the fixed literal set; the stored
    /// value always re-serializes lowercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(Segtype::Block),
            "paragraph" => Ok(Segtype::Paragraph),
            "sentence" => Ok(Segtype::Sentence),
            "phrase" => Ok(Segtype::Phrase),
            _ => Err(Error::InvalidAttributeValue {
                attribute: "segtype",
                allowed: Self::ALLOWED,
                value: s.to_string(),
            }),
        }
    }
}

/// Whether an `<it>` isolated tag opens or closes its native code span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pos {
    Begin,
    End,
}

impl Pos {
    const ALLOWED: &'static str = "begin or end";

    pub fn as_str(&self) -> &'static str {
        match self {
            Pos::Begin => "begin",
            Pos::End => "end",
        }
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Pos {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "begin" => Ok(Pos::Begin),
            "end" => Ok(Pos::End),
            _ => Err(Error::InvalidAttributeValue {
                attribute: "pos",
                allowed: Self::ALLOWED,
                value: s.to_string(),
            }),
        }
    }
}

/// Which side of the surrounding text a `<ph>` placeholder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assoc {
    /// Associated with the preceding text.
    P,
    /// Associated with the following text.
    F,
    /// Associated with the text on both sides.
    B,
}

impl Assoc {
    const ALLOWED: &'static str = "p, f or b";

    pub fn as_str(&self) -> &'static str {
        match self {
            Assoc::P => "p",
            Assoc::F => "f",
            Assoc::B => "b",
        }
    }
}

impl Display for Assoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Assoc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "p" => Ok(Assoc::P),
            "f" => Ok(Assoc::F),
            "b" => Ok(Assoc::B),
            _ => Err(Error::InvalidAttributeValue {
                attribute: "assoc",
                allowed: Self::ALLOWED,
                value: s.to_string(),
            }),
        }
    }
}

/// A value that can cross the string/typed boundary of one attribute.
///
/// One implementation per semantic kind; every entity's parse and serialize
/// path goes through these, so coercion and rejection behave identically
/// across all ~15 element kinds.
pub(crate) trait AttrValue: Sized {
    fn coerce(attribute: &'static str, raw: &str) -> Result<Self, Error>;
    fn render(&self) -> String;
}

impl AttrValue for String {
    fn coerce(_attribute: &'static str, raw: &str) -> Result<Self, Error> {
        Ok(raw.to_string())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl AttrValue for u32 {
    fn coerce(attribute: &'static str, raw: &str) -> Result<Self, Error> {
        raw.trim()
            .parse()
            .map_err(|_| Error::InvalidAttributeType {
                attribute,
                value: raw.to_string(),
            })
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl AttrValue for TmxDate {
    fn coerce(attribute: &'static str, raw: &str) -> Result<Self, Error> {
        TmxDate::parse(attribute, raw)
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl AttrValue for Segtype {
    fn coerce(_attribute: &'static str, raw: &str) -> Result<Self, Error> {
        raw.parse()
    }

    fn render(&self) -> String {
        self.as_str().to_string()
    }
}

impl AttrValue for Pos {
    fn coerce(_attribute: &'static str, raw: &str) -> Result<Self, Error> {
        raw.parse()
    }

    fn render(&self) -> String {
        self.as_str().to_string()
    }
}

impl AttrValue for Assoc {
    fn coerce(_attribute: &'static str, raw: &str) -> Result<Self, Error> {
        raw.parse()
    }

    fn render(&self) -> String {
        self.as_str().to_string()
    }
}

/// Reads and coerces one attribute off a generic node. Absent attributes
/// are `Ok(None)`; present-but-invalid ones are errors.
pub(crate) fn read_attr<T: AttrValue>(
    node: &Node,
    name: &'static str,
) -> Result<Option<T>, Error> {
    node.attribute(name)
        .map(|raw| T::coerce(name, raw))
        .transpose()
}

/// Writes one optional attribute onto a generic node, skipping `None`.
pub(crate) fn write_attr<T: AttrValue>(node: &mut Node, name: &str, value: &Option<T>) {
    if let Some(value) = value {
        node.set_attribute(name, value.render());
    }
}

/// Unwraps a required attribute at serialization time.
pub(crate) fn require_attr<'a, T>(
    element: &'static str,
    attribute: &'static str,
    value: &'a Option<T>,
) -> Result<&'a T, Error> {
    value
        .as_ref()
        .ok_or(Error::MissingAttribute { element, attribute })
}
