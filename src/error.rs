//! All error types for the tmxcodec crate.
//!
//! These are returned from all fallible operations (parsing a generic node
//! into the typed tree, serializing the typed tree back out, and file I/O).
//! Parse-time variants mean "your input was malformed"; serialize-time
//! variants mean "your in-memory tree is invalid". Both carry the entity
//! name, attribute name, and offending value so the fault can be located
//! without re-deriving it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A generic node's tag does not match the entity being built from it.
    #[error("expected <{expected}> but got <{found}>")]
    TagMismatch {
        expected: &'static str,
        found: String,
    },

    /// Text found inside an element that only allows child elements.
    #[error("<{element}> elements are not allowed to contain text but got {text:?}")]
    UnexpectedText {
        element: &'static str,
        text: String,
    },

    /// Tail text after a child of an element that only allows child
    /// elements.
    #[error("<{element}> elements are not allowed to contain tail text but got {tail:?}")]
    UnexpectedTail {
        element: &'static str,
        tail: String,
    },

    /// A child element that the containing entity does not permit.
    #[error("<{element}> elements are not allowed to contain <{child}> elements")]
    UnexpectedChild {
        element: &'static str,
        child: String,
    },

    /// A second `<seg>` inside one `<tuv>`.
    #[error("only one <seg> element is allowed per <tuv>")]
    DuplicateSeg,

    /// A `<tuv>` serialized without its `<seg>`.
    #[error("<tuv> elements must contain exactly one <seg> element")]
    MissingSeg,

    /// A required attribute is unset at serialization time. Also covers the
    /// conditional requirements (`ude@base` when a map carries `code`, and
    /// the at-least-one-of rule on `<map>`).
    #[error("required attribute `{attribute}` is missing from <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// An integer-like attribute whose value cannot be parsed as base-10.
    #[error("attribute `{attribute}` must be an integer but got {value:?}")]
    InvalidAttributeType {
        attribute: &'static str,
        value: String,
    },

    /// A date-like attribute whose value is not in `YYYYMMDDTHHMMSSZ` form.
    #[error("attribute `{attribute}` must be a date in YYYYMMDDTHHMMSSZ format but got {value:?}")]
    InvalidAttributeFormat {
        attribute: &'static str,
        value: String,
    },

    /// An enumerated attribute whose value is outside its fixed literal set.
    #[error("attribute `{attribute}` must be one of {allowed} but got {value:?}")]
    InvalidAttributeValue {
        attribute: &'static str,
        allowed: &'static str,
        value: String,
    },

    /// `<bpt>`/`<ept>` counts differ within one container's content list.
    #[error("<{element}> has {excess} <{surplus}> element(s) without a corresponding <{missing}>")]
    UnbalancedPairedTags {
        element: &'static str,
        surplus: &'static str,
        missing: &'static str,
        excess: usize,
    },

    /// The underlying XML is not well-formed at the event level.
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    /// Well-formed XML that does not amount to a usable document
    /// (no root element, duplicate root, broken attribute syntax, ...).
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
