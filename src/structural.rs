//! The structural element model: everything from the `<tmx>` root down to
//! the segments, excluding the inline runs (see [`crate::inline`]).
//!
//! Each entity knows how to build itself from a generic [`Node`]
//! (`from_node`, the parse pipeline) and how to validate and emit itself
//! back (`to_node`, the serialize pipeline). Both directions walk the tree
//! recursively and fail fast on the first violation; no partial output is
//! ever produced.

use std::fs::File;
use std::io::{BufRead, Read, Write};
use std::path::Path;

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesText, Event},
};
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::{
    attributes::{
        O_ENCODING, O_TMF, Segtype, TmxDate, XML_LANG, read_attr, require_attr, write_attr,
    },
    error::Error,
    inline::{ContentModel, InlineContainer, InlineNode},
    node::{Node, expect_tag},
    traits::Parser,
};

/// Rejects any text inside an element that only allows child elements: the
/// element's own leading text and every child's tail. Indentation counts as
/// text too; structure-only elements carry none at all, so pretty-printed
/// input fails here instead of being silently normalized. Mixed-content
/// containers never go through this check.
fn forbid_text(element: &'static str, node: &Node) -> Result<(), Error> {
    if let Some(text) = &node.text {
        if !text.is_empty() {
            return Err(Error::UnexpectedText {
                element,
                text: text.clone(),
            });
        }
    }
    for child in &node.children {
        if let Some(tail) = &child.tail {
            if !tail.is_empty() {
                return Err(Error::UnexpectedTail {
                    element,
                    tail: tail.clone(),
                });
            }
        }
    }
    Ok(())
}

fn forbid_children(element: &'static str, node: &Node) -> Result<(), Error> {
    if let Some(child) = node.children.first() {
        return Err(Error::UnexpectedChild {
            element,
            child: child.tag.clone(),
        });
    }
    Ok(())
}

/// `<prop>` — a free-form, tool-defined property of its parent element (or
/// of the whole document when it sits in the header). The standard does not
/// define types or values; unpublished types should start with `x-`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Prop {
    /// The kind of data the property holds. Required.
    pub r#type: Option<String>,
    /// Locale of the property text (`xml:lang` on the wire).
    pub xmllang: Option<String>,
    /// Original code set of the data (`o-encoding` on the wire);
    /// descriptive only, never used for re-encoding.
    pub oencoding: Option<String>,
    pub text: String,
}

impl Prop {
    pub fn new(r#type: impl Into<String>, text: impl Into<String>) -> Self {
        Prop {
            r#type: Some(r#type.into()),
            text: text.into(),
            ..Prop::default()
        }
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("prop", node)?;
        forbid_children("prop", node)?;
        Ok(Prop {
            r#type: read_attr(node, "type")?,
            xmllang: read_attr(node, XML_LANG)?,
            oencoding: read_attr(node, O_ENCODING)?,
            text: node.text.clone().unwrap_or_default(),
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("prop");
        node.set_attribute("type", require_attr("prop", "type", &self.r#type)?);
        write_attr(&mut node, XML_LANG, &self.xmllang);
        write_attr(&mut node, O_ENCODING, &self.oencoding);
        if !self.text.is_empty() {
            node.text = Some(self.text.clone());
        }
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<note>` — a comment for human readers. Unlike `<prop>` it carries no
/// machine-readable type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Note {
    pub xmllang: Option<String>,
    pub oencoding: Option<String>,
    pub text: String,
}

impl Note {
    pub fn new(text: impl Into<String>) -> Self {
        Note {
            text: text.into(),
            ..Note::default()
        }
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("note", node)?;
        forbid_children("note", node)?;
        Ok(Note {
            xmllang: read_attr(node, XML_LANG)?,
            oencoding: read_attr(node, O_ENCODING)?,
            text: node.text.clone().unwrap_or_default(),
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("note");
        write_attr(&mut node, XML_LANG, &self.xmllang);
        write_attr(&mut node, O_ENCODING, &self.oencoding);
        if !self.text.is_empty() {
            node.text = Some(self.text.clone());
        }
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<map/>` — one user-defined character mapping inside a [`Ude`].
///
/// Always an empty element. At least one of `code`, `ent`, `subst` must be
/// set before it serializes; if `code` is set, the owning `Ude` must carry
/// a `base` (checked when the `Ude` serializes, since maps may be attached
/// before the ude is fully populated).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Map {
    /// Unicode value of the character, e.g. `#xF8FF`. Required.
    pub unicode: Option<String>,
    /// Code-point value in the user-defined encoding, e.g. `#x9F`.
    pub code: Option<String>,
    /// Entity name of the character.
    pub ent: Option<String>,
    /// Substitution string for the character.
    pub subst: Option<String>,
}

impl Map {
    pub fn new(unicode: impl Into<String>) -> Self {
        Map {
            unicode: Some(unicode.into()),
            ..Map::default()
        }
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("map", node)?;
        forbid_text("map", node)?;
        forbid_children("map", node)?;
        Ok(Map {
            unicode: read_attr(node, "unicode")?,
            code: read_attr(node, "code")?,
            ent: read_attr(node, "ent")?,
            subst: read_attr(node, "subst")?,
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("map");
        node.set_attribute("unicode", require_attr("map", "unicode", &self.unicode)?);
        if self.code.is_none() && self.ent.is_none() && self.subst.is_none() {
            return Err(Error::MissingAttribute {
                element: "map",
                attribute: "code, ent or subst",
            });
        }
        write_attr(&mut node, "code", &self.code);
        write_attr(&mut node, "ent", &self.ent);
        write_attr(&mut node, "subst", &self.subst);
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<ude>` — a user-defined encoding: a named set of [`Map`] elements,
/// optionally re-mapped from a `base` encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ude {
    /// Name of the encoding. Required.
    pub name: Option<String>,
    /// Encoding the re-mapping is based on; required as soon as any owned
    /// map specifies a `code`.
    pub base: Option<String>,
    pub maps: Vec<Map>,
}

impl Ude {
    pub fn new(name: impl Into<String>) -> Self {
        Ude {
            name: Some(name.into()),
            ..Ude::default()
        }
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("ude", node)?;
        forbid_text("ude", node)?;
        let mut ude = Ude {
            name: read_attr(node, "name")?,
            base: read_attr(node, "base")?,
            maps: Vec::new(),
        };
        for child in &node.children {
            match child.tag.as_str() {
                "map" => ude.maps.push(Map::from_node(child)?),
                other => {
                    return Err(Error::UnexpectedChild {
                        element: "ude",
                        child: other.to_string(),
                    });
                }
            }
        }
        Ok(ude)
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("ude");
        node.set_attribute("name", require_attr("ude", "name", &self.name)?);
        if self.base.is_none() && self.maps.iter().any(|map| map.code.is_some()) {
            return Err(Error::MissingAttribute {
                element: "ude",
                attribute: "base",
            });
        }
        write_attr(&mut node, "base", &self.base);
        for map in &self.maps {
            node.children.push(map.to_node()?);
        }
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<header>` — metadata for the whole document: the tool that produced
/// it, the segmentation kind, source language, and any document-level
/// properties, notes, and user-defined encodings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    /// Tool that created the document. Required.
    pub creationtool: Option<String>,
    /// Version of that tool. Required.
    pub creationtoolversion: Option<String>,
    /// Segmentation kind used by the `<tu>` elements. Required.
    pub segtype: Option<Segtype>,
    /// Format of the originating translation memory (`o-tmf` on the wire).
    /// Required.
    pub otmf: Option<String>,
    /// Default language of `<note>` and `<prop>` content. Required.
    pub adminlang: Option<String>,
    /// Source language, or `*all*`. Required.
    pub srclang: Option<String>,
    /// Kind of data the document holds. Required.
    pub datatype: Option<String>,
    pub oencoding: Option<String>,
    pub creationdate: Option<TmxDate>,
    pub creationid: Option<String>,
    pub changedate: Option<TmxDate>,
    pub changeid: Option<String>,
    pub props: Vec<Prop>,
    pub notes: Vec<Note>,
    pub udes: Vec<Ude>,
}

impl Header {
    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("header", node)?;
        forbid_text("header", node)?;
        let mut header = Header {
            creationtool: read_attr(node, "creationtool")?,
            creationtoolversion: read_attr(node, "creationtoolversion")?,
            segtype: read_attr(node, "segtype")?,
            otmf: read_attr(node, O_TMF)?,
            adminlang: read_attr(node, "adminlang")?,
            srclang: read_attr(node, "srclang")?,
            datatype: read_attr(node, "datatype")?,
            oencoding: read_attr(node, O_ENCODING)?,
            creationdate: read_attr(node, "creationdate")?,
            creationid: read_attr(node, "creationid")?,
            changedate: read_attr(node, "changedate")?,
            changeid: read_attr(node, "changeid")?,
            ..Header::default()
        };
        for child in &node.children {
            match child.tag.as_str() {
                "prop" => header.props.push(Prop::from_node(child)?),
                "note" => header.notes.push(Note::from_node(child)?),
                "ude" => header.udes.push(Ude::from_node(child)?),
                other => {
                    return Err(Error::UnexpectedChild {
                        element: "header",
                        child: other.to_string(),
                    });
                }
            }
        }
        Ok(header)
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("header");
        node.set_attribute(
            "creationtool",
            require_attr("header", "creationtool", &self.creationtool)?,
        );
        node.set_attribute(
            "creationtoolversion",
            require_attr("header", "creationtoolversion", &self.creationtoolversion)?,
        );
        node.set_attribute(
            "segtype",
            require_attr("header", "segtype", &self.segtype)?.as_str(),
        );
        node.set_attribute(O_TMF, require_attr("header", "o-tmf", &self.otmf)?);
        node.set_attribute(
            "adminlang",
            require_attr("header", "adminlang", &self.adminlang)?,
        );
        node.set_attribute("srclang", require_attr("header", "srclang", &self.srclang)?);
        node.set_attribute(
            "datatype",
            require_attr("header", "datatype", &self.datatype)?,
        );
        write_attr(&mut node, O_ENCODING, &self.oencoding);
        write_attr(&mut node, "creationdate", &self.creationdate);
        write_attr(&mut node, "creationid", &self.creationid);
        write_attr(&mut node, "changedate", &self.changedate);
        write_attr(&mut node, "changeid", &self.changeid);
        for prop in &self.props {
            node.children.push(prop.to_node()?);
        }
        for note in &self.notes {
            node.children.push(note.to_node()?);
        }
        for ude in &self.udes {
            node.children.push(ude.to_node()?);
        }
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }

    /// The `srclang` value as a parsed language identifier, `None` when the
    /// attribute is unset, `*all*`, or not a valid BCP 47 tag.
    pub fn source_language_identifier(&self) -> Option<LanguageIdentifier> {
        self.srclang.as_ref()?.parse().ok()
    }
}

/// `<seg>` — the translatable content of one [`Tuv`]: text interleaved
/// with inline runs, order-preserving and lossless through a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Seg {
    pub content: Vec<InlineNode>,
}

impl Seg {
    pub fn new() -> Self {
        Seg::default()
    }

    /// A segment holding a single text fragment.
    pub fn from_text(text: impl Into<String>) -> Self {
        Seg {
            content: vec![InlineNode::Text(text.into())],
        }
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("seg", node)?;
        Ok(Seg {
            content: ContentModel::Segment.parse_content("seg", node)?,
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("seg");
        ContentModel::Segment.write_content("seg", &self.content, &mut node)?;
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

impl InlineContainer for Seg {
    fn content(&self) -> &[InlineNode] {
        &self.content
    }

    fn content_mut(&mut self) -> &mut Vec<InlineNode> {
        &mut self.content
    }
}

/// `<tuv>` — one language variant of a translation unit: exactly one
/// segment plus per-variant properties, notes, and usage metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tuv {
    /// Language of this variant (`xml:lang` on the wire). Required.
    pub xmllang: Option<String>,
    pub oencoding: Option<String>,
    pub datatype: Option<String>,
    pub usagecount: Option<u32>,
    pub lastusagedate: Option<TmxDate>,
    pub creationtool: Option<String>,
    pub creationtoolversion: Option<String>,
    pub creationdate: Option<TmxDate>,
    pub creationid: Option<String>,
    pub changedate: Option<TmxDate>,
    pub changeid: Option<String>,
    pub otmf: Option<String>,
    /// The one `<seg>` of this variant; must be set before serializing.
    pub segment: Option<Seg>,
    pub props: Vec<Prop>,
    pub notes: Vec<Note>,
}

impl Tuv {
    pub fn new(lang: impl Into<String>, segment: Seg) -> Self {
        Tuv {
            xmllang: Some(lang.into()),
            segment: Some(segment),
            ..Tuv::default()
        }
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("tuv", node)?;
        forbid_text("tuv", node)?;
        let mut tuv = Tuv {
            xmllang: read_attr(node, XML_LANG)?,
            oencoding: read_attr(node, O_ENCODING)?,
            datatype: read_attr(node, "datatype")?,
            usagecount: read_attr(node, "usagecount")?,
            lastusagedate: read_attr(node, "lastusagedate")?,
            creationtool: read_attr(node, "creationtool")?,
            creationtoolversion: read_attr(node, "creationtoolversion")?,
            creationdate: read_attr(node, "creationdate")?,
            creationid: read_attr(node, "creationid")?,
            changedate: read_attr(node, "changedate")?,
            changeid: read_attr(node, "changeid")?,
            otmf: read_attr(node, O_TMF)?,
            ..Tuv::default()
        };
        for child in &node.children {
            match child.tag.as_str() {
                "seg" => {
                    if tuv.segment.is_some() {
                        return Err(Error::DuplicateSeg);
                    }
                    tuv.segment = Some(Seg::from_node(child)?);
                }
                "prop" => tuv.props.push(Prop::from_node(child)?),
                "note" => tuv.notes.push(Note::from_node(child)?),
                other => {
                    return Err(Error::UnexpectedChild {
                        element: "tuv",
                        child: other.to_string(),
                    });
                }
            }
        }
        Ok(tuv)
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("tuv");
        node.set_attribute(XML_LANG, require_attr("tuv", "xml:lang", &self.xmllang)?);
        write_attr(&mut node, O_ENCODING, &self.oencoding);
        write_attr(&mut node, "datatype", &self.datatype);
        write_attr(&mut node, "usagecount", &self.usagecount);
        write_attr(&mut node, "lastusagedate", &self.lastusagedate);
        write_attr(&mut node, "creationtool", &self.creationtool);
        write_attr(&mut node, "creationtoolversion", &self.creationtoolversion);
        write_attr(&mut node, "creationdate", &self.creationdate);
        write_attr(&mut node, "creationid", &self.creationid);
        write_attr(&mut node, "changedate", &self.changedate);
        write_attr(&mut node, "changeid", &self.changeid);
        write_attr(&mut node, O_TMF, &self.otmf);
        for prop in &self.props {
            node.children.push(prop.to_node()?);
        }
        for note in &self.notes {
            node.children.push(note.to_node()?);
        }
        let segment = self.segment.as_ref().ok_or(Error::MissingSeg)?;
        node.children.push(segment.to_node()?);
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }

    /// The segment text with all inline markup stripped; empty when no
    /// segment is set.
    pub fn plain_text(&self) -> String {
        self.segment
            .as_ref()
            .map(Seg::plain_text)
            .unwrap_or_default()
    }

    /// The `xml:lang` value as a parsed language identifier, if valid.
    pub fn language_identifier(&self) -> Option<LanguageIdentifier> {
        self.xmllang.as_ref()?.parse().ok()
    }

    /// Whether this variant's language matches `lang` at the primary
    /// language subtag level (`en-US` matches `en`).
    pub fn has_language(&self, lang: &str) -> bool {
        match (
            self.language_identifier(),
            lang.parse::<LanguageIdentifier>(),
        ) {
            (Some(own), Ok(target)) => own.language == target.language,
            _ => false,
        }
    }
}

/// `<tu>` — one translation unit: a source variant plus any number of
/// target variants, with unit-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tu {
    /// Identifier of the unit within the document.
    pub tuid: Option<String>,
    pub oencoding: Option<String>,
    pub datatype: Option<String>,
    pub usagecount: Option<u32>,
    pub lastusagedate: Option<TmxDate>,
    pub creationtool: Option<String>,
    pub creationtoolversion: Option<String>,
    pub creationdate: Option<TmxDate>,
    pub creationid: Option<String>,
    pub changedate: Option<TmxDate>,
    /// Overrides the header's segmentation kind for this unit.
    pub segtype: Option<Segtype>,
    pub changeid: Option<String>,
    pub otmf: Option<String>,
    /// Overrides the header's source language for this unit.
    pub srclang: Option<String>,
    pub tuvs: Vec<Tuv>,
    pub props: Vec<Prop>,
    pub notes: Vec<Note>,
}

impl Tu {
    pub fn new() -> Self {
        Tu::default()
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("tu", node)?;
        forbid_text("tu", node)?;
        let mut tu = Tu {
            tuid: read_attr(node, "tuid")?,
            oencoding: read_attr(node, O_ENCODING)?,
            datatype: read_attr(node, "datatype")?,
            usagecount: read_attr(node, "usagecount")?,
            lastusagedate: read_attr(node, "lastusagedate")?,
            creationtool: read_attr(node, "creationtool")?,
            creationtoolversion: read_attr(node, "creationtoolversion")?,
            creationdate: read_attr(node, "creationdate")?,
            creationid: read_attr(node, "creationid")?,
            changedate: read_attr(node, "changedate")?,
            segtype: read_attr(node, "segtype")?,
            changeid: read_attr(node, "changeid")?,
            otmf: read_attr(node, O_TMF)?,
            srclang: read_attr(node, "srclang")?,
            ..Tu::default()
        };
        for child in &node.children {
            match child.tag.as_str() {
                "tuv" => tu.tuvs.push(Tuv::from_node(child)?),
                "prop" => tu.props.push(Prop::from_node(child)?),
                "note" => tu.notes.push(Note::from_node(child)?),
                other => {
                    return Err(Error::UnexpectedChild {
                        element: "tu",
                        child: other.to_string(),
                    });
                }
            }
        }
        Ok(tu)
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("tu");
        write_attr(&mut node, "tuid", &self.tuid);
        write_attr(&mut node, O_ENCODING, &self.oencoding);
        write_attr(&mut node, "datatype", &self.datatype);
        write_attr(&mut node, "usagecount", &self.usagecount);
        write_attr(&mut node, "lastusagedate", &self.lastusagedate);
        write_attr(&mut node, "creationtool", &self.creationtool);
        write_attr(&mut node, "creationtoolversion", &self.creationtoolversion);
        write_attr(&mut node, "creationdate", &self.creationdate);
        write_attr(&mut node, "creationid", &self.creationid);
        write_attr(&mut node, "changedate", &self.changedate);
        write_attr(&mut node, "segtype", &self.segtype);
        write_attr(&mut node, "changeid", &self.changeid);
        write_attr(&mut node, O_TMF, &self.otmf);
        write_attr(&mut node, "srclang", &self.srclang);
        for prop in &self.props {
            node.children.push(prop.to_node()?);
        }
        for note in &self.notes {
            node.children.push(note.to_node()?);
        }
        for tuv in &self.tuvs {
            node.children.push(tuv.to_node()?);
        }
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }

    /// The variant whose `xml:lang` matches `lang`, if any.
    pub fn variant(&self, lang: &str) -> Option<&Tuv> {
        self.tuvs.iter().find(|tuv| tuv.has_language(lang))
    }

    /// Mutable access to the variant whose `xml:lang` matches `lang`.
    pub fn variant_mut(&mut self, lang: &str) -> Option<&mut Tuv> {
        self.tuvs.iter_mut().find(|tuv| tuv.has_language(lang))
    }
}

/// `<tmx>` — the document root: one header and the body's list of
/// translation units.
///
/// The `version` attribute is fixed to `"1.4"` and is not a settable
/// field; parsing rejects any other value and serializing always emits it.
/// The `<body>` wrapper element is synthesized on output and has no typed
/// counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tmx {
    pub header: Header,
    pub tus: Vec<Tu>,
}

impl Tmx {
    /// The only TMX version this model reads and writes.
    pub const VERSION: &'static str = "1.4";

    pub fn new(header: Header) -> Self {
        Tmx {
            header,
            tus: Vec::new(),
        }
    }

    /// Builds the whole document tree from a parsed generic root node.
    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("tmx", node)?;
        if let Some(version) = node.attribute("version") {
            if version != Self::VERSION {
                return Err(Error::InvalidAttributeValue {
                    attribute: "version",
                    allowed: Self::VERSION,
                    value: version.to_string(),
                });
            }
        }
        forbid_text("tmx", node)?;

        let mut header: Option<Header> = None;
        let mut tus = Vec::new();
        for child in &node.children {
            match child.tag.as_str() {
                "header" => {
                    if header.is_some() {
                        return Err(Error::MalformedDocument(
                            "document has more than one <header> element".to_string(),
                        ));
                    }
                    header = Some(Header::from_node(child)?);
                }
                "body" => {
                    forbid_text("body", child)?;
                    for tu in &child.children {
                        match tu.tag.as_str() {
                            "tu" => tus.push(Tu::from_node(tu)?),
                            other => {
                                return Err(Error::UnexpectedChild {
                                    element: "body",
                                    child: other.to_string(),
                                });
                            }
                        }
                    }
                }
                other => {
                    return Err(Error::UnexpectedChild {
                        element: "tmx",
                        child: other.to_string(),
                    });
                }
            }
        }

        Ok(Tmx {
            header: header.ok_or_else(|| {
                Error::MalformedDocument("document is missing its <header> element".to_string())
            })?,
            tus,
        })
    }

    /// Validates the whole tree and serializes it, synthesizing the
    /// `<body>` wrapper around the translation units.
    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("tmx");
        node.set_attribute("version", Self::VERSION);
        node.children.push(self.header.to_node()?);
        let mut body = Node::new("body");
        for tu in &self.tus {
            body.children.push(tu.to_node()?);
        }
        node.children.push(body);
        Ok(node)
    }

    /// Renders the document as an XML string (no declaration); identical
    /// output to writing [`Tmx::to_node`] through the node writer.
    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }

    /// The unit with the given `tuid`, if any.
    pub fn find_tu(&self, tuid: &str) -> Option<&Tu> {
        self.tus
            .iter()
            .find(|tu| tu.tuid.as_deref() == Some(tuid))
    }

    /// Mutable access to the unit with the given `tuid`.
    pub fn find_tu_mut(&mut self, tuid: &str) -> Option<&mut Tu> {
        self.tus
            .iter_mut()
            .find(|tu| tu.tuid.as_deref() == Some(tuid))
    }
}

impl Parser for Tmx {
    /// Parse a TMX document from any reader.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let root = Node::from_reader(reader)?;
        Tmx::from_node(&root)
    }

    /// Write the document to any writer, with an XML declaration.
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let node = self.to_node()?;
        let mut xml_writer = Writer::new(&mut writer);
        xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        xml_writer.write_event(Event::Text(BytesText::new("\n")))?;
        node.write_into(&mut xml_writer)?;
        xml_writer.write_event(Event::Text(BytesText::new("\n")))?;
        Ok(())
    }

    /// Override default file reading to support BOM-aware decoding; TMX
    /// files in the wild are frequently UTF-16.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path).map_err(Error::Io)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).map_err(Error::Io)?;

        Self::from_str(&decoded)
    }
}
