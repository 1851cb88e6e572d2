//! The inline run model: the element kinds that can appear inside a
//! segment's text (`<bpt>`, `<ept>`, `<it>`, `<ph>`, `<ut>`, `<hi>`,
//! `<sub>`), plus the recursive content union they all share.
//!
//! Content lists are freely mutable, so containment rules and the bpt/ept
//! pairing invariant are checked at serialization time, not on insertion.

use serde::{Deserialize, Serialize};

use crate::{
    attributes::{Assoc, Pos, read_attr, require_attr, write_attr},
    error::Error,
    node::{Node, expect_tag},
};

/// One item of a mixed content sequence: raw text or a typed inline run.
///
/// Every mixed container (`Seg`, `Hi`, `Sub`, and the code runs) stores a
/// `Vec<InlineNode>`; which variants are legal depends on the container and
/// is enforced when serializing. `Hi` and `Sub` are recursive through this
/// union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineNode {
    Text(String),
    Bpt(Bpt),
    Ept(Ept),
    It(It),
    Ph(Ph),
    Ut(Ut),
    Hi(Hi),
    Sub(Sub),
}

impl InlineNode {
    /// The wire tag of the variant, `#text` for text.
    pub fn tag_name(&self) -> &'static str {
        match self {
            InlineNode::Text(_) => "#text",
            InlineNode::Bpt(_) => "bpt",
            InlineNode::Ept(_) => "ept",
            InlineNode::It(_) => "it",
            InlineNode::Ph(_) => "ph",
            InlineNode::Ut(_) => "ut",
            InlineNode::Hi(_) => "hi",
            InlineNode::Sub(_) => "sub",
        }
    }
}

impl From<&str> for InlineNode {
    fn from(value: &str) -> Self {
        InlineNode::Text(value.to_string())
    }
}

impl From<String> for InlineNode {
    fn from(value: String) -> Self {
        InlineNode::Text(value)
    }
}

/// Which inline kinds one container admits.
///
/// This is the static per-entity-kind declaration behind both the parse-time
/// child dispatch and the serialize-time validation, so the two can never
/// disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentModel {
    /// `bpt`/`ept`/`it`/`ph`/`ut`: text and `<sub>` only.
    Code,
    /// `hi` and `sub`: text and any inline run except `<sub>`.
    Span,
    /// `seg`: text and every inline run kind.
    Segment,
}

impl ContentModel {
    fn allows_sub(self) -> bool {
        matches!(self, ContentModel::Code | ContentModel::Segment)
    }

    fn allows_runs(self) -> bool {
        matches!(self, ContentModel::Span | ContentModel::Segment)
    }

    fn allows(self, item: &InlineNode) -> bool {
        match item {
            InlineNode::Text(_) => true,
            InlineNode::Sub(_) => self.allows_sub(),
            InlineNode::Bpt(_)
            | InlineNode::Ept(_)
            | InlineNode::It(_)
            | InlineNode::Ph(_)
            | InlineNode::Ut(_)
            | InlineNode::Hi(_) => self.allows_runs(),
        }
    }

    fn parse_child(self, element: &'static str, child: &Node) -> Result<InlineNode, Error> {
        match child.tag.as_str() {
            "sub" if self.allows_sub() => Ok(InlineNode::Sub(Sub::from_node(child)?)),
            "bpt" if self.allows_runs() => Ok(InlineNode::Bpt(Bpt::from_node(child)?)),
            "ept" if self.allows_runs() => Ok(InlineNode::Ept(Ept::from_node(child)?)),
            "it" if self.allows_runs() => Ok(InlineNode::It(It::from_node(child)?)),
            "ph" if self.allows_runs() => Ok(InlineNode::Ph(Ph::from_node(child)?)),
            "ut" if self.allows_runs() => Ok(InlineNode::Ut(Ut::from_node(child)?)),
            "hi" if self.allows_runs() => Ok(InlineNode::Hi(Hi::from_node(child)?)),
            other => Err(Error::UnexpectedChild {
                element,
                child: other.to_string(),
            }),
        }
    }

    /// Converts a generic node's mixed content into the typed sequence,
    /// preserving text/child interleaving order exactly: the node's own text
    /// first, then each child followed by its tail.
    pub(crate) fn parse_content(
        self,
        element: &'static str,
        node: &Node,
    ) -> Result<Vec<InlineNode>, Error> {
        let mut content = Vec::new();
        if let Some(text) = &node.text {
            content.push(InlineNode::Text(text.clone()));
        }
        for child in &node.children {
            content.push(self.parse_child(element, child)?);
            if let Some(tail) = &child.tail {
                content.push(InlineNode::Text(tail.clone()));
            }
        }
        Ok(content)
    }

    /// Validates a content sequence and distributes it onto a generic node:
    /// the first text item becomes the node's own text, later text items
    /// become the preceding child's tail. Empty text items are skipped;
    /// they would not survive a reparse anyway.
    pub(crate) fn write_content(
        self,
        element: &'static str,
        content: &[InlineNode],
        node: &mut Node,
    ) -> Result<(), Error> {
        self.validate(element, content)?;
        for item in content {
            match item {
                InlineNode::Text(text) if text.is_empty() => {}
                InlineNode::Text(text) => node.append_text(text),
                InlineNode::Bpt(bpt) => node.children.push(bpt.to_node()?),
                InlineNode::Ept(ept) => node.children.push(ept.to_node()?),
                InlineNode::It(it) => node.children.push(it.to_node()?),
                InlineNode::Ph(ph) => node.children.push(ph.to_node()?),
                InlineNode::Ut(ut) => node.children.push(ut.to_node()?),
                InlineNode::Hi(hi) => node.children.push(hi.to_node()?),
                InlineNode::Sub(sub) => node.children.push(sub.to_node()?),
            }
        }
        Ok(())
    }

    /// Containment and pairing checks, local to this container's own
    /// content list. Nested `Hi`/`Sub` containers each balance their own
    /// list when they serialize themselves.
    fn validate(self, element: &'static str, content: &[InlineNode]) -> Result<(), Error> {
        let mut bpt = 0usize;
        let mut ept = 0usize;
        for item in content {
            if !self.allows(item) {
                return Err(Error::UnexpectedChild {
                    element,
                    child: item.tag_name().to_string(),
                });
            }
            match item {
                InlineNode::Bpt(_) => bpt += 1,
                InlineNode::Ept(_) => ept += 1,
                _ => {}
            }
        }
        if bpt > ept {
            Err(Error::UnbalancedPairedTags {
                element,
                surplus: "bpt",
                missing: "ept",
                excess: bpt - ept,
            })
        } else if ept > bpt {
            Err(Error::UnbalancedPairedTags {
                element,
                surplus: "ept",
                missing: "bpt",
                excess: ept - bpt,
            })
        } else {
            Ok(())
        }
    }
}

/// Shared surface of every element that owns a mixed content sequence.
pub trait InlineContainer {
    fn content(&self) -> &[InlineNode];
    fn content_mut(&mut self) -> &mut Vec<InlineNode>;

    /// Appends one item to the content sequence.
    fn push(&mut self, item: impl Into<InlineNode>) {
        self.content_mut().push(item.into());
    }

    /// Appends a text fragment to the content sequence. Empty fragments
    /// are dropped; they have no wire representation.
    fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.content_mut().push(InlineNode::Text(text));
        }
    }

    /// Inserts one item at `index`, shifting later items right.
    fn insert(&mut self, index: usize, item: impl Into<InlineNode>) {
        self.content_mut().insert(index, item.into());
    }

    /// Removes and returns the item at `index`.
    fn remove(&mut self, index: usize) -> InlineNode {
        self.content_mut().remove(index)
    }

    /// All text of this container and its descendants, concatenated in
    /// document order, with the markup stripped.
    fn plain_text(&self) -> String {
        let mut out = String::new();
        flatten_text(self.content(), &mut out);
        out
    }
}

fn flatten_text(content: &[InlineNode], out: &mut String) {
    for item in content {
        match item {
            InlineNode::Text(text) => out.push_str(text),
            InlineNode::Bpt(bpt) => flatten_text(&bpt.content, out),
            InlineNode::Ept(ept) => flatten_text(&ept.content, out),
            InlineNode::It(it) => flatten_text(&it.content, out),
            InlineNode::Ph(ph) => flatten_text(&ph.content, out),
            InlineNode::Ut(ut) => flatten_text(&ut.content, out),
            InlineNode::Hi(hi) => flatten_text(&hi.content, out),
            InlineNode::Sub(sub) => flatten_text(&sub.content, out),
        }
    }
}

macro_rules! impl_inline_container {
    ($($entity:ty),+ $(,)?) => {
        $(impl InlineContainer for $entity {
            fn content(&self) -> &[InlineNode] {
                &self.content
            }

            fn content_mut(&mut self) -> &mut Vec<InlineNode> {
                &mut self.content
            }
        })+
    };
}

impl_inline_container!(Bpt, Ept, It, Ph, Ut, Hi, Sub);

/// `<bpt>` — begin paired tag. Opens a paired sequence of native codes,
/// closed by an [`Ept`] in the same container. The `i` attribute links the
/// two on the wire; serialization checks that the counts balance but does
/// not cross-check `i` values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bpt {
    /// Pairs this tag with its `<ept>`. Required.
    pub i: Option<u32>,
    /// Pairs allied codes across the `<tuv>`s of one `<tu>`.
    pub x: Option<u32>,
    /// The kind of data the native code represents.
    pub r#type: Option<String>,
    pub content: Vec<InlineNode>,
}

impl Bpt {
    pub fn new(i: u32) -> Self {
        Bpt {
            i: Some(i),
            ..Bpt::default()
        }
    }

    /// Builds this entity from a generic node, enforcing the tag match,
    /// attribute coercion, and containment rules.
    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("bpt", node)?;
        Ok(Bpt {
            i: read_attr(node, "i")?,
            x: read_attr(node, "x")?,
            r#type: read_attr(node, "type")?,
            content: ContentModel::Code.parse_content("bpt", node)?,
        })
    }

    /// Re-validates this entity and serializes it to a generic node.
    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("bpt");
        node.set_attribute("i", require_attr("bpt", "i", &self.i)?.to_string());
        write_attr(&mut node, "x", &self.x);
        write_attr(&mut node, "type", &self.r#type);
        ContentModel::Code.write_content("bpt", &self.content, &mut node)?;
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<ept>` — end paired tag. Closes the [`Bpt`] with the same `i`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ept {
    /// Pairs this tag with its `<bpt>`. Required.
    pub i: Option<u32>,
    pub content: Vec<InlineNode>,
}

impl Ept {
    pub fn new(i: u32) -> Self {
        Ept {
            i: Some(i),
            content: Vec::new(),
        }
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("ept", node)?;
        Ok(Ept {
            i: read_attr(node, "i")?,
            content: ContentModel::Code.parse_content("ept", node)?,
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("ept");
        node.set_attribute("i", require_attr("ept", "i", &self.i)?.to_string());
        ContentModel::Code.write_content("ept", &self.content, &mut node)?;
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<it>` — isolated tag: a begin or end native code whose counterpart
/// falls outside the segment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct It {
    /// Whether this opens or closes the native code span. Required.
    pub pos: Option<Pos>,
    pub x: Option<u32>,
    pub r#type: Option<String>,
    pub content: Vec<InlineNode>,
}

impl It {
    pub fn new(pos: Pos) -> Self {
        It {
            pos: Some(pos),
            ..It::default()
        }
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("it", node)?;
        Ok(It {
            pos: read_attr(node, "pos")?,
            x: read_attr(node, "x")?,
            r#type: read_attr(node, "type")?,
            content: ContentModel::Code.parse_content("it", node)?,
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("it");
        node.set_attribute("pos", require_attr("it", "pos", &self.pos)?.as_str());
        write_attr(&mut node, "x", &self.x);
        write_attr(&mut node, "type", &self.r#type);
        ContentModel::Code.write_content("it", &self.content, &mut node)?;
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<ph>` — placeholder for a standalone native code sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ph {
    pub x: Option<u32>,
    pub r#type: Option<String>,
    /// Which side of the surrounding text the code belongs to.
    pub assoc: Option<Assoc>,
    pub content: Vec<InlineNode>,
}

impl Ph {
    pub fn new() -> Self {
        Ph::default()
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("ph", node)?;
        Ok(Ph {
            x: read_attr(node, "x")?,
            r#type: read_attr(node, "type")?,
            assoc: read_attr(node, "assoc")?,
            content: ContentModel::Code.parse_content("ph", node)?,
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("ph");
        write_attr(&mut node, "x", &self.x);
        write_attr(&mut node, "type", &self.r#type);
        write_attr(&mut node, "assoc", &self.assoc);
        ContentModel::Code.write_content("ph", &self.content, &mut node)?;
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<ut>` — unknown tag (deprecated by TMX 1.4, still parsed and
/// re-emitted for interchange with older tools).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ut {
    pub x: Option<u32>,
    pub content: Vec<InlineNode>,
}

impl Ut {
    pub fn new() -> Self {
        Ut::default()
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("ut", node)?;
        Ok(Ut {
            x: read_attr(node, "x")?,
            content: ContentModel::Code.parse_content("ut", node)?,
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("ut");
        write_attr(&mut node, "x", &self.x);
        ContentModel::Code.write_content("ut", &self.content, &mut node)?;
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<hi>` — highlighted span of segment text. May nest further `<hi>`
/// elements and any paired or standalone inline run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hi {
    pub x: Option<u32>,
    pub r#type: Option<String>,
    pub content: Vec<InlineNode>,
}

impl Hi {
    pub fn new() -> Self {
        Hi::default()
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("hi", node)?;
        Ok(Hi {
            x: read_attr(node, "x")?,
            r#type: read_attr(node, "type")?,
            content: ContentModel::Span.parse_content("hi", node)?,
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("hi");
        write_attr(&mut node, "x", &self.x);
        write_attr(&mut node, "type", &self.r#type);
        ContentModel::Span.write_content("hi", &self.content, &mut node)?;
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

/// `<sub>` — sub-flow text embedded inside a native code run, e.g. the
/// text of an HTML `title` attribute or a footnote body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sub {
    pub r#type: Option<String>,
    pub datatype: Option<String>,
    pub content: Vec<InlineNode>,
}

impl Sub {
    pub fn new() -> Self {
        Sub::default()
    }

    pub fn from_node(node: &Node) -> Result<Self, Error> {
        expect_tag("sub", node)?;
        Ok(Sub {
            r#type: read_attr(node, "type")?,
            datatype: read_attr(node, "datatype")?,
            content: ContentModel::Span.parse_content("sub", node)?,
        })
    }

    pub fn to_node(&self) -> Result<Node, Error> {
        let mut node = Node::new("sub");
        write_attr(&mut node, "type", &self.r#type);
        write_attr(&mut node, "datatype", &self.datatype);
        ContentModel::Span.write_content("sub", &self.content, &mut node)?;
        Ok(node)
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.to_node()?.to_xml_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bpt_with_sub_and_tail() {
        let node = Node::from_xml(r#"<bpt i="1" x="2" type="bold">&lt;b <sub>title</sub>&gt;</bpt>"#)
            .unwrap();
        let bpt = Bpt::from_node(&node).unwrap();
        assert_eq!(bpt.i, Some(1));
        assert_eq!(bpt.x, Some(2));
        assert_eq!(bpt.r#type.as_deref(), Some("bold"));
        assert_eq!(bpt.content.len(), 3);
        assert_eq!(bpt.content[0], InlineNode::Text("<b ".to_string()));
        assert!(matches!(bpt.content[1], InlineNode::Sub(_)));
        assert_eq!(bpt.content[2], InlineNode::Text(">".to_string()));
    }

    #[test]
    fn test_parse_rejects_disallowed_child() {
        // hi is not legal inside bpt
        let node = Node::from_xml(r#"<bpt i="1"><hi>x</hi></bpt>"#).unwrap();
        let error = Bpt::from_node(&node).unwrap_err();
        assert!(matches!(
            error,
            Error::UnexpectedChild {
                element: "bpt",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_tag_mismatch() {
        let node = Node::from_xml(r#"<ept i="1"/>"#).unwrap();
        let error = Bpt::from_node(&node).unwrap_err();
        assert!(matches!(
            error,
            Error::TagMismatch {
                expected: "bpt",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_non_integer_i() {
        let node = Node::from_xml(r#"<bpt i="one"/>"#).unwrap();
        let error = Bpt::from_node(&node).unwrap_err();
        assert!(matches!(
            error,
            Error::InvalidAttributeType { attribute: "i", .. }
        ));
    }

    #[test]
    fn test_serialize_requires_i() {
        let bpt = Bpt::default();
        let error = bpt.to_node().unwrap_err();
        assert!(matches!(
            error,
            Error::MissingAttribute {
                element: "bpt",
                attribute: "i",
            }
        ));
    }

    #[test]
    fn test_it_requires_pos() {
        let node = Node::from_xml(r#"<it pos="BEGIN">code</it>"#).unwrap();
        let it = It::from_node(&node).unwrap();
        assert_eq!(it.pos, Some(Pos::Begin));
        // normalized to lowercase on the way back out
        assert_eq!(it.to_xml_string().unwrap(), r#"<it pos="begin">code</it>"#);

        let error = It::default().to_node().unwrap_err();
        assert!(matches!(
            error,
            Error::MissingAttribute {
                element: "it",
                attribute: "pos",
            }
        ));
    }

    #[test]
    fn test_ph_assoc_round_trip() {
        let node = Node::from_xml(r#"<ph assoc="P" x="3">&#38;nbsp;</ph>"#).unwrap();
        let ph = Ph::from_node(&node).unwrap();
        assert_eq!(ph.assoc, Some(Assoc::P));
        assert_eq!(ph.x, Some(3));
        let xml = ph.to_xml_string().unwrap();
        assert!(xml.contains(r#"assoc="p""#));
    }

    #[test]
    fn test_hi_nests_recursively() {
        let node = Node::from_xml(r#"<hi type="name">outer <hi>inner</hi> rest</hi>"#).unwrap();
        let hi = Hi::from_node(&node).unwrap();
        assert_eq!(hi.content.len(), 3);
        match &hi.content[1] {
            InlineNode::Hi(inner) => {
                assert_eq!(inner.content, vec![InlineNode::Text("inner".to_string())]);
            }
            other => panic!("expected nested hi, got {:?}", other),
        }
        assert_eq!(hi.plain_text(), "outer inner rest");
    }

    #[test]
    fn test_hi_rejects_sub_at_serialization() {
        let mut hi = Hi::new();
        hi.push(InlineNode::Sub(Sub::new()));
        let error = hi.to_node().unwrap_err();
        assert!(matches!(
            error,
            Error::UnexpectedChild {
                element: "hi",
                ..
            }
        ));
    }

    #[test]
    fn test_unbalanced_bpt_in_hi() {
        let mut hi = Hi::new();
        hi.push_text("start ");
        hi.push(InlineNode::Bpt(Bpt::new(1)));
        let error = hi.to_node().unwrap_err();
        assert!(matches!(
            error,
            Error::UnbalancedPairedTags {
                element: "hi",
                surplus: "bpt",
                missing: "ept",
                excess: 1,
            }
        ));

        hi.push(InlineNode::Ept(Ept::new(1)));
        assert!(hi.to_node().is_ok());
    }

    #[test]
    fn test_balance_is_local_to_each_container() {
        // The bpt lives inside the nested hi; the outer hi's own list only
        // holds the nested hi, so the outer check passes and the inner one
        // fails.
        let mut inner = Hi::new();
        inner.push(InlineNode::Bpt(Bpt::new(1)));
        let mut outer = Hi::new();
        outer.push(InlineNode::Hi(inner));
        let error = outer.to_node().unwrap_err();
        assert!(matches!(
            error,
            Error::UnbalancedPairedTags { element: "hi", .. }
        ));
    }

    #[test]
    fn test_pairing_is_by_count_not_by_i() {
        let mut hi = Hi::new();
        hi.push(InlineNode::Bpt(Bpt::new(1)));
        hi.push(InlineNode::Ept(Ept::new(2)));
        assert!(hi.to_node().is_ok());
    }

    #[test]
    fn test_empty_text_has_no_wire_representation() {
        let mut sub = Sub::new();
        sub.push_text("");
        assert!(sub.content().is_empty());

        sub.push(InlineNode::Text(String::new()));
        assert_eq!(sub.to_xml_string().unwrap(), "<sub/>");
    }

    #[test]
    fn test_container_mutation_helpers() {
        let mut sub = Sub::new();
        sub.push_text("one");
        sub.push(InlineNode::Ph(Ph::new()));
        sub.push_text("two");
        sub.insert(0, "zero ");
        assert_eq!(sub.content().len(), 4);
        let removed = sub.remove(2);
        assert!(matches!(removed, InlineNode::Ph(_)));
        assert_eq!(sub.plain_text(), "zero onetwo");
    }

    #[test]
    fn test_ut_round_trip() {
        let node = Node::from_xml(r#"<ut x="4">\page</ut>"#).unwrap();
        let ut = Ut::from_node(&node).unwrap();
        assert_eq!(ut.x, Some(4));
        assert_eq!(ut.to_xml_string().unwrap(), r#"<ut x="4">\page</ut>"#);
    }
}
