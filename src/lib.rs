#![forbid(unsafe_code)]
//! Typed object model for TMX 1.4 (Translation Memory eXchange) files.
//!
//! Parses TMX documents into strongly-typed entities, lets you inspect and
//! mutate them freely, and serializes them back to XML with full structural
//! validation. Segment content is lossless: text and inline markup keep
//! their exact interleaving order through a round trip.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tmxcodec::{Tmx, traits::Parser};
//!
//! let mut tmx = Tmx::read_from("memory.tmx")?;
//! for tu in &tmx.tus {
//!     if let Some(tuv) = tu.variant("en") {
//!         println!("{}", tuv.plain_text());
//!     }
//! }
//! tmx.write_to("memory_copy.tmx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Model
//!
//! - **Structural elements**: [`Tmx`], [`Header`], [`Tu`], [`Tuv`], [`Seg`],
//!   plus [`Prop`], [`Note`], [`Ude`], and [`Map`]
//! - **Inline elements**: [`Bpt`], [`Ept`], [`It`], [`Ph`], [`Ut`], [`Hi`],
//!   and [`Sub`], held as an ordered [`InlineNode`] sequence
//! - **Generic layer**: [`Node`], the plain XML element tree every typed
//!   entity parses from and serializes into
//!
//! Attribute fields are all optional in memory; required attributes are
//! enforced when serializing, so partially-built trees stay workable until
//! they are written out.

pub mod attributes;
pub mod error;
pub mod inline;
pub mod node;
pub mod structural;
pub mod traits;

// Re-export most used types for easy consumption
pub use crate::{
    attributes::{Assoc, Pos, Segtype, TmxDate},
    error::Error,
    inline::{Bpt, Ept, Hi, InlineContainer, InlineNode, It, Ph, Sub, Ut},
    node::Node,
    structural::{Header, Map, Note, Prop, Seg, Tmx, Tu, Tuv, Ude},
};
