//! JSON ⇄ XML conversion.
//!
//! # Data Flow
//! ```text
//! request:  { header, <root>: payload }
//!     → encode.rs (split header, serialize payload under <root>,
//!                  expand self-closing elements)
//!     → XmlDocument
//!
//! response: XML text
//!     → decode.rs (event reader → tree builder)
//!     → { <root>: value }
//! ```
//!
//! # Conventions
//! - Sequences are repeated sibling elements; a single decoded sibling is a
//!   plain value, not a one-element list
//! - Encoder input: `@` holds attributes, `#` holds element text
//! - Decoder output: `$` holds attributes, `_` holds element text
//! - Decoded scalars are always strings
//!
//! No I/O happens here.

pub mod decode;
pub mod encode;

pub use decode::{decode, ParseError, ParseFault};
pub use encode::{encode, expand_empty_elements, ConversionError, ConversionFault, EncodedRequest, XmlDocument};

pub(crate) const ATTRIBUTES_KEY: &str = "@";
pub(crate) const TEXT_KEY: &str = "#";
pub(crate) const ATTRIBUTES_DECODED_KEY: &str = "$";
pub(crate) const TEXT_DECODED_KEY: &str = "_";

pub(crate) fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
}
