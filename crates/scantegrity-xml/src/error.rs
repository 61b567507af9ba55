//! Errors raised while parsing an XML artifact into a typed model value.

use scantegrity_core::schema::ModelError;
use thiserror::Error;

/// Errors raised by the `parse` module.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The document was not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    /// An expected child element was missing.
    #[error("missing element {child} under {parent}")]
    MissingElement {
        /// The element that was searched.
        parent: String,
        /// The missing child element's path, relative to `parent`.
        child: String,
    },
    /// An expected attribute was missing.
    #[error("missing attribute {attribute} on {element}")]
    MissingAttribute {
        /// The element missing the attribute.
        element: String,
        /// The missing attribute's name.
        attribute: String,
    },
    /// An element that was expected to carry text content had none.
    #[error("element {element} has no text content")]
    MissingText {
        /// The element missing text content.
        element: String,
    },
    /// An attribute or text value that should have been an integer was not.
    #[error("attribute {attribute} on {element} is not a valid integer: {value:?}")]
    InvalidInteger {
        /// The element carrying the bad value.
        element: String,
        /// The attribute carrying the bad value.
        attribute: String,
        /// The raw value that failed to parse.
        value: String,
    },
    /// The election commitment constant was not valid base64 or not 16 bytes.
    #[error("invalid election constant: {0}")]
    InvalidConstant(String),
    /// Propagated from building the typed model.
    #[error(transparent)]
    Model(#[from] ModelError),
}
