//! Error types for 3MF loading
//!
//! Every error carries a code so failures can be categorized without string
//! matching on the full message.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and archive errors
//! - **E2xxx**: XML and document structure errors
//! - **E3xxx**: Model resolution errors
//! - **E4xxx**: Unsupported resources and extension failures
//!
//! ## Propagation
//!
//! Archive and top-level document errors abort the whole load. An
//! [`Error::UnsupportedResource`] is only ever logged by the geometry builder:
//! the affected mesh group is skipped and the rest of the scene still loads.

use std::io;
use thiserror::Error;

/// Result type for 3MF loading operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a 3MF package
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading the input
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input buffer is not a readable ZIP container
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Corrupted or truncated download
    /// - Unsupported compression method
    /// - The bytes are not a 3MF package at all
    #[error("[E1002] Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A part required by the loader is absent from the archive
    ///
    /// **Error Code**: E1003
    #[error("[E1003] Missing required file: {0}")]
    MissingFile(String),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// A model or relationship part is missing its root or has the wrong root
    ///
    /// **Error Code**: E2004
    ///
    /// **Common Causes**:
    /// - Root element of a `.model` part is not `<model>`
    /// - Empty or truncated XML part
    #[error("[E2004] Invalid document '{part}': {message}")]
    Document {
        /// Archive path of the offending part
        part: String,
        /// Description of the problem
        message: String,
    },

    /// No relationship in the root manifest points at a model part
    ///
    /// **Error Code**: E2005
    #[error("[E2005] No 3D model relationship found in '{0}'")]
    MissingRelationship(String),

    /// Parse error for numeric values
    ///
    /// **Error Code**: E3002
    #[error("[E3002] Parse error: {0}")]
    Parse(String),

    /// A component graph references itself, directly or through other objects
    ///
    /// **Error Code**: E3003
    #[error("[E3003] Cyclic component reference: {}", .chain.join(" -> "))]
    CyclicReference {
        /// Object ids along the cycle, ending with the repeated id
        chain: Vec<String>,
    },

    /// A component or build item references an object that does not exist
    ///
    /// **Error Code**: E3004
    #[error("[E3004] Object '{object_id}' not found in '{part}'")]
    MissingObject {
        /// Model part searched for the object
        part: String,
        /// Referenced object id
        object_id: String,
    },

    /// A triangle group resolves to a resource the builder cannot render
    ///
    /// **Error Code**: E4001
    ///
    /// The loader logs this error and skips the affected group.
    #[error("[E4001] Unsupported resource '{resource_id}': {reason}")]
    UnsupportedResource {
        /// Resource id the triangles were bound to
        resource_id: String,
        /// Why the group could not be built
        reason: String,
    },

    /// A registered extension handler failed
    ///
    /// **Error Code**: E4002
    #[error("[E4002] Extension '{namespace}' failed: {message}")]
    Extension {
        /// Namespace URI of the failing handler
        namespace: String,
        /// Handler-provided description
        message: String,
    },
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::Parse(format!("Failed to parse floating-point number: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::Parse(format!("Failed to parse integer: {}", err))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create a Document error for an archive part
    pub fn document(part: &str, message: impl Into<String>) -> Self {
        Error::Document {
            part: part.to_string(),
            message: message.into(),
        }
    }

    /// Create an XmlAttr error for a missing required attribute
    ///
    /// # Example
    /// ```
    /// use lib3mf_scene::Error;
    ///
    /// let err = Error::missing_attribute("component", "objectid");
    /// assert!(err.to_string().contains("objectid"));
    /// ```
    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Error::XmlAttr(format!(
            "Element '<{}>' is missing required attribute '{}'",
            element, attribute
        ))
    }

    /// Create a Parse error with context about what was being parsed
    ///
    /// # Arguments
    /// * `field_name` - The name of the field being parsed (e.g., "vertex x coordinate")
    /// * `value` - The value that failed to parse
    /// * `expected_type` - The expected type (e.g., "floating-point number")
    pub fn parse_error_with_context(field_name: &str, value: &str, expected_type: &str) -> Self {
        Error::Parse(format!(
            "Failed to parse '{}': expected {}, got '{}'",
            field_name, expected_type, value
        ))
    }

    /// Create an UnsupportedResource error
    pub fn unsupported_resource(resource_id: &str, reason: impl Into<String>) -> Self {
        Error::UnsupportedResource {
            resource_id: resource_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the loader may skip the failing unit of work and continue
    ///
    /// Only per-resource-group failures are recoverable; everything else
    /// aborts the load.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::UnsupportedResource { .. })
    }
}
