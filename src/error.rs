//! Error types for URDF parsing, serialization and kinematic resolution.

use thiserror::Error;

/// Errors that can occur while reading, writing or resolving a URDF model.
#[derive(Debug, Error)]
pub enum UrdfError {
    /// XML parsing or writing error.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required attribute or element is absent.
    #[error("missing required field: {field} on {element}")]
    MissingRequiredField {
        /// The missing attribute or child element name.
        field: &'static str,
        /// The element that should carry it.
        element: String,
    },

    /// Invalid attribute value.
    #[error("invalid value for {attribute} on {element}: {message}")]
    InvalidAttribute {
        /// The attribute with the invalid value.
        attribute: &'static str,
        /// The element containing the attribute.
        element: String,
        /// Description of why the value is invalid.
        message: String,
    },

    /// An element is structurally invalid.
    #[error("invalid element {element}: {message}")]
    InvalidElement {
        /// The offending element name.
        element: String,
        /// Description of the problem.
        message: String,
    },

    /// An element tag that has no meaning in its context.
    #[error("unknown element <{element}> in {context}")]
    UnknownElement {
        /// The unexpected tag.
        element: String,
        /// Where it was found.
        context: String,
    },

    /// A type alias that is not registered in the dialect registry.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// An object wrote a field its descriptor table does not declare.
    #[error("field {field} is not declared for {element}")]
    UndeclaredField {
        /// The undeclared field.
        field: &'static str,
        /// The element being written.
        element: String,
    },

    /// A geometry element holds more than one shape.
    #[error("ambiguous geometry in {context}: found {found:?}")]
    AmbiguousGeometry {
        /// The element holding the geometry.
        context: String,
        /// The shape tags that were found.
        found: Vec<String>,
    },

    /// A geometry element holds no shape.
    #[error("missing geometry shape in {context}")]
    MissingGeometry {
        /// The element holding the geometry.
        context: String,
    },

    /// None of the candidate schemas accepted an element.
    #[error("no schema among {candidates:?} matches <{element}>")]
    NoMatchingSchema {
        /// The element that was tried.
        element: String,
        /// Candidate schema names, in the order they were tried.
        candidates: Vec<&'static str>,
        /// The error from the last candidate.
        #[source]
        source: Option<Box<UrdfError>>,
    },

    /// A name that must be unique is used twice.
    #[error("duplicate {kind} name: {name}")]
    DuplicateName {
        /// What kind of entity carries the name.
        kind: &'static str,
        /// The repeated name.
        name: String,
    },

    /// A link is claimed as child by more than one joint.
    #[error("link {child} is the child of both {existing} and {joint}")]
    DuplicateChild {
        /// The link claimed twice.
        child: String,
        /// The joint that first claimed it.
        existing: String,
        /// The joint that claimed it again.
        joint: String,
    },

    /// More than one link has no parent joint.
    #[error("multiple root links found: {0:?}")]
    MultipleRoots(Vec<String>),

    /// No link is free of a parent joint, or there are no links at all.
    #[error("no root link found")]
    NoRoot,

    /// The tip of a chain does not descend from the requested root.
    #[error("link {tip} is not reachable from {root}")]
    UnreachableRoot {
        /// The requested chain root.
        root: String,
        /// The requested chain tip.
        tip: String,
    },

    /// Unknown joint type.
    #[error("invalid joint type: {0}")]
    InvalidJointType(String),

    /// Reference to undefined link.
    #[error("reference to undefined link: {link_name} in {context}")]
    UndefinedLink {
        /// The link name that was referenced.
        link_name: String,
        /// Where it was referenced.
        context: String,
    },

    /// Kinematic loop detected.
    #[error("kinematic loop detected: {0}")]
    KinematicLoop(String),
}

impl UrdfError {
    /// Create a missing required field error.
    pub fn missing_field(field: &'static str, element: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field,
            element: element.into(),
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(
        attribute: &'static str,
        element: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            attribute,
            element: element.into(),
            message: message.into(),
        }
    }

    /// Create an invalid element error.
    pub fn invalid_element(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidElement {
            element: element.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate name error.
    pub fn duplicate_name(kind: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    /// Create an undefined link error.
    pub fn undefined_link(link_name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UndefinedLink {
            link_name: link_name.into(),
            context: context.into(),
        }
    }
}

/// Result type for URDF operations.
pub type Result<T> = std::result::Result<T, UrdfError>;

/// Non-fatal issues found in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrdfWarning {
    /// A material defines neither a colour nor a texture.
    #[error("material '{name}' in {context} has neither a color nor a texture")]
    MaterialWithoutAppearance {
        /// Material name.
        name: String,
        /// Where the material is declared.
        context: String,
    },
}
