//! Generation-time errors.
//!
//! Every variant carries the [`Location`] of the offending declaration. These
//! errors are fatal to the build; passes collect them into a `Vec` so a single
//! run reports every problem instead of stopping at the first one.

use thiserror::Error;

use crate::Location;

/// Errors raised while building the type mapping table or resolving exports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindsError {
    /// A managed type has no native mapping and is not a primitive.
    #[error("{location}: type `{managed}` has no native mapping (used by {context})")]
    UnregisteredType {
        /// The managed type as written.
        managed: String,
        /// What referenced it, e.g. "field `r` of `Color`".
        context: String,
        location: Location,
    },

    /// The same managed type was registered twice with different mappings.
    #[error("{location}: conflicting mapping for `{managed}`: already mapped to `{existing}` at {first}")]
    ConflictingMapping {
        managed: String,
        /// Native name of the first registration.
        existing: String,
        first: Location,
        location: Location,
    },

    /// A blittable type contains itself by value.
    #[error("{location}: blittable type `{managed}` contains itself by value")]
    RecursiveLayout { managed: String, location: Location },

    /// Two exported classes share a managed namespace and name.
    #[error("{location}: duplicate export `{name}` (first declared at {first})")]
    DuplicateExport {
        name: String,
        first: Location,
        location: Location,
    },

    /// A class exports two methods with the same name.
    #[error("{location}: duplicate method `{method}` in export `{class}`")]
    DuplicateMethod {
        class: String,
        method: String,
        location: Location,
    },

    /// A method declares two parameters with the same name.
    #[error("{location}: duplicate parameter `{param}` in `{class}::{method}`")]
    DuplicateParameter {
        class: String,
        method: String,
        param: String,
        location: Location,
    },

    /// A managed type cannot cross the boundary in this position.
    #[error("{location}: unsupported type `{managed}` in {context}: {reason}")]
    UnsupportedType {
        managed: String,
        context: String,
        reason: String,
        location: Location,
    },

    /// The declaration itself is malformed.
    #[error("{location}: invalid declaration: {message}")]
    InvalidDeclaration { message: String, location: Location },
}

impl BindsError {
    /// The declaration site this error points at.
    pub fn location(&self) -> &Location {
        match self {
            BindsError::UnregisteredType { location, .. }
            | BindsError::ConflictingMapping { location, .. }
            | BindsError::RecursiveLayout { location, .. }
            | BindsError::DuplicateExport { location, .. }
            | BindsError::DuplicateMethod { location, .. }
            | BindsError::DuplicateParameter { location, .. }
            | BindsError::UnsupportedType { location, .. }
            | BindsError::InvalidDeclaration { location, .. } => location,
        }
    }
}

/// Result type for core operations.
pub type BindsResult<T> = Result<T, BindsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    #[test]
    fn unregistered_type_message_names_field() {
        let err = BindsError::UnregisteredType {
            managed: "Vec3".into(),
            context: "field `position` of `Transform`".into(),
            location: Location::new("math.rs", Span::point(4, 5)),
        };
        assert_eq!(
            err.to_string(),
            "math.rs:4:5: type `Vec3` has no native mapping (used by field `position` of `Transform`)"
        );
        assert_eq!(err.location().span.line, 4);
    }

    #[test]
    fn duplicate_export_message() {
        let err = BindsError::DuplicateExport {
            name: "interop::MathModule".into(),
            first: Location::new("a.rs", Span::point(1, 1)),
            location: Location::new("b.rs", Span::point(2, 1)),
        };
        assert!(err.to_string().contains("first declared at a.rs:1:1"));
    }
}
