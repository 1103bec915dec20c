//! Error types for netlist declaration and output.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for netlist operations.
pub type NetlistResult<T> = Result<T, NetlistError>;

/// Errors that can occur while declaring a design or emitting its netlist.
#[derive(Debug, Error)]
pub enum NetlistError {
    /// The catalog has no template for the requested part.
    #[error("Unknown part: {category}/{name}")]
    UnknownPart {
        /// Catalog category (e.g. "Connector").
        category: String,
        /// Template name within the category.
        name: String,
    },

    /// A reference designator is already in use.
    #[error("Duplicate reference designator: {reference}")]
    DuplicateReference {
        /// The colliding designator.
        reference: String,
    },

    /// A net with the same name has already been declared.
    #[error("Duplicate net name: {name}")]
    DuplicateNet {
        /// The colliding net name.
        name: String,
    },

    /// Net names must be non-empty.
    #[error("Invalid net name: {name:?}")]
    InvalidNetName {
        /// The rejected name.
        name: String,
    },

    /// The part has no pin matching the reference.
    #[error("Part {reference} has no pin '{pin}'")]
    InvalidPin {
        /// Reference designator of the part.
        reference: String,
        /// The pin number or name that failed to resolve.
        pin: String,
    },

    /// A pin name matched more than one pin.
    #[error("Pin '{pin}' is ambiguous on {reference} (matches pins {candidates:?})")]
    AmbiguousPin {
        /// Reference designator of the part.
        reference: String,
        /// The pin name that was looked up.
        pin: String,
        /// Pin numbers sharing that name.
        candidates: Vec<String>,
    },

    /// The pin is already a member of a different net.
    #[error("Pin {reference}.{pin} is already on net {existing}, cannot join {requested}")]
    PinConflict {
        /// Reference designator of the part.
        reference: String,
        /// Pin number.
        pin: String,
        /// Net the pin already belongs to.
        existing: String,
        /// Net the caller tried to connect it to.
        requested: String,
    },

    /// A part handle does not belong to this design.
    #[error("Unknown part handle: {index}")]
    UnknownPartHandle {
        /// Raw handle index.
        index: usize,
    },

    /// A net handle does not belong to this design.
    #[error("Unknown net handle: {index}")]
    UnknownNetHandle {
        /// Raw handle index.
        index: usize,
    },

    /// A catalog template is malformed.
    #[error("Invalid part template {category}/{name}: {message}")]
    InvalidTemplate {
        /// Catalog category.
        category: String,
        /// Template name.
        name: String,
        /// Description of what's wrong.
        message: String,
    },

    /// Failed to open or read a file.
    #[error("Failed to read file: {path}")]
    FileRead {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write the netlist.
    #[error("Failed to write netlist to {target}")]
    FileWrite {
        /// Output path or stream name.
        target: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A catalog file could not be parsed.
    #[error("Failed to parse catalog: {path}")]
    CatalogParse {
        /// Path to the catalog file (or `<inline>`).
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The netlist could not be serialised.
    #[error("Failed to serialise netlist as {format}: {message}")]
    Serialise {
        /// Output format name.
        format: &'static str,
        /// Description of what went wrong.
        message: String,
    },
}

impl NetlistError {
    /// Creates an unknown part error.
    pub fn unknown_part(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownPart {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Creates an invalid pin error.
    pub fn invalid_pin(reference: impl Into<String>, pin: impl Into<String>) -> Self {
        Self::InvalidPin {
            reference: reference.into(),
            pin: pin.into(),
        }
    }

    /// Creates an invalid template error.
    pub fn invalid_template(
        category: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidTemplate {
            category: category.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a file read error.
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a write error for the given output target.
    pub fn file_write(target: impl Into<String>, source: io::Error) -> Self {
        Self::FileWrite {
            target: target.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = NetlistError::unknown_part("Connector", "Nope");
        assert_eq!(err.to_string(), "Unknown part: Connector/Nope");
    }

    #[test]
    fn pin_conflict_display() {
        let err = NetlistError::PinConflict {
            reference: "J1".to_string(),
            pin: "16".to_string(),
            existing: "SD_MUX_SEL".to_string(),
            requested: "GND".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Pin J1.16 is already on net SD_MUX_SEL, cannot join GND"
        );
    }
}
