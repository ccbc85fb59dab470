//! Error types for the index crate.

use std::fmt;

/// Errors that can occur during index and entry operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The entry array is malformed. Carries every violation that was found.
    #[error("validation error: {0}")]
    Validation(Violations),

    /// No free index is left in the allocation range.
    #[error("cannot allocate a new index in the range [{min},{max})")]
    Exhausted { min: i64, max: i64 },

    /// A document edit failed.
    #[error("document error: {0}")]
    Doc(#[from] hdl_doc::DocError),
}

impl IndexError {
    /// Shorthand for a validation error with a single violation.
    pub fn single(kind: ViolationKind, description: impl Into<String>) -> Self {
        Self::Validation(Violations(vec![Violation {
            position: None,
            kind,
            description: description.into(),
        }]))
    }

    /// The collected violations, if this is a validation error.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;

/// A specific structural problem in a handle document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Position of the offending entry in the `values` array, if any.
    pub position: Option<usize>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    NotAnObject,
    MissingValues,
    ValuesNotArray,
    EntryNotObject,
    MissingIndex,
    IndexNotInteger,
    DataNotObject,
    DuplicateIndex,
    DuplicateType,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "entry {pos}: {}", self.description),
            None => f.write_str(&self.description),
        }
    }
}

/// Every violation found in one pass over a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// Number of violations of the given kind.
    pub fn count(&self, kind: ViolationKind) -> usize {
        self.0.iter().filter(|v| v.kind == kind).count()
    }

    pub(crate) fn push(&mut self, position: usize, kind: ViolationKind, description: String) {
        self.0.push(Violation {
            position: Some(position),
            kind,
            description,
        });
    }

    /// `Ok(())` when empty, otherwise a validation error.
    pub fn into_result(self) -> IndexResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(IndexError::Validation(self))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}
