use std::fmt;

/// Precondition violations raised by the numeric core.
///
/// Every variant is a caller error: the iteration itself has no failure
/// modes once a [`crate::graph::Graph`] and a valid damping factor exist.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankError {
    /// The graph has no nodes.
    #[error("graph must contain at least one node")]
    EmptyGraph,

    /// The dense N×N matrix for this many nodes is too large to build.
    #[error("{nodes} nodes exceeds the supported maximum of {max}")]
    TooManyNodes { nodes: usize, max: usize },

    /// An adjacency row does not have one entry per node.
    #[error("adjacency row {row} has {found} entries, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// An adjacency entry other than 0 or 1.
    #[error("adjacency entry ({row}, {col}) is {value}, expected 0 or 1")]
    InvalidEntry { row: usize, col: usize, value: u8 },

    /// An edge references a node index outside `0..nodes`.
    #[error("edge {from} -> {to} is out of range for {nodes} nodes")]
    EdgeOutOfRange {
        from: usize,
        to: usize,
        nodes: usize,
    },

    /// Label list length differs from the node count.
    #[error("got {found} labels for {expected} nodes")]
    LabelCount { expected: usize, found: usize },

    /// Damping factor is not a finite value in `[0, 1]`.
    #[error("damping factor {0} must be finite and within [0, 1]")]
    InvalidDamping(f64),

    /// Matrix and vector dimensions disagree, or the matrix is not square.
    #[error("matrix is {rows}x{cols} but vector has {vector} entries")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        vector: usize,
    },
}

impl RankError {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyGraph => ErrorCode::EmptyGraph,
            Self::TooManyNodes { .. } => ErrorCode::TooManyNodes,
            Self::NotSquare { .. } => ErrorCode::NotSquare,
            Self::InvalidEntry { .. } => ErrorCode::InvalidEntry,
            Self::EdgeOutOfRange { .. } => ErrorCode::EdgeOutOfRange,
            Self::LabelCount { .. } => ErrorCode::LabelCount,
            Self::InvalidDamping(_) => ErrorCode::InvalidDamping,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
        }
    }
}

/// Machine-readable error codes, grouped by concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EmptyGraph,
    TooManyNodes,
    NotSquare,
    InvalidEntry,
    EdgeOutOfRange,
    LabelCount,
    InvalidDamping,
    DimensionMismatch,
}

impl ErrorCode {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EmptyGraph => "E1001",
            Self::NotSquare => "E1002",
            Self::InvalidEntry => "E1003",
            Self::EdgeOutOfRange => "E1004",
            Self::LabelCount => "E1005",
            Self::TooManyNodes => "E1006",
            Self::InvalidDamping => "E2001",
            Self::DimensionMismatch => "E3001",
        }
    }

    /// Optional remediation hint for terminal output.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::EmptyGraph => Some("Declare at least one node in the [graph] section."),
            Self::NotSquare | Self::InvalidEntry => {
                Some("Adjacency must be an N x N matrix of 0/1 entries.")
            }
            Self::EdgeOutOfRange => Some("Edge endpoints must be node indices below `nodes`."),
            Self::LabelCount => Some("Provide exactly one label per node, or none."),
            Self::TooManyNodes => {
                Some("Check [graph] edge indices and --nodes; node indices start at 0.")
            }
            Self::InvalidDamping => Some("Use a damping factor such as 0.85."),
            Self::DimensionMismatch => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, RankError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::EmptyGraph,
            ErrorCode::NotSquare,
            ErrorCode::InvalidEntry,
            ErrorCode::EdgeOutOfRange,
            ErrorCode::LabelCount,
            ErrorCode::TooManyNodes,
            ErrorCode::InvalidDamping,
            ErrorCode::DimensionMismatch,
        ];
        let codes: HashSet<_> = all.iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn dimension_mismatch_message_names_both_shapes() {
        let err = RankError::DimensionMismatch {
            rows: 3,
            cols: 4,
            vector: 2,
        };
        assert_eq!(err.to_string(), "matrix is 3x4 but vector has 2 entries");
        assert_eq!(err.code().code(), "E3001");
    }

    #[test]
    fn too_many_nodes_reports_limit() {
        let err = RankError::TooManyNodes {
            nodes: 5_000_000_001,
            max: 16_384,
        };
        assert_eq!(
            err.to_string(),
            "5000000001 nodes exceeds the supported maximum of 16384"
        );
        assert_eq!(err.code().code(), "E1006");
        assert!(err.code().hint().is_some());
    }

    #[test]
    fn damping_error_has_hint() {
        let err = RankError::InvalidDamping(1.5);
        assert!(err.code().hint().is_some());
        assert!(err.to_string().contains("1.5"));
    }
}
