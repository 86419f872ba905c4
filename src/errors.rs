use thiserror::Error;

/// Fatal problems found while turning a graph description into a computable factor graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A factor's parameters do not fit the variables it ended up connected to.
    #[error("factor `{factor}` expects {expected} entries but its scope provides {actual}")]
    ScopeMismatch {
        factor: String,
        expected: usize,
        actual: usize,
    },

    /// A node carries a parameter that cannot be used for inference.
    #[error("node `{node}` has an invalid parameter: {reason}")]
    InvalidParameter { node: String, reason: String },
}

/// Errors returned by the inference engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BpError {
    #[error("unknown node `{0}`")]
    UnknownNode(String),

    #[error("node `{0}` is a factor, not a variable")]
    NotAVariable(String),

    #[error("damping factor {0} is outside of [0, 1]")]
    InvalidDamping(f64),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
