use crate::expr::CallId;

/// Why inference produced no type arguments for a call site.
///
/// Failures inside nested inference for an argument expression are absorbed
/// by the orchestrator; only the top-level call site reports one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    /// Incorporation or final resolution derived a manifestly false bound.
    #[error("contradictory bounds while inferring type arguments for call {call:?}")]
    ContradictoryBounds { call: CallId },

    /// A variable reached final resolution with no derivable instantiation.
    #[error("no instantiation found for type parameter `{type_param}` of call {call:?}")]
    UnresolvedVariable { call: CallId, type_param: String },

    /// An internal invariant was violated; inference for the call site is
    /// abandoned but the surrounding analysis continues.
    #[error("inference invariant violated: {0}")]
    Internal(String),
}
