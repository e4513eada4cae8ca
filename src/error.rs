//! The error taxonomy shared by every fallible operation in the crate.

use thiserror::Error;

/// Every way a genome, network, species, or population operation can fail.
///
/// Recoverable variants (`AddConnectionUnsatisfiable`, `AddNodeUnsatisfiable`,
/// `ActivationNonterminating`) are meant to be handled locally by the caller;
/// `MassExtinction` is terminal for a run and should surface to the user.
#[derive(Debug, Error)]
pub enum EvoError {
    /// `add_connection` could not find a legal, acyclic, not-already-present
    /// node pair within the retry budget. Callers should fall back to
    /// `add_node` instead of treating this as fatal.
    #[error("no legal connection found within the retry budget")]
    AddConnectionUnsatisfiable,

    /// `add_node` could not find an enabled gene to bisect within the retry
    /// budget. Extremely rare; the mutation should simply be skipped.
    #[error("no enabled connection available to bisect")]
    AddNodeUnsatisfiable,

    /// The network's forward-propagation fixpoint did not settle within the
    /// round bound. Fatal for that one evaluation, not for the run.
    #[error("activation did not settle within {0} rounds")]
    ActivationNonterminating(usize),

    /// Every species emptied out after re-speciation. Fatal for the run.
    #[error("every species died out; population is extinct")]
    MassExtinction,

    /// A mutation roulette produced a tag the dispatcher doesn't recognize.
    /// Indicates a programming error in the mutation-ratio configuration.
    #[error("unknown mutation kind: {0}")]
    UnknownMutationKind(String),
}
