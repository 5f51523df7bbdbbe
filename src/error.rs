//! Typed control-flow signals.
//!
//! The reference solver this crate is modeled on uses C++ exceptions as the
//! normal interprocedural signal for contradictions, backtrack-budget
//! exhaustion, enumeration escapes, and timeouts. Rust has no implicit
//! unwinding story we want to lean on for *expected* control flow, so every
//! one of those signals becomes a variant of [`Signal`], propagated with
//! `?` up through the branching frames that know how to handle it.

pub type Result<T, E = Signal> = core::result::Result<T, E>;

/// One of the five typed non-local exits the search core can raise.
///
/// Each variant corresponds to exactly one row of the error table in the
/// specification this solver implements: `Contradiction` is raised by
/// propagation and caught by every branching frame; `NbBacktracksOut` is
/// raised by branching when the restart budget is exceeded and caught by
/// the restart controller; `NbSolutionsOut` is raised by the solution
/// reporter and caught by the top-level solve loop; `TimeOut` is raised at
/// choice-point entry when the cooperative interrupt flag is set; and
/// `FindNewSequence` escapes SCP branching frames when the caller asks for
/// the next distinct sequence.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Propagation (or `enforce_ub`) proved the current partial assignment
    /// infeasible. Caught at the nearest branching frame, which restores
    /// its checkpoint and tries the other branch.
    #[error("contradiction")]
    Contradiction,

    /// The restart controller's backtrack budget for this attempt was
    /// exceeded. Caught by the restart controller, which begins the next
    /// attempt with a longer Luby-derived budget.
    #[error("backtrack budget exhausted")]
    NbBacktracksOut,

    /// The requested number of solutions has been enumerated. Caught by
    /// the top-level `solve` call, which terminates enumeration.
    #[error("solution cap reached")]
    NbSolutionsOut,

    /// The cooperative interrupt flag was observed set at a choice point.
    /// Caught by the top-level `solve` call, which terminates the search.
    #[error("search interrupted")]
    TimeOut,

    /// SCP enumeration requests the next distinct amino-acid sequence,
    /// skipping whatever values remain in the current group. Escapes all
    /// pending SCP branching frames for the current group.
    #[error("find next sequence")]
    FindNewSequence,
}

/// Errors that terminate the process outright rather than being caught by
/// a branching frame: malformed configuration, option incompatibility, or
/// I/O failure while reading a problem or dumping state. These are never
/// raised once search has begun.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("search signal escaped to caller: {0}")]
    Signal(#[from] Signal),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
