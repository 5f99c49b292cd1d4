//! Error types for the election state machine.

use crate::member::MemberId;

/// Errors surfaced by the election state machine and its collaborators.
///
/// Transient conditions (transport back-pressure, catch-up retry) never
/// appear here; they are absorbed by the tick loop. Anything that does
/// surface is either a collaborator failure or an invariant violation,
/// and the host is expected to abandon the election on it.
#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    /// The observable state counter held a code outside the state table.
    #[error("invalid election state code: {0}")]
    InvalidStateCode(u32),

    /// A message referenced a member id that is not part of the cluster.
    #[error("unknown cluster member: {0}")]
    UnknownMember(MemberId),

    /// The member set handed to the election contained a duplicate id.
    #[error("duplicate member id in cluster configuration: {0}")]
    DuplicateMember(MemberId),

    /// The member set handed to the election did not contain this member.
    #[error("cluster configuration has no entry for this member: {0}")]
    SelfNotInCluster(MemberId),

    /// `tick` was invoked after the election completed or was closed.
    #[error("election has terminated and can no longer be ticked")]
    Terminated,

    /// A follower-side step needed the leader's log session id before any
    /// leadership announcement supplied one.
    #[error("log session id is not yet known")]
    NoLogSession,

    /// An internal invariant did not hold; the process should terminate.
    #[error("election invariant violated: {0}")]
    Invariant(String),

    /// The recording log rejected a term record append.
    #[error("recording log append failed: {0}")]
    RecordingLog(String),

    /// The archive client failed while replicating the log gap.
    #[error("archive operation failed: {0}")]
    Archive(String),

    /// The host agent failed a preparation step (e.g. becoming leader).
    #[error("host agent failure: {0}")]
    Host(String),

    /// The catch-up coordinator could not bring the log to the target.
    #[error("log catch-up failed: {0}")]
    CatchUp(String),
}

impl ElectionError {
    /// Creates an invariant-violation error from a description.
    pub fn invariant(message: impl Into<String>) -> Self {
        ElectionError::Invariant(message.into())
    }
}
