//! keel-election: leader election for a keel consensus cluster.
//!
//! This crate drives a group of peer members from an unknown or failed
//! leadership state to a single agreed leader carrying the most
//! up-to-date replicated log, at which point normal replication can
//! resume. It runs on every member at startup and whenever the active
//! leader is deemed lost.
//!
//! # Architecture
//!
//! The election is a single-threaded, cooperatively scheduled state
//! machine ticked by the host agent. Each tick drains inbound status
//! messages, advances the current state, and offers outbound messages;
//! nothing ever blocks. The crate is split along those lines:
//!
//! - **State machine**: [`Election`] with its observable [`StateCounter`]
//! - **Quorum arithmetic**: pure candidacy and vote predicates
//! - **Member table**: per-peer reported positions, terms, and votes
//! - **Catch-up**: [`CatchUpCoordinator`] brings a lagging follower's
//!   log up to the new leader before it joins the live stream
//!
//! Log storage, the message transport, the archive client, and the host
//! agent are external collaborators reached through the traits in this
//! crate.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use keel_election::{Election, ElectionConfig, MemberTable, RecoveryPlan};
//!
//! let mut election = Election::new(
//!     ElectionConfig::default(),
//!     members,
//!     RecoveryPlan { last_appended_log_position: 1000 },
//!     last_term,
//!     true, // startup
//!     rng,
//!     transport,
//!     host,
//!     archive,
//!     recording_log,
//!     now,
//! );
//!
//! // from the host agent's duty cycle, until the host sees
//! // election_complete():
//! election.tick(now)?;
//! ```

mod catchup;
mod config;
mod election;
mod error;
mod host;
mod member;
mod message;
mod quorum;
mod transport;

pub use catchup::{ArchiveClient, CatchUpCoordinator};
pub use config::ElectionConfig;
pub use election::{Election, State, StateCounter};
pub use error::ElectionError;
pub use host::{follower_log_channel, HostAgent, RecordingLog, RecoveryPlan, Role};
pub use member::{Member, MemberId, MemberTable, NULL_POSITION, NULL_TERM_ID};
pub use message::{ElectionMessage, RecordingLogEntry};
pub use quorum::{
    has_majority_vote, has_won_vote_on_full_count, have_voters_reached_position,
    is_quorum_candidate, is_unanimous_candidate, majority_threshold,
};
pub use transport::MessageTransport;
