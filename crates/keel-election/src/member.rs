//! Cluster membership as seen by one election.
//!
//! The member set is fixed for the life of an election. Each row tracks
//! what a peer last reported about itself (log position, leadership
//! term, its vote in the current ballot) plus the book-keeping the
//! candidate needs to avoid re-sending vote requests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ElectionError;

/// Sentinel for a log position that has not been reported yet.
pub const NULL_POSITION: i64 = -1;

/// Sentinel for a leadership term that has not been reported yet.
pub const NULL_TERM_ID: i64 = -1;

/// Stable small-integer identifier of a cluster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub i32);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member-{}", self.0)
    }
}

/// One peer of the cluster, including this member's own row.
#[derive(Debug, Clone)]
pub struct Member {
    /// Stable identifier, unique within the cluster.
    pub id: MemberId,
    /// Endpoint the member-status stream is reachable on.
    pub status_endpoint: String,
    /// Endpoint the member subscribes to the live log on.
    pub log_endpoint: String,
    /// Endpoint the member's archive serves log replication from.
    pub archive_endpoint: String,
    /// Last log position the member reported, or [`NULL_POSITION`].
    pub log_position: i64,
    /// Last leadership term the member reported, or [`NULL_TERM_ID`].
    pub leadership_term_id: i64,
    /// The member's vote in the current ballot. `None` until it votes.
    pub voted_for: Option<bool>,
    /// Whether this node has sent the member a vote request in the
    /// current ballot. Flipped only when the transport accepts the send.
    pub is_ballot_sent: bool,
}

impl Member {
    /// Creates a member row with nothing reported yet.
    pub fn new(
        id: MemberId,
        status_endpoint: impl Into<String>,
        log_endpoint: impl Into<String>,
        archive_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id,
            status_endpoint: status_endpoint.into(),
            log_endpoint: log_endpoint.into(),
            archive_endpoint: archive_endpoint.into(),
            log_position: NULL_POSITION,
            leadership_term_id: NULL_TERM_ID,
            voted_for: None,
            is_ballot_sent: false,
        }
    }

    /// Whether the member has reported a `(term, position)` this round.
    pub fn has_reported(&self) -> bool {
        self.log_position != NULL_POSITION
    }
}

/// The fixed member set of one election, with this member's id marked.
#[derive(Debug, Clone)]
pub struct MemberTable {
    members: Vec<Member>,
    self_id: MemberId,
}

impl MemberTable {
    /// Builds the table, validating that ids are unique and that
    /// `self_id` is present.
    pub fn new(members: Vec<Member>, self_id: MemberId) -> Result<Self, ElectionError> {
        for (i, member) in members.iter().enumerate() {
            if members[..i].iter().any(|other| other.id == member.id) {
                return Err(ElectionError::DuplicateMember(member.id));
            }
        }
        if !members.iter().any(|m| m.id == self_id) {
            return Err(ElectionError::SelfNotInCluster(self_id));
        }
        Ok(Self { members, self_id })
    }

    /// Number of members in the cluster, including this one.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the cluster has no members. Never the case for a table
    /// built through [`MemberTable::new`].
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// This member's id.
    pub fn self_id(&self) -> MemberId {
        self.self_id
    }

    /// This member's own row.
    pub fn self_member(&self) -> &Member {
        self.members
            .iter()
            .find(|m| m.id == self.self_id)
            .expect("self row validated at construction")
    }

    /// Mutable access to this member's own row.
    pub fn self_member_mut(&mut self) -> &mut Member {
        let self_id = self.self_id;
        self.members
            .iter_mut()
            .find(|m| m.id == self_id)
            .expect("self row validated at construction")
    }

    /// Looks up a member by id.
    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Mutable row lookup; an unknown id is an invariant violation.
    pub fn row_mut(&mut self, id: MemberId) -> Result<&mut Member, ElectionError> {
        self.members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ElectionError::UnknownMember(id))
    }

    /// All members, including this one.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// All members except this one.
    pub fn peers(&self) -> impl Iterator<Item = &Member> {
        let self_id = self.self_id;
        self.members.iter().filter(move |m| m.id != self_id)
    }

    /// Clears every row back to the canvass baseline (no reported
    /// `(term, position)`, no vote, no ballot sent), then republishes
    /// this member's real `(term, position)` into its own row.
    pub fn reset(&mut self, self_term: i64, self_position: i64) {
        for member in &mut self.members {
            member.log_position = NULL_POSITION;
            member.leadership_term_id = NULL_TERM_ID;
            member.voted_for = None;
            member.is_ballot_sent = false;
        }
        let own = self.self_member_mut();
        own.leadership_term_id = self_term;
        own.log_position = self_position;
    }

    /// Marks this member as the candidate for `term`: clears all votes,
    /// records the self-vote, and marks its own ballot as sent so the
    /// ballot loop only targets peers.
    pub fn become_candidate(&mut self, term: i64) {
        for member in &mut self.members {
            member.voted_for = None;
            member.is_ballot_sent = false;
        }
        let own = self.self_member_mut();
        own.leadership_term_id = term;
        own.voted_for = Some(true);
        own.is_ballot_sent = true;
    }

    /// Forgets every reported log position ahead of leader ready, so the
    /// leader only counts positions reported under its new term.
    pub fn reset_log_positions(&mut self) {
        for member in &mut self.members {
            member.log_position = NULL_POSITION;
        }
    }
}
