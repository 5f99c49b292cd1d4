//! Quorum arithmetic over the member table.
//!
//! Pure functions only; the election state machine decides what to do
//! with the answers. Members are ranked lexicographically by
//! `(leadership term, log position, member id)`, so the id breaks ties
//! between members whose logs are equally up to date.

use crate::member::{Member, MemberTable};

/// Minimum members that constitute a majority of `member_count`.
pub fn majority_threshold(member_count: usize) -> usize {
    member_count / 2 + 1
}

fn rank(member: &Member) -> (i64, i64, i32) {
    (member.leadership_term_id, member.log_position, member.id.0)
}

/// True when every peer has reported and none ranks above this member.
pub fn is_unanimous_candidate(table: &MemberTable) -> bool {
    let own = rank(table.self_member());
    table.peers().all(|p| p.has_reported() && rank(p) <= own)
}

/// True when a majority of the cluster (counting this member) has
/// reported and this member ranks at least as high as every reporter.
pub fn is_quorum_candidate(table: &MemberTable) -> bool {
    let own = rank(table.self_member());
    let mut reported = 1;
    for peer in table.peers() {
        if peer.has_reported() {
            if rank(peer) > own {
                return false;
            }
            reported += 1;
        }
    }
    reported >= majority_threshold(table.len())
}

/// True when every member has cast a vote and the yes-votes for `term`
/// form a majority. Lets a candidate claim leadership without waiting
/// out the election timeout.
pub fn has_won_vote_on_full_count(table: &MemberTable, term: i64) -> bool {
    let mut yes = 0;
    for member in table.iter() {
        match member.voted_for {
            None => return false,
            Some(true) if member.leadership_term_id == term => yes += 1,
            Some(_) => {}
        }
    }
    yes >= majority_threshold(table.len())
}

/// True when yes-votes for `term` form a majority, regardless of how
/// many members have not voted at all.
pub fn has_majority_vote(table: &MemberTable, term: i64) -> bool {
    let yes = table
        .iter()
        .filter(|m| m.leadership_term_id == term && m.voted_for == Some(true))
        .count();
    yes >= majority_threshold(table.len())
}

/// True when every member that voted yes has confirmed `term` and
/// reached `position`. The leader holds its election open until this
/// does.
pub fn have_voters_reached_position(table: &MemberTable, position: i64, term: i64) -> bool {
    table
        .iter()
        .filter(|m| m.voted_for == Some(true))
        .all(|m| m.leadership_term_id == term && m.log_position >= position)
}
