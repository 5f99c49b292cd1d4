//! Binary wire format for member-status messages.
//!
//! A compact little-endian encoding: one type byte, then fixed-width
//! fields in declaration order. Only the payloads are defined here; how
//! frames reach the other members is the transport's concern.

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::member::MemberId;

/// Maximum entries accepted in a recording-log response. Prevents
/// allocation bombs from crafted messages.
const MAX_RECORDING_LOG_ENTRIES: usize = 1024;

// Safe read helpers that return io::Error instead of panicking on truncated input.

fn safe_get_u8(buf: &mut &[u8]) -> io::Result<u8> {
    if buf.is_empty() {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "need 1 byte"));
    }
    Ok(buf.get_u8())
}

fn safe_get_i32_le(buf: &mut &[u8]) -> io::Result<i32> {
    if buf.len() < 4 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "need 4 bytes"));
    }
    Ok(buf.get_i32_le())
}

fn safe_get_i64_le(buf: &mut &[u8]) -> io::Result<i64> {
    if buf.len() < 8 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "need 8 bytes"));
    }
    Ok(buf.get_i64_le())
}

fn safe_get_member_id(buf: &mut &[u8]) -> io::Result<MemberId> {
    Ok(MemberId(safe_get_i32_le(buf)?))
}

/// Messages exchanged between members while electing a leader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElectionMessage {
    /// A canvassing member advertising where its log ends.
    CanvassPosition {
        log_position: i64,
        leadership_term_id: i64,
        member_id: MemberId,
    },

    /// A candidate asking for a vote in a new term.
    RequestVote {
        log_position: i64,
        candidate_term_id: i64,
        candidate_id: MemberId,
    },

    /// A member's answer to a vote request.
    Vote {
        candidate_term_id: i64,
        candidate_id: MemberId,
        voter_id: MemberId,
        vote: bool,
    },

    /// The new leader announcing its term and log stream session.
    NewLeadershipTerm {
        log_position: i64,
        leadership_term_id: i64,
        leader_id: MemberId,
        log_session_id: i32,
    },

    /// A follower confirming how far its log has been appended.
    AppendedPosition {
        log_position: i64,
        leadership_term_id: i64,
        member_id: MemberId,
    },

    /// A catching-up follower asking the leader for its recovery plan.
    RecoveryPlanQuery {
        correlation_id: i64,
        leader_id: MemberId,
        requester_id: MemberId,
    },

    /// The leader's recovery plan, answered by its host agent.
    RecoveryPlan {
        correlation_id: i64,
        leader_id: MemberId,
        requester_id: MemberId,
        last_leadership_term_id: i64,
        last_term_base_position: i64,
        last_appended_position: i64,
    },

    /// A catching-up follower asking for the leader's recording log.
    RecordingLogQuery {
        correlation_id: i64,
        leader_id: MemberId,
        requester_id: MemberId,
        from_leadership_term_id: i64,
        count: i32,
    },

    /// The recordings backing the leader's log, answered by its host.
    RecordingLog {
        correlation_id: i64,
        leader_id: MemberId,
        requester_id: MemberId,
        entries: Vec<RecordingLogEntry>,
    },
}

/// One recording in a leader's recording log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingLogEntry {
    /// Archive recording that holds the term's log.
    pub recording_id: i64,
    /// Term the recording belongs to.
    pub leadership_term_id: i64,
    /// Log position at which the term starts.
    pub term_base_position: i64,
}

// Wire format constants
const MSG_CANVASS_POSITION: u8 = 1;
const MSG_REQUEST_VOTE: u8 = 2;
const MSG_VOTE: u8 = 3;
const MSG_NEW_LEADERSHIP_TERM: u8 = 4;
const MSG_APPENDED_POSITION: u8 = 5;
const MSG_RECOVERY_PLAN_QUERY: u8 = 6;
const MSG_RECOVERY_PLAN: u8 = 7;
const MSG_RECORDING_LOG_QUERY: u8 = 8;
const MSG_RECORDING_LOG: u8 = 9;

impl ElectionMessage {
    /// Serializes the message to bytes.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Serializes the message into the given buffer.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            ElectionMessage::CanvassPosition {
                log_position,
                leadership_term_id,
                member_id,
            } => {
                buf.put_u8(MSG_CANVASS_POSITION);
                buf.put_i64_le(*log_position);
                buf.put_i64_le(*leadership_term_id);
                buf.put_i32_le(member_id.0);
            }
            ElectionMessage::RequestVote {
                log_position,
                candidate_term_id,
                candidate_id,
            } => {
                buf.put_u8(MSG_REQUEST_VOTE);
                buf.put_i64_le(*log_position);
                buf.put_i64_le(*candidate_term_id);
                buf.put_i32_le(candidate_id.0);
            }
            ElectionMessage::Vote {
                candidate_term_id,
                candidate_id,
                voter_id,
                vote,
            } => {
                buf.put_u8(MSG_VOTE);
                buf.put_i64_le(*candidate_term_id);
                buf.put_i32_le(candidate_id.0);
                buf.put_i32_le(voter_id.0);
                buf.put_u8(u8::from(*vote));
            }
            ElectionMessage::NewLeadershipTerm {
                log_position,
                leadership_term_id,
                leader_id,
                log_session_id,
            } => {
                buf.put_u8(MSG_NEW_LEADERSHIP_TERM);
                buf.put_i64_le(*log_position);
                buf.put_i64_le(*leadership_term_id);
                buf.put_i32_le(leader_id.0);
                buf.put_i32_le(*log_session_id);
            }
            ElectionMessage::AppendedPosition {
                log_position,
                leadership_term_id,
                member_id,
            } => {
                buf.put_u8(MSG_APPENDED_POSITION);
                buf.put_i64_le(*log_position);
                buf.put_i64_le(*leadership_term_id);
                buf.put_i32_le(member_id.0);
            }
            ElectionMessage::RecoveryPlanQuery {
                correlation_id,
                leader_id,
                requester_id,
            } => {
                buf.put_u8(MSG_RECOVERY_PLAN_QUERY);
                buf.put_i64_le(*correlation_id);
                buf.put_i32_le(leader_id.0);
                buf.put_i32_le(requester_id.0);
            }
            ElectionMessage::RecoveryPlan {
                correlation_id,
                leader_id,
                requester_id,
                last_leadership_term_id,
                last_term_base_position,
                last_appended_position,
            } => {
                buf.put_u8(MSG_RECOVERY_PLAN);
                buf.put_i64_le(*correlation_id);
                buf.put_i32_le(leader_id.0);
                buf.put_i32_le(requester_id.0);
                buf.put_i64_le(*last_leadership_term_id);
                buf.put_i64_le(*last_term_base_position);
                buf.put_i64_le(*last_appended_position);
            }
            ElectionMessage::RecordingLogQuery {
                correlation_id,
                leader_id,
                requester_id,
                from_leadership_term_id,
                count,
            } => {
                buf.put_u8(MSG_RECORDING_LOG_QUERY);
                buf.put_i64_le(*correlation_id);
                buf.put_i32_le(leader_id.0);
                buf.put_i32_le(requester_id.0);
                buf.put_i64_le(*from_leadership_term_id);
                buf.put_i32_le(*count);
            }
            ElectionMessage::RecordingLog {
                correlation_id,
                leader_id,
                requester_id,
                entries,
            } => {
                buf.put_u8(MSG_RECORDING_LOG);
                buf.put_i64_le(*correlation_id);
                buf.put_i32_le(leader_id.0);
                buf.put_i32_le(requester_id.0);
                buf.put_i32_le(entries.len() as i32);
                for entry in entries {
                    buf.put_i64_le(entry.recording_id);
                    buf.put_i64_le(entry.leadership_term_id);
                    buf.put_i64_le(entry.term_base_position);
                }
            }
        }
    }

    /// Deserializes a message from bytes.
    pub fn decode(mut buf: &[u8]) -> io::Result<Self> {
        let buf = &mut buf;
        let message = match safe_get_u8(buf)? {
            MSG_CANVASS_POSITION => ElectionMessage::CanvassPosition {
                log_position: safe_get_i64_le(buf)?,
                leadership_term_id: safe_get_i64_le(buf)?,
                member_id: safe_get_member_id(buf)?,
            },
            MSG_REQUEST_VOTE => ElectionMessage::RequestVote {
                log_position: safe_get_i64_le(buf)?,
                candidate_term_id: safe_get_i64_le(buf)?,
                candidate_id: safe_get_member_id(buf)?,
            },
            MSG_VOTE => ElectionMessage::Vote {
                candidate_term_id: safe_get_i64_le(buf)?,
                candidate_id: safe_get_member_id(buf)?,
                voter_id: safe_get_member_id(buf)?,
                vote: safe_get_u8(buf)? != 0,
            },
            MSG_NEW_LEADERSHIP_TERM => ElectionMessage::NewLeadershipTerm {
                log_position: safe_get_i64_le(buf)?,
                leadership_term_id: safe_get_i64_le(buf)?,
                leader_id: safe_get_member_id(buf)?,
                log_session_id: safe_get_i32_le(buf)?,
            },
            MSG_APPENDED_POSITION => ElectionMessage::AppendedPosition {
                log_position: safe_get_i64_le(buf)?,
                leadership_term_id: safe_get_i64_le(buf)?,
                member_id: safe_get_member_id(buf)?,
            },
            MSG_RECOVERY_PLAN_QUERY => ElectionMessage::RecoveryPlanQuery {
                correlation_id: safe_get_i64_le(buf)?,
                leader_id: safe_get_member_id(buf)?,
                requester_id: safe_get_member_id(buf)?,
            },
            MSG_RECOVERY_PLAN => ElectionMessage::RecoveryPlan {
                correlation_id: safe_get_i64_le(buf)?,
                leader_id: safe_get_member_id(buf)?,
                requester_id: safe_get_member_id(buf)?,
                last_leadership_term_id: safe_get_i64_le(buf)?,
                last_term_base_position: safe_get_i64_le(buf)?,
                last_appended_position: safe_get_i64_le(buf)?,
            },
            MSG_RECORDING_LOG_QUERY => ElectionMessage::RecordingLogQuery {
                correlation_id: safe_get_i64_le(buf)?,
                leader_id: safe_get_member_id(buf)?,
                requester_id: safe_get_member_id(buf)?,
                from_leadership_term_id: safe_get_i64_le(buf)?,
                count: safe_get_i32_le(buf)?,
            },
            MSG_RECORDING_LOG => {
                let correlation_id = safe_get_i64_le(buf)?;
                let leader_id = safe_get_member_id(buf)?;
                let requester_id = safe_get_member_id(buf)?;
                let count = safe_get_i32_le(buf)?;
                if count < 0 || count as usize > MAX_RECORDING_LOG_ENTRIES {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("recording log entry count out of range: {count}"),
                    ));
                }
                let mut entries = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    entries.push(RecordingLogEntry {
                        recording_id: safe_get_i64_le(buf)?,
                        leadership_term_id: safe_get_i64_le(buf)?,
                        term_base_position: safe_get_i64_le(buf)?,
                    });
                }
                ElectionMessage::RecordingLog {
                    correlation_id,
                    leader_id,
                    requester_id,
                    entries,
                }
            }
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unknown message type: {other}"),
                ));
            }
        };

        Ok(message)
    }
}
