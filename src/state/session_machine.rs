//! Pure session lifecycle logic.
//!
//! There is no central timer process: every observer recomputes the status
//! from the full persisted row and its own clock, and all observers agree
//! because [`derive_status`] is deterministic in its inputs. Duplicate or
//! out-of-order bus notifications are harmless for the same reason.

use time::OffsetDateTime;

use crate::dao::models::{ChatSessionEntity, SessionStatus, Vote};

/// Recompute the lifecycle status from the current row state.
///
/// Rules, in priority order:
/// - terminal statuses are sticky;
/// - any `no` vote ends the session, both `yes` votes reveal it, regardless of
///   write order or of the phase the votes were cast in;
/// - an `active` session whose window has elapsed moves to `voting`;
/// - otherwise the stored status stands.
pub fn derive_status(
    current: SessionStatus,
    vote_a: Vote,
    vote_b: Vote,
    expires_at: OffsetDateTime,
    now: OffsetDateTime,
) -> SessionStatus {
    if current.is_terminal() {
        return current;
    }

    if let Some(outcome) = evaluate_votes(vote_a, vote_b) {
        return outcome;
    }

    if current == SessionStatus::Active && now >= expires_at {
        return SessionStatus::Voting;
    }

    current
}

/// Convenience wrapper deriving the status straight from a session row.
pub fn derive_session_status(session: &ChatSessionEntity, now: OffsetDateTime) -> SessionStatus {
    derive_status(
        session.status,
        session.vote_a,
        session.vote_b,
        session.expires_at,
        now,
    )
}

/// Terminal outcome implied by the two vote columns, if any.
fn evaluate_votes(vote_a: Vote, vote_b: Vote) -> Option<SessionStatus> {
    if vote_a == Vote::No || vote_b == Vote::No {
        Some(SessionStatus::Ended)
    } else if vote_a == Vote::Yes && vote_b == Vote::Yes {
        Some(SessionStatus::Revealed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;

    fn instants() -> (OffsetDateTime, OffsetDateTime) {
        let now = OffsetDateTime::now_utc();
        (now, now + Duration::minutes(3))
    }

    #[test]
    fn active_stays_active_before_expiry() {
        let (now, expires) = instants();
        let status = derive_status(SessionStatus::Active, Vote::None, Vote::None, expires, now);
        assert_eq!(status, SessionStatus::Active);
    }

    #[test]
    fn elapsed_window_flips_active_to_voting() {
        let (now, _) = instants();
        let expired = now - Duration::seconds(1);
        let status = derive_status(SessionStatus::Active, Vote::None, Vote::None, expired, now);
        assert_eq!(status, SessionStatus::Voting);

        // Re-deriving from the flipped row is idempotent.
        let again = derive_status(status, Vote::None, Vote::None, expired, now);
        assert_eq!(again, SessionStatus::Voting);
    }

    #[test]
    fn mutual_yes_always_and_only_reveals() {
        let (now, expires) = instants();
        for current in [SessionStatus::Active, SessionStatus::Voting] {
            let status = derive_status(current, Vote::Yes, Vote::Yes, expires, now);
            assert_eq!(status, SessionStatus::Revealed);
        }

        // A single yes is not enough.
        let status = derive_status(SessionStatus::Voting, Vote::Yes, Vote::None, expires, now);
        assert_eq!(status, SessionStatus::Voting);
    }

    #[test]
    fn any_no_ends_regardless_of_the_other_vote() {
        let (now, expires) = instants();
        for other in [Vote::None, Vote::Yes, Vote::No] {
            let a_no = derive_status(SessionStatus::Voting, Vote::No, other, expires, now);
            let b_no = derive_status(SessionStatus::Voting, other, Vote::No, expires, now);
            assert_eq!(a_no, SessionStatus::Ended);
            assert_eq!(b_no, SessionStatus::Ended);
        }
    }

    #[test]
    fn no_while_active_skips_straight_to_ended() {
        let (now, expires) = instants();
        let status = derive_status(SessionStatus::Active, Vote::No, Vote::None, expires, now);
        assert_eq!(status, SessionStatus::Ended);
    }

    #[test]
    fn terminal_statuses_are_sticky() {
        let (now, _) = instants();
        let expired = now - Duration::minutes(10);

        // Even contradictory vote columns cannot move a terminal row.
        let revealed = derive_status(SessionStatus::Revealed, Vote::No, Vote::No, expired, now);
        assert_eq!(revealed, SessionStatus::Revealed);

        let ended = derive_status(SessionStatus::Ended, Vote::Yes, Vote::Yes, expired, now);
        assert_eq!(ended, SessionStatus::Ended);
    }

    #[test]
    fn voting_never_falls_back_to_active() {
        let (now, expires) = instants();
        // A voting row with a window still in the future (clock skew between
        // observers) must not revert.
        let status = derive_status(SessionStatus::Voting, Vote::None, Vote::None, expires, now);
        assert_eq!(status, SessionStatus::Voting);
    }

    #[test]
    fn repeated_votes_do_not_change_the_outcome() {
        let (now, expires) = instants();
        let first = derive_status(SessionStatus::Voting, Vote::No, Vote::None, expires, now);
        let second = derive_status(first, Vote::No, Vote::None, expires, now);
        assert_eq!(first, second);
    }
}
