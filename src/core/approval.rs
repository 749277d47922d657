use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::config::APPROVAL_THRESHOLD;
use crate::utils::review_event::{ReviewEvent, ReviewState};

static LGTM_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bAPI\s+LGTM\b").expect("valid LGTM regex"));
static DECLINED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bAPI\s+DECLINED\b").expect("valid DECLINED regex"));
static CHANGES_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bAPI\s+CHANGES\s+REQUESTED\b").expect("valid CHANGES REQUESTED regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Approve,
    Decline,
    RequestChanges,
}

/// Outcome of an API review once the tally is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Requested,
    Approved,
    Declined,
}

/// Decline wins over changes-requested, which wins over approval, when one
/// body carries several markers.
pub fn classify(event: &ReviewEvent) -> Option<Vote> {
    if event.state() == Some(ReviewState::Dismissed) {
        return None;
    }
    let body = event.body();
    if DECLINED_MARKER.is_match(body) {
        return Some(Vote::Decline);
    }
    if event.state() == Some(ReviewState::ChangesRequested) || CHANGES_MARKER.is_match(body) {
        return Some(Vote::RequestChanges);
    }
    if LGTM_MARKER.is_match(body) {
        return Some(Vote::Approve);
    }
    None
}

pub fn has_review_marker(body: &str) -> bool {
    LGTM_MARKER.is_match(body) || DECLINED_MARKER.is_match(body) || CHANGES_MARKER.is_match(body)
}

/// Per-reviewer final votes. Each reviewer appears in at most one list, with
/// the event that decided their vote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApprovalTally {
    approved: Vec<ReviewEvent>,
    declined: Vec<ReviewEvent>,
    requested_changes: Vec<ReviewEvent>,
}

impl ApprovalTally {
    pub fn approved(&self) -> &Vec<ReviewEvent> {
        &self.approved
    }

    pub fn declined(&self) -> &Vec<ReviewEvent> {
        &self.declined
    }

    pub fn requested_changes(&self) -> &Vec<ReviewEvent> {
        &self.requested_changes
    }

    pub fn approved_logins(&self) -> Vec<&str> {
        self.approved.iter().map(|e| e.author().as_str()).collect()
    }

    pub fn declined_logins(&self) -> Vec<&str> {
        self.declined.iter().map(|e| e.author().as_str()).collect()
    }

    pub fn requested_changes_logins(&self) -> Vec<&str> {
        self.requested_changes.iter().map(|e| e.author().as_str()).collect()
    }

    pub fn decision(&self) -> ReviewDecision {
        if !self.declined.is_empty() {
            return ReviewDecision::Declined;
        }
        if self.approved.len() >= APPROVAL_THRESHOLD && self.requested_changes.is_empty() {
            return ReviewDecision::Approved;
        }
        ReviewDecision::Requested
    }
}

fn in_roster(roster: &[String], login: &str) -> bool {
    roster.iter().any(|member| member.eq_ignore_ascii_case(login))
}

/// Folds reviews and comments from roster members into a tally. Only each
/// reviewer's most recent qualifying event counts; on equal timestamps the
/// later input wins.
pub fn aggregate(roster: &[String], reviews: &[ReviewEvent], comments: &[ReviewEvent]) -> ApprovalTally {
    let mut latest: BTreeMap<String, (&ReviewEvent, Vote)> = BTreeMap::new();
    for event in reviews.iter().chain(comments.iter()) {
        if !in_roster(roster, event.author()) {
            continue;
        }
        let Some(vote) = classify(event) else {
            continue;
        };
        let key = event.author().to_ascii_lowercase();
        if let Some((previous, _)) = latest.get(&key) {
            if previous.submitted_at() > event.submitted_at() {
                continue;
            }
        }
        latest.insert(key, (event, vote));
    }

    let mut tally = ApprovalTally::default();
    for (event, vote) in latest.into_values() {
        match vote {
            Vote::Approve => tally.approved.push(event.clone()),
            Vote::Decline => tally.declined.push(event.clone()),
            Vote::RequestChanges => tally.requested_changes.push(event.clone()),
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashSet;

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn comment(author: &str, body: &str, hours: i64) -> ReviewEvent {
        ReviewEvent::new(author, body, None, at(hours))
    }

    fn review(author: &str, body: &str, state: ReviewState, hours: i64) -> ReviewEvent {
        ReviewEvent::new(author, body, Some(state), at(hours))
    }

    fn roster(members: &[&str]) -> Vec<String> {
        members.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_classify_markers() {
        assert_eq!(classify(&comment("a", "API LGTM", 0)), Some(Vote::Approve));
        assert_eq!(classify(&comment("a", "looks fine, api lgtm!", 0)), Some(Vote::Approve));
        assert_eq!(classify(&comment("a", "API DECLINED", 0)), Some(Vote::Decline));
        assert_eq!(classify(&comment("a", "API CHANGES REQUESTED", 0)), Some(Vote::RequestChanges));
        assert_eq!(
            classify(&review("a", "needs work", ReviewState::ChangesRequested, 0)),
            Some(Vote::RequestChanges)
        );
        assert_eq!(classify(&comment("a", "LGTM", 0)), None);
        assert_eq!(classify(&review("a", "", ReviewState::Approved, 0)), None);
        assert_eq!(classify(&review("a", "API LGTM", ReviewState::Dismissed, 0)), None);
        assert_eq!(classify(&comment("a", "API LGTM but API DECLINED", 0)), Some(Vote::Decline));
    }

    #[test]
    fn test_only_roster_members_count() {
        let tally = aggregate(
            &roster(&["alice"]),
            &[],
            &[comment("alice", "API LGTM", 0), comment("mallory", "API LGTM", 1)],
        );
        assert_eq!(tally.approved_logins(), vec!["alice"]);
        assert_eq!(tally.decision(), ReviewDecision::Requested);
    }

    #[test]
    fn test_most_recent_vote_wins() {
        let tally = aggregate(
            &roster(&["alice"]),
            &[review("alice", "", ReviewState::ChangesRequested, 2)],
            &[comment("alice", "API LGTM", 1)],
        );
        assert!(tally.approved().is_empty());
        assert_eq!(tally.requested_changes_logins(), vec!["alice"]);

        let tally = aggregate(
            &roster(&["alice"]),
            &[review("alice", "", ReviewState::ChangesRequested, 1)],
            &[comment("alice", "API LGTM", 2)],
        );
        assert_eq!(tally.approved_logins(), vec!["alice"]);
        assert!(tally.requested_changes().is_empty());
    }

    #[test]
    fn test_unmarked_events_do_not_override_votes() {
        let tally = aggregate(
            &roster(&["alice"]),
            &[],
            &[comment("alice", "API LGTM", 1), comment("alice", "thanks for the update", 2)],
        );
        assert_eq!(tally.approved_logins(), vec!["alice"]);
    }

    #[test]
    fn test_equal_timestamps_prefer_later_input() {
        let tally = aggregate(
            &roster(&["alice"]),
            &[review("alice", "API LGTM", ReviewState::Approved, 1)],
            &[comment("alice", "API DECLINED", 1)],
        );
        assert_eq!(tally.declined_logins(), vec!["alice"]);
        assert!(tally.approved().is_empty());
    }

    #[test]
    fn test_roster_match_ignores_case() {
        let tally = aggregate(&roster(&["Alice"]), &[], &[comment("alice", "API LGTM", 0)]);
        assert_eq!(tally.approved().len(), 1);
    }

    #[test]
    fn test_decision_table() {
        let members = roster(&["a", "b", "c"]);
        let approved = aggregate(&members, &[], &[comment("a", "API LGTM", 0), comment("b", "API LGTM", 1)]);
        assert_eq!(approved.decision(), ReviewDecision::Approved);

        let blocked = aggregate(
            &members,
            &[],
            &[
                comment("a", "API LGTM", 0),
                comment("b", "API LGTM", 1),
                comment("c", "API CHANGES REQUESTED", 2),
            ],
        );
        assert_eq!(blocked.decision(), ReviewDecision::Requested);

        let declined = aggregate(
            &members,
            &[],
            &[comment("a", "API LGTM", 0), comment("b", "API LGTM", 1), comment("c", "API DECLINED", 2)],
        );
        assert_eq!(declined.decision(), ReviewDecision::Declined);

        let single = aggregate(&members, &[], &[comment("a", "API LGTM", 0)]);
        assert_eq!(single.decision(), ReviewDecision::Requested);

        let same_reviewer_twice = aggregate(&members, &[], &[comment("a", "API LGTM", 0), comment("a", "API LGTM", 1)]);
        assert_eq!(same_reviewer_twice.decision(), ReviewDecision::Requested);
    }

    #[test]
    fn test_tally_sets_are_disjoint() {
        let members = roster(&["a", "b", "c", "d"]);
        let bodies = ["API LGTM", "API DECLINED", "API CHANGES REQUESTED", "nit", "api lgtm"];
        let authors = ["a", "b", "c", "d", "e"];
        // Deterministic pseudo-random sequences.
        let mut seed: u64 = 0x5eed;
        for _ in 0..200 {
            let mut comments = Vec::new();
            let mut reviews = Vec::new();
            for i in 0..12 {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let author = authors[(seed >> 33) as usize % authors.len()];
                let body = bodies[(seed >> 17) as usize % bodies.len()];
                let hours = ((seed >> 7) % 6) as i64;
                if i % 3 == 0 {
                    reviews.push(review(author, body, ReviewState::Commented, hours));
                } else {
                    comments.push(comment(author, body, hours));
                }
            }
            let tally = aggregate(&members, &reviews, &comments);
            let approved: HashSet<&str> = tally.approved_logins().into_iter().collect();
            let declined: HashSet<&str> = tally.declined_logins().into_iter().collect();
            let changes: HashSet<&str> = tally.requested_changes_logins().into_iter().collect();
            assert!(approved.is_disjoint(&declined));
            assert!(approved.is_disjoint(&changes));
            assert!(declined.is_disjoint(&changes));
            assert!(!approved.contains("e") && !declined.contains("e") && !changes.contains("e"));
        }
    }
}
