use crate::domain::{
    lead::Lead,
    sorting::{compare_option_dates, compare_position},
    status::{Status, StatusId},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Urgency of a lead's follow-up relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FollowUpState {
    NotDue,
    /// Due before the end of the current local day but not yet past
    DueToday,
    Overdue { days: u32 },
}

impl FollowUpState {
    pub fn is_due(&self) -> bool {
        !matches!(self, Self::NotDue)
    }

    /// Whole days past the follow-up time; 0 unless overdue
    pub fn overdue_days(&self) -> u32 {
        match self {
            Self::Overdue { days } => *days,
            _ => 0,
        }
    }
}

/// Classifies a follow-up timestamp against `now`.
///
/// Day boundaries are taken in the timezone of `now`. Terminal leads are
/// never due.
pub fn classify_follow_up<Tz: TimeZone>(
    follow_up_at: Option<DateTime<Utc>>,
    terminal: bool,
    now: &DateTime<Tz>,
) -> FollowUpState {
    let Some(follow_up_at) = follow_up_at else {
        return FollowUpState::NotDue;
    };
    if terminal || follow_up_at >= start_of_next_day(now) {
        return FollowUpState::NotDue;
    }

    let now = now.with_timezone(&Utc);
    if follow_up_at < now {
        let days = (now - follow_up_at).num_days().max(1);
        FollowUpState::Overdue {
            days: u32::try_from(days).unwrap_or(u32::MAX),
        }
    } else {
        FollowUpState::DueToday
    }
}

/// Midnight at the start of the local day after `now`, in UTC
fn start_of_next_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    now.date_naive()
        .succ_opt()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc) + Duration::days(1))
}

/// A lead whose follow-up is due, with its classification
#[derive(Debug, Clone, Copy)]
pub struct DueLead<'a> {
    pub lead: &'a Lead,
    pub state: FollowUpState,
}

/// Follow-up classification with a configurable set of terminal statuses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpClassifier {
    terminal_statuses: Vec<String>,
}

impl Default for FollowUpClassifier {
    fn default() -> Self {
        Self::new(["booked", "lost"])
    }
}

impl FollowUpClassifier {
    pub fn new<I, S>(terminal_statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terminal_statuses: terminal_statuses.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether follow-up tracking stops for `status`. Matches status id
    /// or label, ignoring case.
    pub fn is_terminal(&self, status: &Status) -> bool {
        self.terminal_statuses.iter().any(|name| status.matches(name))
    }

    /// Classifies one lead given its current status
    pub fn classify<Tz: TimeZone>(
        &self,
        follow_up_at: Option<DateTime<Utc>>,
        status: Option<&Status>,
        now: &DateTime<Tz>,
    ) -> FollowUpState {
        let terminal = status.is_some_and(|status| self.is_terminal(status));
        classify_follow_up(follow_up_at, terminal, now)
    }

    /// Leads that are due or overdue, most overdue first
    pub fn due_queue<'a, Tz: TimeZone>(
        &self,
        leads: &'a [Lead],
        statuses: &[Status],
        now: &DateTime<Tz>,
    ) -> Vec<DueLead<'a>> {
        let by_id: HashMap<&StatusId, &Status> =
            statuses.iter().map(|status| (&status.id, status)).collect();

        let mut due: Vec<DueLead<'a>> = leads
            .iter()
            .filter_map(|lead| {
                let status = lead.status_id.as_ref().and_then(|id| by_id.get(id).copied());
                let state = self.classify(lead.follow_up_at, status, now);
                state.is_due().then_some(DueLead { lead, state })
            })
            .collect();

        due.sort_by(|a, b| {
            compare_option_dates(a.lead.follow_up_at, b.lead.follow_up_at)
                .then_with(|| compare_position(a.lead, b.lead))
        });
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LeadId;
    use chrono::FixedOffset;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, minute, 0).unwrap()
    }

    fn new_status() -> Status {
        Status::new("new", "New", 0)
    }

    fn booked_status() -> Status {
        Status::new("booked", "Booked", 3)
    }

    #[test]
    fn test_missing_follow_up_is_not_due() {
        let classifier = FollowUpClassifier::default();
        let state = classifier.classify(None, Some(&new_status()), &at(12, 0));
        assert_eq!(state, FollowUpState::NotDue);
    }

    #[test]
    fn test_twenty_five_hours_ago_is_one_day_overdue() {
        let classifier = FollowUpClassifier::default();
        let now = at(12, 0);

        let state = classifier.classify(Some(now - Duration::hours(25)), Some(&new_status()), &now);

        assert_eq!(state, FollowUpState::Overdue { days: 1 });
        assert_eq!(state.overdue_days(), 1);
    }

    #[test]
    fn test_overdue_days_floor() {
        let now = at(12, 0);
        let state = classify_follow_up(Some(now - Duration::hours(71)), false, &now);
        assert_eq!(state, FollowUpState::Overdue { days: 2 });
    }

    #[test]
    fn test_just_past_is_at_least_one_day_overdue() {
        let now = at(12, 0);
        let state = classify_follow_up(Some(now - Duration::hours(1)), false, &now);
        assert_eq!(state, FollowUpState::Overdue { days: 1 });
    }

    #[test]
    fn test_later_today_is_due_today() {
        let now = at(12, 0);

        let state = classify_follow_up(Some(now + Duration::hours(1)), false, &now);
        assert_eq!(state, FollowUpState::DueToday);
        assert!(state.is_due());
        assert_eq!(state.overdue_days(), 0);

        let state = classify_follow_up(Some(now), false, &now);
        assert_eq!(state, FollowUpState::DueToday);
    }

    #[test]
    fn test_hour_ahead_across_midnight_is_not_due() {
        let classifier = FollowUpClassifier::default();
        let now = at(23, 30);

        let state = classifier.classify(Some(now + Duration::hours(1)), Some(&new_status()), &now);

        assert_eq!(state, FollowUpState::NotDue);
    }

    #[test]
    fn test_terminal_status_overrides_past_follow_up() {
        let classifier = FollowUpClassifier::default();
        let now = at(12, 0);

        let state =
            classifier.classify(Some(now - Duration::hours(1)), Some(&booked_status()), &now);

        assert_eq!(state, FollowUpState::NotDue);
        assert!(classifier.is_terminal(&Status::new("l-1", "LOST", 4)));
        assert!(!classifier.is_terminal(&new_status()));
    }

    #[test]
    fn test_day_boundary_follows_timezone_of_now() {
        let follow_up = Utc.with_ymd_and_hms(2024, 3, 11, 10, 0, 0).unwrap();
        let now_utc = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();

        assert_eq!(
            classify_follow_up(Some(follow_up), false, &now_utc),
            FollowUpState::NotDue
        );

        let brisbane = FixedOffset::east_opt(10 * 3600).unwrap();
        let now_local = now_utc.with_timezone(&brisbane);
        assert_eq!(
            classify_follow_up(Some(follow_up), false, &now_local),
            FollowUpState::DueToday
        );
    }

    #[test]
    fn test_due_queue_sorted_most_overdue_first() {
        let classifier = FollowUpClassifier::default();
        let now = at(12, 0);
        let statuses = vec![new_status(), booked_status()];

        let mut recent = Lead::with_id(LeadId::new("recent"), "Recent".into(), new_status().id);
        recent.follow_up_at = Some(now - Duration::hours(2));
        let mut oldest = Lead::with_id(LeadId::new("oldest"), "Oldest".into(), new_status().id);
        oldest.follow_up_at = Some(now - Duration::days(4));
        let mut today = Lead::with_id(LeadId::new("today"), "Today".into(), new_status().id);
        today.follow_up_at = Some(now + Duration::hours(3));
        let mut booked = Lead::with_id(LeadId::new("booked"), "Booked".into(), booked_status().id);
        booked.follow_up_at = Some(now - Duration::days(9));
        let mut later = Lead::with_id(LeadId::new("later"), "Later".into(), new_status().id);
        later.follow_up_at = Some(now + Duration::days(2));
        let idle = Lead::with_id(LeadId::new("idle"), "Idle".into(), new_status().id);

        let leads = vec![recent, oldest, today, booked, later, idle];
        let queue = classifier.due_queue(&leads, &statuses, &now);

        let ids: Vec<&str> = queue.iter().map(|d| d.lead.id.as_str()).collect();
        assert_eq!(ids, vec!["oldest", "recent", "today"]);
        assert_eq!(queue[0].state, FollowUpState::Overdue { days: 4 });
        assert_eq!(queue[2].state, FollowUpState::DueToday);
    }
}
