use crate::domain::lead::Lead;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::str::FromStr;

/// Fields available for sorting leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Position,
    Name,
    Created,
    Updated,
    FollowUp,
}

/// Sort order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "position" => Ok(SortField::Position),
            "name" => Ok(SortField::Name),
            "created" => Ok(SortField::Created),
            "updated" => Ok(SortField::Updated),
            "follow-up" => Ok(SortField::FollowUp),
            _ => Err(format!(
                "Invalid sort field '{}'. Valid fields: position, name, created, updated, \
                 follow-up",
                s
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(format!(
                "Invalid sort order '{}'. Valid orders: asc, desc",
                s
            )),
        }
    }
}

/// Sorts leads in-place by the given field and direction.
///
/// The sort is stable, so leads that compare equal keep their input order.
///
/// # Examples
/// ```
/// use leadboard_core::domain::sorting::{sort_leads, SortField, SortOrder};
/// use leadboard_core::domain::{Lead, StatusId};
///
/// let mut leads = vec![
///     Lead::new("Zed".to_string(), StatusId::new("new")),
///     Lead::new("amy".to_string(), StatusId::new("new")),
/// ];
///
/// sort_leads(&mut leads, SortField::Name, SortOrder::Ascending);
/// assert_eq!(leads[0].name, "amy");
/// ```
pub fn sort_leads(leads: &mut [Lead], field: SortField, order: SortOrder) {
    leads.sort_by(|a, b| {
        let cmp = match field {
            SortField::Position => compare_position(a, b),
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::Created => a.created_at.cmp(&b.created_at),
            SortField::Updated => a.updated_at.cmp(&b.updated_at),
            SortField::FollowUp => compare_option_dates(a.follow_up_at, b.follow_up_at),
        };

        match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });
}

/// Board order within a column: position, then creation time, then id
pub(crate) fn compare_position(a: &Lead, b: &Lead) -> Ordering {
    a.position
        .cmp(&b.position)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Compare Option<DateTime> with None always sorting to end
pub(crate) fn compare_option_dates(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
) -> Ordering {
    match (a, b) {
        (Some(a_date), Some(b_date)) => a_date.cmp(&b_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LeadId, StatusId};
    use chrono::Duration;

    fn lead(id: &str, name: &str, position: i64) -> Lead {
        let mut lead = Lead::with_id(LeadId::new(id), name.to_string(), StatusId::new("new"));
        lead.position = position;
        lead
    }

    #[test]
    fn test_sort_by_position() {
        let mut leads = vec![lead("c", "C", 2), lead("a", "A", 0), lead("b", "B", 1)];

        sort_leads(&mut leads, SortField::Position, SortOrder::Ascending);

        let ids: Vec<&str> = leads.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_position_ties_break_on_created_then_id() {
        let now = Utc::now();
        let mut first = lead("z", "Z", 0);
        first.created_at = now - Duration::hours(1);
        let mut second = lead("b", "B", 0);
        second.created_at = now;
        let mut third = lead("a", "A", 0);
        third.created_at = now;

        let mut leads = vec![second, third, first];
        sort_leads(&mut leads, SortField::Position, SortOrder::Ascending);

        let ids: Vec<&str> = leads.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "b"]);
    }

    #[test]
    fn test_sort_by_name_case_insensitive_descending() {
        let mut leads = vec![lead("1", "alpha", 0), lead("2", "Charlie", 0), lead("3", "BRAVO", 0)];

        sort_leads(&mut leads, SortField::Name, SortOrder::Descending);

        assert_eq!(leads[0].name, "Charlie");
        assert_eq!(leads[1].name, "BRAVO");
        assert_eq!(leads[2].name, "alpha");
    }

    #[test]
    fn test_sort_by_follow_up_puts_missing_last() {
        let now = Utc::now();
        let mut early = lead("early", "Early", 0);
        early.follow_up_at = Some(now);
        let mut late = lead("late", "Late", 0);
        late.follow_up_at = Some(now + Duration::days(2));
        let none = lead("none", "None", 0);

        let mut leads = vec![none, late, early];
        sort_leads(&mut leads, SortField::FollowUp, SortOrder::Ascending);

        let ids: Vec<&str> = leads.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late", "none"]);
    }

    #[test]
    fn test_parse_sort_field_and_order() {
        assert_eq!(SortField::from_str("Follow-Up"), Ok(SortField::FollowUp));
        assert_eq!(SortOrder::from_str("DESC"), Ok(SortOrder::Descending));
        assert!(SortField::from_str("priority").is_err());
        assert!(SortOrder::from_str("up").is_err());
    }
}
