use std::{fmt::Display, str::FromStr};

use enum_iterator::all;
use serde::{Deserialize, Serialize};

/// Статус мэтча.
/// Переходы между статусами здесь не реализуются, статус приходит извне.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    std::hash::Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    enum_iterator::Sequence,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[display(fmt = "new")]
    New,
    #[display(fmt = "pending")]
    Pending,
    #[display(fmt = "accepted")]
    Accepted,
    #[display(fmt = "rejected")]
    Rejected,
}

impl FromStr for MatchStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all::<MatchStatus>()
            .find(|st| st.to_string() == s)
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown match status \"{0}\"")]
pub struct UnknownStatus(pub String);

/// Двусторонний обмен или цепочка из нескольких участников.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    #[default]
    #[display(fmt = "bilateral")]
    Bilateral,
    #[display(fmt = "multilateral")]
    Multilateral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,

    /// `None` пока участник не ответил.
    #[serde(default)]
    pub has_accepted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub status: MatchStatus,

    #[serde(default, rename = "type")]
    pub kind: MatchKind,

    #[serde(default)]
    pub match_score: u8,

    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl MatchRecord {
    pub fn new(id: &str, status: MatchStatus) -> Self {
        Self {
            id: id.to_owned(),
            status,
            kind: MatchKind::default(),
            match_score: 0,
            participants: Vec::new(),
        }
    }
}

/// Активная вкладка в списке мэтчей.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, std::hash::Hash)]
pub enum MatchFilter {
    #[default]
    All,
    Status(MatchStatus),
}

impl MatchFilter {
    pub fn accepts(&self, record: &MatchRecord) -> bool {
        match self {
            Self::All => true,
            Self::Status(status) => record.status == *status,
        }
    }

    /// Подпись вкладки.
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All Matches",
            Self::Status(MatchStatus::New) => "New Matches",
            Self::Status(MatchStatus::Pending) => "Pending",
            Self::Status(MatchStatus::Accepted) => "Confirmed",
            Self::Status(MatchStatus::Rejected) => "Cancelled",
        }
    }

    /// Все вкладки в порядке отображения.
    pub fn all() -> impl Iterator<Item = MatchFilter> {
        std::iter::once(Self::All).chain(all::<MatchStatus>().map(Self::Status))
    }
}

impl Display for MatchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Status(status) => write!(f, "{}", status),
        }
    }
}

impl FromStr for MatchFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }

        s.parse()
            .map(Self::Status)
            .map_err(|UnknownStatus(s)| UnknownFilter(s))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown match filter \"{0}\"")]
pub struct UnknownFilter(pub String);

/// Количество мэтчей на каждой вкладке.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub all: usize,
    pub new: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl FilterCounts {
    pub fn get(&self, filter: MatchFilter) -> usize {
        match filter {
            MatchFilter::All => self.all,
            MatchFilter::Status(MatchStatus::New) => self.new,
            MatchFilter::Status(MatchStatus::Pending) => self.pending,
            MatchFilter::Status(MatchStatus::Accepted) => self.accepted,
            MatchFilter::Status(MatchStatus::Rejected) => self.rejected,
        }
    }
}

pub fn compute_filter_counts(matches: &[MatchRecord]) -> FilterCounts {
    let mut counts = FilterCounts {
        all: matches.len(),
        ..Default::default()
    };

    for m in matches {
        let bucket = match m.status {
            MatchStatus::New => &mut counts.new,
            MatchStatus::Pending => &mut counts.pending,
            MatchStatus::Accepted => &mut counts.accepted,
            MatchStatus::Rejected => &mut counts.rejected,
        };
        *bucket += 1;
    }

    counts
}

/// Мэтчи активной вкладки в исходном порядке.
pub fn filter_matches(matches: &[MatchRecord], filter: MatchFilter) -> Vec<&MatchRecord> {
    matches.iter().filter(|m| filter.accepts(m)).collect()
}

/// Вкладка фильтра со счётчиком.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    #[serde(serialize_with = "serialize_display")]
    pub filter: MatchFilter,
    pub label: &'static str,
    pub count: usize,
}

fn serialize_display<T: Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

pub fn filter_options(matches: &[MatchRecord]) -> Vec<FilterOption> {
    let counts = compute_filter_counts(matches);

    MatchFilter::all()
        .map(|filter| FilterOption {
            filter,
            label: filter.label(),
            count: counts.get(filter),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<MatchRecord> {
        vec![
            MatchRecord::new("1", MatchStatus::New),
            MatchRecord::new("2", MatchStatus::Pending),
            MatchRecord::new("3", MatchStatus::Pending),
        ]
    }

    fn ids(records: Vec<&MatchRecord>) -> Vec<&str> {
        records.into_iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn counts() {
        assert_eq!(
            FilterCounts {
                all: 3,
                new: 1,
                pending: 2,
                accepted: 0,
                rejected: 0,
            },
            compute_filter_counts(&scenario())
        );
    }

    #[test]
    fn counts_add_up() {
        let mut matches = scenario();
        matches.push(MatchRecord::new("4", MatchStatus::Accepted));
        matches.push(MatchRecord::new("5", MatchStatus::Rejected));
        matches.push(MatchRecord::new("6", MatchStatus::Rejected));

        let c = compute_filter_counts(&matches);

        assert_eq!(c.all, c.new + c.pending + c.accepted + c.rejected);
        assert_eq!(2, c.rejected);
    }

    #[test]
    fn counts_empty() {
        assert_eq!(FilterCounts::default(), compute_filter_counts(&[]));
    }

    #[test]
    fn filter_all_keeps_order() {
        let matches = scenario();
        assert_eq!(vec!["1", "2", "3"], ids(filter_matches(&matches, MatchFilter::All)));
    }

    #[test]
    fn filter_by_status_is_stable() {
        let matches = vec![
            MatchRecord::new("a", MatchStatus::Pending),
            MatchRecord::new("b", MatchStatus::New),
            MatchRecord::new("c", MatchStatus::Pending),
            MatchRecord::new("d", MatchStatus::Accepted),
            MatchRecord::new("e", MatchStatus::Pending),
        ];

        let pending = filter_matches(&matches, MatchFilter::Status(MatchStatus::Pending));

        assert_eq!(vec!["a", "c", "e"], ids(pending));
        assert!(filter_matches(&matches, MatchFilter::Status(MatchStatus::Rejected)).is_empty());
    }

    #[test]
    fn filter_parse() {
        assert_eq!(Ok(MatchFilter::All), "all".parse());
        assert_eq!(
            Ok(MatchFilter::Status(MatchStatus::Accepted)),
            "accepted".parse()
        );
        assert_eq!(
            Err(UnknownFilter("confirmed".to_owned())),
            "confirmed".parse::<MatchFilter>()
        );
    }

    #[test]
    fn status_parse() {
        assert_eq!(Ok(MatchStatus::Rejected), "rejected".parse());
        assert_eq!(
            Err(UnknownStatus("cancelled".to_owned())),
            "cancelled".parse::<MatchStatus>()
        );
        assert_eq!(
            "unknown match status \"cancelled\"",
            UnknownStatus("cancelled".to_owned()).to_string()
        );
    }

    #[test]
    fn options() {
        let options = filter_options(&scenario());

        let rendered: Vec<(String, &str, usize)> = options
            .iter()
            .map(|o| (o.filter.to_string(), o.label, o.count))
            .collect();

        assert_eq!(
            vec![
                ("all".to_owned(), "All Matches", 3),
                ("new".to_owned(), "New Matches", 1),
                ("pending".to_owned(), "Pending", 2),
                ("accepted".to_owned(), "Confirmed", 0),
                ("rejected".to_owned(), "Cancelled", 0),
            ],
            rendered
        );
    }

    #[test]
    fn deserialize_record_with_extra_fields() {
        let record: MatchRecord = serde_json::from_str(
            r#"{
                "id": "2",
                "status": "pending",
                "type": "multilateral",
                "matchScore": 89,
                "createdAt": "1 day ago",
                "participants": [
                    {"id": "user2", "name": "Marco Rodriguez", "hasAccepted": true, "rating": 4.9},
                    {"id": "currentUser", "name": "You", "hasAccepted": null}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(MatchStatus::Pending, record.status);
        assert_eq!(MatchKind::Multilateral, record.kind);
        assert_eq!(89, record.match_score);
        assert_eq!(Some(true), record.participants[0].has_accepted);
        assert_eq!(None, record.participants[1].has_accepted);
    }
}
