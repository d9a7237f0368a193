//! Report feed types and client-side filtering
//!
//! [`ReportQuery`] is the body of `POST /get_reports`. The backend returns a
//! list of [`Deal`]s which the client narrows and orders again locally with
//! [`ReportFilter`], so that refining a search doesn't need another round trip.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Number of deals requested when the caller doesn't say
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Deadline used for deals without one when filtering or sorting ascending
const MISSING_DEADLINE_LATE: i64 = 999;

/// Deadline used for deals without one when sorting descending
const MISSING_DEADLINE_EARLY: i64 = -1;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Backend field a report can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[serde(rename = "deadlineDays")]
    DeadlineDays,
    #[serde(rename = "value")]
    Value,
}

/// User-facing sort choices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOption {
    DeadlineAsc,
    DeadlineDesc,
    ValueAsc,
    ValueDesc,
}

impl SortOption {
    /// Backend `sort_by` / `order` pair for this option
    pub fn to_backend(self) -> (SortField, SortOrder) {
        match self {
            SortOption::DeadlineAsc => (SortField::DeadlineDays, SortOrder::Asc),
            SortOption::DeadlineDesc => (SortField::DeadlineDays, SortOrder::Desc),
            SortOption::ValueAsc => (SortField::Value, SortOrder::Asc),
            SortOption::ValueDesc => (SortField::Value, SortOrder::Desc),
        }
    }

    fn compare(self, a: &Deal, b: &Deal) -> Ordering {
        match self {
            SortOption::DeadlineAsc => a
                .deadline_or(MISSING_DEADLINE_LATE)
                .cmp(&b.deadline_or(MISSING_DEADLINE_LATE)),
            SortOption::DeadlineDesc => b
                .deadline_or(MISSING_DEADLINE_EARLY)
                .cmp(&a.deadline_or(MISSING_DEADLINE_EARLY)),
            SortOption::ValueAsc => a.value_or_zero().total_cmp(&b.value_or_zero()),
            SortOption::ValueDesc => b.value_or_zero().total_cmp(&a.value_or_zero()),
        }
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deadline-asc" | "deadlineAsc" => Ok(SortOption::DeadlineAsc),
            "deadline-desc" | "deadlineDesc" => Ok(SortOption::DeadlineDesc),
            "value-asc" | "valueAsc" => Ok(SortOption::ValueAsc),
            "value-desc" | "valueDesc" => Ok(SortOption::ValueDesc),
            other => Err(format!(
                "unknown sort '{}': expected deadline-asc, deadline-desc, value-asc or value-desc",
                other
            )),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOption::DeadlineAsc => "deadline-asc",
            SortOption::DeadlineDesc => "deadline-desc",
            SortOption::ValueAsc => "value-asc",
            SortOption::ValueDesc => "value-desc",
        })
    }
}

/// Body of `POST /get_reports`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Free-text search term
    pub keywords: Option<String>,
    /// CPV category code
    pub cpv: Option<String>,
    /// Minimum estimated value
    pub minvalue: Option<f64>,
    /// Maximum estimated value
    pub maxvalue: Option<f64>,
    /// Date filter; the backend accepts it but nothing sets it yet
    pub date: Option<String>,
    /// Maximum number of deals to return
    pub size: u32,
    /// Field to sort by
    pub sort_by: Option<SortField>,
    /// Sort direction
    pub order: SortOrder,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            keywords: None,
            cpv: None,
            minvalue: None,
            maxvalue: None,
            date: None,
            size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            order: SortOrder::Asc,
        }
    }
}

impl ReportQuery {
    /// Build the backend query matching a client-side filter
    pub fn from_filter(filter: &ReportFilter, size: u32) -> Self {
        let (sort_by, order) = match filter.sort {
            Some(option) => {
                let (field, order) = option.to_backend();
                (Some(field), order)
            }
            None => (None, SortOrder::Asc),
        };

        Self {
            keywords: non_blank(filter.term.as_deref()),
            cpv: non_blank(filter.cpv.as_deref()),
            minvalue: filter.min_value,
            maxvalue: filter.max_value,
            date: None,
            size,
            sort_by,
            order,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// One lot of a tender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub description: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// A procurement deal as returned by the report feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub title: String,
    #[serde(default)]
    pub authority: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub deadline_days: Option<i64>,
    #[serde(default)]
    pub cpv: Option<String>,
    #[serde(default)]
    pub savings: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub lots: Vec<Lot>,
}

impl Deal {
    fn value_or_zero(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }

    fn deadline_or(&self, fallback: i64) -> i64 {
        self.deadline_days.unwrap_or(fallback)
    }

    /// Urgency bucket for the board view
    pub fn urgency(&self) -> Urgency {
        Urgency::from_deadline(self.deadline_days)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Lot>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Lot>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response of `POST /get_reports`.
///
/// The backend nests the list as `{"deals": {"deals": [...]}}`; the flat
/// `{"deals": [...]}` form is accepted too.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportsResponse {
    deals: DealsPayload,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum DealsPayload {
    Flat(Vec<Deal>),
    Nested { deals: Vec<Deal> },
}

impl ReportsResponse {
    pub fn deals(&self) -> &[Deal] {
        match &self.deals {
            DealsPayload::Flat(deals) | DealsPayload::Nested { deals } => deals,
        }
    }

    pub fn into_deals(self) -> Vec<Deal> {
        match self.deals {
            DealsPayload::Flat(deals) | DealsPayload::Nested { deals } => deals,
        }
    }
}

/// Quick value ordering chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueChip {
    High,
    Low,
}

impl FromStr for ValueChip {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(ValueChip::High),
            "low" => Ok(ValueChip::Low),
            other => Err(format!("unknown value chip '{}': expected high or low", other)),
        }
    }
}

/// Client-side narrowing and ordering of fetched deals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    /// Case-insensitive match over title, description and authority
    pub term: Option<String>,
    /// Substring match on the CPV code; whitespace in the filter is ignored
    pub cpv: Option<String>,
    /// Inclusive lower bound on value
    pub min_value: Option<f64>,
    /// Inclusive upper bound on value
    pub max_value: Option<f64>,
    /// Keep deals due within this many days
    pub deadline_within: Option<i64>,
    pub value_chip: Option<ValueChip>,
    pub sort: Option<SortOption>,
}

impl ReportFilter {
    /// Filter and order a list of deals. Sorts are stable.
    pub fn apply(&self, deals: &[Deal]) -> Vec<Deal> {
        let term = self
            .term
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        let cpv: Option<String> = self
            .cpv
            .as_deref()
            .map(|c| c.chars().filter(|ch| !ch.is_whitespace()).collect());

        let mut list: Vec<Deal> = deals
            .iter()
            .filter(|deal| match &term {
                Some(term) => {
                    deal.title.to_lowercase().contains(term)
                        || deal.description.to_lowercase().contains(term)
                        || deal.authority.to_lowercase().contains(term)
                }
                None => true,
            })
            .filter(|deal| match &cpv {
                Some(code) if !code.is_empty() => {
                    deal.cpv.as_deref().unwrap_or("").contains(code.as_str())
                }
                _ => true,
            })
            .filter(|deal| self.min_value.map_or(true, |min| deal.value_or_zero() >= min))
            .filter(|deal| self.max_value.map_or(true, |max| deal.value_or_zero() <= max))
            .filter(|deal| {
                self.deadline_within
                    .map_or(true, |days| deal.deadline_or(MISSING_DEADLINE_LATE) <= days)
            })
            .cloned()
            .collect();

        match self.value_chip {
            Some(ValueChip::High) => list.sort_by(|a, b| SortOption::ValueDesc.compare(a, b)),
            Some(ValueChip::Low) => list.sort_by(|a, b| SortOption::ValueAsc.compare(a, b)),
            None => {}
        }

        if let Some(sort) = self.sort {
            list.sort_by(|a, b| sort.compare(a, b));
        }

        list
    }
}

/// Deadline buckets of the board view
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    /// Due within 7 days
    Urgent,
    /// Due in 8 to 14 days
    Soon,
    /// Due later, or no deadline known
    Later,
}

impl Urgency {
    pub fn from_deadline(deadline_days: Option<i64>) -> Self {
        match deadline_days {
            Some(days) if days <= 7 => Urgency::Urgent,
            Some(days) if days <= 14 => Urgency::Soon,
            _ => Urgency::Later,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Urgency::Urgent => "Urgent (<= 7 days)",
            Urgency::Soon => "Soon (8-14 days)",
            Urgency::Later => "Later (> 14 days)",
        }
    }
}

/// Group deals into urgency columns, keeping their relative order
pub fn board(deals: &[Deal]) -> [(Urgency, Vec<&Deal>); 3] {
    let mut columns = [
        (Urgency::Urgent, Vec::new()),
        (Urgency::Soon, Vec::new()),
        (Urgency::Later, Vec::new()),
    ];
    for deal in deals {
        let index = match deal.urgency() {
            Urgency::Urgent => 0,
            Urgency::Soon => 1,
            Urgency::Later => 2,
        };
        columns[index].1.push(deal);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deal(title: &str, value: Option<f64>, deadline: Option<i64>, cpv: Option<&str>) -> Deal {
        Deal {
            title: title.to_string(),
            authority: "Primaria Cluj".to_string(),
            value,
            deadline_days: deadline,
            cpv: cpv.map(str::to_string),
            savings: None,
            description: String::new(),
            lots: Vec::new(),
        }
    }

    fn titles(deals: &[Deal]) -> Vec<&str> {
        deals.iter().map(|d| d.title.as_str()).collect()
    }

    #[test]
    fn test_query_serializes_backend_shape() {
        let filter = ReportFilter {
            term: Some("  asfalt ".to_string()),
            cpv: Some("".to_string()),
            min_value: Some(1000.0),
            sort: Some(SortOption::DeadlineDesc),
            ..Default::default()
        };
        let query = ReportQuery::from_filter(&filter, DEFAULT_PAGE_SIZE);

        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "keywords": "asfalt",
                "cpv": null,
                "minvalue": 1000.0,
                "maxvalue": null,
                "date": null,
                "size": 50,
                "sort_by": "deadlineDays",
                "order": "desc",
            })
        );
    }

    #[test]
    fn test_query_without_sort_defaults_to_asc() {
        let query = ReportQuery::from_filter(&ReportFilter::default(), 10);
        assert_eq!(query.sort_by, None);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.size, 10);
    }

    #[test]
    fn test_response_nested_and_flat() {
        let nested = json!({
            "deals": {"deals": [{
                "title": "Drumuri",
                "description": "Reabilitare",
                "authority": "CJ Cluj",
                "value": 120000.0,
                "savings": 12000.0,
                "cpv": "45233140-2",
                "lots": [{"description": "Lot 1", "value": null}]
            }]}
        });
        let response: ReportsResponse = serde_json::from_value(nested).unwrap();
        assert_eq!(response.deals().len(), 1);
        assert_eq!(response.deals()[0].lots.len(), 1);
        assert_eq!(response.deals()[0].deadline_days, None);

        let flat = json!({"deals": [{"title": "A", "deadlineDays": 3, "lots": null}]});
        let response: ReportsResponse = serde_json::from_value(flat).unwrap();
        let deals = response.into_deals();
        assert_eq!(deals[0].deadline_days, Some(3));
        assert!(deals[0].lots.is_empty());
    }

    #[test]
    fn test_term_matches_any_text_field() {
        let mut by_authority = deal("Iluminat", None, None, None);
        by_authority.authority = "Spitalul Judetean".to_string();
        let mut by_description = deal("Lucrari", None, None, None);
        by_description.description = "Reparatii SPITAL".to_string();
        let deals = vec![by_authority, by_description, deal("Altceva", None, None, None)];

        let filter = ReportFilter {
            term: Some("spital".to_string()),
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(&deals)), vec!["Iluminat", "Lucrari"]);
    }

    #[test]
    fn test_cpv_ignores_whitespace_in_filter() {
        let deals = vec![
            deal("A", None, None, Some("45233140-2")),
            deal("B", None, None, Some("30200000-1")),
            deal("C", None, None, None),
        ];
        let filter = ReportFilter {
            cpv: Some("4523 3140".to_string()),
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(&deals)), vec!["A"]);
    }

    #[test]
    fn test_value_bounds_treat_missing_as_zero() {
        let deals = vec![
            deal("none", None, None, None),
            deal("small", Some(50.0), None, None),
            deal("big", Some(5000.0), None, None),
        ];

        let filter = ReportFilter {
            max_value: Some(100.0),
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(&deals)), vec!["none", "small"]);

        let filter = ReportFilter {
            min_value: Some(50.0),
            max_value: Some(5000.0),
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(&deals)), vec!["small", "big"]);
    }

    #[test]
    fn test_deadline_chip_drops_unknown_deadlines() {
        let deals = vec![
            deal("week", None, Some(7), None),
            deal("fortnight", None, Some(14), None),
            deal("unknown", None, None, None),
        ];
        let filter = ReportFilter {
            deadline_within: Some(7),
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(&deals)), vec!["week"]);
    }

    #[test]
    fn test_deadline_sorts_place_missing_last() {
        let deals = vec![
            deal("unknown", None, None, None),
            deal("late", None, Some(20), None),
            deal("soon", None, Some(2), None),
        ];

        let asc = ReportFilter {
            sort: Some(SortOption::DeadlineAsc),
            ..Default::default()
        };
        assert_eq!(titles(&asc.apply(&deals)), vec!["soon", "late", "unknown"]);

        let desc = ReportFilter {
            sort: Some(SortOption::DeadlineDesc),
            ..Default::default()
        };
        assert_eq!(titles(&desc.apply(&deals)), vec!["late", "soon", "unknown"]);
    }

    #[test]
    fn test_sort_overrides_value_chip() {
        let deals = vec![
            deal("cheap-late", Some(10.0), Some(30), None),
            deal("pricey-soon", Some(900.0), Some(1), None),
            deal("mid", Some(100.0), Some(10), None),
        ];

        let chip_only = ReportFilter {
            value_chip: Some(ValueChip::High),
            ..Default::default()
        };
        assert_eq!(
            titles(&chip_only.apply(&deals)),
            vec!["pricey-soon", "mid", "cheap-late"]
        );

        let both = ReportFilter {
            value_chip: Some(ValueChip::High),
            sort: Some(SortOption::DeadlineDesc),
            ..Default::default()
        };
        assert_eq!(
            titles(&both.apply(&deals)),
            vec!["cheap-late", "mid", "pricey-soon"]
        );
    }

    #[test]
    fn test_sort_option_parsing() {
        assert_eq!("value-desc".parse::<SortOption>().unwrap(), SortOption::ValueDesc);
        assert_eq!("deadlineAsc".parse::<SortOption>().unwrap(), SortOption::DeadlineAsc);
        assert!("newest".parse::<SortOption>().is_err());
        assert_eq!(SortOption::ValueAsc.to_string(), "value-asc");
    }

    #[test]
    fn test_board_buckets() {
        let deals = vec![
            deal("a", None, Some(7), None),
            deal("b", None, Some(8), None),
            deal("c", None, Some(14), None),
            deal("d", None, Some(15), None),
            deal("e", None, None, None),
        ];
        let columns = board(&deals);

        let names = |i: usize| columns[i].1.iter().map(|d| d.title.as_str()).collect::<Vec<_>>();
        assert_eq!(names(0), vec!["a"]);
        assert_eq!(names(1), vec!["b", "c"]);
        assert_eq!(names(2), vec!["d", "e"]);
    }
}
