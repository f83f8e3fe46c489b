//! Filter criteria ⇄ URL query string.
//!
//! The parameter names are shared with bookmarked/shared dashboard URLs and
//! must stay stable: `min_profit`, `max_profit`, `sport`, `bookmaker`,
//! `bet_type`.

use tracing::warn;
use url::form_urlencoded;

use super::filter::FilterCriteria;

pub const MIN_PROFIT: &str = "min_profit";
pub const MAX_PROFIT: &str = "max_profit";
pub const SPORT: &str = "sport";
pub const BOOKMAKER: &str = "bookmaker";
pub const BET_TYPE: &str = "bet_type";

/// Encode the set fields of `criteria` as a form-urlencoded query (no `?`).
/// Unset fields are omitted; all-unset criteria encode to `""`.
pub fn encode_query(criteria: &FilterCriteria) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    if let Some(min) = criteria.min_profit {
        out.append_pair(MIN_PROFIT, &min.to_string());
    }
    if let Some(max) = criteria.max_profit {
        out.append_pair(MAX_PROFIT, &max.to_string());
    }
    for (key, value) in [
        (SPORT, &criteria.sport),
        (BOOKMAKER, &criteria.bookmaker),
        (BET_TYPE, &criteria.bet_type),
    ] {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            out.append_pair(key, v);
        }
    }
    out.finish()
}

/// Decode a query string (with or without a leading `?`) into criteria.
///
/// Missing or empty keys are unset.  A numeric value that does not parse
/// degrades to unset.  For repeated keys the first occurrence wins.
pub fn decode_query(query: &str) -> FilterCriteria {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut min_profit: Option<String> = None;
    let mut max_profit: Option<String> = None;
    let mut sport: Option<String> = None;
    let mut bookmaker: Option<String> = None;
    let mut bet_type: Option<String> = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let slot = match &*key {
            MIN_PROFIT => &mut min_profit,
            MAX_PROFIT => &mut max_profit,
            SPORT => &mut sport,
            BOOKMAKER => &mut bookmaker,
            BET_TYPE => &mut bet_type,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    FilterCriteria::new(
        min_profit.and_then(|v| parse_number(MIN_PROFIT, &v)),
        max_profit.and_then(|v| parse_number(MAX_PROFIT, &v)),
        sport,
        bookmaker,
        bet_type,
    )
}

/// Locale-independent decimal parse.  Empty input is simply unset; anything
/// else that isn't a finite number is logged and dropped.
pub fn parse_number(field: &str, raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!("Ignoring non-numeric {} filter value '{}'", field, raw);
            None
        }
    }
}

/// Most filter states [`FilterHistory`] remembers.
pub const MAX_HISTORY: usize = 100;

/// Push-only history of applied filter queries, oldest first.
///
/// Every change appends an entry, never replaces one, so the dashboard can
/// walk back through earlier filter states.  Only the newest
/// [`MAX_HISTORY`] entries are kept.
#[derive(Debug, Clone)]
pub struct FilterHistory {
    entries: Vec<String>,
}

impl FilterHistory {
    /// Start a history whose first entry is `initial`.
    pub fn new(initial: &FilterCriteria) -> Self {
        FilterHistory {
            entries: vec![encode_query(initial)],
        }
    }

    /// Record `criteria` as the newest entry and return its encoded query.
    pub fn push(&mut self, criteria: &FilterCriteria) -> String {
        let query = encode_query(criteria);
        self.entries.push(query.clone());
        if self.entries.len() > MAX_HISTORY {
            let excess = self.entries.len() - MAX_HISTORY;
            self.entries.drain(..excess);
        }
        query
    }

    /// Drop the newest entry and return the criteria it replaced.
    /// `None` when already at the oldest entry.
    pub fn back(&mut self) -> Option<FilterCriteria> {
        if self.entries.len() <= 1 {
            return None;
        }
        self.entries.pop();
        self.entries.last().map(|q| decode_query(q))
    }

    /// Encoded query of the newest entry.
    pub fn current(&self) -> &str {
        self.entries.last().map(String::as_str).unwrap_or("")
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for FilterHistory {
    fn default() -> Self {
        FilterHistory::new(&FilterCriteria::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> FilterCriteria {
        FilterCriteria {
            min_profit: Some(1.5),
            max_profit: Some(10.0),
            sport: Some("Ice Hockey".into()),
            bookmaker: Some("Bet & Win".into()),
            bet_type: Some("Over/Under".into()),
        }
    }

    #[test]
    fn test_empty_criteria_encode_to_empty_query() {
        assert_eq!(encode_query(&FilterCriteria::default()), "");
        assert_eq!(decode_query(""), FilterCriteria::default());
        assert_eq!(decode_query("?"), FilterCriteria::default());
    }

    #[test]
    fn test_encode_order_and_escaping() {
        assert_eq!(
            encode_query(&full()),
            "min_profit=1.5&max_profit=10&sport=Ice+Hockey&bookmaker=Bet+%26+Win&bet_type=Over%2FUnder"
        );
    }

    #[test]
    fn test_unset_fields_are_omitted() {
        let criteria = FilterCriteria {
            max_profit: Some(2.0),
            bookmaker: Some("BookB".into()),
            ..Default::default()
        };
        assert_eq!(encode_query(&criteria), "max_profit=2&bookmaker=BookB");
    }

    #[test]
    fn test_round_trip() {
        let cases = vec![
            FilterCriteria::default(),
            full(),
            FilterCriteria {
                min_profit: Some(0.1 + 0.2),
                ..Default::default()
            },
            FilterCriteria {
                min_profit: Some(-3.25),
                max_profit: Some(0.0),
                ..Default::default()
            },
            FilterCriteria {
                sport: Some("Fútbol".into()),
                bet_type: Some("1X2 = home?".into()),
                ..Default::default()
            },
        ];
        for criteria in cases {
            let query = encode_query(&criteria);
            assert_eq!(decode_query(&query), criteria, "query: {}", query);
        }
    }

    #[test]
    fn test_decode_accepts_leading_question_mark() {
        let criteria = decode_query("?min_profit=2&sport=Soccer");
        assert_eq!(criteria.min_profit, Some(2.0));
        assert_eq!(criteria.sport.as_deref(), Some("Soccer"));
    }

    #[test]
    fn test_non_numeric_degrades_to_unset() {
        let criteria = decode_query("min_profit=abc&max_profit=NaN&sport=Tennis");
        assert_eq!(criteria.min_profit, None);
        assert_eq!(criteria.max_profit, None);
        assert_eq!(criteria.sport.as_deref(), Some("Tennis"));

        assert_eq!(decode_query("min_profit=inf").min_profit, None);
    }

    #[test]
    fn test_empty_values_are_unset() {
        assert_eq!(
            decode_query("min_profit=&sport=&bookmaker=&bet_type="),
            FilterCriteria::default()
        );
    }

    #[test]
    fn test_first_repeated_key_wins_and_unknown_keys_ignored() {
        let criteria = decode_query("sport=Soccer&sport=Tennis&page=3");
        assert_eq!(criteria.sport.as_deref(), Some("Soccer"));
        assert_eq!(criteria.bookmaker, None);
    }

    #[test]
    fn test_history_pushes_and_goes_back() {
        let mut history = FilterHistory::default();
        assert_eq!(history.current(), "");
        assert!(history.back().is_none());

        let first = FilterCriteria {
            sport: Some("Soccer".into()),
            ..Default::default()
        };
        assert_eq!(history.push(&first), "sport=Soccer");
        history.push(&full());
        // Re-applying identical criteria still pushes a new entry
        history.push(&full());
        assert_eq!(history.len(), 4);

        assert_eq!(history.back(), Some(full()));
        assert_eq!(history.back(), Some(first));
        assert_eq!(history.back(), Some(FilterCriteria::default()));
        assert_eq!(history.back(), None);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_history_keeps_newest_entries_only() {
        let mut history = FilterHistory::default();
        for i in 0..150 {
            history.push(&FilterCriteria {
                min_profit: Some(i as f64),
                ..Default::default()
            });
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.current(), "min_profit=149");

        let mut steps = 0;
        let mut oldest = None;
        while let Some(criteria) = history.back() {
            oldest = Some(criteria);
            steps += 1;
        }
        assert_eq!(steps, MAX_HISTORY - 1);
        assert_eq!(oldest.and_then(|c| c.min_profit), Some(50.0));
    }
}
