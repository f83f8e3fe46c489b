use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::db::models::Opportunity;

/// Active dashboard filter.  Every field is optional; `None` (or an empty
/// string) imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Inclusive lower bound on `profit_margin`
    pub min_profit: Option<f64>,
    /// Inclusive upper bound on `profit_margin`
    pub max_profit: Option<f64>,
    pub sport: Option<String>,
    /// Matches an opportunity that involves this bookmaker on either leg
    pub bookmaker: Option<String>,
    pub bet_type: Option<String>,
}

impl FilterCriteria {
    /// Build criteria from string inputs, turning empty strings into `None`.
    pub fn new(
        min_profit: Option<f64>,
        max_profit: Option<f64>,
        sport: Option<String>,
        bookmaker: Option<String>,
        bet_type: Option<String>,
    ) -> Self {
        FilterCriteria {
            min_profit,
            max_profit,
            sport: non_empty(sport),
            bookmaker: non_empty(bookmaker),
            bet_type: non_empty(bet_type),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &FilterCriteria::default()
    }

    /// Whether `opp` satisfies every active criterion.
    pub fn matches(&self, opp: &Opportunity) -> bool {
        if let Some(min) = self.min_profit {
            if opp.profit_margin < min {
                return false;
            }
        }
        if let Some(max) = self.max_profit {
            if opp.profit_margin > max {
                return false;
            }
        }
        if let Some(sport) = active(&self.sport) {
            if opp.sport != sport {
                return false;
            }
        }
        if let Some(bookmaker) = active(&self.bookmaker) {
            if opp.bookmaker1 != bookmaker && opp.bookmaker2 != bookmaker {
                return false;
            }
        }
        if let Some(bet_type) = active(&self.bet_type) {
            if opp.bet_type != bet_type {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// The subsequence of `opportunities` matching `criteria`, in original order.
pub fn filter_opportunities<'a>(
    opportunities: &'a [Opportunity],
    criteria: &FilterCriteria,
) -> Vec<&'a Opportunity> {
    opportunities
        .iter()
        .filter(|opp| criteria.matches(opp))
        .collect()
}

/// Distinct, sorted values offered by the filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub sports: Vec<String>,
    /// Union of both legs' bookmakers
    pub bookmakers: Vec<String>,
    pub bet_types: Vec<String>,
}

impl FilterOptions {
    pub fn from_opportunities(opportunities: &[Opportunity]) -> Self {
        let mut sports = BTreeSet::new();
        let mut bookmakers = BTreeSet::new();
        let mut bet_types = BTreeSet::new();

        for opp in opportunities {
            if !opp.sport.is_empty() {
                sports.insert(opp.sport.clone());
            }
            for bookmaker in [&opp.bookmaker1, &opp.bookmaker2] {
                if !bookmaker.is_empty() {
                    bookmakers.insert(bookmaker.clone());
                }
            }
            if !opp.bet_type.is_empty() {
                bet_types.insert(opp.bet_type.clone());
            }
        }

        FilterOptions {
            sports: sports.into_iter().collect(),
            bookmakers: bookmakers.into_iter().collect(),
            bet_types: bet_types.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_opp(id: &str, sport: &str, b1: &str, b2: &str, bet_type: &str, margin: f64) -> Opportunity {
        Opportunity {
            id: id.to_string(),
            sport: sport.to_string(),
            bet_type: bet_type.to_string(),
            team1: format!("Event {}", id),
            league: None,
            market: None,
            total_line: None,
            timestamp: None,
            bookmaker1: b1.to_string(),
            bookmaker2: b2.to_string(),
            bet1: "Home".to_string(),
            bet2: "Away".to_string(),
            odds1: Some(2.0),
            odds2: Some(2.1),
            profit_margin: margin,
            bookmaker1_link: None,
            bookmaker2_link: None,
        }
    }

    fn sample() -> Vec<Opportunity> {
        vec![
            make_opp("1", "Soccer", "BookA", "BookB", "Moneyline", 0.8),
            make_opp("2", "Tennis", "BookC", "BookA", "Match Winner", 2.5),
            make_opp("3", "Soccer", "BookD", "BookC", "Totals", 3.4),
            make_opp("4", "Basketball", "BookB", "BookD", "Moneyline", 1.0),
            make_opp("5", "Soccer", "BookB", "BookA", "Moneyline", 5.2),
        ]
    }

    fn ids(result: &[&Opportunity]) -> Vec<String> {
        result.iter().map(|o| o.id.clone()).collect()
    }

    #[test]
    fn test_no_criteria_keeps_everything_in_order() {
        let opps = sample();
        let result = filter_opportunities(&opps, &FilterCriteria::default());
        assert_eq!(ids(&result), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_profit_bounds_are_inclusive() {
        let opps = sample();
        let criteria = FilterCriteria {
            min_profit: Some(1.0),
            max_profit: Some(3.4),
            ..Default::default()
        };
        assert_eq!(ids(&filter_opportunities(&opps, &criteria)), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_bookmaker_matches_either_leg() {
        let opps = vec![make_opp("x", "Soccer", "BookA", "BookB", "Moneyline", 2.0)];
        let criteria = FilterCriteria {
            bookmaker: Some("BookB".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_opportunities(&opps, &criteria)), vec!["x"]);

        let criteria = FilterCriteria {
            bookmaker: Some("BookZ".into()),
            ..Default::default()
        };
        assert!(filter_opportunities(&opps, &criteria).is_empty());
    }

    #[test]
    fn test_criteria_combine_with_and() {
        let opps = sample();
        let criteria = FilterCriteria {
            min_profit: Some(1.0),
            sport: Some("Soccer".into()),
            bet_type: Some("Moneyline".into()),
            bookmaker: Some("BookA".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_opportunities(&opps, &criteria)), vec!["5"]);
    }

    #[test]
    fn test_string_match_is_exact() {
        let opps = sample();
        let criteria = FilterCriteria {
            sport: Some("soccer".into()),
            ..Default::default()
        };
        assert!(filter_opportunities(&opps, &criteria).is_empty());
    }

    #[test]
    fn test_empty_strings_impose_nothing() {
        let opps = sample();
        let criteria = FilterCriteria {
            sport: Some(String::new()),
            bookmaker: Some(String::new()),
            bet_type: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter_opportunities(&opps, &criteria).len(), opps.len());

        let normalized = FilterCriteria::new(None, None, Some(String::new()), None, Some(String::new()));
        assert!(normalized.is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let opps = sample();
        let criteria = FilterCriteria {
            min_profit: Some(0.9),
            sport: Some("Soccer".into()),
            ..Default::default()
        };
        let once: Vec<Opportunity> = filter_opportunities(&opps, &criteria)
            .into_iter()
            .cloned()
            .collect();
        let twice = filter_opportunities(&once, &criteria);
        assert_eq!(ids(&twice), once.iter().map(|o| o.id.clone()).collect::<Vec<_>>());
    }

    #[test]
    fn test_tightening_bounds_never_grows_result() {
        let opps = sample();
        let mut previous = usize::MAX;
        for min in [0.0, 0.8, 1.0, 2.5, 3.5, 6.0] {
            let criteria = FilterCriteria {
                min_profit: Some(min),
                ..Default::default()
            };
            let n = filter_opportunities(&opps, &criteria).len();
            assert!(n <= previous, "min_profit={} grew the result", min);
            previous = n;
        }

        let mut previous = usize::MAX;
        for max in [10.0, 5.2, 3.0, 1.0, 0.5] {
            let criteria = FilterCriteria {
                max_profit: Some(max),
                ..Default::default()
            };
            let n = filter_opportunities(&opps, &criteria).len();
            assert!(n <= previous, "max_profit={} grew the result", max);
            previous = n;
        }
    }

    #[test]
    fn test_options_are_distinct_sorted_and_union_bookmakers() {
        let opps = sample();
        let options = FilterOptions::from_opportunities(&opps);
        assert_eq!(options.sports, vec!["Basketball", "Soccer", "Tennis"]);
        assert_eq!(options.bookmakers, vec!["BookA", "BookB", "BookC", "BookD"]);
        assert_eq!(options.bet_types, vec!["Match Winner", "Moneyline", "Totals"]);
    }

    #[test]
    fn test_options_skip_empty_values() {
        let opps = vec![make_opp("1", "", "BookA", "", "Moneyline", 1.0)];
        let options = FilterOptions::from_opportunities(&opps);
        assert!(options.sports.is_empty());
        assert_eq!(options.bookmakers, vec!["BookA"]);
    }

    #[test]
    fn test_options_from_empty_batch() {
        assert_eq!(FilterOptions::from_opportunities(&[]), FilterOptions::default());
    }
}
