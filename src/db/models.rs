use serde::{Deserialize, Deserializer, Serialize};

/// An arbitrage opportunity as published by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Opaque ID, unique within one fetched batch. The API emits either a
    /// string or a number.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub sport: String,
    pub bet_type: String,
    /// Event description, e.g. "Arsenal vs Chelsea"
    pub team1: String,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    /// Totals line; some feeds send it as a bare number
    #[serde(default, deserialize_with = "deserialize_total_line")]
    pub total_line: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub bookmaker1: String,
    pub bookmaker2: String,
    pub bet1: String,
    pub bet2: String,
    /// Decimal odds for leg 1. `None` when the record omits them.
    #[serde(default)]
    pub odds1: Option<f64>,
    #[serde(default)]
    pub odds2: Option<f64>,
    /// Percentage edge computed upstream
    pub profit_margin: f64,
    #[serde(default)]
    pub bookmaker1_link: Option<String>,
    #[serde(default)]
    pub bookmaker2_link: Option<String>,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "opportunity id must be a string or number, got {}",
            other
        ))),
    }
}

fn deserialize_total_line<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "total_line must be a string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let raw = r#"{
            "id": "opp-1",
            "sport": "Soccer",
            "bet_type": "Moneyline",
            "team1": "Arsenal vs Chelsea",
            "league": "Premier League",
            "bookmaker1": "BookA",
            "bookmaker2": "BookB",
            "bet1": "Arsenal",
            "bet2": "Chelsea or Draw",
            "odds1": 2.0,
            "odds2": 2.2,
            "profit_margin": 4.76,
            "bookmaker1_link": "https://booka.example/e/1"
        }"#;
        let opp: Opportunity = serde_json::from_str(raw).unwrap();
        assert_eq!(opp.id, "opp-1");
        assert_eq!(opp.league.as_deref(), Some("Premier League"));
        assert_eq!(opp.market, None);
        assert_eq!(opp.odds2, Some(2.2));
        assert_eq!(opp.bookmaker2_link, None);
    }

    #[test]
    fn test_numeric_id_and_missing_odds() {
        let raw = r#"{
            "id": 42,
            "sport": "Tennis",
            "bet_type": "Match Winner",
            "team1": "A vs B",
            "bookmaker1": "X",
            "bookmaker2": "Y",
            "bet1": "A",
            "bet2": "B",
            "profit_margin": 1.5
        }"#;
        let opp: Opportunity = serde_json::from_str(raw).unwrap();
        assert_eq!(opp.id, "42");
        assert_eq!(opp.odds1, None);
        assert_eq!(opp.odds2, None);
    }

    #[test]
    fn test_rejects_object_id() {
        let raw = r#"{
            "id": {"nested": true},
            "sport": "Tennis",
            "bet_type": "Match Winner",
            "team1": "A vs B",
            "bookmaker1": "X",
            "bookmaker2": "Y",
            "bet1": "A",
            "bet2": "B",
            "profit_margin": 1.5
        }"#;
        assert!(serde_json::from_str::<Opportunity>(raw).is_err());
    }

    #[test]
    fn test_numeric_total_line_kept_as_text() {
        let raw = r#"{
            "id": 7,
            "sport": "Basketball",
            "bet_type": "Totals",
            "team1": "A vs B",
            "total_line": 2.5,
            "bookmaker1": "X",
            "bookmaker2": "Y",
            "bet1": "Over",
            "bet2": "Under",
            "profit_margin": 1.2
        }"#;
        let opp: Opportunity = serde_json::from_str(raw).unwrap();
        assert_eq!(opp.total_line.as_deref(), Some("2.5"));

        let null_line = raw.replace("2.5,", "null,");
        let opp: Opportunity = serde_json::from_str(&null_line).unwrap();
        assert_eq!(opp.total_line, None);
    }
}
