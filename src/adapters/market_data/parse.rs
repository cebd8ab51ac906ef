//! Gamma market parsing — raw JSON record to `MarketSnapshot`.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::domain::MarketSnapshot;

/// Parse one Gamma API market object into a snapshot, or `None` if the
/// record should be skipped (missing id, unparseable prices, unsupported
/// outcome shape). Never returns an error — per-record failures are
/// isolated from the bulk fetch by the caller.
pub fn parse_gamma_market(data: &Value) -> Option<MarketSnapshot> {
    let market_id = first_str(data, &["conditionId", "condition_id", "id"])?;

    let question = data
        .get("question")
        .and_then(Value::as_str)
        .or_else(|| data.get("title").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    let (yes_price, no_price) = extract_prices(data)?;

    let volume = numeric_field(data, "volumeNum", "volume");
    let liquidity = numeric_field(data, "liquidityNum", "liquidity");

    let active = data.get("active").and_then(Value::as_bool).unwrap_or(true);
    let closed = data
        .get("closed")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Some(MarketSnapshot {
        market_id,
        question,
        yes_price,
        no_price,
        volume,
        liquidity,
        active,
        closed,
        fetched_at: Utc::now(),
    })
}

fn first_str(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        data.get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn numeric_field(data: &Value, numeric_key: &str, plain_key: &str) -> Option<f64> {
    if let Some(v) = data.get(numeric_key).and_then(Value::as_f64) {
        return Some(v);
    }
    match data.get(plain_key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

/// Try the packed `outcomes`/`outcomePrices` format first, then the
/// `tokens` array format. Returns `None` if neither yields both prices.
fn extract_prices(data: &Value) -> Option<(f64, f64)> {
    extract_packed_prices(data).or_else(|| extract_tokenized_prices(data))
}

fn extract_packed_prices(data: &Value) -> Option<(f64, f64)> {
    let outcomes = parse_string_array(data.get("outcomes")?)?;
    let prices = parse_string_array(data.get("outcomePrices")?)?;
    if outcomes.len() != 2 || prices.len() != 2 {
        debug!(count = outcomes.len(), "unsupported outcome count");
        return None;
    }
    map_labels(outcomes.iter().zip(prices.iter()).map(|(o, p)| {
        let price = p.parse::<f64>().ok();
        (o.as_str(), price)
    }))
}

fn extract_tokenized_prices(data: &Value) -> Option<(f64, f64)> {
    let tokens = data.get("tokens")?.as_array()?;
    if tokens.len() != 2 {
        return None;
    }
    map_labels(tokens.iter().map(|t| {
        let outcome = t.get("outcome").and_then(Value::as_str).unwrap_or("");
        let price = t.get("price").and_then(Value::as_f64);
        (outcome, price)
    }))
}

/// A JSON value holding either an array of strings, or a JSON-encoded
/// string containing such an array (the Gamma API serializes
/// `outcomes`/`outcomePrices` both ways depending on endpoint).
fn parse_string_array(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        Value::String(s) => serde_json::from_str::<Vec<String>>(s).ok(),
        _ => None,
    }
}

fn map_labels<'a>(pairs: impl Iterator<Item = (&'a str, Option<f64>)>) -> Option<(f64, f64)> {
    let mut yes_price = None;
    let mut no_price = None;
    for (label, price) in pairs {
        let Some(price) = price else { continue };
        match label.to_ascii_lowercase().as_str() {
            "yes" | "long" if yes_price.is_none() => yes_price = Some(price),
            "no" | "short" if no_price.is_none() => no_price = Some(price),
            _ => {}
        }
    }
    Some((yes_price?, no_price?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_packed_binary_market() {
        let raw = json!({
            "conditionId": "0xabc",
            "question": "Will it rain?",
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": "[\"0.65\", \"0.35\"]",
            "volumeNum": 1234.5,
            "active": true,
            "closed": false,
        });
        let snapshot = parse_gamma_market(&raw).expect("should parse");
        assert_eq!(snapshot.market_id, "0xabc");
        assert_eq!(snapshot.yes_price, 0.65);
        assert_eq!(snapshot.no_price, 0.35);
        assert_eq!(snapshot.volume, Some(1234.5));
    }

    #[test]
    fn parses_tokenized_scalar_market() {
        let raw = json!({
            "condition_id": "0xdef",
            "title": "BTC above 100k?",
            "tokens": [
                {"outcome": "Long", "price": 0.4},
                {"outcome": "Short", "price": 0.6},
            ],
        });
        let snapshot = parse_gamma_market(&raw).expect("should parse");
        assert_eq!(snapshot.yes_price, 0.4);
        assert_eq!(snapshot.no_price, 0.6);
    }

    #[test]
    fn skips_market_missing_identifier() {
        let raw = json!({"question": "no id here"});
        assert!(parse_gamma_market(&raw).is_none());
    }

    #[test]
    fn skips_market_with_unmapped_outcomes() {
        let raw = json!({
            "conditionId": "0x1",
            "outcomes": "[\"Maybe\", \"Never\"]",
            "outcomePrices": "[\"0.5\", \"0.5\"]",
        });
        assert!(parse_gamma_market(&raw).is_none());
    }

    #[test]
    fn defaults_active_and_closed() {
        let raw = json!({
            "conditionId": "0x2",
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": "[\"0.1\", \"0.9\"]",
        });
        let snapshot = parse_gamma_market(&raw).unwrap();
        assert!(snapshot.active);
        assert!(!snapshot.closed);
    }
}
