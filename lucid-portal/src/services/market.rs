//! Market price quotes for the portfolio view.
//!
//! Fetches batch quotes from the Twelve Data price endpoint, converts to EUR,
//! and derives a synthetic entry price. The fetcher degrades rather than
//! fails: any ticker without a usable live quote gets a static fallback, and
//! a ticker with no fallback gets a generic placeholder. Callers always get a
//! price point for every requested ticker.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use lucid_common::types::MarketPricePoint;

/// USD to EUR conversion applied to all live quotes.
const USD_TO_EUR: f64 = 0.92;

/// Synthetic entry price as a fraction of the current quote.
const ENTRY_DISCOUNT: f64 = 0.94;

/// Static (entry, current) EUR fallbacks for tickers we commonly track.
const FALLBACK_PRICES: &[(&str, f64, f64)] = &[
    ("NVDA", 121.40, 136.15),
    ("MSFT", 376.20, 390.80),
    ("ASML", 680.00, 715.40),
    ("COST", 756.00, 782.30),
    ("LLY", 683.00, 724.20),
    ("AAPL", 206.10, 222.45),
    ("TSLA", 169.00, 182.30),
    ("TSMC", 161.40, 173.10),
    ("BTC", 86_500.00, 94_300.00),
    ("ETH", 2_610.00, 2_860.00),
];

/// Generic placeholder for tickers with neither a live quote nor a fallback.
const GENERIC_ENTRY: f64 = 100.0;
const GENERIC_CURRENT: f64 = 105.0;

/// Client for the external quote API.
pub struct MarketClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MarketClient {
    pub fn new(base_url: String, api_key: String) -> lucid_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| lucid_common::Error::Internal(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    /// Fetch price points for `tickers`. Always returns one entry per
    /// requested ticker; network or API trouble is logged and papered over
    /// with fallbacks.
    pub async fn fetch_prices(&self, tickers: &[String]) -> HashMap<String, MarketPricePoint> {
        if tickers.is_empty() {
            return HashMap::new();
        }

        let body = match self.fetch_quote_body(tickers).await {
            Some(body) => body,
            None => {
                warn!("Market quote request failed, serving fallback prices");
                return tickers
                    .iter()
                    .map(|t| (t.clone(), fallback_point(t)))
                    .collect();
            }
        };

        tickers
            .iter()
            .map(|ticker| {
                let value = if tickers.len() == 1 {
                    Some(&body)
                } else {
                    body.get(ticker)
                };
                let point = value
                    .and_then(extract_price)
                    .map(|price| live_point(ticker, price))
                    .unwrap_or_else(|| {
                        debug!(ticker = %ticker, "no live quote, using fallback");
                        fallback_point(ticker)
                    });
                (ticker.clone(), point)
            })
            .collect()
    }

    async fn fetch_quote_body(&self, tickers: &[String]) -> Option<Value> {
        let url = format!(
            "{}/price?symbol={}&apikey={}",
            self.base_url,
            tickers.join(","),
            self.api_key
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| warn!("market quote request error: {}", e))
            .ok()?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "market quote API returned error status");
            return None;
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| warn!("market quote response was not JSON: {}", e))
            .ok()
    }
}

/// Pull a positive finite price out of a per-ticker quote object. The API
/// returns `{"price": "123.45"}` with the number as a string; tolerate a
/// plain number too.
fn extract_price(value: &Value) -> Option<f64> {
    let raw = value.get("price")?;
    let price = match raw {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    (price.is_finite() && price > 0.0).then_some(price)
}

fn live_point(ticker: &str, usd_price: f64) -> MarketPricePoint {
    let current = usd_price * USD_TO_EUR;
    MarketPricePoint {
        ticker: ticker.to_string(),
        entry_price: round_cents(current * ENTRY_DISCOUNT),
        current_price: round_cents(current),
        currency: "EUR".into(),
        is_live: true,
    }
}

fn fallback_point(ticker: &str) -> MarketPricePoint {
    let (entry, current) = FALLBACK_PRICES
        .iter()
        .find(|(t, _, _)| *t == ticker)
        .map(|(_, entry, current)| (*entry, *current))
        .unwrap_or((GENERIC_ENTRY, GENERIC_CURRENT));

    MarketPricePoint {
        ticker: ticker.to_string(),
        entry_price: entry,
        current_price: current,
        currency: "EUR".into(),
        is_live: false,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_price_handles_string_and_number() {
        assert_eq!(extract_price(&json!({ "price": "123.45" })), Some(123.45));
        assert_eq!(extract_price(&json!({ "price": 99.9 })), Some(99.9));
    }

    #[test]
    fn extract_price_rejects_garbage() {
        assert_eq!(extract_price(&json!({ "price": "not a number" })), None);
        assert_eq!(extract_price(&json!({ "price": "-5" })), None);
        assert_eq!(extract_price(&json!({ "price": "0" })), None);
        assert_eq!(extract_price(&json!({ "code": 404 })), None);
    }

    #[test]
    fn live_point_converts_to_eur_with_entry_discount() {
        let point = live_point("AAPL", 100.0);
        assert_eq!(point.ticker, "AAPL");
        assert_eq!(point.current_price, 92.0);
        assert_eq!(point.entry_price, 86.48);
        assert_eq!(point.currency, "EUR");
        assert!(point.is_live);
    }

    #[test]
    fn fallback_point_uses_table_then_generic() {
        let nvda = fallback_point("NVDA");
        assert_eq!(nvda.current_price, 136.15);
        assert_eq!(nvda.entry_price, 121.40);
        assert!(!nvda.is_live);

        let unknown = fallback_point("ZZZZ");
        assert_eq!(unknown.entry_price, 100.0);
        assert_eq!(unknown.current_price, 105.0);
        assert!(!unknown.is_live);
    }

    #[tokio::test]
    async fn fetch_prices_never_fails_when_api_unreachable() {
        let client = MarketClient::new("http://127.0.0.1:1".into(), "demo".into()).unwrap();
        let tickers = vec!["NVDA".to_string(), "ZZZZ".to_string()];
        let prices = client.fetch_prices(&tickers).await;

        assert_eq!(prices.len(), 2);
        assert!(!prices["NVDA"].is_live);
        assert_eq!(prices["NVDA"].current_price, 136.15);
        assert_eq!(prices["ZZZZ"].current_price, 105.0);
    }

    #[tokio::test]
    async fn fetch_prices_empty_input_is_empty() {
        let client = MarketClient::new("http://127.0.0.1:1".into(), "demo".into()).unwrap();
        assert!(client.fetch_prices(&[]).await.is_empty());
    }
}
