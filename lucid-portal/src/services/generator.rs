//! Report generator client
//!
//! Gemini API integration producing structured monthly analyses. The
//! contract callers rely on: recoverable failures return `Ok(None)` (the
//! sync loop stops its run), quota exhaustion returns `Err(Quota)` (the
//! whole sync aborts and the caller decides retry policy).

use async_trait::async_trait;
use lucid_common::types::{SourceRef, StockAnalysis};
use lucid_common::ReportingMonth;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const HTTP_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "Act as a senior financial analyst specialized in risk management \
and scenario analysis (the \"financial lucidity\" method).\n\n\
YOUR MISSION:\n\
Produce a cold, pragmatic analysis of the specified asset, free of emotional or marketing \
bias. Never incite a purchase; expose the structure of the opportunity and its flaws.\n\n\
MANDATORY RESEARCH:\n\
Use your search tools to find the current live market price and the latest major news for \
the asset, so the analysis stays relevant.\n\n\
DISTRIBUTION AND ACCESS LEVELS:\n\
Assign an 'importanceRank' (number from 1 to 12):\n\
- Ranks 1-2: Beta plan selection (essentials).\n\
- Ranks 3-6: Alpha Junior plan selection (strong picks).\n\
- Ranks 7-12: Alpha plan selection (specialized picks).\n\n\
MARKETING HOOK:\n\
Write a 'marketingHook' of at most 100 characters summarizing the opportunity in an \
intriguing but lucid way.\n\n\
CLASSIFICATION:\n\
- If the asset is a cryptocurrency (BTC, ETH, ...), the 'sector' field must be strictly \
\"CRYPTO\".\n\
- Find the exact official ISIN code for equities.\n\n\
SCENARIOS:\n\
- The negative scenario matters most: be surgical about the risks.\n\
- Define clear invalidation points (observable signals).";

const PARTNER_SYSTEM_PROMPT: &str =
    "You are a senior financial copywriter. Produce short, punchy, professional copy.";

/// Generator client errors
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generator not configured: {0}")]
    NotConfigured(String),
}

/// AI-drafted partner listing fields, admin fills in the rest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerDraft {
    #[serde(rename = "type")]
    pub category: String,
    pub strength: String,
    pub description: String,
    pub cta: String,
    pub color: String,
}

/// Report generation interface, the seam the sync orchestrator drives
#[async_trait]
pub trait AnalysisGenerator: Send + Sync {
    /// Pick the month's target tickers; raw comma-separated text
    async fn select_tickers(
        &self,
        month: &ReportingMonth,
    ) -> Result<Option<String>, GeneratorError>;

    /// Produce one analysis for (ticker, month)
    ///
    /// `Ok(None)` means a recoverable failure; callers stop the current
    /// run and retry on a later sync. `Err(Quota)` aborts the whole run.
    async fn generate(
        &self,
        ticker: &str,
        month: &str,
        rank: Option<i64>,
    ) -> Result<Option<StockAnalysis>, GeneratorError>;

    /// Draft marketing copy for a partner listing
    async fn draft_partner(&self, name: &str) -> Result<Option<PartnerDraft>, GeneratorError>;
}

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Fast model for ticker selection and copywriting
    selection_model: String,
    /// Stronger model for scenario analysis
    analysis_model: String,
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        selection_model: String,
        analysis_model: String,
    ) -> lucid_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| lucid_common::Error::Internal(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
            selection_model,
            analysis_model,
        })
    }

    /// POST a generateContent request and extract the first candidate text
    async fn generate_content(&self, model: &str, body: Value) -> Result<Value, GeneratorError> {
        if self.api_key.trim().is_empty() {
            return Err(GeneratorError::NotConfigured(
                "Gemini API key not set".to_string(),
            ));
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GeneratorError::Quota(
                "Gemini API rate/quota limit reached".to_string(),
            ));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))
    }

    fn candidate_text(response: &Value) -> Option<&str> {
        response
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .get(0)?
            .get("text")?
            .as_str()
    }

    /// Grounding citations attached by the search tool, if any
    fn grounding_sources(response: &Value) -> Option<Vec<SourceRef>> {
        let chunks = response
            .get("candidates")?
            .get(0)?
            .get("groundingMetadata")?
            .get("groundingChunks")?
            .as_array()?;

        let sources: Vec<SourceRef> = chunks
            .iter()
            .filter_map(|chunk| {
                let web = chunk.get("web")?;
                Some(SourceRef {
                    title: web
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or("Market source")
                        .to_string(),
                    uri: web.get("uri")?.as_str()?.to_string(),
                })
            })
            .collect();

        if sources.is_empty() {
            None
        } else {
            Some(sources)
        }
    }
}

#[async_trait]
impl AnalysisGenerator for GeminiClient {
    async fn select_tickers(
        &self,
        month: &ReportingMonth,
    ) -> Result<Option<String>, GeneratorError> {
        let prompt = format!(
            "We are in {}. Identify 12 global equities and 2 major cryptocurrencies to \
             analyze this month. Reply only with the tickers separated by commas \
             (e.g. LVMH.PA, AAPL, BTC, ETH...).",
            month.label()
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self.generate_content(&self.selection_model, body).await?;
        Ok(Self::candidate_text(&response).map(|t| t.to_string()))
    }

    async fn generate(
        &self,
        ticker: &str,
        month: &str,
        rank: Option<i64>,
    ) -> Result<Option<StockAnalysis>, GeneratorError> {
        let rank_hint = rank
            .map(|r| format!(" Target importance rank {}.", r))
            .unwrap_or_default();
        let prompt = format!(
            "In-depth analysis of the asset {} for the {} report. Use search to find the \
             precise current price and recent market risks.{}",
            ticker, month, rank_hint
        );

        let body = json!({
            "system_instruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": analysis_schema(),
            },
            "tools": [{ "google_search": {} }],
        });

        let response = match self.generate_content(&self.analysis_model, body).await {
            Ok(response) => response,
            // Quota propagates; everything else is a recoverable null
            Err(GeneratorError::Quota(msg)) => return Err(GeneratorError::Quota(msg)),
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "Analysis generation failed");
                return Ok(None);
            }
        };

        let Some(text) = Self::candidate_text(&response) else {
            tracing::warn!(ticker = %ticker, "Empty generation response");
            return Ok(None);
        };

        let mut analysis: StockAnalysis = match serde_json::from_str(text) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "Unparseable analysis payload");
                return Ok(None);
            }
        };

        analysis.last_update = month.to_string();
        if analysis.sources.is_none() {
            analysis.sources = Self::grounding_sources(&response);
        }

        tracing::info!(
            ticker = %analysis.ticker,
            rank = analysis.importance_rank,
            month = %month,
            "Generated analysis"
        );

        Ok(Some(analysis))
    }

    async fn draft_partner(&self, name: &str) -> Result<Option<PartnerDraft>, GeneratorError> {
        let body = json!({
            "system_instruction": { "parts": [{ "text": PARTNER_SYSTEM_PROMPT }] },
            "contents": [{ "parts": [{
                "text": format!("Write a marketing partner sheet for the broker: \"{}\".", name)
            }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": partner_schema(),
            },
        });

        let response = match self.generate_content(&self.selection_model, body).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(partner = %name, error = %e, "Partner draft failed");
                return Ok(None);
            }
        };

        Ok(Self::candidate_text(&response).and_then(|text| serde_json::from_str(text).ok()))
    }
}

/// Structured-output schema for one analysis
fn analysis_schema() -> Value {
    let string_array = || json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "ticker": { "type": "STRING" },
            "importanceRank": { "type": "NUMBER" },
            "entryPrice": { "type": "NUMBER" },
            "isin": { "type": "STRING" },
            "name": { "type": "STRING" },
            "sector": { "type": "STRING" },
            "marketingHook": { "type": "STRING" },
            "swot": {
                "type": "OBJECT",
                "properties": {
                    "strengths": string_array(),
                    "weaknesses": string_array(),
                    "opportunities": string_array(),
                    "threats": string_array(),
                }
            },
            "mainScenario": {
                "type": "OBJECT",
                "properties": {
                    "probability": { "type": "NUMBER" },
                    "keyPhrase": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "supportingFactors": string_array(),
                }
            },
            "negativeScenario": {
                "type": "OBJECT",
                "properties": {
                    "probability": { "type": "NUMBER" },
                    "description": { "type": "STRING" },
                }
            },
            "neutralScenario": {
                "type": "OBJECT",
                "properties": {
                    "probability": { "type": "NUMBER" },
                    "description": { "type": "STRING" },
                }
            },
            "lucidityScore": {
                "type": "OBJECT",
                "properties": {
                    "total": { "type": "NUMBER" },
                    "readability": { "type": "NUMBER" },
                    "financialStability": { "type": "NUMBER" },
                    "externalDependency": { "type": "NUMBER" },
                    "narrativeVolatility": { "type": "NUMBER" },
                }
            },
            "marketAnticipations": string_array(),
            "realRisks": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": { "type": "STRING" },
                        "description": { "type": "STRING" },
                    }
                }
            },
            "invalidationPoints": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "event": { "type": "STRING" },
                        "observableSignal": { "type": "STRING" },
                    }
                }
            },
        },
        "required": [
            "ticker", "importanceRank", "entryPrice", "name", "sector", "marketingHook",
            "swot", "mainScenario", "lucidityScore", "realRisks", "invalidationPoints"
        ]
    })
}

/// Structured-output schema for a partner draft
fn partner_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": { "type": "STRING" },
            "strength": { "type": "STRING" },
            "description": { "type": "STRING" },
            "cta": { "type": "STRING" },
            "color": { "type": "STRING" },
        },
        "required": ["type", "strength", "description", "cta", "color"]
    })
}
