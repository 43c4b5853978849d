//! Best-effort motivational-summary client.
//!
//! The study protocol treats this as optional enrichment: any failure
//! degrades to a deterministic fallback string instead of an error.
//! Saving the daily log must not depend on this call.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use obi_core::config::InsightConfig;
use obi_core::domain::DailyLog;
use obi_core::domain::Phase;

pub const FALLBACK_NOT_CONFIGURED: &str =
    "API Key not configured. Unable to generate insights.";
pub const FALLBACK_TRANSPORT: &str =
    "Great job recording your data today! Consistency is key.";
pub const FALLBACK_EMPTY: &str =
    "Keep up the good work! Consistent data helps us understand your health better.";

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Internal failure taxonomy. Never crosses the public API; it only
/// selects a fallback and a log line.
#[derive(Debug, Error)]
enum InsightError {
    #[error("http client unavailable")]
    ClientUnavailable,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("response carried no text")]
    EmptyResponse,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize, Default)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InsightClient {
    config: InsightConfig,
    http: Option<reqwest::blocking::Client>,
}

impl InsightClient {
    pub fn new(config: InsightConfig) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| log::warn!("insight http client unavailable: {err}"))
            .ok();
        Self { config, http }
    }

    /// Returns encouragement text for a finished day. Infallible by
    /// contract: every failure path degrades to a fixed string.
    pub fn generate_daily_insight(&self, log: &DailyLog, phase: Phase) -> String {
        let Some(api_key) = self.config.api_key.as_deref() else {
            log::warn!("insight generator skipped: no API key configured");
            return FALLBACK_NOT_CONFIGURED.to_string();
        };
        match self.request(api_key, log, phase) {
            Ok(text) => text,
            Err(InsightError::EmptyResponse) => FALLBACK_EMPTY.to_string(),
            Err(err) => {
                log::warn!("insight generator failed: {err}");
                FALLBACK_TRANSPORT.to_string()
            }
        }
    }

    fn request(&self, api_key: &str, log: &DailyLog, phase: Phase) -> Result<String, InsightError> {
        let http = self.http.as_ref().ok_or(InsightError::ClientUnavailable)?;
        let base = self
            .config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/');
        let url = format!(
            "{base}/v1beta/models/{model}:generateContent?key={api_key}",
            model = self.config.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(log, phase) }] }]
        });
        let response: GenerateContentResponse = http
            .post(&url)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        extract_text(response).ok_or(InsightError::EmptyResponse)
    }
}

/// Structured log fields flattened into the prompt; anything the
/// participant skipped shows up as `N/A`. The reply is treated as opaque.
fn build_prompt(log: &DailyLog, phase: Phase) -> String {
    let phase_label = match phase {
        Phase::Blank => "Observation (No Stimulation)",
        Phase::Stimulation => "Intervention (Active Stimulation)",
    };
    let weight = log
        .morning_stats
        .as_ref()
        .map_or("N/A".to_string(), |stats| format!("{}", stats.weight));
    let breakfast_score = log
        .appetite
        .as_ref()
        .map_or("N/A".to_string(), |a| a.breakfast_score.to_string());
    let dinner_score = log
        .appetite
        .as_ref()
        .map_or("N/A".to_string(), |a| a.dinner_score.to_string());
    let device = if log.device_usage.as_ref().is_some_and(|u| u.confirmed) {
        "Completed"
    } else {
        "Missed"
    };
    format!(
        "Act as a supportive medical health assistant for an obesity \
         intervention experiment.\n\
         \n\
         Current Phase: {phase_label}.\n\
         \n\
         User Data for today:\n\
         - Morning Weight: {weight} kg\n\
         - Breakfast Appetite Score (0-100): {breakfast_score}\n\
         - Dinner Appetite Score (0-100): {dinner_score}\n\
         - Device Usage: {device}\n\
         \n\
         Provide a brief, encouraging 2-sentence feedback message for the \
         user. If in the Blank phase, focus on consistency of data \
         recording. If in the Stimulation phase, focus on how they are \
         feeling and adhering to the protocol. Do not give medical advice, \
         just motivation regarding the data collection."
    )
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let text = response
        .candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .find_map(|part| part.text)?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use obi_core::domain::AppetiteStats;
    use obi_core::domain::DeviceUsageStats;
    use obi_core::domain::MorningStats;

    use super::*;

    fn day_log(filled: bool) -> DailyLog {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        let mut log = DailyLog::fresh(5, now);
        if filled {
            log.morning_stats = Some(MorningStats {
                weight: 71.2,
                body_fat_percentage: None,
                muscle_mass: None,
                visceral_fat: None,
                bmr: None,
                submitted_at: Some(now),
                notes: None,
            });
            log.appetite = Some(AppetiteStats {
                breakfast_score: 40,
                dinner_score: 65,
                breakfast_time: None,
                dinner_time: None,
            });
            log.device_usage = Some(DeviceUsageStats {
                confirmed: true,
                duration_minutes: 30,
                intensity_level: 0,
                timestamp: now,
            });
        }
        log
    }

    #[test]
    fn missing_api_key_returns_the_exact_fallback() {
        let client = InsightClient::new(InsightConfig::default());
        let text = client.generate_daily_insight(&day_log(true), Phase::Blank);
        assert_eq!(text, FALLBACK_NOT_CONFIGURED);
    }

    #[test]
    fn prompt_carries_the_structured_fields() {
        let prompt = build_prompt(&day_log(true), Phase::Stimulation);
        assert!(prompt.contains("Intervention (Active Stimulation)"));
        assert!(prompt.contains("Morning Weight: 71.2 kg"));
        assert!(prompt.contains("Breakfast Appetite Score (0-100): 40"));
        assert!(prompt.contains("Dinner Appetite Score (0-100): 65"));
        assert!(prompt.contains("Device Usage: Completed"));
    }

    #[test]
    fn prompt_marks_missing_data_as_not_available() {
        let prompt = build_prompt(&day_log(false), Phase::Blank);
        assert!(prompt.contains("Observation (No Stimulation)"));
        assert!(prompt.contains("Morning Weight: N/A kg"));
        assert!(prompt.contains("Device Usage: Missed"));
    }

    #[test]
    fn reply_text_is_extracted_from_the_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":" Nice work today. "}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response), Some("Nice work today.".to_string()));
    }

    #[test]
    fn blank_or_absent_reply_text_is_treated_as_empty() {
        let no_candidates: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(extract_text(no_candidates), None);

        let blank: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(blank), None);
    }
}
