use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub insight: InsightConfig,
}

/// Settings for the motivational-summary call. Everything has a usable
/// default; a missing API key only degrades to the fallback text.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct InsightConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// Override for the generateContent base URL (tests, proxies).
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            endpoint: None,
            timeout_secs: 10,
        }
    }
}
