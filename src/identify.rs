//! Plant identification through a generative vision API
//!
//! Sends one photo to a Gemini-style `generateContent` endpoint, asks for a
//! JSON answer and maps it to an [`Identification`]. Either every field comes
//! back or the call fails; there are no partial results. The capture flow in
//! [`crate::game`] does not call this; it is exposed for the HTTP surface and
//! the CLI.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::IdentificationConfig;

const PROMPT: &str = "Identify this plant from the image. Tell me its common name, \
scientific name, and a short interesting fact. Return the data in a clear JSON structure \
with the keys \"name\", \"scientificName\" and \"description\".";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    pub name: String,
    pub scientific_name: String,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentifyError {
    #[error("identification API key is missing (set {0})")]
    MissingApiKey(String),
    #[error("image payload is empty")]
    EmptyImage,
    #[error("identification request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("identification service returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("no identification text received")]
    EmptyResponse,
    #[error("identification answer is malformed: {0}")]
    Malformed(String),
}

/// Model answer as it tends to arrive; key spelling varies between replies
#[derive(Debug, Deserialize)]
struct RawAnswer {
    #[serde(alias = "commonName", alias = "common_name", alias = "plantName")]
    name: Option<String>,
    #[serde(alias = "scientificName", alias = "latinName")]
    scientific_name: Option<String>,
    #[serde(
        alias = "fact",
        alias = "interestingFact",
        alias = "interesting_fact",
        alias = "shortFact"
    )]
    description: Option<String>,
}

pub struct GeminiIdentifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiIdentifier {
    pub fn new(config: &IdentificationConfig, api_key: String) -> Result<Self, IdentifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Build from config, reading the key from the configured environment variable
    pub fn from_config(config: &IdentificationConfig) -> Result<Self, IdentifyError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| IdentifyError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    pub async fn identify(&self, image_base64: &str) -> Result<Identification, IdentifyError> {
        let data = strip_data_url(image_base64);
        if data.is_empty() {
            return Err(IdentifyError::EmptyImage);
        }

        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let body = request_body(data);
        debug!(model = %self.model, bytes = data.len(), "sending identification request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            warn!(status = status.as_u16(), "identification service error");
            return Err(IdentifyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response.json().await?;
        let text = extract_text(&json).ok_or(IdentifyError::EmptyResponse)?;
        parse_identification(text)
    }
}

fn request_body(image_data: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [
                {"text": PROMPT},
                {"inlineData": {"mimeType": "image/jpeg", "data": image_data}}
            ]
        }],
        "generationConfig": {"responseMimeType": "application/json"}
    })
}

/// Accept either bare base64 or a `data:<mime>;base64,<payload>` URL
pub fn strip_data_url(image: &str) -> &str {
    let trimmed = image.trim();
    if trimmed.starts_with("data:") {
        trimmed
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    } else {
        trimmed
    }
}

fn extract_text(json: &serde_json::Value) -> Option<&str> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(serde_json::Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

/// Parse the model's JSON answer; fenced code blocks are tolerated
pub fn parse_identification(text: &str) -> Result<Identification, IdentifyError> {
    let cleaned = strip_code_fence(text.trim());
    let raw: RawAnswer =
        serde_json::from_str(cleaned).map_err(|e| IdentifyError::Malformed(e.to_string()))?;

    let field = |value: Option<String>, key: &str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| IdentifyError::Malformed(format!("missing {key}")))
    };

    Ok(Identification {
        name: field(raw.name, "name")?,
        scientific_name: field(raw.scientific_name, "scientific name")?,
        description: field(raw.description, "description")?,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_data_url() {
        assert_eq!(strip_data_url("data:image/jpeg;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("  QUJD \n"), "QUJD");
        assert_eq!(strip_data_url("data:image/png;base64"), "");
    }

    #[test]
    fn test_parse_camel_case_answer() {
        let text = r#"{"name": "Banyan", "scientificName": "Ficus microcarpa", "description": "Grows aerial roots."}"#;
        let id = parse_identification(text).unwrap();

        assert_eq!(id.name, "Banyan");
        assert_eq!(id.scientific_name, "Ficus microcarpa");
        assert_eq!(id.description, "Grows aerial roots.");
    }

    #[test]
    fn test_parse_alias_keys_and_fence() {
        let text = "```json\n{\"commonName\": \"Lily\", \"scientific_name\": \"Lilium\", \"interestingFact\": \"Toxic to cats.\"}\n```";
        let id = parse_identification(text).unwrap();

        assert_eq!(id.name, "Lily");
        assert_eq!(id.scientific_name, "Lilium");
        assert_eq!(id.description, "Toxic to cats.");
    }

    #[test]
    fn test_partial_answer_rejected() {
        let err = parse_identification(r#"{"name": "Lily"}"#).unwrap_err();
        assert!(matches!(err, IdentifyError::Malformed(msg) if msg.contains("scientific")));

        let err = parse_identification("not json").unwrap_err();
        assert!(matches!(err, IdentifyError::Malformed(_)));
    }

    #[test]
    fn test_extract_text() {
        let json = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
        });
        assert_eq!(extract_text(&json), Some("{}"));

        let empty = serde_json::json!({"candidates": []});
        assert_eq!(extract_text(&empty), None);
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("QUJD");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "QUJD");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_missing_key() {
        let config = IdentificationConfig {
            api_key_env: "PLANTGO_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..IdentificationConfig::default()
        };
        let err = GeminiIdentifier::from_config(&config).err().unwrap();
        assert!(matches!(err, IdentifyError::MissingApiKey(name) if name == "PLANTGO_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[tokio::test]
    async fn test_empty_image_rejected_before_request() {
        let config = IdentificationConfig::default();
        let identifier = GeminiIdentifier::new(&config, "k".into()).unwrap();

        let err = identifier.identify("data:image/jpeg;base64,").await.unwrap_err();
        assert!(matches!(err, IdentifyError::EmptyImage));
    }
}
