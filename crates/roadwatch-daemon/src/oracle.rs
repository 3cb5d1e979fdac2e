use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use roadwatch_core::OracleError;
use serde::Deserialize;
use serde_json::json;

/// The vision-language oracle boundary. Faked in tests.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, prompt: &str, image: &[u8], mime: &str)
        -> Result<String, OracleError>;
}

/// Gemini-style `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

/// Response envelope with every layer optional, so extraction can report
/// exactly which layer was missing.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    pub parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

/// Walk the envelope layers in order: candidates, content parts, text.
pub fn extract_text(envelope: GenerateResponse) -> Result<String, OracleError> {
    let candidate = envelope
        .candidates
        .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
        .ok_or(OracleError::NoCandidates)?;

    let mut parts = candidate
        .content
        .and_then(|c| c.parts)
        .filter(|p| !p.is_empty())
        .ok_or(OracleError::NoContent)?;

    let text = parts.remove(0).text.ok_or(OracleError::EmptyText)?;
    if text.trim().is_empty() {
        return Err(OracleError::EmptyText);
    }
    Ok(text)
}

#[async_trait]
impl Oracle for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        image: &[u8],
        mime: &str,
    ) -> Result<String, OracleError> {
        // Low temperature and a small output cap to favor the mandated
        // JSON schema; the response is still treated as untrusted.
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": prompt },
                    { "inline_data": { "mime_type": mime, "data": BASE64.encode(image) } },
                    { "text": "Analyze this road image now." },
                ],
            }],
            "generationConfig": { "temperature": 0.1, "maxOutputTokens": 256 },
        });

        let resp = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OracleError::Http(status.as_u16()));
        }

        let envelope: GenerateResponse =
            resp.json().await.map_err(|_| OracleError::NoResponse)?;
        extract_text(envelope)
    }
}
