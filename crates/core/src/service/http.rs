//! reqwest-backed implementation of [`StageService`].

use async_trait::async_trait;
use cq_protocol::{ArtifactKind, Credentials};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tracing::debug;

use crate::service::base::{ServiceError, ServiceResult, SpecFile, StageService};

/// Talks to the CoverIQ backend over plain HTTP.
///
/// No per-request timeout is set here; the coordinator bounds each stage
/// as a whole.
#[derive(Clone, Debug)]
pub struct HttpStageService {
    client: Client,
    base_url: String,
}

impl HttpStageService {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> ServiceResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("coveriq/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The backend base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> ServiceResult<Value> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        read_json(check_status(response).await?).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> ServiceResult<Value> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        read_json(check_status(response).await?).await
    }
}

/// Turn a non-success response into [`ServiceError::Status`].
async fn check_status(response: Response) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

async fn read_json(response: Response) -> ServiceResult<Value> {
    response
        .json::<Value>()
        .await
        .map_err(|e| ServiceError::Decode(e.to_string()))
}

/// Pull the `detail` field out of an error body.
///
/// FastAPI sends a string for handled errors and a list of objects for
/// validation errors; the latter is passed through as compact JSON.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::Null => None,
        Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl StageService for HttpStageService {
    async fn extract_design(&self, design_url: &str) -> ServiceResult<Value> {
        self.post_json("/parse-figma", &json!({ "figma_url": design_url }))
            .await
    }

    async fn fetch_design(&self) -> ServiceResult<Value> {
        self.get_json(ArtifactKind::DesignJson.path()).await
    }

    async fn generate_feature(
        &self,
        design_data: &Value,
        feature_description: Option<&str>,
    ) -> ServiceResult<Value> {
        self.post_json(
            "/get-feature-representation",
            &json!({
                "figma_data": design_data,
                "feature_description": feature_description,
            }),
        )
        .await
    }

    async fn fetch_feature(&self) -> ServiceResult<Value> {
        self.get_json(ArtifactKind::FeatureJson.path()).await
    }

    async fn generate_plan(&self, feature_list: &Value) -> ServiceResult<Value> {
        self.post_json("/generate-test-plan", &json!({ "feature_list": feature_list }))
            .await
    }

    async fn fetch_plan(&self) -> ServiceResult<Value> {
        self.get_json(ArtifactKind::PlanJson.path()).await
    }

    async fn generate_cases(&self, test_plan: &Value) -> ServiceResult<Value> {
        self.post_json("/generate-test-cases", &json!({ "test_plan": test_plan }))
            .await
    }

    async fn download(&self, artifact: ArtifactKind) -> ServiceResult<Vec<u8>> {
        let url = self.url(artifact.path());
        debug!(%url, %artifact, "download");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn upload_specs(&self, files: &[SpecFile]) -> ServiceResult<Value> {
        let url = self.url("/upload-feature-file");
        debug!(%url, count = files.len(), "multipart upload");
        let form = files.iter().fold(Form::new(), |form, file| {
            form.part(
                "files",
                Part::bytes(file.contents.clone()).file_name(file.name.clone()),
            )
        });
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        read_json(check_status(response).await?).await
    }

    async fn fetch_specs(&self) -> ServiceResult<Value> {
        self.get_json("/data/cucumber").await
    }

    async fn generate_code(&self, feature_text: &Value, llm_key: &str) -> ServiceResult<Value> {
        self.post_json(
            "/generate-test-code",
            &json!({ "feature_text": feature_text, "gemini_key": llm_key }),
        )
        .await
    }

    async fn save_credentials(&self, credentials: &Credentials) -> ServiceResult<Value> {
        self.post_json(
            "/update-env",
            &json!({
                "figma_token": credentials.design_token,
                "gemini_key": credentials.llm_key,
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail": "boom"}"#),
            Some("boom".to_string())
        );
    }

    #[test]
    fn test_extract_detail_structured() {
        let detail = extract_detail(r#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#)
            .expect("structured detail");
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_extract_detail_missing() {
        assert_eq!(extract_detail(r#"{"error": "nope"}"#), None);
        assert_eq!(extract_detail(r#"{"detail": null}"#), None);
        assert_eq!(extract_detail("Internal Server Error"), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let service = HttpStageService::new("http://localhost:8000/").expect("client");
        assert_eq!(service.base_url(), "http://localhost:8000");
        assert_eq!(service.url("/data/plan"), "http://localhost:8000/data/plan");
    }
}
