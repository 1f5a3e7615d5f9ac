//! Deterministic `StageService` for coordinator tests.

use async_trait::async_trait;
use cq_core::service::{ServiceError, ServiceResult, SpecFile, StageService};
use cq_protocol::{ArtifactKind, Credentials};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::fixtures;

/// Answers every call from fixtures and records the call names in order.
///
/// Individual calls can be made to fail, and all calls can be delayed
/// (use a paused tokio clock to keep tests fast).
#[derive(Default)]
pub struct MockStageService {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, ServiceError>>,
    delay: Mutex<Option<Duration>>,
    specs: Mutex<Option<Value>>,
}

#[allow(dead_code)]
impl MockStageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named call fail with `error`.
    pub fn fail_on(self, call: &str, error: ServiceError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(call.to_string(), error);
        self
    }

    /// Delay every call by `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Names of the calls made so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    async fn call(&self, name: &str) -> ServiceResult<()> {
        self.calls.lock().unwrap().push(name.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().unwrap().get(name) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StageService for MockStageService {
    async fn extract_design(&self, _design_url: &str) -> ServiceResult<Value> {
        self.call("extract_design").await?;
        Ok(fixtures::design_document())
    }

    async fn fetch_design(&self) -> ServiceResult<Value> {
        self.call("fetch_design").await?;
        Ok(fixtures::design_document())
    }

    async fn generate_feature(
        &self,
        _design_data: &Value,
        _feature_description: Option<&str>,
    ) -> ServiceResult<Value> {
        self.call("generate_feature").await?;
        Ok(fixtures::feature_ack())
    }

    async fn fetch_feature(&self) -> ServiceResult<Value> {
        self.call("fetch_feature").await?;
        Ok(fixtures::feature_document())
    }

    async fn generate_plan(&self, _feature_list: &Value) -> ServiceResult<Value> {
        self.call("generate_plan").await?;
        Ok(fixtures::test_plan())
    }

    async fn fetch_plan(&self) -> ServiceResult<Value> {
        self.call("fetch_plan").await?;
        Ok(fixtures::test_plan())
    }

    async fn generate_cases(&self, _test_plan: &Value) -> ServiceResult<Value> {
        self.call("generate_cases").await?;
        Ok(fixtures::test_cases())
    }

    async fn download(&self, artifact: ArtifactKind) -> ServiceResult<Vec<u8>> {
        self.call(&format!("download:{artifact}")).await?;
        Ok(match artifact {
            ArtifactKind::FeatureArchive => fixtures::feature_archive(),
            ArtifactKind::CodeArchive => b"PK\x03\x04test_checkout.py".to_vec(),
            ArtifactKind::PlanMarkdown => b"# Test Plan\n".to_vec(),
            _ => b"{}".to_vec(),
        })
    }

    async fn upload_specs(&self, files: &[SpecFile]) -> ServiceResult<Value> {
        self.call("upload_specs").await?;
        let texts: serde_json::Map<String, Value> = files
            .iter()
            .map(|f| {
                (
                    f.name.clone(),
                    Value::String(String::from_utf8_lossy(&f.contents).into_owned()),
                )
            })
            .collect();
        *self.specs.lock().unwrap() = Some(Value::Object(texts));
        Ok(json!({ "message": format!("{} file(s) uploaded", files.len()) }))
    }

    async fn fetch_specs(&self) -> ServiceResult<Value> {
        self.call("fetch_specs").await?;
        Ok(self.specs.lock().unwrap().clone().unwrap_or_else(|| json!({})))
    }

    async fn generate_code(&self, _feature_text: &Value, _llm_key: &str) -> ServiceResult<Value> {
        self.call("generate_code").await?;
        Ok(json!({ "message": "generated" }))
    }

    async fn save_credentials(&self, _credentials: &Credentials) -> ServiceResult<Value> {
        self.call("save_credentials").await?;
        Ok(json!({ "status": "ok" }))
    }
}
