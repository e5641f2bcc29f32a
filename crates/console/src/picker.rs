use anyhow::{Context, Result};

use trainerdeck_api::SelectPathRequest;
use trainerdeck_api_client::ApiClient;
use trainerdeck_core::settings::PathTarget;

/// Thin proxy to the backend's native file/folder chooser.
#[derive(Clone)]
pub struct PathPicker {
    api: ApiClient,
}

impl PathPicker {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Ask the backend for a path. `None` when the dialog was cancelled.
    pub async fn pick(&self, target: &PathTarget) -> Result<Option<String>> {
        let req = SelectPathRequest {
            kind: target.kind,
            extensions: target.extensions.clone(),
        };
        let resp = self
            .api
            .select_path(&req)
            .await
            .with_context(|| format!("Failed to open {} chooser", target.kind.as_str()))?;
        Ok(resp.picked().map(str::to_string))
    }
}
