//! HTTP request tool — bounded outbound fetches.
//!
//! Lets the model pull external data (weather forecasts, nutrient feed
//! charts) during a cycle. Responses are read up to a byte cap before the
//! executor's payload ceiling applies; the cap bounds memory, the ceiling
//! bounds context.

use async_trait::async_trait;
use std::time::Duration;
use verdant_core::error::ToolError;
use verdant_core::tool::{ArgKind, Tool, ToolSchema};

/// Bytes read from a response body at most.
const MAX_RESPONSE_BYTES: usize = 16 * 1024;

pub struct HttpRequestTool {
    client: reqwest::Client,
}

impl HttpRequestTool {
    pub fn new() -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "http_request".into(),
                reason: format!("HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Tool for HttpRequestTool {
    fn name(&self) -> &str {
        "http_request"
    }

    fn description(&self) -> &str {
        "Make an HTTP GET or POST request to a URL. Returns the status code and \
         the start of the response body."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .required("url", ArgKind::String, "The URL to request")
            .optional("method", ArgKind::String, "GET or POST (default GET)")
            .optional("body", ArgKind::String, "Request body (POST only)")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let url = arguments["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "URL must start with http:// or https://".into(),
            ));
        }

        let method = arguments["method"].as_str().unwrap_or("GET").to_uppercase();
        let request = match method.as_str() {
            "GET" => self.client.get(url),
            "POST" => {
                let body = arguments["body"].as_str().unwrap_or("").to_string();
                self.client.post(url).body(body)
            }
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "Invalid HTTP method: {other}. Must be GET or POST."
                )));
            }
        };

        let response = request.send().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: "http_request".into(),
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: "http_request".into(),
            reason: e.to_string(),
        })?;

        let mut cut = body.len().min(MAX_RESPONSE_BYTES);
        while cut > 0 && !body.is_char_boundary(cut) {
            cut -= 1;
        }

        Ok(format!("HTTP {status}\n{}", &body[..cut]))
    }
}
