//! Client for the remote prediction endpoints.
//!
//! Two models sit behind HTTP: one estimates remaining useful life from the
//! full feature sequence, the other estimates bit temperature from the
//! temperature-excluded flat sequence. Both are reached through the
//! [`Predictor`] trait so the monitor does not care how they are called.

use crate::core::features::{FeatureWindow, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Prediction endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Whether predictions are requested at all
    pub enabled: bool,
    /// Base URL of the inference service
    pub base_url: String,
    /// Path of the remaining-useful-life endpoint
    pub rul_path: String,
    /// Path of the temperature endpoint
    pub temperature_path: String,
    /// Optional bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://127.0.0.1:5000".to_string(),
            rul_path: "/predict".to_string(),
            temperature_path: "/predict_temp".to_string(),
            token: None,
            timeout_secs: 10,
        }
    }
}

impl PredictorConfig {
    /// Create an enabled configuration for a base URL with default paths.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Full URL of the remaining-useful-life endpoint.
    pub fn rul_url(&self) -> String {
        self.join(&self.rul_path)
    }

    /// Full URL of the temperature endpoint.
    pub fn temperature_url(&self) -> String {
        self.join(&self.temperature_path)
    }
}

/// Predictor error types.
#[derive(Debug)]
pub enum PredictorError {
    /// Predictions are switched off
    Disabled,
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// Response body was not a usable prediction
    MalformedResponse(String),
}

impl std::fmt::Display for PredictorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictorError::Disabled => write!(f, "Predictor disabled"),
            PredictorError::Config(msg) => write!(f, "Predictor config error: {msg}"),
            PredictorError::Network(msg) => write!(f, "Predictor network error: {msg}"),
            PredictorError::Server { status, message } => {
                write!(f, "Predictor server error ({status}): {message}")
            }
            PredictorError::MalformedResponse(msg) => {
                write!(f, "Malformed prediction response: {msg}")
            }
        }
    }
}

impl std::error::Error for PredictorError {}

/// Request body for the remaining-useful-life model: a batch of one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulRequest {
    pub sequence: Vec<Vec<[f64; FEATURE_COUNT]>>,
}

impl RulRequest {
    pub fn from_window(window: &FeatureWindow) -> Self {
        Self {
            sequence: vec![window.full_sequence()],
        }
    }
}

/// Request body for the temperature model: a batch of one flat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRequest {
    pub sequence: Vec<Vec<f64>>,
}

impl TemperatureRequest {
    pub fn from_window(window: &FeatureWindow) -> Self {
        Self {
            sequence: vec![window.temperature_excluded()],
        }
    }
}

const PREDICTION_KEYS: [&str; 5] = ["prediction", "predictions", "rul", "temperature", "value"];

/// Pull a single number out of a model response.
///
/// Accepts a bare number, a (nested) array whose first element is a number,
/// or an object carrying one of the usual prediction keys.
pub fn extract_prediction(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::Array(items) => items.first().and_then(extract_prediction),
        serde_json::Value::Object(map) => PREDICTION_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(extract_prediction)),
        _ => None,
    }
}

/// Result of one prediction call as shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Available { value: f64 },
    Unavailable { reason: String },
}

impl PredictionOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            PredictionOutcome::Available { value } => Some(*value),
            PredictionOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PredictionOutcome::Available { .. })
    }
}

impl From<Result<f64, PredictorError>> for PredictionOutcome {
    fn from(result: Result<f64, PredictorError>) -> Self {
        match result {
            Ok(value) => PredictionOutcome::Available { value },
            Err(e) => PredictionOutcome::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

impl std::fmt::Display for PredictionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionOutcome::Available { value } => write!(f, "{value:.2}"),
            PredictionOutcome::Unavailable { .. } => write!(f, "prediction unavailable"),
        }
    }
}

/// Anything that can answer the two prediction questions.
pub trait Predictor {
    /// Remaining useful life for a full feature sequence.
    fn predict_rul(&self, request: &RulRequest) -> Result<f64, PredictorError>;

    /// Temperature estimate for a temperature-excluded sequence.
    fn predict_temperature(&self, request: &TemperatureRequest) -> Result<f64, PredictorError>;
}

/// Predictor used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPredictor;

impl Predictor for DisabledPredictor {
    fn predict_rul(&self, _request: &RulRequest) -> Result<f64, PredictorError> {
        Err(PredictorError::Disabled)
    }

    fn predict_temperature(&self, _request: &TemperatureRequest) -> Result<f64, PredictorError> {
        Err(PredictorError::Disabled)
    }
}

/// Async HTTP client for the prediction endpoints.
#[cfg(feature = "predictor")]
pub struct PredictionClient {
    config: PredictorConfig,
    client: reqwest::Client,
}

#[cfg(feature = "predictor")]
impl PredictionClient {
    /// Create a new prediction client.
    pub fn new(config: PredictorConfig) -> Result<Self, PredictorError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| PredictorError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Request a remaining-useful-life estimate.
    pub async fn predict_rul(&self, request: &RulRequest) -> Result<f64, PredictorError> {
        self.post(self.config.rul_url(), request).await
    }

    /// Request a temperature estimate.
    pub async fn predict_temperature(
        &self,
        request: &TemperatureRequest,
    ) -> Result<f64, PredictorError> {
        self.post(self.config.temperature_url(), request).await
    }

    async fn post<T: Serialize>(&self, url: String, body: &T) -> Result<f64, PredictorError> {
        let mut request = self.client.post(&url).json(body);
        if let Some(ref token) = self.config.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PredictorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PredictorError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PredictorError::MalformedResponse(e.to_string()))?;

        let value = extract_prediction(&body)
            .ok_or_else(|| PredictorError::MalformedResponse(format!("no numeric prediction in {body}")))?;

        tracing::debug!(url = %url, value, "Prediction received");
        Ok(value)
    }
}

/// Blocking prediction client for use in synchronous contexts.
#[cfg(feature = "predictor")]
pub struct BlockingPredictionClient {
    inner: PredictionClient,
    runtime: tokio::runtime::Runtime,
}

#[cfg(feature = "predictor")]
impl BlockingPredictionClient {
    /// Create a new blocking prediction client.
    ///
    /// Must not be created or dropped from inside an async context.
    pub fn new(config: PredictorConfig) -> Result<Self, PredictorError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PredictorError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: PredictionClient::new(config)?,
            runtime,
        })
    }

    pub fn config(&self) -> &PredictorConfig {
        self.inner.config()
    }
}

#[cfg(feature = "predictor")]
impl Predictor for BlockingPredictionClient {
    fn predict_rul(&self, request: &RulRequest) -> Result<f64, PredictorError> {
        self.runtime.block_on(self.inner.predict_rul(request))
    }

    fn predict_temperature(&self, request: &TemperatureRequest) -> Result<f64, PredictorError> {
        self.runtime.block_on(self.inner.predict_temperature(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::types::Sample;
    use serde_json::json;

    #[test]
    fn test_predictor_config_urls() {
        let config = PredictorConfig::new("http://10.0.0.5:5000/");
        assert_eq!(config.rul_url(), "http://10.0.0.5:5000/predict");
        assert_eq!(config.temperature_url(), "http://10.0.0.5:5000/predict_temp");
        assert!(config.enabled);
        assert!(!PredictorConfig::default().enabled);
    }

    #[test]
    fn test_request_shapes() {
        let samples = vec![Sample::new(30.0, 4900, 10.0, 2.0, 5.0); 20];
        let window = FeatureWindow::from_samples(&samples);

        let rul = RulRequest::from_window(&window);
        assert_eq!(rul.sequence.len(), 1);
        assert_eq!(rul.sequence[0].len(), 20);

        let temperature = TemperatureRequest::from_window(&window);
        assert_eq!(temperature.sequence.len(), 1);
        assert_eq!(temperature.sequence[0].len(), 120);

        let body = serde_json::to_value(&rul).unwrap();
        assert_eq!(body["sequence"][0][0].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_extract_prediction_shapes() {
        assert_eq!(extract_prediction(&json!(12.5)), Some(12.5));
        assert_eq!(extract_prediction(&json!({"prediction": 3.0})), Some(3.0));
        assert_eq!(extract_prediction(&json!({"predictions": [[7.25]]})), Some(7.25));
        assert_eq!(extract_prediction(&json!({"rul": 140})), Some(140.0));
        assert_eq!(extract_prediction(&json!([44.1])), Some(44.1));
        assert_eq!(extract_prediction(&json!({"error": "bad input"})), None);
        assert_eq!(extract_prediction(&json!("12")), None);
        assert_eq!(extract_prediction(&json!([])), None);
    }

    #[test]
    fn test_disabled_predictor_is_unavailable() {
        let window = FeatureWindow::default();
        let outcome: PredictionOutcome = DisabledPredictor
            .predict_rul(&RulRequest::from_window(&window))
            .into();
        assert!(!outcome.is_available());
        assert_eq!(outcome.to_string(), "prediction unavailable");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = PredictionOutcome::Available { value: 88.0 };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["value"], 88.0);
        assert_eq!(outcome.value(), Some(88.0));
    }
}
