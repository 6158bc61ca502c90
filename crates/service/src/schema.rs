use serde::{Deserialize, Serialize};

/// Qualitative freshness of a detected fruit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreshnessState {
    Fresh,
    Ripe,
    Overripe,
    Rotten,
}

/// Axis-aligned box in pixel coordinates, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn to_xywh(&self) -> [f32; 4] {
        [
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        ]
    }
}

/// Detector output for a single object.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: String,
    pub score: f32,
}

/// One entry of the `/predict` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub label: String,
    pub freshness: FreshnessState,
    pub days_remaining: f32,
    pub confidence: f32,
    /// `[x, y, width, height]`
    pub bbox: [f32; 4],
    pub latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Seconds since the UNIX epoch.
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub detector_version: String,
    pub classifier_version: String,
    pub regressor_version: String,
    pub env: String,
}

impl ModelMetadata {
    /// Versions advertised by `/model/metadata`. Fixed, independent of the
    /// `ENVIRONMENT` the process runs under.
    pub fn published() -> Self {
        Self {
            detector_version: "v1.4".to_string(),
            classifier_version: "v2.1".to_string(),
            regressor_version: "v1.1".to_string(),
            env: common::Environment::Production.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_serializes_capitalised() {
        assert_eq!(serde_json::to_string(&FreshnessState::Fresh).unwrap(), "\"Fresh\"");
        assert_eq!(
            serde_json::to_string(&FreshnessState::Overripe).unwrap(),
            "\"Overripe\""
        );
    }

    #[test]
    fn inference_result_field_names() {
        let result = InferenceResult {
            label: "Apple".to_string(),
            freshness: FreshnessState::Fresh,
            days_remaining: 5.4,
            confidence: 0.98,
            bbox: [10.0, 10.0, 100.0, 100.0],
            latency_ms: 1.5,
        };
        let value = serde_json::to_value(&result).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            ["bbox", "confidence", "days_remaining", "freshness", "label", "latency_ms"]
        );
        assert_eq!(value["freshness"], "Fresh");
    }

    #[test]
    fn published_metadata_is_fixed() {
        let metadata = ModelMetadata::published();
        assert_eq!(metadata.detector_version, "v1.4");
        assert_eq!(metadata.classifier_version, "v2.1");
        assert_eq!(metadata.regressor_version, "v1.1");
        assert_eq!(metadata.env, "production");
    }
}
