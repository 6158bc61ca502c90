//! Detect → classify → regress over one uploaded image.
//!
//! The three stages are placeholders: they resolve their model handle and
//! return fixed outputs regardless of pixel content.

use crate::models::ModelSet;
use crate::schema::{BoundingBox, Detection, FreshnessState, InferenceResult};
use image::DynamicImage;
use registry::ModelHandle;
use std::time::Instant;
use thiserror::Error;

const PLACEHOLDER_BBOX: BoundingBox = BoundingBox {
    x: 10,
    y: 10,
    width: 100,
    height: 100,
};
const PLACEHOLDER_LABEL: &str = "Apple";
const PLACEHOLDER_SCORE: f32 = 0.98;
const PLACEHOLDER_FRESHNESS: FreshnessState = FreshnessState::Fresh;
const PLACEHOLDER_DAYS_REMAINING: f32 = 5.4;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid image")]
    InvalidImage(#[source] image::ImageError),

    #[error("Model '{model}' is unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },
}

/// Decode uploaded bytes, guessing the format from the content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    image::load_from_memory(bytes).map_err(PipelineError::InvalidImage)
}

pub fn detect(detector: &ModelHandle, image: &DynamicImage) -> Vec<Detection> {
    tracing::trace!(
        model = %detector.name,
        version = %detector.version,
        width = image.width(),
        height = image.height(),
        "Running detector"
    );
    vec![Detection {
        bbox: PLACEHOLDER_BBOX,
        label: PLACEHOLDER_LABEL.to_string(),
        score: PLACEHOLDER_SCORE,
    }]
}

/// Region of `image` under `bbox`, clamped to the image bounds. May be empty.
pub fn crop(image: &DynamicImage, bbox: &BoundingBox) -> DynamicImage {
    image.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height)
}

pub fn classify(classifier: &ModelHandle, crop: &DynamicImage) -> FreshnessState {
    tracing::trace!(
        model = %classifier.name,
        width = crop.width(),
        height = crop.height(),
        "Classifying crop"
    );
    PLACEHOLDER_FRESHNESS
}

pub fn regress(regressor: &ModelHandle, crop: &DynamicImage) -> f32 {
    tracing::trace!(
        model = %regressor.name,
        width = crop.width(),
        height = crop.height(),
        "Estimating shelf life"
    );
    PLACEHOLDER_DAYS_REMAINING
}

/// Run the full pipeline on raw upload bytes.
///
/// `start` marks the beginning of the request; each result's `latency_ms`
/// is the time elapsed since then when that result was produced.
pub fn predict(
    models: &ModelSet,
    bytes: &[u8],
    start: Instant,
) -> Result<Vec<InferenceResult>, PipelineError> {
    let image = decode_image(bytes)?;

    let detector = models.detector.require()?;
    let detections = detect(detector, &image);

    let mut results = Vec::with_capacity(detections.len());
    for detection in detections {
        let region = crop(&image, &detection.bbox);

        let freshness = classify(models.classifier.require()?, &region);
        let days_remaining = regress(models.regressor.require()?, &region);

        results.push(InferenceResult {
            label: detection.label,
            freshness,
            days_remaining,
            confidence: detection.score,
            bbox: detection.bbox.to_xywh(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        });
    }

    Ok(results)
}
