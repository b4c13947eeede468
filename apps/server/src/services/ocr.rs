// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text detection client (Google Vision `images:annotate`).

use std::future::Future;

use base64::{engine::general_purpose::STANDARD, Engine};
use panelcut_core::{OcrOutput, Point2D, TextRegion};
use serde::Deserialize;

use crate::config::OcrConfig;
use crate::error::CollaboratorError;

const SERVICE: &str = "OCR service";

/// Reads the text off a drawing image.
pub trait TextDetector: Send + Sync {
    fn detect_text(
        &self,
        image: &[u8],
    ) -> impl Future<Output = Result<OcrOutput, CollaboratorError>> + Send;
}

/// REST client for the Vision text detection endpoint.
pub struct OcrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageAnnotation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageAnnotation {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    error: Option<AnnotationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Default, Deserialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

/// Vision omits zero coordinates.
#[derive(Debug, Default, Deserialize)]
struct Vertex {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Deserialize)]
struct AnnotationError {
    #[serde(default)]
    message: String,
}

fn into_ocr_output(response: AnnotateResponse) -> Result<OcrOutput, CollaboratorError> {
    let Some(annotation) = response.responses.into_iter().next() else {
        return Ok(OcrOutput::default());
    };
    if let Some(error) = annotation.error {
        return Err(CollaboratorError::Decode {
            service: SERVICE,
            message: error.message,
        });
    }

    // First annotation is the whole text block, the rest are words
    let mut annotations = annotation.text_annotations.into_iter();
    let full_text = annotations
        .next()
        .map(|a| a.description)
        .unwrap_or_default();
    let regions = annotations
        .map(|a| {
            let vertices = a
                .bounding_poly
                .unwrap_or_default()
                .vertices
                .into_iter()
                .map(|v| Point2D::new(v.x, v.y))
                .collect();
            TextRegion::new(a.description, vertices)
        })
        .collect();

    Ok(OcrOutput { full_text, regions })
}

impl OcrClient {
    pub fn new(http: reqwest::Client, config: &OcrConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

impl TextDetector for OcrClient {
    async fn detect_text(&self, image: &[u8]) -> Result<OcrOutput, CollaboratorError> {
        let body = serde_json::json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": "TEXT_DETECTION" }],
            }]
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        if !resp.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: resp.status().as_u16(),
            });
        }

        let parsed: AnnotateResponse = resp
            .json()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        let output = into_ocr_output(parsed)?;
        tracing::info!(
            regions = output.regions.len(),
            chars = output.full_text.len(),
            "Text detection complete"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<OcrOutput, CollaboratorError> {
        into_ocr_output(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_annotations_to_regions() {
        let output = parse(
            r#"{"responses": [{"textAnnotations": [
                {"description": "1200\n720", "boundingPoly": {"vertices": [{"x": 1, "y": 2}]}},
                {"description": "1200", "boundingPoly": {"vertices": [{"y": 10}, {"x": 40, "y": 10}, {"x": 40, "y": 22}, {"y": 22}]}},
                {"description": "720"}
            ]}]}"#,
        )
        .unwrap();

        assert_eq!(output.full_text, "1200\n720");
        assert_eq!(output.regions.len(), 2);
        assert_eq!(output.regions[0].text, "1200");
        assert_eq!(output.regions[0].bounding_box[0], Point2D::new(0.0, 10.0));
        assert!(output.regions[1].bounding_box.is_empty());
    }

    #[test]
    fn test_no_text() {
        assert!(parse(r#"{"responses": [{}]}"#).unwrap().is_empty());
        assert!(parse(r#"{}"#).unwrap().is_empty());
    }

    #[test]
    fn test_annotation_error() {
        let result = parse(r#"{"responses": [{"error": {"code": 3, "message": "Bad image data."}}]}"#);
        assert!(matches!(result, Err(CollaboratorError::Decode { .. })));
    }
}
