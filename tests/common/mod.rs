#![allow(dead_code)]

use actix_web::{test::TestRequest, web};
use frijol_ai::{
    analysis::Analyzer,
    error::AnalyzeError,
    handlers::AppState,
    models::ClassCatalog,
    scorer::Scorer,
};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use ndarray::Array4;
use std::io::Cursor;

pub const BOUNDARY: &str = "frijol-test-boundary";

/// Scores that rank classes 1, 3, 4 on top.
pub const FIXED_SCORES: [f32; 6] = [0.1, 0.9, 0.0, 0.5, 0.3, 0.2];

/// Deterministic scorer that always returns the same scores.
pub struct FixedScorer {
    scores: Vec<f32>,
}

impl FixedScorer {
    pub fn new(scores: &[f32]) -> Self {
        Self {
            scores: scores.to_vec(),
        }
    }
}

impl Scorer for FixedScorer {
    fn score(&self, input: &Array4<f32>) -> Result<Vec<f32>, AnalyzeError> {
        assert_eq!(input.shape(), &[1, 3, 224, 224]);
        Ok(self.scores.clone())
    }

    fn model_type(&self) -> &str {
        "Fixed test scorer"
    }

    fn framework(&self) -> &str {
        "test"
    }
}

pub fn test_state(scores: &[f32], max_upload_bytes: usize) -> web::Data<AppState> {
    web::Data::new(AppState {
        analyzer: Analyzer::new(
            ClassCatalog::plant_village(),
            Box::new(FixedScorer::new(scores)),
        ),
        max_upload_bytes,
    })
}

pub fn default_state() -> web::Data<AppState> {
    test_state(&FIXED_SCORES, 10 * 1024 * 1024)
}

/// Builds the service under test with the real route table.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state)
                .configure(frijol_ai::handlers::configure),
        )
        .await
    };
}

pub fn encode(image: RgbImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, format)
        .expect("Failed to encode test image");
    buf.into_inner()
}

pub fn leaf_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 200) as u8, 120 + (y % 100) as u8, 40])
    });
    encode(image, ImageOutputFormat::Png)
}

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(field: &str, content_type: &str, data: &[u8]) -> TestRequest {
    TestRequest::post()
        .uri("/analyze")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(field, "leaf", content_type, data))
}
