use crate::{
    error::AnalyzeError,
    models::{Analysis, ClassCatalog, ImageSize, Prediction},
    preprocess,
    scorer::Scorer,
};
use tracing::debug;

pub const TOP_K: usize = 3;

/// Numerically stable softmax.
pub fn softmax(scores: &[f32]) -> Vec<f64> {
    let max = scores
        .iter()
        .map(|&s| s as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|&s| (s as f64 - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Labels every probability and ranks them, highest first. Equal confidences
/// keep class order.
pub fn rank(catalog: &ClassCatalog, probabilities: &[f64]) -> Vec<Prediction> {
    let mut predictions: Vec<Prediction> = catalog
        .classes()
        .iter()
        .zip(probabilities)
        .map(|(class, &confidence)| Prediction {
            label: class.label.clone(),
            confidence,
            severity: class.severity,
            disease_type: class.disease_type,
        })
        .collect();

    predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    predictions
}

/// Turns raw scores into the ranked, truncated result.
pub fn assemble(
    catalog: &ClassCatalog,
    scores: &[f32],
    image_size: ImageSize,
) -> Result<Analysis, AnalyzeError> {
    if scores.len() != catalog.len() {
        return Err(AnalyzeError::scoring(format!(
            "Expected {} scores, got {}",
            catalog.len(),
            scores.len()
        )));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(AnalyzeError::scoring("Model produced non-finite scores"));
    }

    let mut predictions = rank(catalog, &softmax(scores));
    predictions.truncate(TOP_K);

    let top_prediction = predictions
        .first()
        .cloned()
        .ok_or_else(|| AnalyzeError::internal("No classes configured"))?;

    Ok(Analysis {
        predictions,
        top_prediction,
        image_size,
    })
}

/// Owns the process-wide, read-only pieces of the pipeline.
pub struct Analyzer {
    catalog: ClassCatalog,
    scorer: Box<dyn Scorer>,
}

impl Analyzer {
    pub fn new(catalog: ClassCatalog, scorer: Box<dyn Scorer>) -> Self {
        Self { catalog, scorer }
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    pub fn scorer(&self) -> &dyn Scorer {
        self.scorer.as_ref()
    }

    /// Decode, preprocess, score and rank one uploaded image. CPU bound; call
    /// it off the async workers.
    pub fn analyze(&self, bytes: &[u8]) -> Result<Analysis, AnalyzeError> {
        let decoded = preprocess::decode(bytes)?;
        debug!(
            width = decoded.size.width,
            height = decoded.size.height,
            "Decoded upload"
        );

        let tensor = preprocess::to_tensor(&decoded.pixels);
        let scores = self.scorer.score(&tensor)?;
        debug!(?scores, "Raw scores");

        assemble(&self.catalog, &scores, decoded.size)
    }
}
