use crate::{error::AnalyzeError, preprocess::INPUT_SIZE, Error, Result};
use ndarray::Array4;
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use rand_distr::Dirichlet;
use std::path::Path;
use tracing::info;
use tract_onnx::prelude::*;

/// Maps a preprocessed `[1, 3, H, W]` tensor to one raw score per class.
///
/// Implementations are shared by every request, so they must not rely on
/// interior mutability that needs locking.
pub trait Scorer: Send + Sync {
    fn score(&self, input: &Array4<f32>) -> std::result::Result<Vec<f32>, AnalyzeError>;

    fn model_type(&self) -> &str;

    fn framework(&self) -> &str;
}

const MOCK_CONCENTRATION: [f64; 6] = [1.0, 1.0, 1.0, 1.0, 0.5, 1.0];
const MOCK_BOOST_WEIGHTS: [f64; 6] = [0.3, 0.25, 0.25, 0.15, 0.03, 0.02];

/// Stand-in classifier: a Dirichlet draw with one class pushed to the top.
/// Ignores its input.
pub struct MockScorer {
    dirichlet: Dirichlet<f64>,
    boost: WeightedIndex<f64>,
}

impl MockScorer {
    pub fn new() -> Result<Self> {
        let dirichlet = Dirichlet::new(&MOCK_CONCENTRATION)
            .map_err(|e| Error::model(format!("Invalid Dirichlet concentration: {}", e)))?;
        let boost = WeightedIndex::new(MOCK_BOOST_WEIGHTS)
            .map_err(|e| Error::model(format!("Invalid boost weights: {}", e)))?;
        Ok(Self { dirichlet, boost })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f32> {
        let mut scores: Vec<f64> = self.dirichlet.sample(rng);

        let boosted = self.boost.sample(rng);
        let floor = 0.6 + rng.gen_range(0.0..0.3);
        scores[boosted] = scores[boosted].max(floor);

        let total: f64 = scores.iter().sum();
        scores.into_iter().map(|s| (s / total) as f32).collect()
    }
}

impl Scorer for MockScorer {
    fn score(&self, _input: &Array4<f32>) -> std::result::Result<Vec<f32>, AnalyzeError> {
        Ok(self.sample(&mut rand::thread_rng()))
    }

    fn model_type(&self) -> &str {
        "PlantVillage CNN (Simulated)"
    }

    fn framework(&self) -> &str {
        "Simulated"
    }
}

/// Runs an ONNX classifier through tract. The graph is loaded and optimized
/// once; each call only executes the plan.
///
/// The input is pinned to `[1, 3, INPUT_SIZE, INPUT_SIZE]` f32, so exports
/// with symbolic or undeclared input dimensions load as well.
pub struct OnnxScorer {
    model: TypedRunnableModel<TypedModel>,
}

impl OnnxScorer {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading ONNX model from {}", path.display());

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| Error::model(format!("Failed to load ONNX model: {}", e)))?
            .with_input_fact(0, input_fact())
            .map_err(|e| Error::model(format!("Failed to set model input shape: {}", e)))?
            .into_optimized()
            .map_err(|e| Error::model(format!("Failed to optimize ONNX model: {}", e)))?
            .into_runnable()
            .map_err(|e| Error::model(format!("Failed to make model runnable: {}", e)))?;

        Ok(Self { model })
    }
}

fn input_fact() -> InferenceFact {
    let side = INPUT_SIZE as usize;
    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side))
}

impl Scorer for OnnxScorer {
    fn score(&self, input: &Array4<f32>) -> std::result::Result<Vec<f32>, AnalyzeError> {
        let values: Vec<f32> = input.iter().copied().collect();
        let tensor = tract_ndarray::Array::from_shape_vec(input.dim(), values)
            .map_err(|e| AnalyzeError::scoring(format!("Invalid input tensor: {}", e)))?
            .into_tensor();

        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(|e| AnalyzeError::scoring(format!("Inference error: {}", e)))?;

        let first = outputs
            .first()
            .ok_or_else(|| AnalyzeError::scoring("Model produced no outputs"))?;
        let scores = first
            .to_array_view::<f32>()
            .map_err(|e| AnalyzeError::scoring(format!("Unexpected output type: {}", e)))?;

        Ok(scores.iter().copied().collect())
    }

    fn model_type(&self) -> &str {
        "PlantVillage CNN (ONNX)"
    }

    fn framework(&self) -> &str {
        "tract-onnx"
    }
}
