pub mod analysis;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod preprocess;
pub mod scorer;

pub use error::{Error, Result};

use analysis::Analyzer;
use config::Config;
use handlers::AppState;
use models::ClassCatalog;
use scorer::{MockScorer, OnnxScorer, Scorer};
use tracing::{info, warn};

/// Builds the shared state once at startup: the class table plus whichever
/// scorer the configuration selects.
pub fn build_state(config: &Config) -> Result<AppState> {
    let scorer: Box<dyn Scorer> = match &config.model_path {
        Some(path) => Box::new(OnnxScorer::load(path)?),
        None => {
            warn!("No MODEL_PATH configured, serving simulated predictions");
            Box::new(MockScorer::new()?)
        }
    };
    info!(
        model_type = scorer.model_type(),
        framework = scorer.framework(),
        "Scorer ready"
    );

    Ok(AppState {
        analyzer: Analyzer::new(ClassCatalog::plant_village(), scorer),
        max_upload_bytes: config.max_upload_bytes,
    })
}
