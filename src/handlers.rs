use crate::{
    analysis::Analyzer,
    error::AnalyzeError,
    models::{AnalyzeResponse, HealthResponse, ModelInfoResponse},
    preprocess::INPUT_SIZE,
};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

pub const SERVICE_NAME: &str = "FrijolAI AI Service";
pub const UPLOAD_FIELD: &str = "file";

const MODEL_DESCRIPTION: &str =
    "Modelo entrenado con dataset PlantVillage para detección de enfermedades en frijol";

/// Process-wide state handed to every request.
pub struct AppState {
    pub analyzer: Analyzer,
    pub max_upload_bytes: usize,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(health_check)))
        .service(web::resource("/analyze").route(web::post().to(analyze)))
        .service(web::resource("/model/info").route(web::get().to(model_info)));
}

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_classes: state.analyzer.catalog().len(),
    })
}

pub async fn model_info(state: web::Data<AppState>) -> HttpResponse {
    let catalog = state.analyzer.catalog();
    let scorer = state.analyzer.scorer();

    HttpResponse::Ok().json(ModelInfoResponse {
        model_type: scorer.model_type().to_string(),
        classes: catalog.labels_by_index(),
        total_classes: catalog.len(),
        input_size: [INPUT_SIZE, INPUT_SIZE],
        framework: scorer.framework().to_string(),
        description: MODEL_DESCRIPTION.to_string(),
    })
}

pub async fn analyze(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AnalyzeError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze", %request_id);

    let result = run_analysis(state, payload).instrument(span.clone()).await;

    let _entered = span.enter();
    match result {
        Ok(response) => {
            info!(
                top = %response.top_prediction.label,
                confidence = response.top_prediction.confidence,
                processing_time = response.processing_time,
                "Analysis complete"
            );
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) if e.is_client_error() => {
            info!("Rejected upload: {}", e);
            Err(e)
        }
        Err(e) => {
            error!("Failed to analyze upload: {}", e);
            Err(e)
        }
    }
}

async fn run_analysis(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<AnalyzeResponse, AnalyzeError> {
    let mut upload = None;

    while let Some(item) = payload.next().await {
        let field = item?;
        if field.content_disposition().get_name() != Some(UPLOAD_FIELD) {
            drain(field).await?;
            continue;
        }

        let content_type = field.content_type().essence_str().to_string();
        debug!(content_type = %content_type, "Received upload field");
        if !content_type.starts_with("image/") {
            return Err(AnalyzeError::NotAnImage);
        }

        let started = Instant::now();
        let bytes = read_bounded(field, state.max_upload_bytes).await?;
        upload = Some((started, bytes));
        break;
    }

    let (started, bytes) = upload.ok_or(AnalyzeError::MissingFile)?;
    debug!(bytes = bytes.len(), "Read upload");

    let worker_state = state.clone();
    let analysis = web::block(move || worker_state.analyzer.analyze(&bytes))
        .await
        .map_err(|e| AnalyzeError::internal(e.to_string()))??;

    let processing_time = round_to_hundredths(started.elapsed().as_secs_f64());
    Ok(AnalyzeResponse::new(analysis, processing_time))
}

async fn read_bounded(mut field: Field, limit: usize) -> Result<Vec<u8>, AnalyzeError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk?;
        if bytes.len() + data.len() > limit {
            return Err(AnalyzeError::TooLarge { limit });
        }
        bytes.extend_from_slice(&data);
    }
    Ok(bytes)
}

async fn drain(mut field: Field) -> Result<(), AnalyzeError> {
    while let Some(chunk) = field.next().await {
        chunk?;
    }
    Ok(())
}

fn round_to_hundredths(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
