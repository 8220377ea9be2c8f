use super::ApiError;
use crate::{
    genai::{
        pipeline::{MISSING_IMAGE, MISSING_MODEL_OR_GARMENTS},
        Composition, Pipeline,
    },
    models::{CutoutRequest, GenerateRequest, HealthResponse, ImagePayload, ImageResponse},
};
use actix_web::{web, HttpResponse};

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { ok: true })
}

pub async fn cutout(
    pipeline: web::Data<Pipeline>,
    body: web::Json<CutoutRequest>,
) -> Result<HttpResponse, ApiError> {
    let raw = present(body.into_inner().image).ok_or_else(|| ApiError::bad_request(MISSING_IMAGE))?;
    let image = ImagePayload::from_data_url_lenient(&raw)?;

    let png = pipeline.cutout(&image).await?;
    Ok(HttpResponse::Ok().json(ImageResponse {
        png: png.to_data_url(),
    }))
}

pub async fn generate(
    pipeline: web::Data<Pipeline>,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let model_png = match present(request.model_png) {
        Some(model_png) if !request.garments.is_empty() => model_png,
        _ => return Err(ApiError::bad_request(MISSING_MODEL_OR_GARMENTS)),
    };

    let subject = ImagePayload::from_data_url_lenient(&model_png)?;
    let garments = request
        .garments
        .iter()
        .map(|garment| ImagePayload::from_data_url_lenient(garment))
        .collect::<crate::error::Result<Vec<_>>>()?;

    let composition = Composition {
        subject,
        garments,
        prompt: request.prompt,
        background: request.background.unwrap_or_default(),
    };

    let png = pipeline.generate(&composition).await?;
    Ok(HttpResponse::Ok().json(ImageResponse {
        png: png.to_data_url(),
    }))
}
