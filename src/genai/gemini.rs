use crate::{
    config::GenAiConfig,
    error::{HaulError, Result},
    genai::{ImageSynthesizer, SynthesisError},
    logger,
    models::{
        gemini::{
            ApiErrorEnvelope, Content, GenerateContentRequest, GenerateContentResponse,
            GenerationConfig, InlineData, Part,
        },
        image::{sniff_media_type, DEFAULT_MEDIA_TYPE},
        ImagePayload,
    },
};
use async_trait::async_trait;
use reqwest::Client;

#[derive(Clone)]
pub struct GeminiSynthesizer {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiSynthesizer {
    pub fn new(config: &GenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| HaulError::Unconfigured("Missing API key on server".into()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HaulError::ConfigError(e.to_string()))?;

        let model = config.model().to_string();
        let endpoint = endpoint_for_model(config.api_base(), &model);

        Ok(Self {
            client,
            api_key,
            model,
            endpoint,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn endpoint_for_model(api_base: &str, model: &str) -> String {
    let model = model.trim();
    let model_path = if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    };
    format!("{}/{}:generateContent", api_base.trim_end_matches('/'), model_path)
}

pub(crate) fn build_request(instruction: &str, images: &[ImagePayload]) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part {
        text: Some(instruction.to_string()),
        inline_data: None,
    });
    parts.extend(images.iter().map(|image| Part {
        text: None,
        inline_data: Some(InlineData {
            mime_type: Some(image.media_type().to_string()),
            data: image.to_base64(),
        }),
    }));

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: Some(GenerationConfig {
            response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
        }),
    }
}

/// First image-bearing part across all candidates.
pub(crate) fn extract_first_image(
    response: GenerateContentResponse,
) -> std::result::Result<ImagePayload, SynthesisError> {
    let inline = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.inline_data)
        .find(|inline| !inline.data.trim().is_empty())
        .ok_or(SynthesisError::NoImage)?;

    let payload = ImagePayload::from_base64(DEFAULT_MEDIA_TYPE, &inline.data)
        .map_err(|e| SynthesisError::Response(e.to_string()))?;

    let media_type = inline
        .mime_type
        .filter(|mime| mime.starts_with("image/"))
        .or_else(|| sniff_media_type(payload.bytes()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());

    Ok(ImagePayload::new(media_type, payload.into_bytes()))
}

fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown upstream error")
            .to_string(),
    }
}

#[async_trait]
impl ImageSynthesizer for GeminiSynthesizer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn synthesize(
        &self,
        instruction: &str,
        images: &[ImagePayload],
    ) -> std::result::Result<ImagePayload, SynthesisError> {
        let request = build_request(instruction, images);
        let _timer = logger::timer(&format!("{} generateContent", self.model));

        log::info!(
            "Invoking model {} with {} image(s), instruction length {}",
            self.model,
            images.len(),
            instruction.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(status, &body);
            log::error!("Model {} returned {}: {}", self.model, status, message);
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Response(e.to_string()))?;

        let image = extract_first_image(parsed)?;
        log::debug!(
            "Model {} returned {} ({} bytes)",
            self.model,
            image.media_type(),
            image.len()
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_for_model() {
        assert_eq!(
            endpoint_for_model("https://generativelanguage.googleapis.com/v1beta/", "gemini-x"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-x:generateContent"
        );
        assert_eq!(
            endpoint_for_model("http://stub", "models/gemini-x"),
            "http://stub/models/gemini-x:generateContent"
        );
    }

    #[test]
    fn test_new_requires_credentials() {
        let err = GeminiSynthesizer::new(&GenAiConfig::new()).err().unwrap();
        assert!(matches!(err, HaulError::Unconfigured(_)));

        let synth = GeminiSynthesizer::new(&GenAiConfig::new().with_api_key("k")).unwrap();
        assert_eq!(synth.model(), crate::config::DEFAULT_MODEL);
    }

    #[test]
    fn test_request_orders_text_then_images() {
        let images = vec![
            ImagePayload::new("image/png", vec![0, 0, 0]),
            ImagePayload::new("image/jpeg", vec![1, 2, 3]),
        ];
        let body = serde_json::to_value(build_request("dress", &images)).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();

        assert_eq!(body["contents"][0]["role"], json!("user"));
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], json!({"text": "dress"}));
        assert_eq!(parts[1]["inlineData"]["mimeType"], json!("image/png"));
        assert_eq!(parts[1]["inlineData"]["data"], json!("AAAA"));
        assert_eq!(parts[2]["inlineData"]["mimeType"], json!("image/jpeg"));
        assert_eq!(body["generationConfig"]["responseModalities"], json!(["TEXT", "IMAGE"]));
    }

    #[test]
    fn test_extract_skips_text_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here is your image"},
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                    {"inlineData": {"mimeType": "image/png", "data": "AQID"}}
                ]}
            }]
        }))
        .unwrap();

        let image = extract_first_image(response).unwrap();
        assert_eq!(image.media_type(), "image/png");
        assert_eq!(image.bytes(), &[0, 0, 0]);
    }

    #[test]
    fn test_extract_accepts_snake_case_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "refused"}]}},
                {"content": {"parts": [{"inline_data": {"mime_type": "image/webp", "data": "AQID"}}]}}
            ]
        }))
        .unwrap();

        let image = extract_first_image(response).unwrap();
        assert_eq!(image.media_type(), "image/webp");
        assert_eq!(image.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_extract_without_image_part() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "I can't help with that"}]}}]
        }))
        .unwrap();
        assert_eq!(extract_first_image(response).unwrap_err(), SynthesisError::NoImage);

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_first_image(empty).unwrap_err(), SynthesisError::NoImage);
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            api_error_message(reqwest::StatusCode::TOO_MANY_REQUESTS, body),
            "Quota exceeded"
        );
        assert_eq!(
            api_error_message(reqwest::StatusCode::BAD_GATEWAY, ""),
            "Bad Gateway"
        );
    }

    #[cfg(feature = "server")]
    mod exchange {
        use super::*;
        use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
        use std::sync::{Arc, Mutex};

        type Seen = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

        /// Serves one canned reply on every path and records query + body.
        fn upstream(status: StatusCode, reply: serde_json::Value) -> (String, Seen) {
            let seen: Seen = Arc::default();
            let recorded = seen.clone();
            let server = HttpServer::new(move || {
                let reply = reply.clone();
                let recorded = recorded.clone();
                App::new().default_service(web::to(
                    move |req: HttpRequest, body: web::Json<serde_json::Value>| {
                        let reply = reply.clone();
                        let recorded = recorded.clone();
                        async move {
                            recorded
                                .lock()
                                .unwrap()
                                .push((req.uri().to_string(), body.into_inner()));
                            HttpResponse::build(status).json(reply)
                        }
                    },
                ))
            })
            .workers(1)
            .disable_signals()
            .bind(("127.0.0.1", 0))
            .unwrap();
            let addr = server.addrs()[0];
            actix_web::rt::spawn(server.run());
            (format!("http://{}/v1beta", addr), seen)
        }

        fn synthesizer(api_base: &str) -> GeminiSynthesizer {
            GeminiSynthesizer::new(
                &GenAiConfig::new()
                    .with_api_key("test-key")
                    .with_model("gemini-x")
                    .with_api_base(api_base),
            )
            .unwrap()
        }

        #[actix_web::test]
        async fn test_synthesize_decodes_first_image() {
            let (base, seen) = upstream(
                StatusCode::OK,
                json!({"candidates": [{"content": {"parts": [
                    {"text": "done"},
                    {"inlineData": {"mimeType": "image/png", "data": "AQID"}}
                ]}}]}),
            );

            let image = synthesizer(&base)
                .synthesize("cut out", &[ImagePayload::new("image/jpeg", vec![7])])
                .await
                .unwrap();
            assert_eq!(image.media_type(), "image/png");
            assert_eq!(image.bytes(), &[1, 2, 3]);

            let seen = seen.lock().unwrap();
            let (uri, body) = &seen[0];
            assert_eq!(uri, "/v1beta/models/gemini-x:generateContent?key=test-key");
            assert_eq!(body["contents"][0]["parts"][0]["text"], json!("cut out"));
            assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], json!("Bw=="));
        }

        #[actix_web::test]
        async fn test_synthesize_maps_error_status() {
            let (base, _) = upstream(
                StatusCode::TOO_MANY_REQUESTS,
                json!({"error": {"code": 429, "message": "Resource has been exhausted"}}),
            );

            let err = synthesizer(&base)
                .synthesize("dress", &[ImagePayload::new("image/png", vec![1])])
                .await
                .unwrap_err();
            assert_eq!(
                err,
                SynthesisError::Api {
                    status: 429,
                    message: "Resource has been exhausted".into()
                }
            );
            assert_eq!(err.to_string(), "Resource has been exhausted");
        }

        #[actix_web::test]
        async fn test_synthesize_without_image_part() {
            let (base, _) = upstream(
                StatusCode::OK,
                json!({"candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]}),
            );

            let err = synthesizer(&base)
                .synthesize("dress", &[ImagePayload::new("image/png", vec![1])])
                .await
                .unwrap_err();
            assert_eq!(err, SynthesisError::NoImage);
        }
    }
}
