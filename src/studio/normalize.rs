use crate::{
    error::{HaulError, Result},
    models::{
        image::{media_type_for_path, sniff_media_type, DEFAULT_MEDIA_TYPE},
        ImagePayload, ImageSource,
    },
};
use futures::future::try_join_all;
use reqwest::{header::CONTENT_TYPE, Client};
use std::path::Path;

/// Turns any [`ImageSource`] into an [`ImagePayload`] without re-encoding
/// the bytes.
#[derive(Clone, Default)]
pub struct ImageNormalizer {
    client: Client,
}

/// Explicit type, then sniffed bytes, then the file extension, then PNG.
fn resolve_media_type(explicit: Option<&str>, bytes: &[u8], path_hint: Option<&Path>) -> String {
    explicit
        .map(str::trim)
        .filter(|mime| mime.starts_with("image/"))
        .map(str::to_string)
        .or_else(|| sniff_media_type(bytes).map(str::to_string))
        .or_else(|| path_hint.and_then(media_type_for_path).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string())
}

fn non_empty(payload: ImagePayload, origin: &str) -> Result<ImagePayload> {
    if payload.is_empty() {
        return Err(HaulError::SourceUnavailable(format!("{} is empty", origin)));
    }
    Ok(payload)
}

impl ImageNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn normalize(&self, source: &ImageSource) -> Result<ImagePayload> {
        let origin = source.describe();
        let payload = match source {
            ImageSource::Bytes { bytes, media_type } => {
                let media_type = resolve_media_type(media_type.as_deref(), bytes, None);
                ImagePayload::new(media_type, bytes.clone())
            }
            ImageSource::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    HaulError::SourceUnavailable(format!("{}: {}", path.display(), e))
                })?;
                let media_type = resolve_media_type(None, &bytes, Some(path));
                ImagePayload::new(media_type, bytes)
            }
            ImageSource::Url(url) if url.starts_with("data:") => url
                .parse::<ImagePayload>()
                .map_err(|e| HaulError::SourceUnavailable(format!("{}: {}", origin, e)))?,
            ImageSource::Url(url) => self.fetch(url).await?,
            ImageSource::Encoded(payload) => payload.clone(),
        };

        log::debug!(
            "Normalized {} as {} ({} bytes)",
            origin,
            payload.media_type(),
            payload.len()
        );
        non_empty(payload, &origin)
    }

    /// Normalizes concurrently; the output keeps the input order.
    pub async fn normalize_all(&self, sources: &[ImageSource]) -> Result<Vec<ImagePayload>> {
        try_join_all(sources.iter().map(|source| self.normalize(source))).await
    }

    async fn fetch(&self, url: &str) -> Result<ImagePayload> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HaulError::SourceUnavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HaulError::SourceUnavailable(format!(
                "{} returned {}",
                url, status
            )));
        }

        let header_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_string());
        let path_hint = response.url().path().to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HaulError::SourceUnavailable(format!("{}: {}", url, e)))?;

        let media_type =
            resolve_media_type(header_type.as_deref(), &bytes, Some(Path::new(&path_hint)));
        Ok(ImagePayload::new(media_type, bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn temp_path(extension: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fashion-haul-{}.{}", Uuid::new_v4(), extension))
    }

    #[test]
    fn test_resolve_media_type_order() {
        assert_eq!(resolve_media_type(Some("image/gif"), &PNG_MAGIC, None), "image/gif");
        assert_eq!(resolve_media_type(Some("text/plain"), &PNG_MAGIC, None), "image/png");
        assert_eq!(
            resolve_media_type(None, &[1, 2, 3], Some(Path::new("heels.webp"))),
            "image/webp"
        );
        assert_eq!(resolve_media_type(None, &[1, 2, 3], None), DEFAULT_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_bytes_keep_fidelity() {
        let normalizer = ImageNormalizer::new();
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&[42; 32]);

        let payload = normalizer
            .normalize(&ImageSource::bytes(bytes.clone()))
            .await
            .unwrap();
        assert_eq!(payload.media_type(), "image/png");
        assert_eq!(payload.bytes(), bytes.as_slice());
    }

    #[tokio::test]
    async fn test_empty_source_is_unavailable() {
        let normalizer = ImageNormalizer::new();
        let err = normalizer
            .normalize(&ImageSource::bytes(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, HaulError::SourceUnavailable(_)));

        let err = normalizer
            .normalize(&ImageSource::Encoded(ImagePayload::new("image/png", vec![])))
            .await
            .unwrap_err();
        assert!(matches!(err, HaulError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_path_source() {
        let path = temp_path("jpg");
        std::fs::write(&path, [7u8, 7, 7]).unwrap();

        let payload = ImageNormalizer::new()
            .normalize(&ImageSource::Path(path.clone()))
            .await
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(payload.media_type(), "image/jpeg");
        assert_eq!(payload.bytes(), &[7, 7, 7]);
    }

    #[tokio::test]
    async fn test_missing_path_is_unavailable() {
        let err = ImageNormalizer::new()
            .normalize(&ImageSource::Path(temp_path("png")))
            .await
            .unwrap_err();
        assert!(matches!(err, HaulError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_data_url_source_is_parsed_strictly() {
        let normalizer = ImageNormalizer::new();
        let payload = normalizer
            .normalize(&ImageSource::Url("data:image/webp;base64,AQID".into()))
            .await
            .unwrap();
        assert_eq!(payload.media_type(), "image/webp");

        let err = normalizer
            .normalize(&ImageSource::Url("data:;base64,AQID".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, HaulError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_url_is_unavailable() {
        let err = ImageNormalizer::new()
            .normalize(&ImageSource::Url("http://127.0.0.1:9/model1.png".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, HaulError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_normalize_all_keeps_order() {
        let sources = vec![
            ImageSource::Encoded(ImagePayload::new("image/png", vec![1])),
            ImageSource::bytes(vec![2]),
            ImageSource::Url("data:image/gif;base64,Aw==".into()),
        ];
        let payloads = ImageNormalizer::new().normalize_all(&sources).await.unwrap();
        let firsts: Vec<u8> = payloads.iter().map(|p| p.bytes()[0]).collect();
        assert_eq!(firsts, vec![1, 2, 3]);
        assert_eq!(payloads[2].media_type(), "image/gif");
    }
}
