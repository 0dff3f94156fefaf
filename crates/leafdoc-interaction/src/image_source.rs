//! Resolving image references into base64 payloads.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use leafdoc_core::error::AnalysisError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use url::Url;

/// Where an image reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A plain path or a `file://` URI.
    File(PathBuf),
    /// An `http://` or `https://` URI.
    Remote(Url),
}

/// Image bytes in the transport-safe shape the capability expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    /// Standard base64, no line breaks.
    pub data: String,
}

impl ImageSource {
    /// Interprets a reference without touching the file system or network.
    pub fn parse(reference: &str) -> Result<Self, AnalysisError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AnalysisError::invalid_input("No image provided"));
        }

        // Windows drive letters ("C:\leaf.jpg") also parse as URLs with a
        // one-letter scheme, so only known schemes are treated as URIs.
        match Url::parse(reference) {
            Ok(url) if url.scheme() == "file" => url.to_file_path().map(Self::File).map_err(|_| {
                AnalysisError::encoding(format!("Invalid file URI: {reference}"))
            }),
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Remote(url)),
            _ => Ok(Self::File(PathBuf::from(reference))),
        }
    }

    /// Mime type guessed from the extension, if it is an image type.
    pub fn guess_mime_type(&self) -> Option<String> {
        let guess = match self {
            Self::File(path) => mime_guess::from_path(path).first(),
            Self::Remote(url) => mime_guess::from_path(Path::new(url.path())).first(),
        }?;

        (guess.type_() == mime_guess::mime::IMAGE).then(|| guess.essence_str().to_string())
    }

    /// Reads the referenced bytes. Any failure is an `Encoding` error.
    pub async fn load_bytes(&self, client: &Client) -> Result<Vec<u8>, AnalysisError> {
        match self {
            Self::File(path) => tokio::fs::read(path).await.map_err(|e| {
                AnalysisError::encoding(format!("Failed to read image {}: {}", path.display(), e))
            }),
            Self::Remote(url) => {
                let response = client.get(url.clone()).send().await.map_err(|e| {
                    AnalysisError::encoding(format!("Failed to download image {url}: {e}"))
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(AnalysisError::encoding(format!(
                        "Failed to download image {url}: HTTP {status}"
                    )));
                }

                let bytes = response.bytes().await.map_err(|e| {
                    AnalysisError::encoding(format!("Failed to download image {url}: {e}"))
                })?;
                Ok(bytes.to_vec())
            }
        }
    }

    /// Loads and base64-encodes the image.
    pub async fn encode(
        &self,
        client: &Client,
        default_mime_type: &str,
    ) -> Result<EncodedImage, AnalysisError> {
        let bytes = self.load_bytes(client).await?;
        if bytes.is_empty() {
            return Err(AnalysisError::encoding("Image is empty"));
        }

        Ok(EncodedImage {
            mime_type: self
                .guess_mime_type()
                .unwrap_or_else(|| default_mime_type.to_string()),
            data: BASE64_STANDARD.encode(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            ImageSource::parse("leaf.jpg").unwrap(),
            ImageSource::File(PathBuf::from("leaf.jpg"))
        );
        assert_eq!(
            ImageSource::parse("file:///tmp/leaf.png").unwrap(),
            ImageSource::File(PathBuf::from("/tmp/leaf.png"))
        );
        assert!(matches!(
            ImageSource::parse("https://example.com/leaf.webp").unwrap(),
            ImageSource::Remote(_)
        ));
    }

    #[test]
    fn test_empty_reference_is_invalid_input() {
        for reference in ["", "   "] {
            assert!(matches!(
                ImageSource::parse(reference),
                Err(AnalysisError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_mime_guess() {
        let png = ImageSource::parse("/photos/leaf.png").unwrap();
        assert_eq!(png.guess_mime_type().as_deref(), Some("image/png"));

        let remote = ImageSource::parse("https://cdn.example.com/a/leaf.jpeg?w=200").unwrap();
        assert_eq!(remote.guess_mime_type().as_deref(), Some("image/jpeg"));

        let unknown = ImageSource::parse("/photos/leaf").unwrap();
        assert!(unknown.guess_mime_type().is_none());

        let not_image = ImageSource::parse("/photos/leaf.txt").unwrap();
        assert!(not_image.guess_mime_type().is_none());
    }

    #[tokio::test]
    async fn test_encode_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leaf");
        std::fs::write(&path, b"leaf-bytes").unwrap();

        let source = ImageSource::File(path);
        let encoded = source.encode(&Client::new(), "image/jpeg").await.unwrap();

        assert_eq!(encoded.mime_type, "image/jpeg");
        assert_eq!(encoded.data, BASE64_STANDARD.encode(b"leaf-bytes"));
    }

    #[tokio::test]
    async fn test_missing_file_is_encoding_error() {
        let dir = TempDir::new().unwrap();
        let source = ImageSource::File(dir.path().join("missing.jpg"));

        let err = source.encode(&Client::new(), "image/jpeg").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Encoding { .. }));
    }
}
