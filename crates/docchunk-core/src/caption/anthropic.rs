//! Anthropic Messages API captioner

use super::Captioner;
use crate::config::CaptionConfig;
use crate::error::{DocChunkError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";

const CAPTION_PROMPT: &str = "You are analyzing a technical image taken from an Oil & Gas industrial document.
Write a detailed, structured description that will be used for technical retrieval.

Cover the following:

1. Document type: P&ID, equipment photo, schematic, flowchart, safety diagram or similar.
2. Equipment: every visible item (pumps, valves, tanks, compressors, heat exchangers) with tag numbers and specifications where legible.
3. Piping and flow: flow directions, pipe connections and line sizes.
4. Instrumentation and controls: sensors, transmitters and controllers (PT, TT, FT, LT, FV, PV), their tags and control loops.
5. Safety equipment: relief valves, interlocks, warning symbols and emergency systems.
6. Text and labels: all visible text, tag numbers, process conditions (pressure, temperature, flow rate) and specifications.
7. Condition assessment for equipment photos: damage, corrosion, wear, maintenance state and anomalies.";

const TERMINOLOGY_LINE: &str = "Use industry-standard terminology (API, ASME, ISA).";

/// Media type declared for an image file, by extension.
///
/// `None` for encodings the service does not accept (JPEG 2000, JBIG2);
/// unknown extensions are sent as JPEG.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpx" | "jp2" | "jb2" | "jbig2" => None,
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => Some("image/jpeg"),
    }
}

fn build_prompt(context: &str) -> String {
    if context.trim().is_empty() {
        format!("{}\n\n{}", CAPTION_PROMPT, TERMINOLOGY_LINE)
    } else {
        format!(
            "{}\n\n**Context**: {}\n\n{}",
            CAPTION_PROMPT, context, TERMINOLOGY_LINE
        )
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn caption_from_response(response: MessagesResponse) -> Result<String> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| DocChunkError::Caption("No text in caption response".to_string()))
}

/// Captioner backed by the Anthropic Messages API
pub struct AnthropicCaptioner {
    http_client: reqwest::Client,
    config: CaptionConfig,
    api_key: String,
}

impl AnthropicCaptioner {
    /// Create a captioner; the API key must be present in `config`
    pub fn new(config: CaptionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DocChunkError::Config(
                    "ANTHROPIC_API_KEY not found in configuration or environment".to_string(),
                )
            })?;

        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            config,
            api_key,
        })
    }

    fn build_request(&self, data: String, media_type: &'static str, context: &str) -> MessagesRequest<'_> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type,
                            data,
                        },
                    },
                    ContentBlock::Text {
                        text: build_prompt(context),
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl Captioner for AnthropicCaptioner {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn caption(&self, image_path: &Path, context: &str) -> Result<String> {
        let media_type = media_type_for(image_path).ok_or_else(|| {
            DocChunkError::Caption(format!(
                "unsupported image format for captioning: {}",
                image_path.display()
            ))
        })?;
        let bytes = tokio::fs::read(image_path).await?;
        let request = self.build_request(STANDARD.encode(bytes), media_type, context);

        let url = format!("{}/v1/messages", self.config.url.trim_end_matches('/'));
        tracing::debug!("Requesting caption for {:?} from {}", image_path, url);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DocChunkError::Caption(format!(
                "Caption service error (HTTP {}): {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = response.json().await?;
        caption_from_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captioner() -> AnthropicCaptioner {
        AnthropicCaptioner::new(CaptionConfig {
            api_key: Some("test-key".to_string()),
            ..CaptionConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_media_types() {
        assert_eq!(media_type_for(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(media_type_for(Path::new("a.jpg")), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("a.gif")), Some("image/gif"));
        assert_eq!(media_type_for(Path::new("a.webp")), Some("image/webp"));
        assert_eq!(media_type_for(Path::new("noext")), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("a.jpx")), None);
        assert_eq!(media_type_for(Path::new("a.jb2")), None);
    }

    #[tokio::test]
    async fn test_unsupported_format_fails_before_upload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("manual_p0_img0.jpx");
        std::fs::write(&path, [0u8; 4]).unwrap();

        let err = captioner().caption(&path, "").await.unwrap_err();
        match err {
            DocChunkError::Caption(reason) => {
                assert!(reason.contains("unsupported image format"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prompt_context_line() {
        let with = build_prompt("Source document: plant, page 3");
        assert!(with.contains("**Context**: Source document: plant, page 3"));
        assert!(with.ends_with(TERMINOLOGY_LINE));

        let without = build_prompt("");
        assert!(!without.contains("**Context**"));
    }

    #[test]
    fn test_missing_api_key() {
        let err = AnthropicCaptioner::new(CaptionConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, DocChunkError::Config(_)));

        let blank = CaptionConfig {
            api_key: Some("  ".to_string()),
            ..CaptionConfig::default()
        };
        assert!(AnthropicCaptioner::new(blank).is_err());
    }

    #[test]
    fn test_request_shape() {
        let captioner = captioner();
        let request = captioner.build_request("QUJD".to_string(), "image/png", "page 1");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "claude-sonnet-4-20250514");
        assert_eq!(value["max_tokens"], 1024);
        assert_eq!(value["messages"][0]["role"], "user");

        let content = &value["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/png");
        assert_eq!(content[0]["source"]["data"], "QUJD");
        assert_eq!(content[1]["type"], "text");
        assert!(content[1]["text"].as_str().unwrap().contains("**Context**: page 1"));
    }

    #[test]
    fn test_response_parsing() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"id":"msg_1","content":[{"type":"text","text":"A P&ID showing pump P-101."}]}"#,
        )
        .unwrap();
        assert_eq!(
            caption_from_response(response).unwrap(),
            "A P&ID showing pump P-101."
        );

        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(caption_from_response(empty).is_err());
    }

    #[tokio::test]
    async fn test_missing_image_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = captioner()
            .caption(&dir.path().join("absent.png"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, DocChunkError::Io(_)));
    }
}
