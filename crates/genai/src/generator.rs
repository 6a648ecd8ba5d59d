//! [`ContentGenerator`] backed by the generative REST API.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kana_core::error::CoreError;
use kana_core::generation::{
    ContentGenerator, GeneratedContent, GeneratedImage, Language, Platform, VisualStyle,
};
use kana_core::settings::{AspectRatio, EnhanceSettings};
use kana_core::types::SourceFile;

use crate::api::{Content, GenAiApi, GenAiError, GenerateRequest, ImageConfig, Part};
use crate::config::GenAiConfig;
use crate::prompts;

const JSON_MIME_TYPE: &str = "application/json";

impl From<GenAiError> for CoreError {
    fn from(err: GenAiError) -> Self {
        CoreError::Remote(err.to_string())
    }
}

pub struct GenAiGenerator {
    api: GenAiApi,
}

impl GenAiGenerator {
    pub fn new(config: GenAiConfig) -> Self {
        Self {
            api: GenAiApi::new(config),
        }
    }

    pub fn with_api(api: GenAiApi) -> Self {
        Self { api }
    }

    fn image_part(file: &SourceFile) -> Part {
        Part::inline(file.mime_type.clone(), STANDARD.encode(&file.bytes))
    }

    /// Run an image-model request and decode the single returned image.
    async fn generate_image(
        &self,
        parts: Vec<Part>,
        aspect_ratio: AspectRatio,
    ) -> Result<GeneratedImage, GenAiError> {
        let mut request = GenerateRequest::user(parts);
        request.generation_config.image_config = Some(ImageConfig {
            aspect_ratio: aspect_ratio.as_str().to_string(),
        });

        let response = self
            .api
            .generate(&self.api.config().image_model, &request)
            .await?;
        let inline = response.inline_image()?;
        let bytes = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| GenAiError::Malformed(format!("invalid image payload: {e}")))?;

        Ok(GeneratedImage {
            mime_type: inline.mime_type.clone(),
            bytes,
        })
    }
}

#[async_trait]
impl ContentGenerator for GenAiGenerator {
    async fn generate_caption(
        &self,
        image: &SourceFile,
        context: &str,
        platform: Platform,
        language: Language,
    ) -> Result<GeneratedContent, CoreError> {
        let mut request = GenerateRequest::user(vec![
            Self::image_part(image),
            Part::text(prompts::caption_user_text(context, platform)),
        ]);
        request.system_instruction = Some(Content {
            role: None,
            parts: vec![Part::text(prompts::caption_system_instruction(
                platform, language,
            ))],
        });
        request.generation_config.response_mime_type = Some(JSON_MIME_TYPE.to_string());
        request.generation_config.response_schema = Some(prompts::caption_response_schema());

        let response = self
            .api
            .generate(&self.api.config().text_model, &request)
            .await?;
        let text = response.text()?;

        let content: GeneratedContent = serde_json::from_str(&text)
            .map_err(|e| GenAiError::Malformed(format!("caption payload: {e}")))?;
        tracing::debug!(
            platform = platform.label(),
            video_ideas = content.video_ideas.len(),
            "Caption generated",
        );
        Ok(content)
    }

    async fn generate_visual(
        &self,
        images: &[Arc<SourceFile>],
        context: &str,
        style: VisualStyle,
        language: Language,
    ) -> Result<GeneratedImage, CoreError> {
        if images.is_empty() {
            return Err(CoreError::Validation(
                "At least one source image is required".into(),
            ));
        }

        let mut parts: Vec<Part> = images.iter().map(|f| Self::image_part(f)).collect();
        parts.push(Part::text(prompts::visual_prompt(context, style, language)));

        let image = self
            .generate_image(parts, prompts::VISUAL_ASPECT_RATIO)
            .await?;
        tracing::debug!(style = style.label(), sources = images.len(), "Visual generated");
        Ok(image)
    }

    async fn enhance_image(
        &self,
        image: &SourceFile,
        settings: &EnhanceSettings,
    ) -> Result<GeneratedImage, CoreError> {
        let aspect_ratio = settings.aspect_ratio.nearest_supported();
        if aspect_ratio != settings.aspect_ratio {
            tracing::debug!(
                requested = settings.aspect_ratio.as_str(),
                used = aspect_ratio.as_str(),
                "Substituting supported aspect ratio",
            );
        }

        let parts = vec![
            Self::image_part(image),
            Part::text(prompts::enhance_prompt(settings)),
        ];
        Ok(self.generate_image(parts, aspect_ratio).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
