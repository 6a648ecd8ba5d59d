//! Contracts of the remote generative collaborators.
//!
//! The AI model is a black box: submit image(s) plus text and options,
//! receive structured text or exactly one image. Implementations live in
//! `kana-genai`; pipeline code depends only on these traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::settings::EnhanceSettings;
use crate::types::SourceFile;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Platform {
    #[default]
    Instagram,
    TikTok,
    Threads,
}

impl Platform {
    pub fn label(self) -> &'static str {
        match self {
            Self::Instagram => "Instagram",
            Self::TikTok => "TikTok",
            Self::Threads => "Threads",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VisualStyle {
    Microblog,
    Typography,
    #[default]
    Showcase,
    Aesthetic,
    Collage,
    #[serde(rename = "Data Infographic")]
    Infographic,
    Meme,
}

impl VisualStyle {
    pub fn label(self) -> &'static str {
        match self {
            Self::Microblog => "Microblog",
            Self::Typography => "Typography",
            Self::Showcase => "Showcase",
            Self::Aesthetic => "Aesthetic",
            Self::Collage => "Collage",
            Self::Infographic => "Data Infographic",
            Self::Meme => "Meme",
        }
    }
}

/// Output language of generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Id,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoIdea {
    pub title: String,
    pub script: String,
    pub storyboard: String,
}

/// Structured caption / video-concept result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub headline: String,
    pub hook: String,
    pub caption: String,
    pub call_to_action: String,
    pub video_ideas: Vec<VideoIdea>,
}

/// Exactly one generated raster image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    pub fn to_data_url(&self) -> String {
        crate::data_url::encode(&self.mime_type, &self.bytes)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Remote content capability: captions, visuals, enhancement.
///
/// Every call either returns a complete result or fails; there are no
/// partial results.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_caption(
        &self,
        image: &SourceFile,
        context: &str,
        platform: Platform,
        language: Language,
    ) -> Result<GeneratedContent, CoreError>;

    async fn generate_visual(
        &self,
        images: &[Arc<SourceFile>],
        context: &str,
        style: VisualStyle,
        language: Language,
    ) -> Result<GeneratedImage, CoreError>;

    /// Enhance one product photo. Implementations substitute the nearest
    /// supported aspect ratio when the requested one is not available.
    async fn enhance_image(
        &self,
        image: &SourceFile,
        settings: &EnhanceSettings,
    ) -> Result<GeneratedImage, CoreError>;
}

/// Resolves an image reference (URL) to its bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError>;
}

/// Fetcher that only understands inline `data:` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlFetcher;

#[async_trait]
impl ImageFetcher for DataUrlFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        if !crate::data_url::is_data_url(url) {
            return Err(CoreError::Validation(format!(
                "Cannot fetch non-data URL '{}'",
                url.chars().take(64).collect::<String>()
            )));
        }
        Ok(crate::data_url::decode(url)?.bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
