//! The single shared [`EnhanceSettings`] record.
//!
//! Readers take a snapshot; processing calls snapshot at dispatch so a
//! later change never alters a call already in flight.

use std::sync::Arc;

use kana_core::error::CoreError;
use kana_core::settings::{EnhanceSettings, UpdateEnhanceSettings};
use kana_core::types::SourceFile;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct SettingsHandle {
    inner: RwLock<EnhanceSettings>,
}

impl SettingsHandle {
    pub fn new(settings: EnhanceSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub async fn snapshot(&self) -> EnhanceSettings {
        self.inner.read().await.clone()
    }

    pub async fn update(&self, update: UpdateEnhanceSettings) -> Result<EnhanceSettings, CoreError> {
        let mut settings = self.inner.write().await;
        settings.apply(update)?;
        tracing::debug!(
            aspect_ratio = settings.aspect_ratio.as_str(),
            background = settings.background_color.label(),
            "Enhance settings updated",
        );
        Ok(settings.clone())
    }

    /// Set or clear the export frame overlay.
    pub async fn set_frame(&self, frame: Option<Arc<SourceFile>>) -> EnhanceSettings {
        let mut settings = self.inner.write().await;
        settings.frame_file = frame;
        settings.clone()
    }

    pub async fn frame(&self) -> Option<Arc<SourceFile>> {
        self.inner.read().await.frame_file.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kana_core::settings::AspectRatio;

    #[tokio::test]
    async fn snapshot_is_detached_from_later_updates() {
        let handle = SettingsHandle::default();
        let before = handle.snapshot().await;

        handle
            .update(UpdateEnhanceSettings {
                aspect_ratio: Some(AspectRatio::Tall9x16),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(before.aspect_ratio, AspectRatio::Square);
        assert_eq!(handle.snapshot().await.aspect_ratio, AspectRatio::Tall9x16);
    }

    #[tokio::test]
    async fn invalid_update_leaves_settings_unchanged() {
        let handle = SettingsHandle::default();
        let result = handle
            .update(UpdateEnhanceSettings {
                aspect_ratio: Some(AspectRatio::Wide16x9),
                custom_background_color: Some("not-a-color".into()),
                ..Default::default()
            })
            .await;

        assert!(result.is_err());
        assert_eq!(handle.snapshot().await, EnhanceSettings::default());
    }

    #[tokio::test]
    async fn frame_can_be_set_and_cleared() {
        let handle = SettingsHandle::default();
        let frame = SourceFile::new("frame.png", "image/png", vec![1]).shared();
        assert!(handle.set_frame(Some(frame)).await.has_frame());
        assert!(handle.frame().await.is_some());
        assert!(!handle.set_frame(None).await.has_frame());
    }
}
