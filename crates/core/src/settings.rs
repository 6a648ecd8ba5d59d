//! Enhancement settings shared by every job processed after a change.
//!
//! Settings are global and unversioned: a job re-processed after a change
//! uses the settings current at dispatch time, and nothing records which
//! settings produced an earlier result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::SourceFile;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default custom background color (only meaningful with the `Custom` preset).
pub const DEFAULT_CUSTOM_BACKGROUND: &str = "#ffffff";

/// Maximum length of the free-text object color directive.
pub const MAX_OBJECT_COLOR_LEN: usize = 120;

// ---------------------------------------------------------------------------
// Aspect ratio
// ---------------------------------------------------------------------------

/// Output aspect ratios offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "16:9")]
    Wide16x9,
    #[serde(rename = "9:16")]
    Tall9x16,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 6] = [
        Self::Square,
        Self::Portrait3x4,
        Self::Landscape4x3,
        Self::Portrait4x5,
        Self::Wide16x9,
        Self::Tall9x16,
    ];

    /// Ratio label as sent on the wire, e.g. `"16:9"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait4x5 => "4:5",
            Self::Wide16x9 => "16:9",
            Self::Tall9x16 => "9:16",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == value.trim())
            .ok_or_else(|| CoreError::Validation(format!("Unsupported aspect ratio '{value}'")))
    }

    /// The ratio actually requested from the remote capability.
    ///
    /// `4:5` is not available remotely and maps to the closest vertical
    /// ratio, `3:4`.
    pub fn nearest_supported(self) -> Self {
        match self {
            Self::Portrait4x5 => Self::Portrait3x4,
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Background preset
// ---------------------------------------------------------------------------

/// Named background presets; `Custom` defers to `custom_background_color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BackgroundPreset {
    #[default]
    White,
    Black,
    Gray,
    #[serde(rename = "Green Screen")]
    GreenScreen,
    Custom,
}

impl BackgroundPreset {
    pub fn label(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
            Self::Gray => "Gray",
            Self::GreenScreen => "Green Screen",
            Self::Custom => "Custom",
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The single shared settings record read by every processing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhanceSettings {
    pub aspect_ratio: AspectRatio,
    pub background_color: BackgroundPreset,
    pub custom_background_color: String,
    /// Recolor directive for the product; `None` keeps true colors.
    pub object_color: Option<String>,
    /// Decorative overlay applied at export time only; never sent remotely.
    #[serde(skip)]
    pub frame_file: Option<Arc<SourceFile>>,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            background_color: BackgroundPreset::default(),
            custom_background_color: DEFAULT_CUSTOM_BACKGROUND.to_string(),
            object_color: None,
            frame_file: None,
        }
    }
}

/// Partial update of the user-editable settings fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEnhanceSettings {
    pub aspect_ratio: Option<AspectRatio>,
    pub background_color: Option<BackgroundPreset>,
    pub custom_background_color: Option<String>,
    /// An empty string clears the directive.
    pub object_color: Option<String>,
}

impl EnhanceSettings {
    /// Apply a validated partial update in place.
    pub fn apply(&mut self, update: UpdateEnhanceSettings) -> Result<(), CoreError> {
        if let Some(color) = &update.custom_background_color {
            validate_hex_color(color)?;
        }
        if let Some(color) = &update.object_color {
            if color.chars().count() > MAX_OBJECT_COLOR_LEN {
                return Err(CoreError::Validation(format!(
                    "Object color must not exceed {MAX_OBJECT_COLOR_LEN} characters"
                )));
            }
        }

        if let Some(ratio) = update.aspect_ratio {
            self.aspect_ratio = ratio;
        }
        if let Some(preset) = update.background_color {
            self.background_color = preset;
        }
        if let Some(color) = update.custom_background_color {
            self.custom_background_color = color.trim().to_ascii_lowercase();
        }
        if let Some(color) = update.object_color {
            let trimmed = color.trim();
            self.object_color = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        Ok(())
    }

    /// Background clause for the enhancement prompt.
    pub fn background_description(&self) -> String {
        match self.background_color {
            BackgroundPreset::White => "clean, studio white background".to_string(),
            BackgroundPreset::Black => "elegant studio black background".to_string(),
            BackgroundPreset::Gray => "neutral gray studio background".to_string(),
            BackgroundPreset::GreenScreen => {
                "solid bright green background (hex #00FF00) for chroma keying".to_string()
            }
            BackgroundPreset::Custom => format!(
                "solid background with color {}",
                self.custom_background_color
            ),
        }
    }

    /// Product color clause for the enhancement prompt.
    pub fn object_color_instruction(&self) -> String {
        match self.object_color.as_deref() {
            Some(color) => format!(
                "CHANGE PRODUCT COLOR: Change the main product's material color to {color}. \
                 IMPORTANT: The shape, form, geometry, and texture must remain EXACTLY the same \
                 as the original image. Do not morph, distort, or reimagine the object. It must \
                 look like the exact same object, just painted {color}."
            ),
            None => "Keep the product colors true to life.".to_string(),
        }
    }

    pub fn has_frame(&self) -> bool {
        self.frame_file.is_some()
    }
}

/// Validate a `#rgb` or `#rrggbb` color value.
pub fn validate_hex_color(value: &str) -> Result<(), CoreError> {
    let value = value.trim();
    let digits = value.strip_prefix('#').unwrap_or("");
    let valid_len = digits.len() == 3 || digits.len() == 6;
    if valid_len && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid color '{value}'. Expected #rgb or #rrggbb"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- AspectRatio -----------------------------------------------------------

    #[test]
    fn four_by_five_maps_to_three_by_four() {
        assert_eq!(
            AspectRatio::Portrait4x5.nearest_supported(),
            AspectRatio::Portrait3x4
        );
    }

    #[test]
    fn supported_ratios_pass_through() {
        for ratio in AspectRatio::ALL {
            if ratio != AspectRatio::Portrait4x5 {
                assert_eq!(ratio.nearest_supported(), ratio);
            }
        }
    }

    #[test]
    fn ratio_parse_and_serde_agree() {
        let ratio = AspectRatio::parse("16:9").unwrap();
        assert_eq!(ratio, AspectRatio::Wide16x9);
        assert_eq!(serde_json::to_value(ratio).unwrap(), "16:9");
        assert!(AspectRatio::parse("2:1").is_err());
    }

    // -- Settings --------------------------------------------------------------

    #[test]
    fn defaults_match_initial_form_state() {
        let s = EnhanceSettings::default();
        assert_eq!(s.aspect_ratio, AspectRatio::Square);
        assert_eq!(s.background_color, BackgroundPreset::White);
        assert_eq!(s.custom_background_color, "#ffffff");
        assert!(s.object_color.is_none());
        assert!(!s.has_frame());
    }

    #[test]
    fn apply_updates_only_given_fields() {
        let mut s = EnhanceSettings::default();
        s.apply(UpdateEnhanceSettings {
            background_color: Some(BackgroundPreset::Custom),
            custom_background_color: Some("#FFAA00".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.aspect_ratio, AspectRatio::Square);
        assert_eq!(s.background_description(), "solid background with color #ffaa00");
    }

    #[test]
    fn apply_rejects_bad_color_without_partial_mutation() {
        let mut s = EnhanceSettings::default();
        let result = s.apply(UpdateEnhanceSettings {
            aspect_ratio: Some(AspectRatio::Tall9x16),
            custom_background_color: Some("red".into()),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(s.aspect_ratio, AspectRatio::Square);
    }

    #[test]
    fn empty_object_color_clears_directive() {
        let mut s = EnhanceSettings::default();
        s.apply(UpdateEnhanceSettings {
            object_color: Some("matte navy".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(s.object_color_instruction().contains("matte navy"));

        s.apply(UpdateEnhanceSettings {
            object_color: Some("   ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.object_color_instruction(), "Keep the product colors true to life.");
    }

    #[test]
    fn green_screen_description_names_hex() {
        let s = EnhanceSettings {
            background_color: BackgroundPreset::GreenScreen,
            ..Default::default()
        };
        assert!(s.background_description().contains("#00FF00"));
    }

    #[test]
    fn preset_serde_uses_labels() {
        let json = serde_json::to_value(BackgroundPreset::GreenScreen).unwrap();
        assert_eq!(json, "Green Screen");
        assert_eq!(BackgroundPreset::GreenScreen.label(), "Green Screen");
    }

    #[test]
    fn hex_color_validation() {
        assert!(validate_hex_color("#fff").is_ok());
        assert!(validate_hex_color("#A1b2C3").is_ok());
        assert!(validate_hex_color("fff").is_err());
        assert!(validate_hex_color("#ffff").is_err());
        assert!(validate_hex_color("#gggggg").is_err());
    }
}
