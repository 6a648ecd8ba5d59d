//! Prompt text and response schemas sent with each generation call.

use kana_core::generation::{Language, Platform, VisualStyle};
use kana_core::settings::{AspectRatio, EnhanceSettings};
use serde_json::{json, Value};

/// Aspect ratio requested for generated visuals. The intent is a vertical
/// 4:5 post; 3:4 is the closest ratio the image model accepts.
pub const VISUAL_ASPECT_RATIO: AspectRatio = AspectRatio::Portrait3x4;

// ---------------------------------------------------------------------------
// Captions
// ---------------------------------------------------------------------------

fn caption_language_line(language: Language) -> &'static str {
    match language {
        Language::Id => {
            "OUTPUT LANGUAGE: Indonesian (Bahasa Indonesia). Use formal yet trendy \
             Indonesian suitable for social media."
        }
        Language::En => "OUTPUT LANGUAGE: English.",
    }
}

/// System instruction for structured caption generation.
pub fn caption_system_instruction(platform: Platform, language: Language) -> String {
    format!(
        "You are Kana Creator, an expert social media strategist and creative director.

TARGET AUDIENCE PROFILE:
- Age: 18-35 years old (Gen Z & Millennials)
- Occupation: Office workers, Students, Creatives
- Persona: Tech-savvy, urban living, minimalists, Apple ecosystem enthusiasts.
- Tone: Modern, clean, professional yet relatable, witty, authentic. Avoid cringey hashtags or overuse of emojis.

{language}

TASK:
Analyze the provided image and description to create content for {platform}.

REQUIREMENTS:
1. Headline: Short, punchy, aesthetic.
2. Hook: The first sentence that stops the scroll.
3. Caption: Engaging narrative that resonates with the urban/tech lifestyle.
4. Call to Action (CTA): Low friction engagement (e.g., \"Save for later\", \"Share with a coworker\").
5. Video Ideas: Create exactly 3 distinct video concepts (Reels/TikToks) using the image as a reference/thumbnail. Include a Title, detailed Script, and Storyboard description for each.",
        language = caption_language_line(language),
        platform = platform.label(),
    )
}

/// User-turn text accompanying the caption image.
pub fn caption_user_text(context: &str, platform: Platform) -> String {
    format!("Description: {context}\nPlatform: {}", platform.label())
}

/// JSON schema the caption response must follow.
pub fn caption_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "headline": { "type": "STRING", "description": "Catchy headline for the post" },
            "hook": { "type": "STRING", "description": "First line to grab attention" },
            "caption": { "type": "STRING", "description": "Full caption body" },
            "callToAction": { "type": "STRING", "description": "Engagement prompt" },
            "videoIdeas": {
                "type": "ARRAY",
                "description": "List of 3 distinct video ideas (Reels/TikToks)",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING", "description": "Title of the video concept" },
                        "script": { "type": "STRING", "description": "Detailed voiceover or dialogue script" },
                        "storyboard": { "type": "STRING", "description": "Visual description of scenes/shots" }
                    },
                    "required": ["title", "script", "storyboard"]
                }
            }
        },
        "required": ["headline", "hook", "caption", "callToAction", "videoIdeas"]
    })
}

// ---------------------------------------------------------------------------
// Visuals
// ---------------------------------------------------------------------------

pub fn visual_prompt(context: &str, style: VisualStyle, language: Language) -> String {
    let language_line = match language {
        Language::Id => {
            "If any text is displayed in the image (like for Infographics), it MUST be in Indonesian."
        }
        Language::En => "Text should be in English.",
    };

    format!(
        "Create a high-quality, professional Instagram post (vertical 4:5 ratio) featuring these product materials.

Style: {style}
Context & Details to include: {context}
{language_line}

Instructions:
- Use the uploaded images as the source materials for the product composition.
- If multiple images are provided, arrange them creatively or select the best angle/item to fit the chosen style.
- If the style is 'Data Infographic' or 'Microblog', incorporate text elements based on the Context provided.
- If the style is 'Meme', make it witty and relatable to office workers/students.
- Ensure the aesthetic is modern, clean, and premium (Kana Creator style).
- The output must be a single generated image.",
        style = style.label(),
    )
}

// ---------------------------------------------------------------------------
// Enhancement
// ---------------------------------------------------------------------------

pub fn enhance_prompt(settings: &EnhanceSettings) -> String {
    format!(
        "Transform this product photo into a high-end, studio-quality e-commerce image.

Instructions:
1. {color}
2. BACKGROUND: Set to {background}.
3. LIGHTING: Apply soft, balanced, professional studio lighting. Eliminate harsh shadows.
4. PRESERVE GEOMETRY: The product shape in the output MUST match the input image 100%. Do not add or remove parts of the product.
5. CLEANUP: Remove any background distractions, text, or clutter, leaving only the product on the requested background.",
        color = settings.object_color_instruction(),
        background = settings.background_description(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use kana_core::settings::{BackgroundPreset, UpdateEnhanceSettings};

    #[test]
    fn caption_instruction_names_platform_and_language() {
        let text = caption_system_instruction(Platform::TikTok, Language::Id);
        assert!(text.contains("create content for TikTok"));
        assert!(text.contains("Bahasa Indonesia"));

        let text = caption_system_instruction(Platform::Instagram, Language::En);
        assert!(text.contains("OUTPUT LANGUAGE: English."));
    }

    #[test]
    fn caption_user_text_carries_context() {
        assert_eq!(
            caption_user_text("new mug", Platform::Threads),
            "Description: new mug\nPlatform: Threads"
        );
    }

    #[test]
    fn schema_requires_all_fields() {
        let schema = caption_response_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 5);
        assert!(required.iter().any(|v| v == "callToAction"));
    }

    #[test]
    fn visual_prompt_uses_style_label() {
        let text = visual_prompt("sale", VisualStyle::Infographic, Language::Id);
        assert!(text.contains("Style: Data Infographic"));
        assert!(text.contains("MUST be in Indonesian"));
    }

    #[test]
    fn enhance_prompt_reflects_settings() {
        let mut settings = EnhanceSettings::default();
        settings
            .apply(UpdateEnhanceSettings {
                background_color: Some(BackgroundPreset::Black),
                object_color: Some("matte navy".into()),
                ..Default::default()
            })
            .unwrap();

        let text = enhance_prompt(&settings);
        assert!(text.contains("elegant studio black background"));
        assert!(text.contains("just painted matte navy"));
    }

    #[test]
    fn enhance_prompt_defaults_keep_colors() {
        let text = enhance_prompt(&EnhanceSettings::default());
        assert!(text.contains("Keep the product colors true to life."));
        assert!(text.contains("clean, studio white background"));
    }
}
