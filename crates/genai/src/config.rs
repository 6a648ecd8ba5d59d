/// Remote capability configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    /// Base URL of the REST API, without trailing slash.
    pub api_url: String,
    /// API key sent in the `x-goog-api-key` header. Empty disables auth,
    /// in which case every call fails remotely and jobs end up in `error`.
    pub api_key: String,
    /// Model used for structured text (captions, video ideas).
    pub text_model: String,
    /// Model used for image generation and enhancement.
    pub image_model: String,
}

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl GenAiConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var             | Default                                            |
    /// |---------------------|----------------------------------------------------|
    /// | `GENAI_API_URL`     | `https://generativelanguage.googleapis.com/v1beta` |
    /// | `GENAI_API_KEY`     | empty                                              |
    /// | `GENAI_TEXT_MODEL`  | `gemini-3-pro-preview`                             |
    /// | `GENAI_IMAGE_MODEL` | `gemini-3-pro-image-preview`                       |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: String| std::env::var(name).unwrap_or(default);

        Self {
            api_url: var("GENAI_API_URL", defaults.api_url)
                .trim_end_matches('/')
                .to_string(),
            api_key: var("GENAI_API_KEY", defaults.api_key),
            text_model: var("GENAI_TEXT_MODEL", defaults.text_model),
            image_model: var("GENAI_IMAGE_MODEL", defaults.image_model),
        }
    }
}
