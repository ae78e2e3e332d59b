/// Upstream API credential, read once at startup and injected into the
/// router state. Never reconstructed per request.
#[derive(Clone)]
pub struct ApiCredential(String);

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiCredential").field(&"<redacted>").finish()
    }
}

impl ApiCredential {
    pub const ENV_VAR: &'static str = "STABILITY_API_KEY";

    const PREFIX: &'static str = "sk-";
    const MIN_LEN: usize = 20;

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    /// Format rule only; no network validation is ever performed.
    pub fn is_valid_format(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::MIN_LEN
    }

    pub fn format_status(&self) -> &'static str {
        if self.is_valid_format() {
            "valid format"
        } else {
            "invalid format"
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}
