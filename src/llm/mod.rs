//! LLM backend implementations.
//!
//! Only Gemini is implemented. The provider name is still checked so an
//! unknown name fails before any credential lookup or network traffic.

pub mod gemini;

use crate::config::Config;
use crate::error::AiqError;
use anyhow::Result;
use std::str::FromStr;

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

impl FromStr for Provider {
    type Err = AiqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemini" => Ok(Provider::Gemini),
            other => Err(AiqError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Enum-based backend for LLM providers.
pub enum Backend {
    Gemini(gemini::GeminiBackend),
}

impl Backend {
    /// Generate text, returning the response fragments in order.
    pub async fn generate(
        &self,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> Result<Vec<String>> {
        match self {
            Backend::Gemini(b) => b.generate(system_instruction, prompt).await,
        }
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Gemini(_) => "gemini",
        }
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        match self {
            Backend::Gemini(b) => &b.model,
        }
    }
}

/// Create a backend for `provider`, resolving its credential from the environment.
pub fn create_backend(provider: Provider, model: &str, config: &Config) -> Result<Backend> {
    match provider {
        Provider::Gemini => {
            let api_key = gemini::api_key()?;
            let backend = gemini::GeminiBackend::new(
                model.to_string(),
                config.gemini.base_url.clone(),
                api_key,
            )?;
            Ok(Backend::Gemini(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gemini() {
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
    }

    #[test]
    fn test_parse_unsupported() {
        let err = "openai".parse::<Provider>().unwrap_err();
        assert!(matches!(err, AiqError::UnsupportedProvider(ref name) if name == "openai"));
    }

    #[test]
    fn test_provider_names_are_case_sensitive() {
        assert!("Gemini".parse::<Provider>().is_err());
    }
}
