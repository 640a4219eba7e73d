//! Provider settings and the persisted store of saved AI configurations.
//!
//! [`ProviderSettings`] is the snapshot a request is built from.  It usually
//! comes from [`ConfigurationStore::active_settings`], which mirrors the
//! editor's settings dialog: several named configurations, one of them active,
//! plus a list of preset system words prepended to every conversation.

use std::{
    env, fs,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::error::{InkpressError, Result};

pub const DEFAULT_PROVIDER_ID: &str = "custom";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Everything needed to talk to one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Opaque key selecting the provider profile (`openai`, `qwen`, `custom`, …).
    pub provider_id: String,
    pub api_key: String,
    /// Full chat-completions endpoint URL, not a base URL.
    pub api_domain: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Sent as system messages, in order, ahead of every prompt.
    #[serde(default)]
    pub preset_system_messages: Vec<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_id: DEFAULT_PROVIDER_ID.to_owned(),
            api_key: String::new(),
            api_domain: String::new(),
            model: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            preset_system_messages: Vec::new(),
        }
    }
}

impl ProviderSettings {
    pub fn new(
        api_domain: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_domain: api_domain.into(),
            api_key: api_key.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Load settings from `INKPRESS_*` environment variables.
    ///
    /// `INKPRESS_API_DOMAIN` is mandatory; everything else falls back to the
    /// defaults (`custom` provider, temperature 0.7, 2048 max tokens).
    pub fn from_env() -> Result<Self> {
        let api_domain = env::var("INKPRESS_API_DOMAIN").map_err(|_| {
            InkpressError::Config("missing env variable: `INKPRESS_API_DOMAIN`".into())
        })?;

        let mut settings = Self::new(
            api_domain,
            env::var("INKPRESS_API_KEY").unwrap_or_default(),
            env::var("INKPRESS_MODEL").unwrap_or_default(),
        );

        if let Ok(provider) = env::var("INKPRESS_PROVIDER") {
            settings.provider_id = provider;
        }
        if let Ok(raw) = env::var("INKPRESS_TEMPERATURE") {
            settings.temperature = raw.parse().map_err(|_| {
                InkpressError::Config(format!("`INKPRESS_TEMPERATURE` is not a number: {raw}"))
            })?;
        }
        if let Ok(raw) = env::var("INKPRESS_MAX_TOKENS") {
            settings.max_tokens = raw.parse().map_err(|_| {
                InkpressError::Config(format!("`INKPRESS_MAX_TOKENS` is not an integer: {raw}"))
            })?;
        }

        Ok(settings)
    }

    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = provider_id.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_preset_messages(mut self, presets: Vec<String>) -> Self {
        self.preset_system_messages = presets;
        self
    }

    /// Reject settings no provider could accept.
    pub fn validate(&self) -> Result<()> {
        if self.api_domain.trim().is_empty() {
            return Err(InkpressError::Config("missing API endpoint (`api_domain`)".into()));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(InkpressError::Invalid(format!(
                "temperature must be within 0..=1, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(InkpressError::Invalid("max_tokens must be positive".into()));
        }
        Ok(())
    }
}

/// A named, saved configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfiguration {
    pub id: String,
    pub name: String,
    pub api_key: String,
    pub api_domain: String,
    pub model: String,
    pub temperature: f64,
    pub max_length: u32,
}

/// The editable fields of an [`AiConfiguration`], as filled in by the
/// settings dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationDraft {
    /// Blank names are replaced with `config-<last four id characters>`.
    pub name: String,
    pub api_key: String,
    pub api_domain: String,
    pub model: String,
    pub temperature: f64,
    pub max_length: u32,
}

impl Default for ConfigurationDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            api_key: String::new(),
            api_domain: String::new(),
            model: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_length: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ConfigurationDraft {
    fn into_configuration(self, id: String) -> AiConfiguration {
        let name = if self.name.trim().is_empty() {
            default_name(&id)
        } else {
            self.name
        };

        AiConfiguration {
            id,
            name,
            api_key: self.api_key,
            api_domain: self.api_domain,
            model: self.model,
            temperature: self.temperature,
            max_length: self.max_length,
        }
    }
}

impl From<&AiConfiguration> for ConfigurationDraft {
    fn from(value: &AiConfiguration) -> Self {
        Self {
            name: value.name.clone(),
            api_key: value.api_key.clone(),
            api_domain: value.api_domain.clone(),
            model: value.model.clone(),
            temperature: value.temperature,
            max_length: value.max_length,
        }
    }
}

/// `config-` plus the last four characters of `id`.
fn default_name(id: &str) -> String {
    let tail = id.char_indices().rev().nth(3).map_or(0, |(at, _)| at);
    format!("config-{}", &id[tail..])
}

/// Saved configurations, the active selection and the preset system words.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationStore {
    #[serde(default)]
    configurations: Vec<AiConfiguration>,
    #[serde(default)]
    active_configuration_id: Option<String>,
    #[serde(default)]
    preset_words: Vec<String>,
}

impl ConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a store previously written by [`Self::save`].  A missing file
    /// yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, starting empty");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        let store = serde_json::from_str(&raw)?;
        Ok(store)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), count = self.configurations.len(), "saved configurations");
        Ok(())
    }

    pub fn configurations(&self) -> &[AiConfiguration] {
        &self.configurations
    }

    pub fn get(&self, id: &str) -> Option<&AiConfiguration> {
        self.configurations.iter().find(|c| c.id == id)
    }

    pub fn active_configuration(&self) -> Option<&AiConfiguration> {
        self.active_configuration_id
            .as_deref()
            .and_then(|id| self.get(id))
    }

    /// Store `draft` as a new configuration and make it the active one.
    pub fn save_configuration(&mut self, draft: ConfigurationDraft) -> &AiConfiguration {
        let id = self.fresh_id();
        self.configurations.push(draft.into_configuration(id.clone()));
        self.active_configuration_id = Some(id);

        let saved = self.configurations.len() - 1;
        &self.configurations[saved]
    }

    /// Replace the configuration `id` with `draft`, keeping its id.
    pub fn update_configuration(&mut self, id: &str, draft: ConfigurationDraft) -> Result<()> {
        let slot = self
            .configurations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| InkpressError::Config(format!("no configuration with id `{id}`")))?;

        *slot = draft.into_configuration(id.to_owned());
        Ok(())
    }

    /// Remove a configuration. Returns `false` if `id` was unknown.
    ///
    /// The active configuration cannot be deleted.
    pub fn delete_configuration(&mut self, id: &str) -> Result<bool> {
        if self.active_configuration_id.as_deref() == Some(id) {
            return Err(InkpressError::Config(
                "cannot delete the configuration currently in use".into(),
            ));
        }

        let before = self.configurations.len();
        self.configurations.retain(|c| c.id != id);
        Ok(self.configurations.len() != before)
    }

    pub fn activate(&mut self, id: &str) -> Result<&AiConfiguration> {
        let index = self
            .configurations
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| InkpressError::Config(format!("no configuration with id `{id}`")))?;

        self.active_configuration_id = Some(id.to_owned());
        Ok(&self.configurations[index])
    }

    pub fn preset_words(&self) -> &[String] {
        &self.preset_words
    }

    pub fn add_preset_word(&mut self, word: impl Into<String>) {
        self.preset_words.push(word.into());
    }

    pub fn remove_preset_word(&mut self, index: usize) -> Result<String> {
        if index >= self.preset_words.len() {
            return Err(InkpressError::Config(format!(
                "preset word index {index} out of range ({} words)",
                self.preset_words.len()
            )));
        }
        Ok(self.preset_words.remove(index))
    }

    /// Settings for the active configuration, preset words attached.
    pub fn active_settings(&self) -> Result<ProviderSettings> {
        let active = self
            .active_configuration()
            .ok_or_else(|| InkpressError::Config("no active AI configuration".into()))?;

        Ok(ProviderSettings {
            provider_id: DEFAULT_PROVIDER_ID.to_owned(),
            api_key: active.api_key.clone(),
            api_domain: active.api_domain.clone(),
            model: active.model.clone(),
            temperature: active.temperature,
            max_tokens: active.max_length,
            preset_system_messages: self.preset_words.clone(),
        })
    }

    fn fresh_id(&self) -> String {
        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        while self.get(&millis.to_string()).is_some() {
            millis += 1;
        }
        millis.to_string()
    }
}
