//! User-facing postfix template settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::template::TemplateDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to parse postfix settings: {0}")]
    Toml(String),
    #[error("unknown postfix setting `{0}`")]
    UnknownKey(String),
}

impl From<toml::de::Error> for SettingsError {
    fn from(err: toml::de::Error) -> Self {
        // Keep just the message; the default `Display` embeds a source snippet.
        SettingsError::Toml(err.message().to_string())
    }
}

/// Settings consulted by dispatch, the rewrite engine and the completion helpers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PostfixSettings {
    /// Offer postfix templates in the completion list.
    pub show_postfix_items: bool,
    /// Statement templates emit `{ }` around their embedded statement.
    pub braces_for_embedded_statements: bool,
    /// Show parameter info after an expansion leaves the caret inside an argument list.
    pub show_parameter_info: bool,
    /// Offer a `Count` alias for `Length` and vice versa.
    pub show_length_count_items: bool,
    /// Upper bound when searching for a free type parameter name (`T`, `T2`, ...).
    pub type_parameter_name_limit: u32,
    /// Per-template overrides keyed by template name.
    pub templates: BTreeMap<String, bool>,
}

impl Default for PostfixSettings {
    fn default() -> Self {
        Self {
            show_postfix_items: true,
            braces_for_embedded_statements: true,
            show_parameter_info: false,
            show_length_count_items: true,
            type_parameter_name_limit: 100,
            templates: BTreeMap::new(),
        }
    }
}

impl PostfixSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Whether `descriptor` takes part in dispatch. An explicit override wins over
    /// the descriptor's own default.
    pub fn is_enabled(&self, descriptor: &TemplateDescriptor) -> bool {
        self.templates
            .get(descriptor.name.as_str())
            .copied()
            .unwrap_or(!descriptor.disabled_by_default)
    }

    pub fn set_template_enabled(&mut self, name: &str, enabled: bool) {
        self.templates.insert(name.to_string(), enabled);
    }

    /// Flat key/value view: `braces_for_embedded_statements`, `templates.if`, ...
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            "show_postfix_items" => Some(self.show_postfix_items),
            "braces_for_embedded_statements" => Some(self.braces_for_embedded_statements),
            "show_parameter_info" => Some(self.show_parameter_info),
            "show_length_count_items" => Some(self.show_length_count_items),
            _ => key
                .strip_prefix("templates.")
                .and_then(|name| self.templates.get(name).copied()),
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<(), SettingsError> {
        match key {
            "show_postfix_items" => self.show_postfix_items = value,
            "braces_for_embedded_statements" => self.braces_for_embedded_statements = value,
            "show_parameter_info" => self.show_parameter_info = value,
            "show_length_count_items" => self.show_length_count_items = value,
            _ => match key.strip_prefix("templates.") {
                Some(name) if !name.is_empty() => self.set_template_enabled(name, value),
                _ => return Err(SettingsError::UnknownKey(key.to_string())),
            },
        }
        Ok(())
    }
}
