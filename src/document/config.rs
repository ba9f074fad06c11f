//! Per-document settings decoded from YAML front matter.
//!
//! Decoding is lenient about scalar types: `title: 2024` is the string
//! `"2024"`, `tags: [2024, q3]` is two strings, and mapping keys inside
//! `data` are turned into strings whatever their YAML type.

use log::warn;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;

/// Settings for a single document.
///
/// Every field tolerates an explicit YAML `null`, which decodes to the field's
/// zero value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Whether the front matter is honoured at all (YAML key `mdoc`).
    #[serde(rename = "mdoc", deserialize_with = "nullable")]
    pub enabled: bool,
    /// Name of the theme to load. Empty selects the built-in fallback theme.
    #[serde(deserialize_with = "text")]
    pub theme: String,
    #[serde(deserialize_with = "text")]
    pub title: String,
    #[serde(deserialize_with = "text")]
    pub author: String,
    #[serde(deserialize_with = "text_list")]
    pub tags: Vec<String>,
    /// Free-form values, addressable from templates as `Data.<key>`.
    #[serde(deserialize_with = "data_map")]
    pub data: BTreeMap<String, JsonValue>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<YamlValue>::deserialize(deserializer)? {
        None => Ok(String::new()),
        Some(value) => {
            scalar_text(value).ok_or_else(|| D::Error::custom("expected a scalar value"))
        }
    }
}

fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut value = Option::<YamlValue>::deserialize(deserializer)?.unwrap_or(YamlValue::Null);
    while let YamlValue::Tagged(tagged) = value {
        value = tagged.value;
    }

    match value {
        YamlValue::Null => Ok(Vec::new()),
        YamlValue::Sequence(items) => items
            .into_iter()
            .map(|item| {
                scalar_text(item)
                    .ok_or_else(|| D::Error::custom("expected a list of scalar values"))
            })
            .collect(),
        _ => Err(D::Error::custom("expected a list of scalar values")),
    }
}

fn data_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<YamlValue>::deserialize(deserializer)?.unwrap_or(YamlValue::Null);
    match to_json(value).map_err(D::Error::custom)? {
        JsonValue::Null => Ok(BTreeMap::new()),
        JsonValue::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(D::Error::custom("expected a mapping")),
    }
}

/// The text of a YAML scalar; `None` for sequences and mappings.
fn scalar_text(value: YamlValue) -> Option<String> {
    match value {
        YamlValue::Null => Some(String::new()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::String(s) => Some(s),
        YamlValue::Tagged(tagged) => scalar_text(tagged.value),
        YamlValue::Sequence(_) | YamlValue::Mapping(_) => None,
    }
}

fn to_json(value: YamlValue) -> Result<JsonValue, String> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => json_number(&n),
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        YamlValue::Mapping(map) => JsonValue::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let key = scalar_text(key).ok_or("mapping keys must be scalars")?;
                    Ok((key, to_json(value)?))
                })
                .collect::<Result<serde_json::Map<_, _>, String>>()?,
        ),
        YamlValue::Tagged(tagged) => to_json(tagged.value)?,
    })
}

fn json_number(n: &serde_yaml::Number) -> JsonValue {
    if let Some(i) = n.as_i64() {
        return JsonValue::from(i);
    }
    if let Some(u) = n.as_u64() {
        return JsonValue::from(u);
    }
    // JSON has no NaN or infinity
    n.as_f64()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(n.to_string()))
}

impl DocumentConfig {
    /// The fixed configuration used whenever front matter is switched off.
    pub fn fallback() -> DocumentConfig {
        DocumentConfig {
            enabled: true,
            theme: "plain".to_string(),
            title: "Untitled".to_string(),
            author: "Anonymous".to_string(),
            tags: Vec::new(),
            data: BTreeMap::new(),
        }
    }

    /// The fallback configuration with a caller-chosen theme.
    pub fn fallback_with_theme<S: Into<String>>(theme: S) -> DocumentConfig {
        DocumentConfig {
            theme: theme.into(),
            ..DocumentConfig::fallback()
        }
    }

    /// Apply the `mdoc` kill switch.
    ///
    /// When `enabled` is false the whole configuration is replaced by
    /// `defaults`. Nothing is merged: a title set next to `mdoc: false` is
    /// discarded along with everything else.
    pub fn resolve(self, defaults: &DocumentConfig) -> DocumentConfig {
        if self.enabled {
            return self;
        }

        if self != DocumentConfig::default() {
            warn!("front matter sets `mdoc: false`, discarding its other settings");
        }
        defaults.clone()
    }

    /// View of the configuration handed to templates in the document body.
    pub fn template_context(&self) -> ConfigContext<'_> {
        ConfigContext {
            enabled: self.enabled,
            theme: &self.theme,
            title: &self.title,
            author: &self.author,
            tags: &self.tags,
            data: &self.data,
        }
    }
}

/// Template-facing names for [`DocumentConfig`] (`{{.Title}}`, `{{.Data.key}}`, ...).
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigContext<'a> {
    #[serde(rename = "MDoc")]
    enabled: bool,
    theme: &'a str,
    title: &'a str,
    author: &'a str,
    tags: &'a [String],
    data: &'a BTreeMap<String, JsonValue>,
}
