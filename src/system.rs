//! System information for the debug page.
//!
//! The debug page is an ordinary [`Document`] rendered with a built-in theme,
//! so printing it exercises the whole pipeline and the browser in one go.

use crate::document::{Document, DocumentConfig};
use crate::error::Result;
use crate::theme::Theme;
use serde::Serialize;
use std::collections::BTreeMap;

const DEBUG_THEME: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/debug.html"));

const DEBUG_BODY: &str = r#"# {{.Title}}

Generated on {{.Data.System.date}} at {{.Data.System.time}}.

| Setting | Value |
|---|---|
| Version | `{{.Data.System.version}}` |
| Platform | `{{.Data.System.os}}/{{.Data.System.arch}}` |
| Browser | `{{.Data.System.browser}}` |
| Theme directory | `{{.Data.System.theme_dir}}` |
| Settings directory | `{{.Data.System.config_dir}}` |

## Raw data

```json
{{.Data.Dump}}
```

## Rendering check

Table, ~~strikethrough~~ and inline math $a^2 + b^2 = c^2$ should all render.
"#;

#[derive(Debug, Clone, Serialize)]
pub struct SystemData {
    pub date: String,
    pub time: String,
    pub version: String,
    pub os: String,
    pub arch: String,
    pub browser: String,
    pub theme_dir: String,
    pub config_dir: String,
}

impl SystemData {
    pub fn collect(browser: Option<&str>, theme_dir: &str) -> SystemData {
        let now = chrono::Local::now();
        SystemData {
            date: now.format("%d %B %Y").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            browser: browser.unwrap_or("not found").to_string(),
            theme_dir: theme_dir.to_string(),
            config_dir: crate::settings::config_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    /// Build the debug page document.
    pub fn debug_document(&self) -> Result<Document> {
        let system = serde_json::to_value(self).unwrap_or_default();
        let dump = serde_json::to_string_pretty(&system).unwrap_or_default();

        let mut data = BTreeMap::new();
        data.insert("System".to_string(), system);
        data.insert("Dump".to_string(), serde_json::Value::String(dump));

        let config = DocumentConfig {
            enabled: true,
            theme: String::new(),
            title: "mdoc debug page".to_string(),
            author: format!("mdoc {}", self.version),
            tags: vec!["debug".to_string()],
            data,
        };

        Ok(Document::new(
            config,
            DEBUG_BODY.to_string(),
            Theme::compile("debug", DEBUG_THEME)?,
        ))
    }
}
