//! Themes: HTML templates wrapped around the converted document body.
//!
//! A theme named `report` lives at `{theme_dir}/report.html`. The theme
//! directory is configured as a path template such as
//! `${XDG_CONFIG_HOME}/mdoc/themes` or `~/themes` and expanded against an
//! explicit [`Environment`]. A document without a theme name gets
//! [`FALLBACK_THEME`]; a named theme that can't be read is an error, never a
//! silent fallback.
//!
//! Themes see `Title`, `Author`, `Tags`, `Data` and `Body`. Everything except
//! `Body`, `Data` keys included, is HTML-escaped once while building
//! [`RenderData`]; `Body` is
//! [`TrustedHtml`] and lands in the page verbatim.

use crate::document::DocumentConfig;
use crate::error::{MdocError, Result};
use crate::template;
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Used when a document doesn't name a theme.
pub const FALLBACK_THEME: &str =
    "<!doctype html><html><head><title>{{.Title}}</title></head><body>{{.Body}}</body></html>";

const TEMPLATE_NAME: &str = "theme";

/// HTML that is embedded into themes without escaping.
///
/// Only produced by the markdown converter. Raw HTML written in the markdown
/// source passes through as well, so a document can inject arbitrary markup
/// into its own output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    pub(crate) fn new(html: String) -> TrustedHtml {
        TrustedHtml(html)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The values a theme template can reference.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenderData {
    title: String,
    author: String,
    tags: Vec<String>,
    data: BTreeMap<String, Value>,
    body: TrustedHtml,
}

impl RenderData {
    pub fn new(config: &DocumentConfig, body: TrustedHtml) -> RenderData {
        RenderData {
            title: escape(&config.title),
            author: escape(&config.author),
            tags: config.tags.iter().map(|tag| escape(tag)).collect(),
            data: config
                .data
                .iter()
                .map(|(key, value)| (escape(key), escape_value(value)))
                .collect(),
            body,
        }
    }
}

fn escape(text: &str) -> String {
    html_escape::encode_safe(text).into_owned()
}

fn escape_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape(s)),
        Value::Array(items) => Value::Array(items.iter().map(escape_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (escape(key), escape_value(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// A snapshot of environment variables used to expand path templates.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn from_process() -> Environment {
        std::env::vars().collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    fn home_dir(&self) -> Option<&str> {
        self.get("HOME").or_else(|| self.get("USERPROFILE"))
    }

    /// Expand `~`, `$VAR` and `${VAR}` in `template`.
    ///
    /// Unknown variables are left in place so they show up in error messages.
    pub fn expand_path(&self, template: &str) -> PathBuf {
        let expanded = shellexpand::full_with_context_no_errors(
            template,
            || self.home_dir(),
            |name| self.get(name),
        );
        PathBuf::from(expanded.as_ref())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Environment {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A compiled theme template.
#[derive(Debug, Clone)]
pub struct Theme {
    name: String,
    registry: Handlebars<'static>,
}

impl Theme {
    /// Compile theme `source`. `name` labels errors.
    pub fn compile<S: Into<String>>(name: S, source: &str) -> Result<Theme> {
        let name = name.into();
        let mut registry = template::registry();
        template::register(&mut registry, TEMPLATE_NAME, source).map_err(|e| match e {
            MdocError::Template { message, .. } => MdocError::Template {
                name: format!("theme `{name}`"),
                message,
            },
            other => other,
        })?;
        Ok(Theme { name, registry })
    }

    pub fn fallback() -> Result<Theme> {
        Theme::compile("fallback", FALLBACK_THEME)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, data: &RenderData) -> Result<String> {
        template::render(&self.registry, TEMPLATE_NAME, data).map_err(|e| match e {
            MdocError::Template { message, .. } => MdocError::Template {
                name: format!("theme `{}`", self.name),
                message,
            },
            other => other,
        })
    }
}

/// Finds theme files in a theme directory.
#[derive(Debug, Clone)]
pub struct ThemeResolver {
    dir: PathBuf,
}

impl ThemeResolver {
    pub fn new<P: Into<PathBuf>>(dir: P) -> ThemeResolver {
        ThemeResolver { dir: dir.into() }
    }

    /// Resolver for a directory given as a path template.
    pub fn from_template(dir_template: &str, env: &Environment) -> ThemeResolver {
        ThemeResolver::new(env.expand_path(dir_template))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the theme called `name` is expected.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.html"))
    }

    /// Load and compile a theme. An empty name selects [`FALLBACK_THEME`].
    pub fn load(&self, name: &str) -> Result<Theme> {
        if name.is_empty() {
            return Theme::fallback();
        }

        let path = self.path_for(name);
        if name.contains(['/', '\\']) || name.contains("..") {
            return Err(MdocError::ThemeLoad {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "theme names can't contain path separators or `..`",
                ),
            });
        }

        log::debug!("loading theme `{name}` from {}", path.display());
        let source = std::fs::read_to_string(&path).map_err(|source| MdocError::ThemeLoad {
            path: path.clone(),
            source,
        })?;
        Theme::compile(name, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(config: &DocumentConfig, body: &str) -> RenderData {
        RenderData::new(config, TrustedHtml::new(body.to_string()))
    }

    #[test]
    fn fallback_theme_renders_title_and_body() {
        let config = DocumentConfig::fallback();
        let html = Theme::fallback()
            .expect("fallback compiles")
            .render(&data(&config, "<p>hi</p>"))
            .expect("can render");
        assert_eq!(
            html,
            "<!doctype html><html><head><title>Untitled</title></head><body><p>hi</p></body></html>"
        );
    }

    #[test]
    fn values_are_escaped_once_and_body_is_not() {
        let mut config = DocumentConfig::fallback();
        config.title = "Fish & \"Chips\"".to_string();
        config.data.insert(
            "nested".to_string(),
            serde_json::json!({ "list": ["<i>x</i>"], "n": 2 }),
        );
        let theme = Theme::compile(
            "test",
            r#"<meta content="{{.Title}}">{{Data.nested.list.[0]}}{{Data.nested.n}}{{{Body}}}"#,
        )
        .expect("can compile");
        let html = theme
            .render(&data(&config, "<em>&amp;</em>"))
            .expect("can render");
        assert_eq!(
            html,
            r#"<meta content="Fish &amp; &quot;Chips&quot;">&lt;i&gt;x&lt;&#x2F;i&gt;2<em>&amp;</em>"#
        );
    }

    #[test]
    fn data_keys_are_escaped() {
        let mut config = DocumentConfig::fallback();
        config
            .data
            .insert("<b>k</b>".to_string(), serde_json::json!({ "a&b": "v" }));
        let theme = Theme::compile(
            "keys",
            "{{#each Data}}{{@key}}:{{#each this}}{{@key}}={{this}}{{/each}}{{/each}}",
        )
        .expect("can compile");
        let html = theme.render(&data(&config, "")).expect("can render");
        assert_eq!(html, "&lt;b&gt;k&lt;&#x2F;b&gt;:a&amp;b=v");
    }

    #[test]
    fn theme_without_body_is_not_an_error() {
        let theme = Theme::compile("bare", "<h1>{{.Title}}</h1>").expect("can compile");
        let html = theme
            .render(&data(&DocumentConfig::fallback(), "<p>lost</p>"))
            .expect("can render");
        assert_eq!(html, "<h1>Untitled</h1>");
    }

    #[test]
    fn broken_theme_is_a_template_error() {
        match Theme::compile("broken", "{{#if Title}}unclosed") {
            Err(MdocError::Template { name, .. }) => assert!(name.contains("broken")),
            other => panic!("expected a template error, got {other:?}"),
        }
    }

    #[test]
    fn can_load_theme_from_directory() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        std::fs::write(dir.path().join("report.html"), "<title>{{.Title}}</title>{{.Body}}")
            .expect("can write theme");

        let resolver = ThemeResolver::new(dir.path());
        let theme = resolver.load("report").expect("can load theme");
        assert_eq!(theme.name(), "report");
        let html = theme
            .render(&data(&DocumentConfig::fallback(), "<p>x</p>"))
            .expect("can render");
        assert_eq!(html, "<title>Untitled</title><p>x</p>");
    }

    #[test]
    fn bundled_plain_theme_renders() {
        let source = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/themes/plain.html"));
        let mut config = DocumentConfig::fallback();
        config.tags = vec!["a".to_string(), "b".to_string()];
        let html = Theme::compile("plain", source)
            .expect("bundled theme compiles")
            .render(&data(&config, "<p>content</p>"))
            .expect("can render");
        assert!(html.contains("<title>Untitled</title>"));
        assert!(html.contains(r#"content="a, b""#), "{html}");
        assert!(html.contains("<p>content</p>"));
    }

    #[test]
    fn empty_name_selects_fallback() {
        let resolver = ThemeResolver::new("/definitely/not/a/real/dir");
        let theme = resolver.load("").expect("fallback always loads");
        assert_eq!(theme.name(), "fallback");
    }

    #[test]
    fn missing_theme_names_the_path() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let resolver = ThemeResolver::new(dir.path());
        match resolver.load("doesnotexist") {
            Err(MdocError::ThemeLoad { path, .. }) => {
                assert_eq!(path, dir.path().join("doesnotexist.html"));
            }
            other => panic!("expected a theme load error, got {other:?}"),
        }
    }

    #[test]
    fn theme_names_cannot_escape_the_directory() {
        let resolver = ThemeResolver::new("themes");
        assert!(matches!(
            resolver.load("../secrets"),
            Err(MdocError::ThemeLoad { .. })
        ));
        assert!(matches!(
            resolver.load("nested/theme"),
            Err(MdocError::ThemeLoad { .. })
        ));
    }

    #[test]
    fn can_expand_paths_against_explicit_environment() {
        let env: Environment = [("XDG_CONFIG_HOME", "/cfg"), ("HOME", "/home/sam")]
            .into_iter()
            .collect();
        assert_eq!(
            env.expand_path("${XDG_CONFIG_HOME}/mdoc/themes"),
            PathBuf::from("/cfg/mdoc/themes")
        );
        assert_eq!(
            env.expand_path("$XDG_CONFIG_HOME/mdoc"),
            PathBuf::from("/cfg/mdoc")
        );
        assert_eq!(env.expand_path("~/themes"), PathBuf::from("/home/sam/themes"));
        assert_eq!(
            env.expand_path("$UNSET_VARIABLE/themes"),
            PathBuf::from("$UNSET_VARIABLE/themes")
        );

        let resolver = ThemeResolver::from_template("${XDG_CONFIG_HOME}/mdoc/themes", &env);
        assert_eq!(
            resolver.path_for("plain"),
            PathBuf::from("/cfg/mdoc/themes/plain.html")
        );
    }
}
