//! A markdown document and the pipeline that turns it into themed HTML.
//!
//! Rendering runs three stages in a fixed order:
//!
//! 1. the body is expanded as a template with the document config as context
//! 2. the expanded markdown is converted to HTML
//! 3. the HTML and the config are poured into the theme
//!
//! The first failing stage aborts the render. Rendering does no I/O; the theme
//! is read and compiled when the document is built.

mod config;
mod front_matter;

pub use config::DocumentConfig;
use front_matter::FrontMatter;

use crate::error::Result;
use crate::markdown;
use crate::template;
use crate::theme::{RenderData, Theme, ThemeResolver};
use std::io::Read;

#[derive(Debug, Clone)]
pub struct Document {
    pub config: DocumentConfig,
    /// Markdown source with the front matter removed.
    pub body: String,
    theme: Theme,
}

impl Document {
    pub fn new(config: DocumentConfig, body: String, theme: Theme) -> Document {
        Document {
            config,
            body,
            theme,
        }
    }

    /// Read a whole document from `reader`.
    ///
    /// `source_name` labels errors, `defaults` replace the config when the
    /// front matter doesn't enable itself with `mdoc: true`.
    pub fn parse<R: Read>(
        mut reader: R,
        source_name: &str,
        themes: &ThemeResolver,
        defaults: &DocumentConfig,
    ) -> Result<Document> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        Document::from_text(&input, source_name, themes, defaults)
    }

    pub fn from_text(
        input: &str,
        source_name: &str,
        themes: &ThemeResolver,
        defaults: &DocumentConfig,
    ) -> Result<Document> {
        let front_matter = FrontMatter::split(input);
        let config = front_matter.decode(source_name)?.resolve(defaults);
        log::debug!(
            "{source_name}: title `{}`, theme `{}`",
            config.title,
            config.theme
        );

        let theme = themes.load(&config.theme)?;
        Ok(Document::new(config, front_matter.body.to_string(), theme))
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Expand template references in the markdown body.
    pub fn substitute_body(&self) -> Result<String> {
        template::substitute("document body", &self.body, &self.config.template_context())
    }

    /// Render the document into a complete HTML page.
    pub fn render(&self) -> Result<String> {
        let markdown = self.substitute_body()?;
        let body = markdown::to_html(&markdown)?;
        log::trace!("converted body into {} bytes of HTML", body.as_str().len());
        self.theme.render(&RenderData::new(&self.config, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MdocError;

    fn resolver_with(themes: &[(&str, &str)]) -> (tempfile::TempDir, ThemeResolver) {
        let dir = tempfile::tempdir().expect("can create temp dir");
        for (name, source) in themes {
            std::fs::write(dir.path().join(format!("{name}.html")), source)
                .expect("can write theme");
        }
        let resolver = ThemeResolver::new(dir.path());
        (dir, resolver)
    }

    fn defaults() -> DocumentConfig {
        DocumentConfig::fallback_with_theme("")
    }

    #[test]
    fn can_render_with_fallback_theme() {
        let (_dir, themes) = resolver_with(&[]);
        let input = "---\nmdoc: true\ntitle: World\n---\n# Hi {{.Title}}\n";
        let doc = Document::from_text(input, "doc.md", &themes, &defaults()).expect("can parse");

        assert_eq!(doc.substitute_body().expect("can substitute"), "# Hi World\n");

        let html = doc.render().expect("can render");
        assert!(html.contains("<title>World</title>"), "{html}");
        assert!(html.contains(r#"<h1 id="hi-world">Hi World</h1>"#), "{html}");
    }

    #[test]
    fn rendering_is_repeatable() {
        let (_dir, themes) = resolver_with(&[]);
        let input = "---\nmdoc: true\ndata:\n  b: 2\n  a: 1\n---\n{{.Data.a}} {{.Data.b}}\n\n## Same\n\n## Same\n";
        let doc = Document::from_text(input, "doc.md", &themes, &defaults()).expect("can parse");
        assert_eq!(
            doc.render().expect("can render"),
            doc.render().expect("can render again")
        );
    }

    #[test]
    fn kill_switch_discards_front_matter() {
        let (_dir, themes) = resolver_with(&[]);
        let input = "---\nmdoc: false\ntitle: Ignored\ntheme: fancy\n---\n# {{.Title}}\n";
        let doc = Document::from_text(input, "doc.md", &themes, &defaults()).expect("can parse");
        assert_eq!(doc.config, defaults());
        assert!(doc.render().expect("can render").contains(">Untitled</h1>"));
    }

    #[test]
    fn input_without_front_matter_uses_defaults() {
        let (_dir, themes) = resolver_with(&[]);
        let input = "# Heading\n\nBody text.\n";
        let doc = Document::from_text(input, "doc.md", &themes, &defaults()).expect("can parse");
        assert_eq!(doc.body, input);
        assert_eq!(doc.config, defaults());
    }

    #[test]
    fn default_plain_theme_is_loaded_from_the_theme_dir() {
        let (_dir, themes) = resolver_with(&[("plain", "<main>{{.Body}}</main>")]);
        let doc = Document::from_text("text\n", "doc.md", &themes, &DocumentConfig::fallback())
            .expect("can parse");
        assert_eq!(doc.theme().name(), "plain");
        assert_eq!(doc.render().expect("can render"), "<main><p>text</p>\n</main>");
    }

    #[test]
    fn missing_data_key_is_a_template_error() {
        let (_dir, themes) = resolver_with(&[]);
        let input = "---\nmdoc: true\ndata:\n  present: yes\n---\n{{.Data.missing}}\n";
        let doc = Document::from_text(input, "doc.md", &themes, &defaults()).expect("can parse");
        assert!(matches!(doc.render(), Err(MdocError::Template { .. })));
    }

    #[test]
    fn missing_named_theme_does_not_fall_back() {
        let (dir, themes) = resolver_with(&[]);
        let input = "---\nmdoc: true\ntheme: doesnotexist\n---\nbody\n";
        match Document::from_text(input, "doc.md", &themes, &defaults()) {
            Err(MdocError::ThemeLoad { path, .. }) => {
                assert_eq!(path, dir.path().join("doesnotexist.html"));
            }
            other => panic!("expected a theme load error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_front_matter_is_a_parse_error() {
        let (_dir, themes) = resolver_with(&[]);
        let input = "---\nmdoc: [\n---\nbody\n";
        assert!(matches!(
            Document::from_text(input, "doc.md", &themes, &defaults()),
            Err(MdocError::Parse { .. })
        ));
    }

    #[test]
    fn themed_document_sees_all_render_data() {
        let (_dir, themes) = resolver_with(&[(
            "full",
            "{{.Title}}|{{.Author}}|{{#each .Tags}}[{{.}}]{{/each}}|{{.Data.client}}|{{.Body}}",
        )]);
        let input = "---\nmdoc: true\ntheme: full\ntitle: T\nauthor: A\ntags: [x, y]\ndata:\n  client: <ACME>\n---\n~~old~~ new\n";
        let doc = Document::from_text(input, "doc.md", &themes, &defaults()).expect("can parse");
        assert_eq!(
            doc.render().expect("can render"),
            "T|A|[x][y]|&lt;ACME&gt;|<p><del>old</del> new</p>\n"
        );
    }

    #[test]
    fn can_parse_from_reader() {
        let (_dir, themes) = resolver_with(&[]);
        let input: &[u8] = b"---\nmdoc: true\ntitle: From bytes\n---\nbody\n";
        let doc = Document::parse(input, "stdin", &themes, &defaults()).expect("can parse");
        assert_eq!(doc.config.title, "From bytes");
        assert_eq!(doc.body, "body\n");
    }
}
