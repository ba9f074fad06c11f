use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Paper and margin settings for PDF export.
///
/// All lengths are in inches. The defaults describe an A4 page without
/// margins.
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct PageOptions {
    #[builder(default = "8.27")]
    pub width_in: f32,
    #[builder(default = "11.69")]
    pub height_in: f32,
    #[builder(default)]
    pub margin_top_in: f32,
    #[builder(default)]
    pub margin_right_in: f32,
    #[builder(default)]
    pub margin_bottom_in: f32,
    #[builder(default)]
    pub margin_left_in: f32,
    /// Print CSS backgrounds and colours
    #[builder(default = "true")]
    pub print_background: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        PageOptions {
            width_in: 8.27,
            height_in: 11.69,
            margin_top_in: 0.0,
            margin_right_in: 0.0,
            margin_bottom_in: 0.0,
            margin_left_in: 0.0,
            print_background: true,
        }
    }
}

impl PageOptionsBuilder {
    /// Set all four margins at once.
    pub fn margins(&mut self, inches: f32) -> &mut Self {
        self.margin_top_in(inches)
            .margin_right_in(inches)
            .margin_bottom_in(inches)
            .margin_left_in(inches)
    }
}

impl PageOptions {
    /// CSS that makes the browser lay the page out with these options.
    pub fn stylesheet(&self) -> String {
        let mut css = format!(
            "@page {{ size: {}in {}in; margin: {}in {}in {}in {}in; }}",
            self.width_in,
            self.height_in,
            self.margin_top_in,
            self.margin_right_in,
            self.margin_bottom_in,
            self.margin_left_in,
        );
        if self.print_background {
            css.push_str(
                " html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }",
            );
        }
        css
    }

    /// Inject [`Self::stylesheet`] into `html`.
    ///
    /// The rule goes at the start of `<head>` so a theme's own `@page` rules
    /// still win, otherwise in front of the whole document.
    pub fn apply_to(&self, html: &str) -> String {
        let style = format!("<style>{}</style>", self.stylesheet());
        let lowercase = html.to_ascii_lowercase();

        let head = lowercase.match_indices("<head").map(|(i, _)| i).find(|i| {
            matches!(lowercase.as_bytes().get(i + 5), Some(b'>' | b' ' | b'\t' | b'\r' | b'\n'))
        });
        let Some(head) = head else {
            return format!("{style}{html}");
        };
        let Some(close) = lowercase[head..].find('>') else {
            return format!("{style}{html}");
        };

        let insert_at = head + close + 1;
        let mut out = String::with_capacity(html.len() + style.len());
        out.push_str(&html[..insert_at]);
        out.push_str(&style);
        out.push_str(&html[insert_at..]);
        out
    }
}
