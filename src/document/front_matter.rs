//! Splitting a leading YAML block off a markdown document.
//!
//! A block starts on the very first line with `---` and ends at the next line
//! that is exactly `---` or `...`:
//!
//! ```markdown
//! ---
//! mdoc: true
//! title: Quarterly Report
//! ---
//! # Summary
//! ```
//!
//! Without an opening and a closing delimiter the whole input is body.

use super::config::DocumentConfig;
use crate::error::{MdocError, Result};

const OPENING: &str = "---";
const CLOSING: [&str; 2] = ["---", "..."];

/// A document cut into its front matter block and its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    /// Raw YAML between the delimiters, if a block was found.
    pub block: Option<&'a str>,
    /// Everything after the closing delimiter line, untouched.
    pub body: &'a str,
}

impl<'a> FrontMatter<'a> {
    fn none(input: &'a str) -> FrontMatter<'a> {
        FrontMatter {
            block: None,
            body: input,
        }
    }

    /// Locate the front matter block in `input`.
    pub fn split(input: &'a str) -> FrontMatter<'a> {
        let text = input.strip_prefix('\u{feff}').unwrap_or(input);
        let mut lines = text.split_inclusive('\n');

        let Some(first) = lines.next() else {
            return FrontMatter::none(input);
        };
        if first.trim_end() != OPENING || !first.ends_with('\n') {
            return FrontMatter::none(input);
        }

        let block_start = first.len();
        let mut offset = block_start;
        for line in lines {
            if CLOSING.contains(&line.trim_end()) {
                return FrontMatter {
                    block: Some(&text[block_start..offset]),
                    body: &text[offset + line.len()..],
                };
            }
            offset += line.len();
        }

        FrontMatter::none(input)
    }

    /// Decode the block into a [`DocumentConfig`].
    ///
    /// A missing or empty block yields the zero configuration. `source_name`
    /// only labels errors.
    pub fn decode(&self, source_name: &str) -> Result<DocumentConfig> {
        let Some(block) = self.block.filter(|block| !block.trim().is_empty()) else {
            return Ok(DocumentConfig::default());
        };

        let parse_error = |e: serde_yaml::Error| MdocError::Parse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        };

        let value: serde_yaml::Value = serde_yaml::from_str(block).map_err(parse_error)?;
        if value.is_null() {
            return Ok(DocumentConfig::default());
        }
        serde_yaml::from_value(value).map_err(parse_error)
    }
}
