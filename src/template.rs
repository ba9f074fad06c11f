//! Variable substitution for document bodies and themes.
//!
//! Templates are rendered with `handlebars` in strict mode, so a reference to
//! a value that doesn't exist is an error instead of an empty string. Both
//! native handlebars paths (`{{Title}}`, `{{Data.client}}`) and Go-style
//! references with a leading dot (`{{.Title}}`, `{{ .Data.client }}`, `{{.}}`)
//! are accepted; the latter are rewritten before compilation.
//!
//! Handlebars' own HTML escaping is switched off. Markdown bodies must not be
//! escaped at all, and theme values are escaped once when the render data is
//! built (see [`crate::theme::RenderData`]).

use crate::error::{MdocError, Result};
use handlebars::{no_escape, Handlebars};
use serde::Serialize;
use std::borrow::Cow;

/// A strict registry with escaping disabled.
pub fn registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(no_escape);
    registry
}

/// Compile `source` under `name` into `registry`.
pub fn register(registry: &mut Handlebars<'static>, name: &str, source: &str) -> Result<()> {
    registry
        .register_template_string(name, normalise(source))
        .map_err(|e| MdocError::template(name, e))
}

/// Render the registered template `name` against `context`.
pub fn render<T: Serialize>(
    registry: &Handlebars<'static>,
    name: &str,
    context: &T,
) -> Result<String> {
    registry
        .render(name, context)
        .map_err(|e| MdocError::template(name, e))
}

/// Compile and render `source` in one go.
///
/// Text without any `{{` is returned as-is without touching the engine.
pub fn substitute<T: Serialize>(name: &str, source: &str, context: &T) -> Result<String> {
    if !source.contains("{{") {
        return Ok(source.to_string());
    }

    let mut registry = registry();
    register(&mut registry, name, source)?;
    render(&registry, name, context)
}

/// Rewrite Go-style leading-dot references into handlebars paths.
///
/// Only the inside of `{{ .. }}` expressions is touched, comments and string
/// literals are left alone.
pub fn normalise(source: &str) -> Cow<'_, str> {
    if !source.contains('.') || !source.contains("{{") {
        return Cow::Borrowed(source);
    }

    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        // block comments may contain `}}`
        if after.starts_with("!--") {
            let end = after.find("--}}").map(|i| i + 4).unwrap_or(after.len());
            out.push_str("{{");
            out.push_str(&after[..end]);
            rest = &after[end..];
            continue;
        }

        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let expression = &after[..end];
        out.push_str("{{");
        if expression.starts_with('!') {
            out.push_str(expression);
        } else {
            normalise_expression(expression, &mut out);
        }
        out.push_str("}}");
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Cow::Owned(out)
}

fn normalise_expression(expression: &str, out: &mut String) {
    let chars: Vec<char> = expression.chars().collect();
    let mut quote: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            out.push(c);
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
            out.push(c);
            continue;
        }

        let at_boundary = i == 0 || is_boundary(chars[i - 1]);
        if c == '.' && at_boundary {
            match chars.get(i + 1) {
                // `.Title` -> `Title`
                Some(&next) if next.is_alphabetic() || next == '_' => continue,
                // `.` -> `this`
                None => {
                    out.push_str("this");
                    continue;
                }
                Some(&next) if next.is_whitespace() || next == ')' || next == '}' => {
                    out.push_str("this");
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
}

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '{' | '#' | '/' | '^' | '&' | '~' | '>' | '(' | '=')
}
