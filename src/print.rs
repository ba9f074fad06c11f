//! The `print` and `render` commands.

use crate::browser::{Browser, PageOptions};
use crate::cli::{PrintArgs, RenderArgs};
use crate::document::{Document, DocumentConfig};
use crate::settings::Settings;
use crate::theme::{Environment, ThemeResolver};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Render a document to PDF.
pub fn run(args: &PrintArgs, settings: &Settings) -> Result<()> {
    let env = Environment::from_process();
    let document = load_document(&args.input, args.theme_dir.as_deref(), settings, &env)?;

    println!("Rendering {}...", args.input.display());
    let html = document
        .render()
        .with_context(|| format!("Failed to render {}", args.input.display()))?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, "pdf"));

    if args.html {
        let html_path = output.with_extension("html");
        std::fs::write(&html_path, &html)
            .with_context(|| format!("Failed to write HTML file {}", html_path.display()))?;
        println!("Exported HTML to {}", html_path.display());
    }

    let browser = locate_browser(settings, &env)?;
    let pdf = export(&browser, &html, &settings.page)?;
    write_pdf(&output, &pdf)
}

/// Render a document to HTML only.
pub fn render(args: &RenderArgs, settings: &Settings) -> Result<()> {
    let env = Environment::from_process();
    let document = load_document(&args.input, args.theme_dir.as_deref(), settings, &env)?;
    let html = document
        .render()
        .with_context(|| format!("Failed to render {}", args.input.display()))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &html)
                .with_context(|| format!("Failed to write HTML file {}", path.display()))?;
            eprintln!("Saved HTML to {}", path.display());
        }
        None => print!("{html}"),
    }
    Ok(())
}

/// Read and parse `input`; `-` reads standard input.
fn load_document(
    input: &Path,
    theme_dir: Option<&str>,
    settings: &Settings,
    env: &Environment,
) -> Result<Document> {
    let themes = ThemeResolver::from_template(theme_dir.unwrap_or(&settings.theme_dir), env);
    let defaults = DocumentConfig::fallback_with_theme(settings.default_theme.clone());
    let source_name = input.display().to_string();

    let document = if input == Path::new("-") {
        Document::parse(std::io::stdin().lock(), "standard input", &themes, &defaults)
    } else {
        let file = std::fs::File::open(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        Document::parse(std::io::BufReader::new(file), &source_name, &themes, &defaults)
    }
    .with_context(|| format!("Failed to parse document {source_name}"))?;

    log::info!(
        "{source_name}: using theme `{}` from {}",
        document.theme().name(),
        themes.dir().display()
    );
    Ok(document)
}

/// `notes/report.md` becomes `report.<extension>` in the working directory.
pub fn default_output(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .filter(|stem| *stem != "-")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("document"));
    stem.with_extension(extension)
}

pub fn locate_browser(settings: &Settings, env: &Environment) -> Result<Browser> {
    let browser = Browser::locate(
        settings.browser.as_deref(),
        env,
        crate::settings::packaged_browser_dir().as_deref(),
    )
    .with_context(|| "Unable to find a browser to print with")?;
    log::info!("using browser {}", browser.path().display());

    Ok(browser
        .with_timeout(Duration::from_secs(settings.timeout_secs))
        .with_args(settings.browser_args.clone()))
}

/// Print `html` with a spinner on screen.
pub fn export(browser: &Browser, html: &str, page: &PageOptions) -> Result<Vec<u8>> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("can parse progress style"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_message("Generating PDF...");

    let result = browser
        .export_to_pdf(html, page)
        .with_context(|| "Failed to generate PDF");
    progress.finish_and_clear();
    result
}

pub fn write_pdf(output: &Path, pdf: &[u8]) -> Result<()> {
    std::fs::write(output, pdf)
        .with_context(|| format!("Failed to write PDF to {}", output.display()))?;

    let size = byte_unit::Byte::from_u64(pdf.len() as u64)
        .get_appropriate_unit(byte_unit::UnitType::Binary);
    println!("Done! Saved to {} ({size:.1})", output.display());
    Ok(())
}
