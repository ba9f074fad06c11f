//! The `debug` command: print a page of system information.
//!
//! Useful for checking that a browser can be found and that printing works
//! before blaming a document or a theme.

use crate::browser::PageOptionsBuilder;
use crate::cli::DebugArgs;
use crate::print::{export, locate_browser, write_pdf};
use crate::settings::Settings;
use crate::system::SystemData;
use crate::theme::Environment;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn run(args: &DebugArgs, settings: &Settings) -> Result<()> {
    let env = Environment::from_process();

    println!("Collecting system data...");
    let browser = locate_browser(settings, &env);
    let browser_path = browser
        .as_ref()
        .ok()
        .map(|browser| browser.path().display().to_string());
    let theme_dir = env.expand_path(&settings.theme_dir).display().to_string();
    let system = SystemData::collect(browser_path.as_deref(), &theme_dir);

    let html = system
        .debug_document()
        .and_then(|document| document.render())
        .with_context(|| "Failed to render debug page")?;

    let browser = browser?;
    let page = PageOptionsBuilder::default()
        .width_in(settings.page.width_in)
        .height_in(settings.page.height_in)
        .margins(0.5)
        .build()
        .with_context(|| "Failed to build page options")?;
    let pdf = export(&browser, &html, &page)?;

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!("debug-{}.pdf", chrono::Utc::now().timestamp()))
    });
    write_pdf(&output, &pdf)
}
