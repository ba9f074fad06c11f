//! Printing HTML to PDF with a headless Chromium-family browser.
//!
//! Every export launches one browser process with a throwaway profile, lets
//! it print a temporary copy of the page and waits for it to exit. The process
//! is killed and reaped on every way out of [`Browser::export_to_pdf`], and the
//! temporary directory is removed with it.

mod options;

pub use options::{PageOptions, PageOptionsBuilder};

use crate::theme::Environment;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Environment variable that points at a browser binary.
pub const BROWSER_ENV: &str = "MDOC_BROWSER";

/// Executables looked up on `PATH`, in order.
const CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "microsoft-edge",
    "chrome",
];

/// Where a browser snapshot sits inside a revision directory of the packaged
/// browser folder.
const PACKAGED_LAYOUTS: &[&str] = &[
    "chrome-linux/chrome",
    "chrome-linux64/chrome",
    "chrome-win/chrome.exe",
    "chrome-win64/chrome.exe",
    "chrome-mac/Chromium.app/Contents/MacOS/Chromium",
];

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no compatible browser found; install Chromium or Chrome, or point MDOC_BROWSER at one")]
    NotFound,

    #[error("configured browser {} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("failed to launch browser {}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("browser did not finish printing within {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("browser exited with {status} without writing a PDF: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("browser I/O failed")]
    Io(#[from] std::io::Error),
}

/// A browser binary that can print pages.
#[derive(Debug, Clone)]
pub struct Browser {
    path: PathBuf,
    timeout: Duration,
    extra_args: Vec<String>,
}

impl Browser {
    pub fn new<P: Into<PathBuf>>(path: P) -> Browser {
        Browser {
            path: path.into(),
            timeout: Duration::from_secs(60),
            extra_args: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Browser {
        self.timeout = timeout;
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Browser {
        self.extra_args = args;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find a browser.
    ///
    /// Looks at, in order: the `explicit` path, the `MDOC_BROWSER` variable,
    /// the packaged browser folder and finally well-known names on `PATH`.
    pub fn locate(
        explicit: Option<&Path>,
        env: &Environment,
        packaged_dir: Option<&Path>,
    ) -> Result<Browser, BrowserError> {
        if let Some(path) = explicit {
            return existing(path);
        }
        if let Some(path) = env.get(BROWSER_ENV).filter(|p| !p.is_empty()) {
            return existing(Path::new(path));
        }
        if let Some(path) = packaged_dir.and_then(packaged_binary) {
            log::debug!("using packaged browser at {}", path.display());
            return Ok(Browser::new(path));
        }

        log::debug!("no packaged browser found, searching PATH");
        CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Browser::new)
            .ok_or(BrowserError::NotFound)
    }

    /// Command line for printing `page` into `pdf` using `profile` as the
    /// user data directory.
    fn arguments(&self, page: &Path, pdf: &Path, profile: &Path) -> Vec<String> {
        let mut args = vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--hide-scrollbars".to_string(),
            "--no-pdf-header-footer".to_string(),
            "--run-all-compositor-stages-before-draw".to_string(),
            // let scripts such as MathJax settle before printing
            "--virtual-time-budget=10000".to_string(),
            format!("--user-data-dir={}", profile.display()),
            format!("--print-to-pdf={}", pdf.display()),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(file_url(page));
        args
    }

    /// Print `html` to PDF and return the PDF bytes.
    pub fn export_to_pdf(&self, html: &str, options: &PageOptions) -> Result<Vec<u8>, BrowserError> {
        let workdir = tempfile::Builder::new().prefix("mdoc-").tempdir()?;
        let page = workdir.path().join("document.html");
        let pdf = workdir.path().join("document.pdf");
        let profile = workdir.path().join("profile");
        let stderr_path = workdir.path().join("stderr.log");

        std::fs::write(&page, options.apply_to(html))?;
        let stderr = File::create(&stderr_path)?;

        log::debug!("launching {}", self.path.display());
        let child = Command::new(&self.path)
            .args(self.arguments(&page, &pdf, &profile))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|source| BrowserError::Launch {
                path: self.path.clone(),
                source,
            })?;
        let mut child = ChildGuard(child);

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.0.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                return Err(BrowserError::Timeout(self.timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
        };
        log::debug!("browser exited with {status} after {:?}", started.elapsed());

        match std::fs::read(&pdf) {
            Ok(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(BrowserError::Failed {
                status: status.to_string(),
                stderr: std::fs::read_to_string(&stderr_path)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            }),
        }
    }
}

/// Kills and reaps the browser if it is still running when dropped.
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            log::debug!("killing browser process {}", self.0.id());
            let _ = self.0.kill();
            let _ = self.0.wait();
        }
    }
}

fn existing(path: &Path) -> Result<Browser, BrowserError> {
    if path.is_file() {
        Ok(Browser::new(path))
    } else {
        Err(BrowserError::Missing(path.to_path_buf()))
    }
}

/// Newest browser inside `root/<revision>/`.
fn packaged_binary(root: &Path) -> Option<PathBuf> {
    let mut revisions: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    revisions.sort_by(|a, b| b.cmp(a));

    revisions.iter().find_map(|revision| {
        PACKAGED_LAYOUTS
            .iter()
            .map(|layout| revision.join(layout))
            .find(|candidate| candidate.is_file())
    })
}

fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}
