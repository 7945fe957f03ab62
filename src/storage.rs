//! Output locations, MIME policy and inline encoding.

use anyhow::{bail, Context, Result};
use base64::Engine;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::session::{OutputLocation, RecordingOptions};

/// Maps an output location class to a filesystem root
pub trait DirectoryResolver: Send + Sync {
    fn root(&self, location: OutputLocation) -> Result<PathBuf>;

    /// Directory a session writes into, created if absent
    fn resolve(&self, options: &RecordingOptions) -> Result<PathBuf> {
        let mut dir = self.root(options.output_location)?;
        if let Some(sub) = options.sub_directory.as_deref().filter(|s| !s.is_empty()) {
            dir.push(validate_sub_directory(sub)?);
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create recordings directory {}", dir.display()))?;
        debug!("Resolved output directory {}", dir.display());
        Ok(dir)
    }
}

fn validate_sub_directory(sub: &str) -> Result<&Path> {
    let path = Path::new(sub);
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        bail!("Sub directory must be a relative path without '..': {}", sub);
    }
    Ok(path)
}

/// Platform directories from the `dirs` crate
#[derive(Debug, Clone)]
pub struct PlatformDirectories {
    app_name: String,
    default_root: PathBuf,
}

impl PlatformDirectories {
    pub fn new(app_name: impl Into<String>, default_root: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            default_root: default_root.into(),
        }
    }
}

impl DirectoryResolver for PlatformDirectories {
    fn root(&self, location: OutputLocation) -> Result<PathBuf> {
        let base = match location {
            OutputLocation::Cache => dirs::cache_dir(),
            OutputLocation::Library => dirs::data_dir(),
            OutputLocation::Default => return Ok(self.default_root.clone()),
        };
        let base = base.with_context(|| format!("No platform directory for {:?}", location))?;
        Ok(base.join(&self.app_name))
    }
}

/// Every location class under one root (sandboxed hosts, tests)
#[derive(Debug, Clone)]
pub struct FixedDirectories {
    root: PathBuf,
}

impl FixedDirectories {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DirectoryResolver for FixedDirectories {
    fn root(&self, location: OutputLocation) -> Result<PathBuf> {
        let name = match location {
            OutputLocation::Cache => "cache",
            OutputLocation::Library => "library",
            OutputLocation::Default => "recordings",
        };
        Ok(self.root.join(name))
    }
}

/// MIME type from the final container extension
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("m4a") => "audio/mp4",
        Some("wav") => "audio/wav",
        _ => "audio/aac",
    }
}

/// Path of `file` relative to the location root: `<sub_directory>/<file name>`
pub fn relative_output_path(options: &RecordingOptions, file: &Path) -> Option<String> {
    let name = file.file_name()?.to_str()?;
    match options.sub_directory.as_deref().filter(|s| !s.is_empty()) {
        Some(sub) => Some(format!("{}/{}", sub.trim_end_matches('/'), name)),
        None => Some(name.to_string()),
    }
}

/// Base64 bytes of a finished recording
pub fn encode_inline(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read recording {}", path.display()))?;
    if bytes.is_empty() {
        bail!("Recording {} is empty", path.display());
    }
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}
