//! Download job description.

use crate::error::ValidationError;
use crate::settings::Settings;
use mediagrab_dl::template::EXT_PLACEHOLDER;
use std::path::PathBuf;

/// How the output filename is chosen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FilenamePolicy {
    /// Use the configured output template
    #[default]
    Template,
    /// Use a caller-supplied name, sanitized
    Explicit(String),
}

impl FilenamePolicy {
    /// Explicit name, or [`FilenamePolicy::Template`] if `name` is blank.
    pub fn explicit(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            FilenamePolicy::Template
        } else {
            FilenamePolicy::Explicit(name)
        }
    }
}

/// One download, immutable once submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobRequest {
    pub source_url: String,
    pub destination_directory: PathBuf,
    pub filename_policy: FilenamePolicy,
    /// Cookies file; must exist when set
    pub credential_file: Option<PathBuf>,
    /// Referer header overriding the per-site default
    pub referer_override: Option<String>,
}

impl JobRequest {
    pub fn new(source_url: impl Into<String>, destination_directory: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            destination_directory: destination_directory.into(),
            filename_policy: FilenamePolicy::Template,
            credential_file: None,
            referer_override: None,
        }
    }

    /// Request using the default directory and cookies file from `settings`.
    pub fn from_settings(source_url: impl Into<String>, settings: &Settings) -> Self {
        Self {
            credential_file: settings.cookies_file.clone(),
            ..Self::new(source_url, settings.save_directory.clone())
        }
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename_policy = FilenamePolicy::explicit(name);
        self
    }

    pub fn with_credential_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_file = Some(path.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer_override = Some(referer.into());
        self
    }

    /// Filename part of the output template.
    pub fn filename(&self, template: &str) -> Result<String, ValidationError> {
        match &self.filename_policy {
            FilenamePolicy::Template => Ok(template.to_string()),
            FilenamePolicy::Explicit(name) => explicit_filename(name, template),
        }
    }

    /// Full output template: destination directory joined with the filename.
    pub fn output_template(&self, template: &str) -> Result<String, ValidationError> {
        let filename = self.filename(template)?;
        Ok(self
            .destination_directory
            .join(filename)
            .to_string_lossy()
            .into_owned())
    }
}

fn explicit_filename(name: &str, template: &str) -> Result<String, ValidationError> {
    let base = base_name(name.trim());
    let mut filename = sanitize_filename(base);

    if filename.is_empty() {
        return Err(ValidationError::EmptyFilename(name.to_string()));
    }

    if !filename.contains(EXT_PLACEHOLDER) && !template.contains(EXT_PLACEHOLDER) {
        filename.push('.');
        filename.push_str(EXT_PLACEHOLDER);
    }

    Ok(filename)
}

/// Last path component, splitting on both separator styles.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Replace control characters and `< > : " / \ | ? *` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | '\x00'..='\x1f' => '_',
            c => c,
        })
        .collect()
}
