//! Merge and probe tool discovery.
//!
//! The extractor shells out to ffmpeg to merge separate video and audio streams
//! and to ffprobe to inspect the result. Both must be reachable before a
//! download starts. A configured path may name the ffmpeg binary itself or the
//! directory that holds it; the probe tool is expected next to it. When the
//! configured location has nothing usable, the system search path is tried.
//!
//! Unlike site matching, discovery fails closed: any doubt means "missing".

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Merge binary name.
pub const MERGER: &str = "ffmpeg";

/// Probe companion binary name.
pub const PROBE: &str = "ffprobe";

/// Where a tool was looked for when it was found (or last looked for).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    /// The configured path is the binary
    ExplicitFile,
    /// Inside the configured directory, or the configured file's directory
    ExplicitDirectory,
    /// The system executable search path
    SystemPath,
}

/// Result of resolving one tool.
///
/// Resolved fresh for every job; tools may be installed or removed between runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolLocation {
    pub binary_name: String,
    pub resolved_path: Option<PathBuf>,
    pub search_mode: SearchMode,
}

impl ToolLocation {
    pub fn is_available(&self) -> bool {
        self.resolved_path.is_some()
    }
}

/// Resolves tools against a configured path and a search path.
#[derive(Clone, Debug, Default)]
pub struct ToolLocator {
    /// Replaces `PATH` when set
    search_path: Option<OsString>,
}

impl ToolLocator {
    /// Locator searching the process `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locator searching `paths` (same syntax as `PATH`) instead of the process `PATH`.
    pub fn with_search_path(paths: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(paths.into()),
        }
    }

    /// Whether `binary_name` can be resolved.
    pub fn binary_available(&self, configured_path: Option<&str>, binary_name: &str) -> bool {
        self.locate(configured_path, binary_name).is_available()
    }

    /// Resolve `binary_name`, preferring `configured_path`.
    ///
    /// An executable file at `configured_path` is accepted only as the merge
    /// binary. For the probe tool, the file's directory is searched instead.
    pub fn locate(&self, configured_path: Option<&str>, binary_name: &str) -> ToolLocation {
        let found = |path: PathBuf, search_mode| ToolLocation {
            binary_name: binary_name.to_string(),
            resolved_path: Some(path),
            search_mode,
        };

        if let Some(configured) = configured_path.and_then(explicit) {
            let path = Path::new(configured);

            if path.is_file() {
                if binary_name == MERGER && is_executable(path) {
                    return found(path.to_path_buf(), SearchMode::ExplicitFile);
                }
                if let Some(candidate) = path.parent().and_then(|dir| find_in_dir(dir, binary_name)) {
                    return found(candidate, SearchMode::ExplicitDirectory);
                }
            } else if path.is_dir() {
                if let Some(candidate) = find_in_dir(path, binary_name) {
                    return found(candidate, SearchMode::ExplicitDirectory);
                }
            } else if let Some(candidate) = path
                .parent()
                .filter(|dir| dir.is_dir())
                .and_then(|dir| find_in_dir(dir, binary_name))
            {
                return found(candidate, SearchMode::ExplicitDirectory);
            }

            tracing::debug!(
                binary = binary_name,
                configured,
                "not found at configured path, trying search path"
            );
        }

        ToolLocation {
            binary_name: binary_name.to_string(),
            resolved_path: self.search(binary_name),
            search_mode: SearchMode::SystemPath,
        }
    }

    fn search(&self, binary_name: &str) -> Option<PathBuf> {
        let result = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_default();
                which::which_in(binary_name, Some(paths), cwd)
            }
            None => which::which(binary_name),
        };

        result
            .inspect_err(|e| tracing::debug!(binary = binary_name, error = %e, "not on search path"))
            .ok()
    }
}

/// Whether `binary_name` is reachable, searching the process `PATH` as a fallback.
pub fn binary_available(configured_path: Option<&str>, binary_name: &str) -> bool {
    ToolLocator::new().binary_available(configured_path, binary_name)
}

/// Directory to hand the extractor as `ffmpeg_location`.
///
/// The directory holding the resolved merge binary. `None` when it was found
/// on the search path or not at all, which lets the extractor use its own search.
pub fn merger_location(location: &ToolLocation) -> Option<PathBuf> {
    match location.search_mode {
        SearchMode::ExplicitFile | SearchMode::ExplicitDirectory => location
            .resolved_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf),
        SearchMode::SystemPath => None,
    }
}

/// Configured path, unless blank or the bare default binary name.
fn explicit(configured: &str) -> Option<&str> {
    let configured = configured.trim();
    (!configured.is_empty() && !configured.eq_ignore_ascii_case(MERGER)).then_some(configured)
}

/// `<dir>/<binary_name>[.exe]` if it is an executable file.
fn find_in_dir(dir: &Path, binary_name: &str) -> Option<PathBuf> {
    let candidate = dir.join(format!("{binary_name}{}", std::env::consts::EXE_SUFFIX));
    is_executable(&candidate).then_some(candidate)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create an executable stub named `name` in `dir`.
    fn stub(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
        fs::write(&path, "#!/bin/sh\n").unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        path
    }

    fn empty_locator() -> (tempfile::TempDir, ToolLocator) {
        let dir = tempfile::tempdir().unwrap();
        let locator = ToolLocator::with_search_path(dir.path());
        (dir, locator)
    }

    #[test]
    fn nonexistent_configured_path_and_empty_search_path() {
        let (_dir, locator) = empty_locator();

        let location = locator.locate(Some("/definitely/not/here/ffmpeg"), MERGER);
        assert_eq!(location.resolved_path, None);
        assert_eq!(location.search_mode, SearchMode::SystemPath);
        assert!(!locator.binary_available(Some("/definitely/not/here/ffmpeg"), PROBE));
    }

    #[test]
    fn explicit_file_is_the_merger() {
        let (dir, locator) = empty_locator();
        let ffmpeg = stub(dir.path(), "ffmpeg-custom");

        let location = locator.locate(ffmpeg.to_str(), MERGER);
        assert_eq!(location.resolved_path, Some(ffmpeg));
        assert_eq!(location.search_mode, SearchMode::ExplicitFile);
    }

    #[test]
    fn probe_is_looked_up_next_to_explicit_file() {
        let (dir, locator) = empty_locator();
        let ffmpeg = stub(dir.path(), MERGER);

        assert!(!locator.binary_available(ffmpeg.to_str(), PROBE));

        let ffprobe = stub(dir.path(), PROBE);
        let location = locator.locate(ffmpeg.to_str(), PROBE);
        assert_eq!(location.resolved_path, Some(ffprobe));
        assert_eq!(location.search_mode, SearchMode::ExplicitDirectory);
    }

    #[test]
    fn explicit_directory() {
        let (_dir, locator) = empty_locator();
        let tools = tempfile::tempdir().unwrap();
        stub(tools.path(), MERGER);
        stub(tools.path(), PROBE);

        for binary in [MERGER, PROBE] {
            let location = locator.locate(tools.path().to_str(), binary);
            assert!(location.is_available(), "{binary}");
            assert_eq!(location.search_mode, SearchMode::ExplicitDirectory);
        }
    }

    #[test]
    fn missing_file_uses_parent_directory() {
        let (_dir, locator) = empty_locator();
        let tools = tempfile::tempdir().unwrap();
        let ffmpeg = stub(tools.path(), MERGER);
        let configured = tools.path().join("ffmpeg-old");

        let location = locator.locate(configured.to_str(), MERGER);
        assert_eq!(location.resolved_path, Some(ffmpeg));
    }

    #[test]
    fn falls_back_to_search_path() {
        let path_dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub(path_dir.path(), MERGER);
        let locator = ToolLocator::with_search_path(path_dir.path());

        for configured in [None, Some(""), Some("ffmpeg"), Some("FFMPEG"), Some("/nope/ffmpeg")] {
            let location = locator.locate(configured, MERGER);
            assert_eq!(location.resolved_path.as_deref(), Some(ffmpeg.as_path()), "{configured:?}");
            assert_eq!(location.search_mode, SearchMode::SystemPath);
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_rejected() {
        let (dir, locator) = empty_locator();
        let plain = dir.path().join("ffmpeg");
        fs::write(&plain, "").unwrap();

        assert!(!locator.binary_available(plain.to_str(), MERGER));
    }

    #[test]
    fn merger_location_follows_resolution() {
        let tools = tempfile::tempdir().unwrap();
        let ffmpeg = stub(tools.path(), MERGER);
        let (_dir, locator) = empty_locator();

        let from_file = locator.locate(ffmpeg.to_str(), MERGER);
        assert_eq!(merger_location(&from_file), Some(tools.path().to_path_buf()));

        let from_dir = locator.locate(tools.path().to_str(), MERGER);
        assert_eq!(merger_location(&from_dir), Some(tools.path().to_path_buf()));

        let missing = locator.locate(Some("/definitely/not/here/ffmpeg"), MERGER);
        assert_eq!(merger_location(&missing), None);
    }

    #[test]
    fn merger_location_ignores_configured_dir_when_found_on_path() {
        let configured = tempfile::tempdir().unwrap();
        let on_path = tempfile::tempdir().unwrap();
        stub(on_path.path(), MERGER);
        let locator = ToolLocator::with_search_path(on_path.path());

        let location = locator.locate(configured.path().to_str(), MERGER);

        assert_eq!(location.search_mode, SearchMode::SystemPath);
        assert!(location.is_available());
        assert_eq!(merger_location(&location), None);
    }
}
