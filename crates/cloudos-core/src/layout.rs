//! Filesystem layout of installed apps
//!
//! ```text
//! <app-repository>/
//!   <name>/
//!     latest -> <version>
//!     <version>/
//!       cloudos-manifest.json
//!       chef/
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version sentinel that resolves through the `latest` link
pub const LATEST_VERSION: &str = "latest";

/// Manifest file name inside a version directory
pub const MANIFEST_FILE: &str = "cloudos-manifest.json";

/// The parts of an app manifest needed to locate it on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifest {
    pub name: String,
    pub version: String,
}

/// Where a named, optionally versioned app lives under the repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    app_repository: PathBuf,
    name: String,
    version: Option<String>,
}

impl AppLayout {
    pub fn new(app_repository: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            app_repository: app_repository.into(),
            name: name.into(),
            version: None,
        }
    }

    pub fn with_version(
        app_repository: impl Into<PathBuf>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            version: Some(version.into()),
            ..Self::new(app_repository, name)
        }
    }

    pub fn for_manifest(app_repository: impl Into<PathBuf>, manifest: &AppManifest) -> Self {
        Self::with_version(app_repository, manifest.name.clone(), manifest.version.clone())
    }

    pub fn for_latest_version(app_repository: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::with_version(app_repository, name, LATEST_VERSION)
    }

    pub fn app_repository(&self) -> &Path {
        &self.app_repository
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// `<repository>/<name>`
    pub fn app_dir(&self) -> PathBuf {
        self.app_repository.join(&self.name)
    }

    /// `<repository>/<name>/latest`
    pub fn latest_version_link(&self) -> PathBuf {
        self.app_dir().join(LATEST_VERSION)
    }

    /// `<repository>/<name>/<version>`, if a version was given
    pub fn version_dir(&self) -> Option<PathBuf> {
        self.version.as_ref().map(|v| self.app_dir().join(v))
    }

    pub fn manifest_file(&self) -> Option<PathBuf> {
        self.version_dir().map(|dir| dir.join(MANIFEST_FILE))
    }

    pub fn chef_dir(&self) -> Option<PathBuf> {
        self.version_dir().map(|dir| dir.join("chef"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_dirs() {
        let layout = AppLayout::with_version("/var/apps", "mail", "1.2");
        assert_eq!(layout.app_dir(), PathBuf::from("/var/apps/mail"));
        assert_eq!(layout.version_dir(), Some(PathBuf::from("/var/apps/mail/1.2")));
        assert_eq!(
            layout.manifest_file(),
            Some(PathBuf::from("/var/apps/mail/1.2/cloudos-manifest.json"))
        );
        assert_eq!(layout.chef_dir(), Some(PathBuf::from("/var/apps/mail/1.2/chef")));
    }

    #[test]
    fn unversioned_layout_has_no_version_dir() {
        let layout = AppLayout::new("/var/apps", "mail");
        assert_eq!(layout.version(), None);
        assert_eq!(layout.version_dir(), None);
        assert_eq!(layout.latest_version_link(), PathBuf::from("/var/apps/mail/latest"));
    }

    #[test]
    fn manifest_and_latest() {
        let manifest = AppManifest {
            name: "mail".to_string(),
            version: "3.0".to_string(),
        };
        assert_eq!(
            AppLayout::for_manifest("/r", &manifest),
            AppLayout::with_version("/r", "mail", "3.0")
        );
        assert_eq!(AppLayout::for_latest_version("/r", "mail").version(), Some(LATEST_VERSION));
    }
}
