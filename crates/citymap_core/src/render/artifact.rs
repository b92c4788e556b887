//! Scoped temporary map files.
//!
//! # Invariants
//! - Every artifact lives under one isolated directory with a unique name
//!   (`map_<requester>_<target>_<random>.png`).
//! - Dropping the artifact deletes the file on every exit path.

use std::io;
use std::path::Path;
use tempfile::{Builder, TempPath};

const MAX_SLUG_CHARS: usize = 32;

/// Owned path of one rendered map; the file is removed on drop.
#[derive(Debug)]
pub struct MapArtifact {
    path: TempPath,
}

impl MapArtifact {
    /// Reserves a unique empty file for one render.
    pub fn create(dir: &Path, requester: i64, target: &str) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let prefix = format!("map_{requester}_{}_", slug(target));
        let file = Builder::new()
            .prefix(&prefix)
            .suffix(".png")
            .tempfile_in(dir)?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file now, reporting failures instead of logging them.
    pub fn close(self) -> io::Result<()> {
        self.path.close()
    }
}

/// Filesystem-safe fragment of a render target.
pub fn slug(target: &str) -> String {
    let slug = target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_SLUG_CHARS)
        .collect::<String>();
    if slug.is_empty() {
        "map".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::{slug, MapArtifact};

    #[test]
    fn slug_replaces_unsafe_characters() {
        assert_eq!(slug("New York"), "New_York");
        assert_eq!(slug("../etc"), "___etc");
        assert_eq!(slug(""), "map");
        assert_eq!(slug(&"x".repeat(100)).len(), 32);
    }

    #[test]
    fn artifact_names_are_unique_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let first = MapArtifact::create(dir.path(), 42, "Rome").unwrap();
        let second = MapArtifact::create(dir.path(), 42, "Rome").unwrap();
        assert_ne!(first.path(), second.path());

        let name = first.path().file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("map_42_Rome_"));
        assert!(name.ends_with(".png"));

        let first_path = first.path().to_path_buf();
        drop(first);
        assert!(!first_path.exists());
        second.close().unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
