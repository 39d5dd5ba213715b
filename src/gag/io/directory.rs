use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::gag::error::{GagError, GagResult};
use crate::gag::models::MediaKind;

/// Name of the folder created under the destination root.
pub const GAGS_DIR_NAME: &str = "gags";

/// Manages the directory structure for downloaded content
#[derive(Debug, Clone)]
pub struct DirectoryManager {
    /// Destination folder chosen by the user
    root_dir: PathBuf,
    /// `{root}/gags`
    gags_dir: PathBuf,
    /// `{root}/gags/videos`
    videos_dir: PathBuf,
    /// `{root}/gags/images`
    images_dir: PathBuf,
}

impl DirectoryManager {
    /// Creates a manager for `root_dir`. Nothing is touched on disk until
    /// [DirectoryManager::create_directory_structure] is called.
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        let root = root_dir.as_ref().to_path_buf();
        let gags = root.join(GAGS_DIR_NAME);
        let videos = gags.join(MediaKind::Video.directory_name());
        let images = gags.join(MediaKind::Image.directory_name());

        DirectoryManager {
            root_dir: root,
            gags_dir: gags,
            videos_dir: videos,
            images_dir: images,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn gags_dir(&self) -> &Path {
        &self.gags_dir
    }

    /// Creates `gags/videos` and `gags/images` if they do not exist yet.
    pub fn create_directory_structure(&self) -> GagResult<()> {
        for dir in [&self.videos_dir, &self.images_dir] {
            fs::create_dir_all(dir).map_err(|source| GagError::Destination {
                path: dir.clone(),
                source,
            })?;
        }
        trace!("Directory structure ready at {}", self.gags_dir.display());
        Ok(())
    }

    /// Folder that holds files of `kind`.
    pub fn kind_dir(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Video => &self.videos_dir,
            MediaKind::Image => &self.images_dir,
        }
    }

    /// Target path of a file of `kind` named `{stem}.{extension}`.
    pub fn media_path(&self, kind: MediaKind, stem: &str, extension: &str) -> PathBuf {
        self.kind_dir(kind).join(format!("{}.{}", stem, extension))
    }

    /// Returns the first existing file for `stem` among `extensions`.
    pub fn find_existing(&self, kind: MediaKind, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
        extensions
            .iter()
            .map(|extension| self.media_path(kind, stem, extension))
            .find(|path| path.exists())
    }

    /// Writes `body` verbatim to `{stem}.{extension}`, creating the folder when needed.
    pub fn store(&self, kind: MediaKind, stem: &str, extension: &str, body: &[u8]) -> io::Result<PathBuf> {
        let path = self.media_path(kind, stem, extension);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, body)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout() {
        let manager = DirectoryManager::new("/data");
        assert_eq!(
            manager.media_path(MediaKind::Video, "Dog", "mp4"),
            PathBuf::from("/data/gags/videos/Dog.mp4")
        );
        assert_eq!(
            manager.media_path(MediaKind::Image, "Dog", "jpg"),
            PathBuf::from("/data/gags/images/Dog.jpg")
        );
    }

    #[test]
    fn test_create_directory_structure_is_idempotent() {
        let dir = tempdir().unwrap();
        let manager = DirectoryManager::new(dir.path());

        manager.create_directory_structure().unwrap();
        manager.create_directory_structure().unwrap();

        assert!(dir.path().join("gags/videos").is_dir());
        assert!(dir.path().join("gags/images").is_dir());
    }

    #[test]
    fn test_create_directory_structure_reports_destination() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_folder");
        fs::write(&blocker, b"file").unwrap();

        let manager = DirectoryManager::new(&blocker);
        let err = manager.create_directory_structure().unwrap_err();
        assert!(matches!(err, GagError::Destination { .. }));
    }

    #[test]
    fn test_store_and_find_existing() {
        let dir = tempdir().unwrap();
        let manager = DirectoryManager::new(dir.path());

        assert!(manager.find_existing(MediaKind::Image, "Cat", &["jpg"]).is_none());

        let path = manager.store(MediaKind::Image, "Cat", "jpg", b"jpeg bytes").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"jpeg bytes");
        assert_eq!(manager.find_existing(MediaKind::Image, "Cat", &["png", "jpg"]), Some(path));
        assert!(manager.find_existing(MediaKind::Video, "Cat", &["mp4"]).is_none());
    }
}
