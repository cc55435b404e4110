//! Removal of scratch files and maintenance of the `LATEST` links.
use crate::scene::SceneId;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    /// The scene directory and the (then empty) working directory are gone.
    Removed,
    /// The working directory still holds other files, e.g. the cached scene list.
    WorkDirKept,
}

/// Deletes the downloaded files of `scene_id`, then the working directory if nothing else is
/// left in it. A missing scene directory is fine; any other filesystem error is returned.
pub fn clean_up_scene(work_dir: &Path, scene_id: &SceneId) -> io::Result<Cleanup> {
    let scene_dir = work_dir.join(scene_id.as_str());
    match fs::remove_dir_all(&scene_dir) {
        Ok(()) => println!("{}", scene_dir.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => debug!(path = %scene_dir.display(), "nothing to remove"),
        Err(e) => return Err(e),
    }

    match fs::remove_dir(work_dir) {
        Ok(()) => {
            println!("{}/", work_dir.display());
            Ok(Cleanup::Removed)
        }
        Err(e) if e.kind() == ErrorKind::DirectoryNotEmpty => {
            println!("{}/ is not empty: no action", work_dir.display());
            Ok(Cleanup::WorkDirKept)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Cleanup::Removed),
        Err(e) => Err(e),
    }
}

/// Points `LATEST.jpg` and `LATEST_metadata.json` in `output_dir` at the given files,
/// replacing earlier links. Returns the links that were created.
pub fn link_latest(output_dir: &Path, image: &Path, metadata: &Path) -> io::Result<Vec<PathBuf>> {
    let mut links = vec![];
    for (name, target) in [("LATEST.jpg", image), ("LATEST_metadata.json", metadata)] {
        let link = output_dir.join(name);
        replace_link(&link, target)?;
        links.push(link);
    }
    Ok(links)
}

#[cfg(unix)]
fn replace_link(link: &Path, target: &Path) -> io::Result<()> {
    match fs::remove_file(link) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    // Links sit next to their targets
    let relative = target.file_name().map(Path::new).unwrap_or(target);
    std::os::unix::fs::symlink(relative, link)
}

#[cfg(not(unix))]
fn replace_link(link: &Path, _target: &Path) -> io::Result<()> {
    tracing::warn!(path = %link.display(), "symbolic links are not supported on this platform");
    Ok(())
}
