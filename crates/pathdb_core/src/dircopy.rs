//! Recursive directory copy used by collection `copy`/`move_to`.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Copies the directory tree at `src` into `dst`, creating `dst` and any
/// intermediate directories.
pub(crate) fn copy_dir(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_nested_tree() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");

        fs::create_dir_all(src.join("a").join("b")).unwrap();
        fs::write(src.join("top"), b"top").unwrap();
        fs::write(src.join("a").join("b").join("leaf"), b"leaf").unwrap();

        copy_dir(&src, &dst).unwrap();

        assert_eq!(fs::read(dst.join("top")).unwrap(), b"top");
        assert_eq!(fs::read(dst.join("a").join("b").join("leaf")).unwrap(), b"leaf");
    }

    #[test]
    fn copies_empty_dir() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::create_dir_all(&src).unwrap();

        copy_dir(&src, &dst).unwrap();
        assert!(dst.is_dir());
    }
}
