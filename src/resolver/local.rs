use std::path::Path;

use log::info;

use super::{FetchAction, FetchError, ResolveRequest, SourceResolver};

/// Stages a source that already exists as a directory on the local
/// filesystem by copying it into the staging area.
pub struct LocalResolver;

impl SourceResolver for LocalResolver {
    fn resolve(&self, request: &ResolveRequest) -> Option<FetchAction> {
        let source = request.uri.local_path();
        if !source.is_dir() {
            // Not a directory: no opinion, let the caller report it.
            return None;
        }

        let source = source.to_path_buf();
        let staging = request.staging.clone();
        let target = staging.subdirectory_for(&request.uri.to_string());
        Some(FetchAction::new(target.clone(), move || {
            staging.create_once(&target, || {
                info!(
                    "Copying {} to {}",
                    source.display(),
                    target.display()
                );
                copy_dir_recursive(&source, &target).map_err(FetchError::from)
            })
        }))
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::staging::StagingArea;

    fn request(uri: &str, root: &Path) -> ResolveRequest {
        ResolveRequest {
            uri: uri.parse().unwrap(),
            staging: StagingArea::new(root.join("staging")).unwrap(),
        }
    }

    #[test]
    fn declines_missing_paths_and_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("archive.tar");
        std::fs::write(&file, b"not a directory").unwrap();

        let missing = request("file:///srcfetch/does/not/exist", dir.path());
        assert!(LocalResolver.resolve(&missing).is_none());

        let not_a_dir = request(&format!("file://{}", file.display()), dir.path());
        assert!(LocalResolver.resolve(&not_a_dir).is_none());
    }

    #[test]
    fn copies_the_directory_into_the_staging_area() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("lib");
        std::fs::create_dir_all(source.join("nested")).unwrap();
        std::fs::write(source.join("build.txt"), b"root file").unwrap();
        std::fs::write(source.join("nested/mod.txt"), b"nested file").unwrap();

        let request = request(&format!("file://{}", source.display()), dir.path());
        let action = LocalResolver.resolve(&request).expect("existing directory");
        assert!(!action.target().exists(), "resolution must be lazy");

        let staged = action.run().unwrap();
        assert_eq!(
            std::fs::read(staged.join("build.txt")).unwrap(),
            b"root file"
        );
        assert_eq!(
            std::fs::read(staged.join("nested/mod.txt")).unwrap(),
            b"nested file"
        );
    }

    #[test]
    fn second_resolution_reuses_the_staged_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("lib");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("v"), b"1").unwrap();

        let request = request(&format!("file://{}", source.display()), dir.path());
        let first = LocalResolver.resolve(&request).unwrap().run().unwrap();

        // Mutating the origin after staging must not be observable: the
        // staged directory is treated as permanently valid.
        std::fs::write(source.join("v"), b"2").unwrap();
        let second = LocalResolver.resolve(&request).unwrap().run().unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(second.join("v")).unwrap(), b"1");
    }
}
