use std::path::{Path, PathBuf};

use ndarray::Array2;
use ndarray_npy::WriteNpyExt;
use tempfile::NamedTempFile;

use crate::error::WriteError;

pub const ARTIFACT_EXTENSION: &str = "npy";

/// `<output_dir>/<identifier>` with its last extension replaced by `.npy`.
///
/// `sample01.flac` → `sample01.npy`, `sample01` → `sample01.npy`.
pub fn artifact_path(output_dir: &Path, identifier: &str) -> PathBuf {
    output_dir
        .join(identifier)
        .with_extension(ARTIFACT_EXTENSION)
}

/// Write `matrix` as a little-endian f32 `.npy` file.
///
/// The bytes go to a temporary file next to `path` that is then renamed
/// over it, so readers never see a partial artifact. An existing file is
/// replaced. The parent directory must already exist.
pub fn write_artifact(path: &Path, matrix: &Array2<f32>) -> Result<(), WriteError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Err(WriteError::MissingDirectory(dir.to_path_buf()));
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    matrix.write_npy(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| WriteError::Io(e.error))?;

    log::debug!("Wrote {} {:?}", path.display(), matrix.dim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_npy::read_npy;

    #[test]
    fn test_artifact_path_strips_extension() {
        let dir = Path::new("cqts");
        assert_eq!(artifact_path(dir, "sample01.flac"), PathBuf::from("cqts/sample01.npy"));
        assert_eq!(artifact_path(dir, "sample01"), PathBuf::from("cqts/sample01.npy"));
        assert_eq!(artifact_path(dir, "take.2.wav"), PathBuf::from("cqts/take.2.npy"));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact_path(dir.path(), "clip");
        let m = Array2::from_shape_fn((13, 150), |(f, t)| f as f32 - t as f32 * 0.5);

        write_artifact(&path, &m).unwrap();
        let back: Array2<f32> = read_npy(&path).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact_path(dir.path(), "clip");
        write_artifact(&path, &Array2::from_elem((2, 3), 1.0)).unwrap();
        write_artifact(&path, &Array2::from_elem((2, 3), 2.0)).unwrap();

        let back: Array2<f32> = read_npy(&path).unwrap();
        assert!(back.iter().all(|&v| v == 2.0));
        // no stray temporaries left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact_path(&dir.path().join("absent"), "clip");
        let err = write_artifact(&path, &Array2::zeros((1, 1))).unwrap_err();
        assert!(matches!(err, WriteError::MissingDirectory(_)));
    }
}
