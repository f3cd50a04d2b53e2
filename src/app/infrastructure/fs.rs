use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::app::error::Result;

/// Files larger than this are mapped instead of read into a buffer first.
pub const MMAP_THRESHOLD: u64 = 8 * 1024 * 1024;

/// Read a whole file as bytes.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    if size < MMAP_THRESHOLD {
        return Ok(fs::read(path)?);
    }

    tracing::debug!("Mapping {:?} ({} bytes)", path, size);
    // SAFETY: the map is only read while copying it into an owned Vec and is
    // dropped before returning. A concurrent writer truncating the file could
    // still fault the copy; the editor never writes files it is reading.
    let map = unsafe { Mmap::map(&file)? };
    Ok(map.to_vec())
}

/// Decode bytes as UTF-8, stripping a BOM. Invalid sequences are replaced.
pub fn decode_utf8(path: &Path, bytes: Vec<u8>) -> String {
    let bytes = match bytes.strip_prefix(b"\xEF\xBB\xBF") {
        Some(rest) => rest.to_vec(),
        None => bytes,
    };
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{:?} is not valid UTF-8; invalid bytes were replaced", path);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!(".{}.richpad-tmp", name))
}

/// Write `contents` next to `path` and rename it into place.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = temp_path_for(path);
    let result = (|| -> Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(read_bytes(&path).unwrap(), b"second");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_bytes(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, crate::app::error::AppError::Io(_)));
    }

    #[test]
    fn test_read_large_file_through_mmap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        let data = vec![b'x'; MMAP_THRESHOLD as usize + 10];
        fs::write(&path, &data).unwrap();
        assert_eq!(read_bytes(&path).unwrap().len(), data.len());
    }

    #[test]
    fn test_decode_strips_bom_and_replaces_invalid() {
        let path = Path::new("x.txt");
        assert_eq!(decode_utf8(path, b"\xEF\xBB\xBFhi".to_vec()), "hi");
        assert_eq!(decode_utf8(path, b"a\xFFb".to_vec()), "a\u{FFFD}b");
    }
}
