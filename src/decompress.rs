use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use zip::ZipArchive;

use crate::error::DaedalusError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

pub fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, DaedalusError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|err| DaedalusError::Decompress(format!("gzip: {err}")))?;
    Ok(out)
}

/// Gunzips `bytes` when they carry the gzip magic number, else returns them as-is.
pub fn maybe_gunzip(bytes: Vec<u8>) -> Result<Vec<u8>, DaedalusError> {
    if is_gzip(&bytes) {
        gunzip(&bytes)
    } else {
        Ok(bytes)
    }
}

/// Reads the first file entry of an in-memory zip archive.
pub fn unzip_first(bytes: &[u8]) -> Result<(String, Vec<u8>), DaedalusError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| DaedalusError::Decompress(format!("zip: {err}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| DaedalusError::Decompress(format!("zip: {err}")))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut out = Vec::new();
        entry
            .read_to_end(&mut out)
            .map_err(|err| DaedalusError::Decompress(format!("zip entry {name}: {err}")))?;
        return Ok((name, out));
    }
    Err(DaedalusError::Decompress(
        "zip archive holds no file entries".to_string(),
    ))
}

pub fn utf8(dataset: &str, bytes: Vec<u8>) -> Result<String, DaedalusError> {
    String::from_utf8(bytes).map_err(|err| DaedalusError::Parse {
        dataset: dataset.to_string(),
        message: format!("body is not UTF-8: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    #[test]
    fn gunzip_only_when_magic_matches() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"a\tb\n").unwrap();
        let packed = encoder.finish().unwrap();

        assert!(is_gzip(&packed));
        assert_eq!(maybe_gunzip(packed).unwrap(), b"a\tb\n");
        assert_eq!(maybe_gunzip(b"plain".to_vec()).unwrap(), b"plain");
    }

    #[test]
    fn unzip_rejects_garbage() {
        let err = unzip_first(b"not a zip").unwrap_err();
        assert!(matches!(err, DaedalusError::Decompress(_)));
    }
}
