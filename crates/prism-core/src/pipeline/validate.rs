//! Cheap pre-decode checks: existence, size limit, container signature.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

use super::codec::AssetFormat;

/// Longest signature we inspect.
const HEADER_LEN: usize = 8;

/// Rejects files that cannot possibly decode before the codec reads them in full.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Validate `path` and return the container its signature identifies.
    ///
    /// Only containers the pipeline can write back are accepted.
    pub fn validate(&self, path: &Path) -> Result<AssetFormat, PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let len = std::fs::metadata(path)
            .map_err(|e| decode_error(path, format!("Cannot read metadata: {}", e)))?
            .len();
        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if len > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: len / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let header = read_header(path)?;
        sniff(&header).ok_or_else(|| {
            decode_error(path, "Unrecognized image format (invalid magic bytes)".to_string())
        })
    }
}

fn read_header(path: &Path) -> Result<Vec<u8>, PipelineError> {
    let file = std::fs::File::open(path)
        .map_err(|e| decode_error(path, format!("Cannot open file: {}", e)))?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64)
        .read_to_end(&mut header)
        .map_err(|e| decode_error(path, format!("Cannot read header: {}", e)))?;
    Ok(header)
}

/// Identify a container from its leading bytes.
fn sniff(header: &[u8]) -> Option<AssetFormat> {
    const SIGNATURES: &[(&[u8], AssetFormat)] = &[
        (&[0xFF, 0xD8, 0xFF], AssetFormat::Jpeg),
        (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], AssetFormat::Png),
        (b"BM", AssetFormat::Bmp),
        (&[b'I', b'I', 0x2A, 0x00], AssetFormat::Tiff),
        (&[b'M', b'M', 0x00, 0x2A], AssetFormat::Tiff),
    ];

    SIGNATURES
        .iter()
        .find(|(magic, _)| header.starts_with(magic))
        .map(|(_, format)| *format)
}

fn decode_error(path: &Path, message: String) -> PipelineError {
    PipelineError::Decode {
        path: path.to_path_buf(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_known_containers() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(AssetFormat::Jpeg));
        assert_eq!(
            sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Some(AssetFormat::Png)
        );
        assert_eq!(sniff(b"BM\x00\x00"), Some(AssetFormat::Bmp));
        assert_eq!(sniff(&[b'I', b'I', 0x2A, 0x00]), Some(AssetFormat::Tiff));
        assert_eq!(sniff(&[b'M', b'M', 0x00, 0x2A]), Some(AssetFormat::Tiff));
    }

    #[test]
    fn test_sniff_rejects_unsupported_and_truncated() {
        assert_eq!(sniff(b"GIF89a"), None);
        assert_eq!(sniff(b"RIFF\x00\x00\x00\x00"), None);
        assert_eq!(sniff(&[b'I', b'I', 0x00, 0x00]), None);
        assert_eq!(sniff(&[0xFF, 0xD8]), None);
        assert_eq!(sniff(&[]), None);
    }

    #[test]
    fn test_validate_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, "hello world").unwrap();

        let err = Validator::new(LimitsConfig::default()).validate(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_validate_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bmp");
        let mut bytes = b"BM".to_vec();
        bytes.resize(2 * 1024 * 1024, 0);
        std::fs::write(&path, bytes).unwrap();

        let validator = Validator::new(LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        });
        let err = validator.validate(&path).unwrap_err();
        assert!(matches!(err, PipelineError::FileTooLarge { size_mb: 2, max_mb: 1, .. }));
    }

    #[test]
    fn test_validate_huge_size_limit_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.bmp");
        std::fs::write(&path, b"BM\x00\x00").unwrap();

        let validator = Validator::new(LimitsConfig {
            max_file_size_mb: u64::MAX,
            ..LimitsConfig::default()
        });
        assert_eq!(validator.validate(&path).unwrap(), AssetFormat::Bmp);
    }

    #[test]
    fn test_validate_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Validator::new(LimitsConfig::default())
            .validate(dir.path())
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }
}
