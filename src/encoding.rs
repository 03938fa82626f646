use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use zeroize::Zeroizing;

use crate::shamir::Share;

/// Base64 (standard alphabet, padded) form of a share
pub fn encode_share(share: &Share) -> Zeroizing<String> {
    Zeroizing::new(general_purpose::STANDARD.encode(share.as_bytes()))
}

/// Number of Base64 characters for a raw share of `raw_len` bytes
pub fn encoded_len(raw_len: usize) -> Result<usize> {
    base64::encoded_len(raw_len, true)
        .with_context(|| format!("Base64 length of {} bytes overflows usize", raw_len))
}

/// Decode one share from its Base64 text, ignoring surrounding whitespace
pub fn decode_share(text: &str) -> Result<Share> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        bail!("share is empty");
    }
    let raw = general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|e| anyhow!("not valid Base64: {}", e))?;
    Ok(Share::from_bytes(raw))
}

/// Read a file holding a single Base64 share
pub fn read_share_file(path: &Path) -> Result<Share> {
    let contents = Zeroizing::new(
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
    );
    if contents.trim().is_empty() {
        bail!("File {} is empty", path.display());
    }
    decode_share(&contents)
        .with_context(|| format!("File {} does not contain a valid share", path.display()))
}

/// Write a share as Base64 text, readable only by the owner on Unix
pub fn write_share_file(path: &Path, share: &Share) -> Result<()> {
    let encoded = encode_share(share);
    write_private(path, encoded.as_bytes())
}

/// Create or truncate `path` with mode 0600 on Unix and write `data` to it
pub fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(data)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Create `dir` (and parents), restricted to the owner on Unix
pub fn create_private_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_encode_uses_standard_padded_alphabet() {
        let share = Share::from_bytes(vec![0xFB, 0xFF, 0x01]);
        assert_eq!(encode_share(&share).as_str(), "+/8B");

        let share = Share::from_bytes(vec![b'h', b'i']);
        assert_eq!(encode_share(&share).as_str(), "aGk=");
        assert_eq!(encoded_len(2).unwrap(), 4);
        assert_eq!(encoded_len(17).unwrap(), 24);
        assert_eq!(encoded_len(0).unwrap(), 0);
        assert!(encoded_len(usize::MAX).is_err());
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let share = decode_share("  aGk=\n").unwrap();
        assert_eq!(share.as_bytes(), b"hi");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(decode_share("   ").is_err());
        assert!(decode_share("not*base64").is_err());
    }

    #[test]
    fn test_share_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("share_01.b64");
        let share = Share::from_bytes(vec![1, 2, 3, 4, 5]);

        write_share_file(&path, &share).unwrap();
        assert_eq!(read_share_file(&path).unwrap(), share);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_empty_share_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.b64");
        fs::write(&path, "\n\n").unwrap();
        let err = read_share_file(&path).unwrap_err();
        assert!(err.to_string().contains("is empty"));
    }

    #[test]
    fn test_missing_share_file() {
        let dir = tempdir().unwrap();
        assert!(read_share_file(&dir.path().join("nope.b64")).is_err());
    }

    #[test]
    fn test_private_dir_is_nested() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        create_private_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Creating it again is fine
        create_private_dir(&nested).unwrap();
    }
}
