//! Suite integrity ledger: SHA-256 of every scenario file, written next to
//! the suite and verified before any scenario executes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use kafbench_core::error::{Error, Result};
use sha2::{Digest, Sha256};

/// Ledger file written into the suite directory.
pub const LEDGER_FILE_NAME: &str = "status.md";

/// First line of every ledger.
pub const LEDGER_HEADER: &str = "# kafbench suite validation";

/// Hex SHA-256 of a file's raw bytes.
pub fn hash_file(path: &Path) -> Result<String> {
    let raw = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&raw)))
}

/// Suite-relative name used in ledger entries and error texts.
pub(crate) fn relative_name(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir).unwrap_or(path).display().to_string()
}

/// Writes the ledger for the given relative-path → hash entries, sorted by
/// path.
pub fn write_ledger(dir: &Path, entries: &BTreeMap<String, String>) -> Result<PathBuf> {
    let mut body = String::new();
    body.push_str(LEDGER_HEADER);
    body.push('\n');
    body.push_str(&format!(
        "validated_at: {}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    body.push('\n');
    for (rel, hash) in entries {
        body.push_str(&format!("{hash}  {rel}\n"));
    }
    let path = dir.join(LEDGER_FILE_NAME);
    std::fs::write(&path, body)?;
    Ok(path)
}

/// Parses a ledger back into relative-path → hash entries. Blank lines,
/// comments, and the validation stamp are skipped; malformed lines are
/// ignored.
pub fn read_ledger(path: &Path) -> Result<BTreeMap<String, String>> {
    let raw = std::fs::read_to_string(path)?;
    let mut entries = BTreeMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("validated_at:") {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(hash), Some(rel)) = (parts.next(), parts.next()) else {
            continue;
        };
        entries.insert(rel.to_string(), hash.to_string());
    }
    Ok(entries)
}

/// Re-hashes every file against the ledger. A missing entry or a changed
/// hash aborts the suite.
pub fn verify_ledger(dir: &Path, files: &[PathBuf]) -> Result<()> {
    let entries = read_ledger(&dir.join(LEDGER_FILE_NAME))?;
    for path in files {
        let rel = relative_name(dir, path);
        let Some(expected) = entries.get(&rel) else {
            return Err(Error::Integrity {
                message: format!("missing hash for {rel}"),
            });
        };
        let actual = hash_file(path)?;
        if &actual != expected {
            return Err(Error::Integrity {
                message: format!("hash mismatch for {rel}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_verify_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.json");
        std::fs::write(&file, br#"{"name": "a"}"#).unwrap();
        let mut entries = BTreeMap::new();
        entries.insert("a.json".to_string(), hash_file(&file).unwrap());
        let ledger = write_ledger(dir.path(), &entries).unwrap();
        assert_eq!(ledger.file_name().unwrap(), LEDGER_FILE_NAME);
        verify_ledger(dir.path(), &[file]).unwrap();
    }

    #[test]
    fn ledger_format_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries = BTreeMap::new();
        entries.insert("b.json".to_string(), "beef".to_string());
        entries.insert("a.json".to_string(), "cafe".to_string());
        let ledger = write_ledger(dir.path(), &entries).unwrap();
        let body = std::fs::read_to_string(ledger).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "# kafbench suite validation");
        assert!(lines[1].starts_with("validated_at: "));
        assert_eq!(lines[2], "");
        // Entries are sorted by path, hash first.
        assert_eq!(lines[3], "cafe  a.json");
        assert_eq!(lines[4], "beef  b.json");
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn reader_skips_noise_and_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join(LEDGER_FILE_NAME);
        std::fs::write(
            &ledger,
            "# kafbench suite validation\nvalidated_at: 2026-08-25T00:00:00Z\n\n\
             cafe  a.json\nnot-a-valid-line-without-path\n# trailing comment\nbeef  b.json\n",
        )
        .unwrap();
        let entries = read_ledger(&ledger).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["a.json"], "cafe");
        assert_eq!(entries["b.json"], "beef");
    }

    #[test]
    fn missing_entry_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("new.json");
        std::fs::write(&file, b"{}").unwrap();
        write_ledger(dir.path(), &BTreeMap::new()).unwrap();
        let err = verify_ledger(dir.path(), &[file]).unwrap_err();
        assert!(err.to_string().contains("missing hash for new.json"));
    }

    #[test]
    fn changed_file_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.json");
        std::fs::write(&file, br#"{"name": "a"}"#).unwrap();
        let mut entries = BTreeMap::new();
        entries.insert("a.json".to_string(), hash_file(&file).unwrap());
        write_ledger(dir.path(), &entries).unwrap();
        std::fs::write(&file, br#"{"name": "tampered"}"#).unwrap();
        let err = verify_ledger(dir.path(), &[file]).unwrap_err();
        assert!(err.to_string().contains("hash mismatch for a.json"));
    }

    #[test]
    fn hashes_are_hex_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.json");
        std::fs::write(&file, b"kafbench").unwrap();
        let hash = hash_file(&file).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
