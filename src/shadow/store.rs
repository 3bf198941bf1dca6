//! Locked access to the shadow database

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info};
use zeroize::Zeroizing;

use super::lock::LockFile;
use super::record::CredentialRecord;
use crate::error::ShadowError;

/// Location of the shadow database and its lock.
#[derive(Debug, Clone)]
pub struct ShadowStore {
    shadow_path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

/// The database lock, held for as long as this guard lives.
pub struct ShadowLock<'a> {
    store: &'a ShadowStore,
    _lock: LockFile,
}

impl ShadowStore {
    pub fn new(
        shadow_path: impl Into<PathBuf>,
        lock_path: impl Into<PathBuf>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            shadow_path: shadow_path.into(),
            lock_path: lock_path.into(),
            lock_timeout,
        }
    }

    pub fn shadow_path(&self) -> &Path {
        &self.shadow_path
    }

    /// Takes the database-wide lock.
    pub fn lock(&self) -> Result<ShadowLock<'_>, ShadowError> {
        let lock = LockFile::acquire(&self.lock_path, self.lock_timeout)?;
        Ok(ShadowLock { store: self, _lock: lock })
    }

    /// Looks up `username` under its own lock.
    pub fn find(&self, username: &str) -> Result<Option<CredentialRecord>, ShadowError> {
        self.lock()?.find(username)
    }

    /// Replaces the hash of `username` under its own lock.
    pub fn update(&self, username: &str, new_hash: &str) -> Result<(), ShadowError> {
        self.lock()?.update(username, new_hash)
    }
}

impl ShadowLock<'_> {
    pub fn find(&self, username: &str) -> Result<Option<CredentialRecord>, ShadowError> {
        let mut file = File::open(&self.store.shadow_path)
            .map_err(|e| ShadowError::OpenFailed(self.store.shadow_path.clone(), e))?;
        let contents = read_all(&mut file)?;

        let found = locate(&contents, username).map(|(_, record)| record);
        debug!(
            "Shadow lookup for {}: {}",
            username,
            if found.is_some() { "found" } else { "not found" }
        );
        Ok(found)
    }

    /// Rewrites the matching record in place with `new_hash`. Every other
    /// field, and every other line, is kept byte for byte.
    pub fn update(&self, username: &str, new_hash: &str) -> Result<(), ShadowError> {
        let path = &self.store.shadow_path;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| ShadowError::OpenFailed(path.clone(), e))?;
        let contents = read_all(&mut file)?;

        let (range, record) = locate(&contents, username)
            .ok_or_else(|| ShadowError::RecordNotFound(username.to_string()))?;

        let line = Zeroizing::new(record.with_hash(new_hash).to_line());

        let new_len = match splice_record(&mut file, &contents, &range, line.as_bytes()) {
            Ok(new_len) => new_len,
            Err(e) => {
                if let Err(undo) = file.set_len(contents.len() as u64) {
                    error!("Could not restore length of {}: {}", path.display(), undo);
                }
                return Err(ShadowError::WriteFailed(e));
            }
        };
        if new_len != contents.len() {
            file.set_len(new_len as u64)
                .map_err(ShadowError::WriteFailed)?;
        }
        file.sync_all().map_err(ShadowError::WriteFailed)?;

        info!("Updated shadow record for {}", username);
        Ok(())
    }
}

/// Writes `line` over `range` of `original` in a single write, carrying the
/// rest of the file along when the record length changes. Returns the new
/// length. If the write fails, the original bytes from `range.start` on are
/// written back.
fn splice_record<W: Write + Seek>(
    out: &mut W,
    original: &[u8],
    range: &Range<usize>,
    line: &[u8],
) -> io::Result<usize> {
    let tail = &original[range.end..];
    let mut rewritten = Zeroizing::new(Vec::with_capacity(line.len() + tail.len()));
    rewritten.extend_from_slice(line);
    if line.len() != range.len() {
        rewritten.extend_from_slice(tail);
    }

    if let Err(e) = write_at(out, range.start, &rewritten) {
        error!(
            "Shadow write failed at byte {}: {}; restoring previous contents",
            range.start, e
        );
        if let Err(undo) = write_at(out, range.start, &original[range.start..]) {
            error!(
                "Shadow database may be damaged from byte {}: {}",
                range.start, undo
            );
        }
        return Err(e);
    }

    Ok(range.start + line.len() + tail.len())
}

fn write_at<W: Write + Seek>(out: &mut W, offset: usize, bytes: &[u8]) -> io::Result<()> {
    out.seek(SeekFrom::Start(offset as u64))?;
    out.write_all(bytes)?;
    out.flush()
}

fn read_all(file: &mut File) -> Result<Zeroizing<Vec<u8>>, ShadowError> {
    let mut contents = Zeroizing::new(Vec::new());
    file.read_to_end(&mut contents)
        .map_err(ShadowError::ReadFailed)?;
    Ok(contents)
}

/// Finds the first record named exactly `username`. The range covers the
/// record line including its newline.
fn locate(contents: &[u8], username: &str) -> Option<(Range<usize>, CredentialRecord)> {
    let mut offset = 0;

    while offset < contents.len() {
        let end = contents[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| offset + i + 1)
            .unwrap_or(contents.len());

        let raw = &contents[offset..end];
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);

        match std::str::from_utf8(raw).ok().and_then(CredentialRecord::parse) {
            Some(record) if record.username == username => return Some((offset..end, record)),
            Some(_) => {}
            None if raw.is_empty() => {}
            None => debug!("Skipping malformed shadow line at byte {}", offset),
        }

        offset = end;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const SHADOW: &str = "root:*:19000:0:99999:7:::\n\
                          alice:$1$oldsalt$abcdefghijklmnopqrstuv:19001:0:99999:7:::\n\
                          al:$1$xx$short:19002:0:99999:7:::\n\
                          alicea:!:19003:0:99999:7:::\n";

    fn store_with(contents: &str) -> (ShadowStore, TempDir) {
        let dir = tempdir().unwrap();
        let shadow = dir.path().join("shadow");
        fs::write(&shadow, contents).unwrap();
        let store = ShadowStore::new(
            shadow,
            dir.path().join("shadow.lock"),
            Duration::from_millis(200),
        );
        (store, dir)
    }

    #[test]
    fn test_find_exact_username() {
        let (store, _dir) = store_with(SHADOW);

        let record = store.find("alice").unwrap().unwrap();
        assert_eq!(record.username, "alice");
        assert_eq!(record.last_change, "19001");

        assert_eq!(store.find("al").unwrap().unwrap().last_change, "19002");
        assert_eq!(store.find("alicea").unwrap().unwrap().hash, "!");
    }

    #[test]
    fn test_find_absent_and_prefixes() {
        let (store, _dir) = store_with(SHADOW);
        for name in ["bob", "a", "ali", "alic", "aliceab", "ROOT"] {
            assert!(store.find(name).unwrap().is_none(), "{} must not match", name);
        }
    }

    #[test]
    fn test_find_releases_lock() {
        let (store, dir) = store_with(SHADOW);
        store.find("alice").unwrap();
        assert!(!dir.path().join("shadow.lock").exists());
    }

    #[test]
    fn test_update_then_find() {
        let (store, _dir) = store_with(SHADOW);
        let before = store.find("alice").unwrap().unwrap();

        store.update("alice", "$6$newsalt$newhash").unwrap();

        let after = store.find("alice").unwrap().unwrap();
        assert_eq!(after.hash, "$6$newsalt$newhash");
        assert_eq!(after, before.with_hash("$6$newsalt$newhash"));
    }

    #[test]
    fn test_update_keeps_other_lines() {
        let (store, _dir) = store_with(SHADOW);

        // longer than the original hash
        let long_hash = format!("$6$rounds=5000$abcdefgh${}", "x".repeat(86));
        store.update("alice", &long_hash).unwrap();
        let contents = fs::read_to_string(store.shadow_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "root:*:19000:0:99999:7:::");
        assert_eq!(lines[1], format!("alice:{}:19001:0:99999:7:::", long_hash));
        assert_eq!(lines[2], "al:$1$xx$short:19002:0:99999:7:::");
        assert_eq!(lines[3], "alicea:!:19003:0:99999:7:::");

        // then shorter again
        store.update("alice", "x").unwrap();
        let contents = fs::read_to_string(store.shadow_path()).unwrap();
        assert_eq!(
            contents,
            SHADOW.replace("$1$oldsalt$abcdefghijklmnopqrstuv", "x")
        );
    }

    #[test]
    fn test_update_missing_user() {
        let (store, dir) = store_with(SHADOW);
        assert!(matches!(
            store.update("bob", "hash"),
            Err(ShadowError::RecordNotFound(u)) if u == "bob"
        ));
        assert_eq!(fs::read_to_string(store.shadow_path()).unwrap(), SHADOW);
        assert!(!dir.path().join("shadow.lock").exists());
    }

    #[test]
    fn test_malformed_lines_are_preserved() {
        let contents = "garbage line\n\nbob:old:1:2:3:4:5:6:7\n";
        let (store, _dir) = store_with(contents);
        store.update("bob", "new").unwrap();
        assert_eq!(
            fs::read_to_string(store.shadow_path()).unwrap(),
            "garbage line\n\nbob:new:1:2:3:4:5:6:7\n"
        );
    }

    #[test]
    fn test_last_line_without_newline() {
        let (store, _dir) = store_with("bob:old:1:2:3:4:5:6:7");
        store.update("bob", "newer").unwrap();
        assert_eq!(
            fs::read_to_string(store.shadow_path()).unwrap(),
            "bob:newer:1:2:3:4:5:6:7\n"
        );
    }

    /// Accepts `budget` bytes, fails once, then behaves.
    struct FlakyWriter {
        inner: io::Cursor<Vec<u8>>,
        budget: Option<usize>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match self.budget {
                Some(0) => {
                    self.budget = None;
                    Err(io::Error::other("no space left on device"))
                }
                Some(left) => {
                    let n = self.inner.write(&buf[..buf.len().min(left)])?;
                    self.budget = Some(left - n);
                    Ok(n)
                }
                None => self.inner.write(buf),
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl Seek for FlakyWriter {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_failed_splice_restores_contents() {
        let original = SHADOW.as_bytes();
        let (range, record) = locate(original, "alice").unwrap();
        let line = record.with_hash("$6$longersalt$0123456789abcdefghijklmnopqrstuvwxyz").to_line();

        let mut out = FlakyWriter {
            inner: io::Cursor::new(original.to_vec()),
            budget: Some(5),
        };
        assert!(splice_record(&mut out, original, &range, line.as_bytes()).is_err());
        assert_eq!(out.inner.get_ref().as_slice(), original);
    }

    #[test]
    fn test_splice_moves_tail() {
        let original = SHADOW.as_bytes();
        let (range, record) = locate(original, "alice").unwrap();
        let line = record.with_hash("x").to_line();

        let mut out = io::Cursor::new(original.to_vec());
        let new_len = splice_record(&mut out, original, &range, line.as_bytes()).unwrap();
        let mut written = out.into_inner();
        written.truncate(new_len);
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "root:*:19000:0:99999:7:::\n\
             alice:x:19001:0:99999:7:::\n\
             al:$1$xx$short:19002:0:99999:7:::\n\
             alicea:!:19003:0:99999:7:::\n"
        );
    }

    #[test]
    fn test_missing_database_is_fatal() {
        let dir = tempdir().unwrap();
        let store = ShadowStore::new(
            dir.path().join("missing"),
            dir.path().join("shadow.lock"),
            Duration::from_millis(50),
        );
        let err = store.find("alice").unwrap_err();
        assert!(err.is_fatal());
        assert!(!dir.path().join("shadow.lock").exists());
    }

    #[test]
    fn test_held_lock_blocks_other_callers() {
        let (store, _dir) = store_with(SHADOW);
        let guard = store.lock().unwrap();
        assert!(guard.find("alice").unwrap().is_some());
        assert!(matches!(store.find("alice"), Err(ShadowError::LockTimeout(_))));
        drop(guard);
        assert!(store.find("alice").unwrap().is_some());
    }
}
