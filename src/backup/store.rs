//! Dotfile snapshot store.
//!
//! Each snapshot is a timestamped directory holding copies of the tracked
//! files plus a `backup.json` manifest with per-file sha256 digests. Every
//! file is handled independently: one unreadable file never aborts the rest.

#![allow(missing_docs)]

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::errors::{DevkitError, Result};

const MANIFEST: &str = "backup.json";

/// One file captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupFile {
    /// Absolute path the file was copied from (and restores to).
    pub source: PathBuf,
    /// File name inside the snapshot directory.
    pub stored: String,
    pub size: u64,
    pub sha256: String,
}

/// On-disk manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    id: String,
    created_at: String,
    timestamp_ms: i64,
    files: Vec<BackupFile>,
}

/// Summary of a snapshot for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSnapshot {
    pub id: String,
    pub created_at: String,
    pub timestamp_ms: i64,
    pub file_count: usize,
    pub total_bytes: u64,
    pub path: PathBuf,
}

/// A per-file failure inside a best-effort operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub code: &'static str,
    pub message: String,
}

impl FileFailure {
    fn from_error(path: &Path, err: &DevkitError) -> Self {
        Self {
            path: path.to_path_buf(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    pub snapshot: BackupSnapshot,
    /// Tracked files that do not exist on this machine.
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FileFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub id: String,
    pub restored: usize,
    pub failed: Vec<FileFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneResult {
    pub kept: usize,
    pub removed_ids: Vec<String>,
}

/// Snapshot store rooted at one directory.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    #[must_use]
    pub fn open(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot `files`. Missing files are skipped; unreadable files are reported.
    pub fn create(&self, files: &[PathBuf]) -> Result<CreateReport> {
        fs::create_dir_all(&self.dir).map_err(|e| backup_io(&self.dir, &e))?;

        let now = Utc::now();
        let timestamp_ms = now.timestamp_millis();
        let (id, entry_dir) = self.allocate_entry(&now.format("%Y%m%d-%H%M%S").to_string())?;

        let mut manifest = Manifest {
            id: id.clone(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            timestamp_ms,
            files: Vec::with_capacity(files.len()),
        };
        let mut skipped = Vec::new();
        let mut failed = Vec::new();

        for (idx, source) in files.iter().enumerate() {
            if !source.exists() {
                skipped.push(source.clone());
                continue;
            }
            let stored = stored_name(idx, source);
            match copy_with_digest(source, &entry_dir.join(&stored)) {
                Ok((size, sha256)) => manifest.files.push(BackupFile {
                    source: source.clone(),
                    stored,
                    size,
                    sha256,
                }),
                Err(err) => failed.push(FileFailure::from_error(source, &err)),
            }
        }

        let manifest_path = entry_dir.join(MANIFEST);
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
            .map_err(|e| backup_io(&manifest_path, &e))?;

        Ok(CreateReport {
            snapshot: summarize(&manifest, entry_dir),
            skipped,
            failed,
        })
    }

    /// All snapshots, newest first. Directories without a readable manifest are ignored.
    #[must_use]
    pub fn list(&self) -> Vec<BackupSnapshot> {
        let Ok(read_dir) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut entries: Vec<BackupSnapshot> = read_dir
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let path = entry.path();
                read_manifest(&path).ok().map(|m| summarize(&m, path))
            })
            .collect();

        entries.sort_by(|a, b| {
            b.timestamp_ms
                .cmp(&a.timestamp_ms)
                .then_with(|| b.id.cmp(&a.id))
        });
        entries
    }

    /// Files recorded in a snapshot.
    pub fn files(&self, id: &str) -> Result<Vec<BackupFile>> {
        Ok(read_manifest(&self.entry_dir(id)?)?.files)
    }

    /// Copy every file in the snapshot back to its source path.
    ///
    /// Files whose stored digest no longer matches the manifest are not restored.
    pub fn restore(&self, id: &str) -> Result<RestoreReport> {
        let entry_dir = self.entry_dir(id)?;
        let manifest = read_manifest(&entry_dir)?;

        let mut restored = 0;
        let mut failed = Vec::new();
        for file in &manifest.files {
            match restore_one(&entry_dir, file) {
                Ok(()) => restored += 1,
                Err(err) => failed.push(FileFailure::from_error(&file.source, &err)),
            }
        }

        Ok(RestoreReport {
            id: manifest.id,
            restored,
            failed,
        })
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let entry_dir = self.entry_dir(id)?;
        fs::remove_dir_all(&entry_dir).map_err(|e| backup_io(&entry_dir, &e))
    }

    /// Remove all but the `keep` newest snapshots.
    pub fn prune(&self, keep: usize) -> Result<PruneResult> {
        let entries = self.list();
        let mut removed_ids = Vec::new();
        for entry in entries.iter().skip(keep) {
            fs::remove_dir_all(&entry.path).map_err(|e| backup_io(&entry.path, &e))?;
            removed_ids.push(entry.id.clone());
        }
        Ok(PruneResult {
            kept: entries.len() - removed_ids.len(),
            removed_ids,
        })
    }

    fn entry_dir(&self, id: &str) -> Result<PathBuf> {
        let not_found = || DevkitError::BackupNotFound { id: id.to_string() };
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(not_found());
        }
        let dir = self.dir.join(id);
        if dir.join(MANIFEST).is_file() {
            Ok(dir)
        } else {
            Err(not_found())
        }
    }

    fn allocate_entry(&self, base: &str) -> Result<(String, PathBuf)> {
        let mut id = base.to_string();
        let mut suffix = 1;
        while self.dir.join(&id).exists() {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }
        let dir = self.dir.join(&id);
        fs::create_dir_all(&dir).map_err(|e| backup_io(&dir, &e))?;
        Ok((id, dir))
    }
}

fn backup_io(path: &Path, err: &std::io::Error) -> DevkitError {
    DevkitError::BackupIo {
        path: path.to_path_buf(),
        details: err.to_string(),
    }
}

fn read_manifest(entry_dir: &Path) -> Result<Manifest> {
    let path = entry_dir.join(MANIFEST);
    let raw = fs::read_to_string(&path).map_err(|e| backup_io(&path, &e))?;
    Ok(serde_json::from_str(&raw)?)
}

fn summarize(manifest: &Manifest, path: PathBuf) -> BackupSnapshot {
    BackupSnapshot {
        id: manifest.id.clone(),
        created_at: manifest.created_at.clone(),
        timestamp_ms: manifest.timestamp_ms,
        file_count: manifest.files.len(),
        total_bytes: manifest.files.iter().map(|f| f.size).sum(),
        path,
    }
}

/// `03-.config_nvim_init.lua` for `/home/u/.config/nvim/init.lua` at index 3.
fn stored_name(idx: usize, source: &Path) -> String {
    let tail: Vec<String> = source
        .components()
        .rev()
        .take(3)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let joined: Vec<&str> = tail.iter().rev().map(String::as_str).collect();
    format!("{idx:02}-{}", joined.join("_").replace(['/', '\\'], "_"))
}

fn sha256_file(path: &Path) -> Result<(u64, String)> {
    let mut file = fs::File::open(path).map_err(|e| backup_io(path, &e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf).map_err(|e| backup_io(path, &e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((size, to_hex(&hasher.finalize())))
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

fn copy_with_digest(source: &Path, dest: &Path) -> Result<(u64, String)> {
    fs::copy(source, dest).map_err(|e| backup_io(source, &e))?;
    sha256_file(dest)
}

fn restore_one(entry_dir: &Path, file: &BackupFile) -> Result<()> {
    let stored = entry_dir.join(&file.stored);
    let (_, digest) = sha256_file(&stored)?;
    if digest != file.sha256 {
        return Err(DevkitError::BackupIo {
            path: stored,
            details: "checksum mismatch".to_string(),
        });
    }
    if let Some(parent) = file.source.parent() {
        fs::create_dir_all(parent).map_err(|e| backup_io(parent, &e))?;
    }
    fs::copy(&stored, &file.source).map_err(|e| backup_io(&file.source, &e))?;
    Ok(())
}
