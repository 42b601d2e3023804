//! Line-oriented `KEY=VALUE` file parsing and atomic in-place updates.
//!
//! Reads are tolerant: comments, blank lines, and malformed lines are
//! skipped. Writes touch only the targeted line (or append), preserving
//! every other line byte-for-byte, and replace the file atomically via a
//! uniquely-named temp file in the same directory. Writers to the same
//! file are serialized through a process-wide lock table keyed by the
//! file's absolute path.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

static FILE_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

/// Return the lock guarding writes to `path`, creating it on first use.
fn file_lock(path: &Path) -> Arc<Mutex<()>> {
    let locks = FILE_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let key = canonical_key(path);
    let mut map = locks.lock().expect("env-file lock table poisoned");
    Arc::clone(map.entry(key).or_default())
}

/// Best-effort canonical form: resolve the parent directory (which must
/// exist for a write to succeed anyway) and re-attach the file name.
fn canonical_key(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Parse env-file content into a key → value map.
///
/// A data line is `KEY=VALUE` with optional whitespace around the key;
/// key and value are trimmed. Comments (`#` after optional leading
/// whitespace), blank lines, and lines without `=` are skipped. An
/// embedded `=` in the value is kept.
pub fn parse(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

/// Read and parse an env-file inside `dir`. Missing or unreadable files
/// yield an empty map.
pub fn read_env_file(dir: &Path, file: &str) -> HashMap<String, String> {
    match fs::read_to_string(dir.join(file)) {
        Ok(content) => parse(&content),
        Err(_) => HashMap::new(),
    }
}

/// Look up a single key in an env-file inside `dir`.
pub fn read_env_value(dir: &Path, file: &str, key: &str) -> Option<String> {
    read_env_file(dir, file).remove(key)
}

/// Replace the first line starting with `key=` or `key ` with
/// `key=value`, or append `key=value` if no line matches. All other
/// lines pass through unchanged; the result always ends with a newline.
fn update_content(content: &str, key: &str, value: &str) -> String {
    if content.is_empty() {
        return format!("{key}={value}\n");
    }

    let eq_prefix = format!("{key}=");
    let space_prefix = format!("{key} ");
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    let mut updated = false;

    for line in lines.iter_mut() {
        if !updated && (line.starts_with(&eq_prefix) || line.starts_with(&space_prefix)) {
            *line = format!("{key}={value}");
            updated = true;
        }
    }

    let mut result = if updated {
        lines.join("\n")
    } else {
        let mut joined = content.to_string();
        if !joined.ends_with('\n') {
            joined.push('\n');
        }
        joined.push_str(&format!("{key}={value}\n"));
        joined
    };

    if !result.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Write `key=value` into the env-file at `path`, holding the per-path
/// lock for the whole read-modify-write-rename cycle.
pub fn write_key(path: &Path, key: &str, value: &str) -> io::Result<()> {
    write_keys(path, &[(key.to_string(), value.to_string())])
}

/// Write several `key=value` pairs into the env-file at `path` under a
/// single lock acquisition and a single atomic replace.
pub fn write_keys(path: &Path, pairs: &[(String, String)]) -> io::Result<()> {
    let lock = file_lock(path);
    let _guard = lock.lock().expect("env-file lock poisoned");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let old_perms = fs::metadata(path).ok().map(|m| m.permissions());

    let mut content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    for (key, value) in pairs {
        content = update_content(&content, key, value);
    }

    atomic_replace(path, content.as_bytes(), old_perms)
}

/// Write `bytes` to a uniquely-named temp file next to `path`, restore
/// the prior permissions (0644 for new files), then rename over `path`.
/// The temp file is removed on any error after creation.
fn atomic_replace(
    path: &Path,
    bytes: &[u8],
    old_perms: Option<fs::Permissions>,
) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("envfile");
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let tmp_path = dir.join(format!(".{base}.{}.{nanos}.tmp", std::process::id()));

    let cleanup = |e: io::Error| {
        let _ = fs::remove_file(&tmp_path);
        e
    };

    fs::write(&tmp_path, bytes).map_err(cleanup)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = old_perms.unwrap_or_else(|| fs::Permissions::from_mode(0o644));
        fs::set_permissions(&tmp_path, perms).map_err(cleanup)?;
    }
    #[cfg(not(unix))]
    {
        let _ = old_perms;
    }

    fs::rename(&tmp_path, path).map_err(cleanup)
}
