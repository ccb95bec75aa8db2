//! Collision-free file names.
//!
//! This is the host's shared helper: it sanitizes the name and probes the
//! adapter's `exists` with `name`, `name-1`, `name-2`, ... until a free
//! candidate is found.

use super::adapter::StorageAdapter;
use super::error::StorageError;

/// Pick a file name in `target_dir` that the adapter reports as free.
///
/// Returns the candidate joined onto `target_dir`.
///
/// # Errors
///
/// Propagates errors from `adapter.exists`.
pub async fn unique_file_name<A>(
    adapter: &A,
    file_name: &str,
    target_dir: &str,
) -> Result<String, StorageError>
where
    A: StorageAdapter + ?Sized,
{
    let (stem, ext) = match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    };
    let stem = sanitize_file_name(stem);

    let mut attempt: u32 = 0;
    loop {
        let candidate = if attempt == 0 {
            format!("{stem}{ext}")
        } else {
            format!("{stem}-{attempt}{ext}")
        };

        if !adapter.exists(&candidate, Some(target_dir)).await? {
            return Ok(join_path(target_dir, &candidate));
        }
        attempt += 1;
    }
}

/// Replace everything except ASCII word characters, `@` and `.` with `-`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '@' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Join `dir` and `file` the way POSIX `path.join` does.
///
/// Empty and `.` segments are dropped and `..` removes the previous segment.
/// A leading `/` on `dir` is kept.
#[must_use]
pub fn join_path(dir: &str, file: &str) -> String {
    let absolute = dir.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in dir.split('/').chain(file.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Replace Windows path separators with `/`.
#[must_use]
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
