// src/build/paths.rs

//! Path conversion for the MSYS shell

use std::path::Path;

/// Convert a Windows path into the form the MSYS shell understands
///
/// `C:\deps\automake\compile` becomes `/c/deps/automake/compile`. Paths that
/// are already POSIX style are returned with backslashes normalized.
pub fn unix_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let bytes = raw.as_bytes();

    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        let drive = (bytes[0] as char).to_ascii_lowercase();
        let rest = raw[2..].trim_start_matches('/');
        if rest.is_empty() {
            format!("/{}", drive)
        } else {
            format!("/{}/{}", drive, rest)
        }
    } else {
        raw
    }
}
