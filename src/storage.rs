// ABOUTME: Local artifact writing for rendered results
// ABOUTME: Writes through a sibling temp file and renames into place

use crate::Result;
use rand::Rng;
use std::fs;
use std::path::Path;

pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let random: u32 = rand::thread_rng().gen();
    let tmp_path = dir.join(format!(".{}.{:x}.part", name, random));

    fs::write(&tmp_path, content)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}
