use std::path::Path;
use std::fs;
use anyhow::{Result, Context};
use log::debug;

/// Create a directory if it doesn't exist
pub fn ensure_dir_exists(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    debug!("Creating directory: {}", dir.display());
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))
}

/// Read a file to string with better error handling
pub fn read_file_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))
}

/// Write a string to a file, creating parent directories as needed
pub fn write_string_to_file(path: impl AsRef<Path>, content: &str) -> Result<()> {
    write_bytes_to_file(path, content.as_bytes())
}

/// Write raw bytes to a file, creating parent directories as needed
pub fn write_bytes_to_file(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent)?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write file {}", path.display()))?;
    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Turn an arbitrary label into something safe to use inside a file name
pub fn sanitize_file_component(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_creates_missing_parents() -> Result<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("a").join("b").join("out.txt");

        write_string_to_file(&nested, "hello")?;

        assert_eq!(read_file_to_string(&nested)?, "hello");
        Ok(())
    }

    #[test]
    fn sanitize_keeps_cjk_and_replaces_separators() {
        assert_eq!(sanitize_file_component("宋力"), "宋力");
        assert_eq!(sanitize_file_component("a/b c"), "a_b_c");
        assert_eq!(sanitize_file_component("   "), "unnamed");
    }
}
