use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Write `value` as pretty JSON with a trailing newline, creating parent
/// directories as needed.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report directory: {}", parent.display()))?;
    }

    let mut data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize report: {}", path.display()))?;
    data.push(b'\n');

    File::create(path)
        .and_then(|mut file| file.write_all(&data))
        .with_context(|| format!("failed to write report: {}", path.display()))
}

/// Display name of a prediction file: its stem, or the full path as a fallback
pub fn run_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_json_pretty_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("nested").join("score.json");

        write_json_pretty(&path, &serde_json::json!({"overall_score": 87.5})).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["overall_score"], 87.5);
    }

    #[test]
    fn test_run_name_uses_stem() {
        assert_eq!(run_name(Path::new("runs/gpt-quadrants.json")), "gpt-quadrants");
        assert_eq!(run_name(Path::new("baseline")), "baseline");
    }
}
