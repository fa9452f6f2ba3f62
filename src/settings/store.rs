use crate::settings::{Preferences, SCHEMA_VERSION};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn preferences_path() -> PathBuf {
    home_dir().join(".calmmate").join("preferences.json")
}

fn read_preferences_file(path: &Path) -> Result<Preferences, String> {
    let data = fs::read(path).map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let prefs: Preferences = serde_json::from_slice(&data)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
    if prefs.schema_version != SCHEMA_VERSION {
        return Err(format!(
            "unknown schema_version in {}: {}",
            path.display(),
            prefs.schema_version
        ));
    }
    Ok(prefs)
}

fn staged_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Moves a fully written staging file over the live preferences. Some
/// platforms refuse to rename onto an existing file, so the old copy is
/// removed first in that case. The staging file never outlives a failure.
fn publish_preferences(staged: &Path, live: &Path) -> io::Result<()> {
    let result = fs::rename(staged, live).or_else(|rename_err| {
        if !live.exists() {
            return Err(rename_err);
        }
        fs::remove_file(live)?;
        fs::rename(staged, live)
    });
    if result.is_err() {
        let _ = fs::remove_file(staged);
    }
    result
}

pub fn save_to(path: &Path, prefs: &Preferences) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let bytes = serde_json::to_vec_pretty(prefs)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

    let staged = staged_path(path);
    fs::write(&staged, bytes)?;
    publish_preferences(&staged, path)
}

/// Loads preferences, falling back to defaults. A missing file is not a
/// warning; an unreadable or unknown one is.
pub fn load_from(path: &Path) -> (Preferences, Option<String>) {
    if !path.exists() {
        return (Preferences::default(), None);
    }
    match read_preferences_file(path) {
        Ok(prefs) => (prefs, None),
        Err(err) => (Preferences::default(), Some(err)),
    }
}

pub fn load() -> (Preferences, Option<String>) {
    load_from(&preferences_path())
}

pub fn save(prefs: &Preferences) -> io::Result<()> {
    save_to(&preferences_path(), prefs)
}

#[cfg(test)]
mod tests {
    use super::{load_from, publish_preferences, read_preferences_file, save_to, staged_path};
    use crate::settings::Preferences;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "calmmate_prefs_{prefix}_{}_{}.json",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn preferences_round_trip_through_disk() {
        let path = temp_file("roundtrip");
        let prefs = Preferences {
            font_size: 18.0,
            calm_mode: true,
            sidebar_open: false,
            ..Preferences::default()
        };
        save_to(&path, &prefs).expect("save should succeed");
        save_to(&path, &prefs).expect("overwrite should succeed");

        let (loaded, warning) = load_from(&path);
        assert!(warning.is_none());
        assert_eq!(loaded, prefs);
        assert!(!staged_path(&path).exists());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn failed_publish_discards_the_staged_file() {
        let live = temp_file("occupied");
        fs::create_dir_all(live.join("child")).expect("fixture dir should create");
        let staged = staged_path(&live);
        fs::write(&staged, b"{}").expect("staged file should write");

        assert!(publish_preferences(&staged, &live).is_err());
        assert!(!staged.exists());

        let _ = fs::remove_dir_all(live);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let path = temp_file("partial");
        fs::write(&path, r#"{ "schema_version": 1, "calm_mode": true }"#)
            .expect("fixture should write");

        let prefs = read_preferences_file(&path).expect("partial file should load");
        assert!(prefs.calm_mode);
        assert!(prefs.sidebar_open);
        assert_eq!(prefs.font_size, Preferences::default().font_size);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_schema_is_rejected_with_defaults() {
        let path = temp_file("unknown");
        fs::write(&path, r#"{ "schema_version": 99, "font_size": 20.0 }"#)
            .expect("fixture should write");

        let error = read_preferences_file(&path).expect_err("unknown schema should fail");
        assert!(error.contains("unknown schema_version"));

        let (prefs, warning) = load_from(&path);
        assert_eq!(prefs, Preferences::default());
        assert!(warning.is_some());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_silent() {
        let (prefs, warning) = load_from(&temp_file("absent"));
        assert_eq!(prefs, Preferences::default());
        assert!(warning.is_none());
    }
}
