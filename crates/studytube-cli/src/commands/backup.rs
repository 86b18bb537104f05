//! Export and import handlers

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;

use studytube_core::storage::{export_file_name, preview_backup};
use studytube_core::{Library, StateStore};

use crate::output::Output;

/// Write a backup of everything to a file
///
/// Defaults to a dated file name in the current directory.
pub fn export<S: StateStore>(
    library: &Library<S>,
    path: Option<PathBuf>,
    output: &Output,
) -> Result<PathBuf> {
    let path = path.unwrap_or_else(|| PathBuf::from(export_file_name(Local::now().date_naive())));
    let json = library
        .export()
        .to_json()
        .context("Failed to serialize backup")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write backup: {:?}", path))?;

    output.success(&format!("Exported backup to {}", path.display()));
    Ok(path)
}

/// Restore a backup, or only summarize it with `dry_run`
pub fn import<S: StateStore>(
    library: &mut Library<S>,
    path: PathBuf,
    dry_run: bool,
    output: &Output,
) -> Result<()> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read backup: {:?}", path))?;

    if dry_run {
        let preview = preview_backup(&text)?;
        output.print_backup_preview(&preview);
        return Ok(());
    }

    library.import(&text)?;
    output.success(&format!(
        "Imported {} videos from {}",
        library.state().subjects.total(),
        path.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use studytube_core::{MemoryStore, Subject, VideoRecord};
    use tempfile::TempDir;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_export_then_import() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup.json");

        let blob = serde_json::json!({
            "subjects": { "chemistry": [VideoRecord::placeholder("dQw4w9WgXcQ")] },
            "settings": { "theme": "dark", "autoSave": true }
        });
        let source = Library::open(MemoryStore::with_contents(blob.to_string()));
        let written = export(&source, Some(path.clone()), &quiet()).unwrap();
        assert_eq!(written, path);

        let mut target = Library::open(MemoryStore::new());
        import(&mut target, path.clone(), true, &quiet()).unwrap();
        assert_eq!(target.state().subjects.total(), 0);

        import(&mut target, path, false, &quiet()).unwrap();
        assert_eq!(target.videos(Subject::Chemistry).len(), 1);
        assert_eq!(target.state(), source.state());
    }

    #[test]
    fn test_import_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, r#"{"subjects": {}}"#).unwrap();

        let mut library = Library::open(MemoryStore::new());
        let err = import(&mut library, path, false, &quiet()).unwrap_err();

        assert!(err.to_string().contains("missing 'settings'"));
        assert!(library.store().contents().is_none());
    }
}
