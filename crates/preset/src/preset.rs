use crate::error::{PresetError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extension of stored presets
pub const PRESET_EXTENSION: &str = "patterns";

/// Presets directory relative to a project root
pub const DEFAULT_PRESET_DIR: &str = ".context-preset/presets";

/// Named pattern files kept in one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetStore {
    dir: PathBuf,
}

impl PresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under `<root>/.context-preset/presets`
    pub fn for_project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(DEFAULT_PRESET_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{PRESET_EXTENSION}")))
    }

    /// Writes `text` as preset `name`, replacing any previous version
    pub fn save(&self, name: &str, text: &str) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;

        let mut contents = text.to_string();
        if !contents.is_empty() && !contents.ends_with('\n') {
            contents.push('\n');
        }

        let tmp = path.with_extension(format!("{PRESET_EXTENSION}.tmp"));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        log::info!("Saved preset '{name}' to {}", path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<String> {
        let path = self.path_for(name)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(PresetError::PresetNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stored preset names, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(PRESET_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted preset '{name}'");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(PresetError::PresetNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
    {
        return Err(PresetError::InvalidPresetName(name.to_string()));
    }
    Ok(())
}
