//! Preset store.
//!
//! Presets live as one JSON file per name in a directory, with a
//! `_list.json` index (`{"items":[{"name":…}]}`) and a reserved `_tmp.json`
//! holding the last session's state. File names are percent-escaped;
//! names beginning with `_` are reserved and rejected for user saves.

use crate::error::ConfigError;
use crate::params::Params;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Characters escaped in preset file names, on top of controls.
const FILENAME_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'%')
    .add(b'/')
    .add(b'\\')
    .add(b'?')
    .add(b'#')
    .add(b'"')
    .add(b'\'');

/// The session-state pseudo-preset.
const SESSION_NAME: &str = "_tmp";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PresetMeta {
    name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PresetIndex {
    items: Vec<PresetMeta>,
}

/// A directory-backed preset store.
pub struct PresetStore {
    dir: PathBuf,
    /// Name of the most recently loaded or saved user preset.
    pub selected: Option<String>,
    index: Option<PresetIndex>,
}

impl PresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            selected: None,
            index: None,
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        let escaped = utf8_percent_encode(name, FILENAME_ESCAPE).to_string();
        self.dir.join(format!("{escaped}.json"))
    }

    fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.dir).map_err(|e| ConfigError::CreateDir {
            path: self.dir.clone(),
            source: e,
        })
    }

    fn reject_reserved(name: &str) -> Result<(), ConfigError> {
        if name.is_empty() || name.starts_with('_') {
            return Err(ConfigError::ReservedName(name.to_owned()));
        }
        Ok(())
    }

    /// Load a preset into a fresh parameter tree and remember it as
    /// selected.
    pub fn load(&mut self, name: &str) -> Result<Params, ConfigError> {
        let path = self.path_for(name);
        let json = fs::read_to_string(&path).map_err(|_| {
            ConfigError::PresetNotFound(name.to_owned())
        })?;
        let params = Params::from_json(&json)?;
        self.selected = Some(name.to_owned());
        Ok(params)
    }

    /// Save under an explicit name and add it to the index.
    pub fn save_as(&mut self, name: &str, params: &Params) -> Result<(), ConfigError> {
        Self::reject_reserved(name)?;
        self.write_file(name, params)?;
        self.upsert(name)?;
        self.selected = Some(name.to_owned());
        Ok(())
    }

    /// Overwrite the currently selected preset.
    pub fn save(&mut self, params: &Params) -> Result<(), ConfigError> {
        let name = self
            .selected
            .clone()
            .ok_or_else(|| ConfigError::PresetNotFound("<none selected>".to_owned()))?;
        self.save_as(&name, params)
    }

    /// Delete a user preset and drop it from the index.
    pub fn delete(&mut self, name: &str) -> Result<(), ConfigError> {
        Self::reject_reserved(name)?;
        let path = self.path_for(name);
        fs::remove_file(&path).map_err(|e| ConfigError::WriteFile { path, source: e })?;
        let index = self.load_index()?;
        index.items.retain(|m| m.name != name);
        self.write_index()?;
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        Ok(())
    }

    /// Names of every user preset in the index.
    pub fn list(&mut self) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .load_index()?
            .items
            .iter()
            .map(|m| m.name.clone())
            .collect())
    }

    /// The index as wire JSON (`{"items":[{"name":…}]}`).
    pub fn list_json(&mut self) -> Result<String, ConfigError> {
        let index = self.load_index()?;
        Ok(serde_json::to_string(index)?)
    }

    /// Restore the `_tmp` session state, if present.
    pub fn load_session(&self) -> Result<Option<Params>, ConfigError> {
        let path = self.path_for(SESSION_NAME);
        match fs::read_to_string(path) {
            Ok(json) => Ok(Some(Params::from_json(&json)?)),
            Err(_) => Ok(None),
        }
    }

    /// Persist the `_tmp` session state.
    pub fn save_session(&self, params: &Params) -> Result<(), ConfigError> {
        self.write_file(SESSION_NAME, params)
    }

    fn write_file(&self, name: &str, params: &Params) -> Result<(), ConfigError> {
        self.ensure_dir()?;
        let path = self.path_for(name);
        fs::write(&path, params.to_json())
            .map_err(|e| ConfigError::WriteFile { path, source: e })
    }

    fn load_index(&mut self) -> Result<&mut PresetIndex, ConfigError> {
        if self.index.is_none() {
            let path = self.path_for("_list");
            let index = match fs::read_to_string(&path) {
                Ok(json) => serde_json::from_str(&json)?,
                Err(_) => {
                    let index = PresetIndex::default();
                    self.ensure_dir()?;
                    fs::write(&path, serde_json::to_string(&index)?)
                        .map_err(|e| ConfigError::WriteFile { path, source: e })?;
                    index
                }
            };
            self.index = Some(index);
        }
        Ok(self.index.as_mut().expect("index just ensured"))
    }

    fn write_index(&mut self) -> Result<(), ConfigError> {
        self.ensure_dir()?;
        let path = self.path_for("_list");
        let json = serde_json::to_string(self.index.as_ref().unwrap_or(&PresetIndex::default()))?;
        fs::write(&path, json).map_err(|e| ConfigError::WriteFile { path, source: e })
    }

    fn upsert(&mut self, name: &str) -> Result<(), ConfigError> {
        let index = self.load_index()?;
        if index.items.iter().any(|m| m.name == name) {
            return Ok(());
        }
        index.items.push(PresetMeta {
            name: name.to_owned(),
        });
        self.write_index()
    }
}
