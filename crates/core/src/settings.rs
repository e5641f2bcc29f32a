//! Flat task settings (the `load_task` / `yaml_updates` side of the editor).
//!
//! Keys are dotted (`qwen.output_dir`); values are plain scalars. The
//! profile selection travels under [`PROFILE_KEY`] and a derived model
//! version under [`MODEL_VERSION_KEY`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce::parse_number;
use crate::error::{DocumentError, Result};
use crate::profile::Profile;

pub const PROFILE_KEY: &str = "qwen.lora";
pub const MODEL_VERSION_KEY: &str = "qwen.model_version";
pub const OUTPUT_DIR_KEY: &str = "qwen.output_dir";
pub const OUTPUT_NAME_KEY: &str = "qwen.output_name";

const KEY_NAMESPACE: &str = "qwen.";
const FOLDER_KEYS: &[&str] = &["output_dir"];
const WEIGHT_FILE_KEYS: &[&str] = &["dit", "vae", "text_encoder", "network_weights"];

pub const WEIGHT_EXTENSIONS: &[&str] = &[".safetensors"];
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    File,
    Folder,
}

impl PathKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

/// What a path chooser should offer for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTarget {
    pub kind: PathKind,
    pub extensions: Vec<String>,
}

impl PathTarget {
    pub fn folder() -> Self {
        Self {
            kind: PathKind::Folder,
            extensions: Vec::new(),
        }
    }

    pub fn file(extensions: &[&str]) -> Self {
        Self {
            kind: PathKind::File,
            extensions: extensions.iter().map(|ext| (*ext).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingControl {
    Text(String),
    Toggle(bool),
    /// A choice whose value is promoted to a number when it looks numeric.
    Select(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingInput {
    pub name: String,
    pub control: SettingControl,
    pub picker: Option<PathTarget>,
}

/// A persisted flat setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

/// Plain (non-document) settings of a task, in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    inputs: Vec<SettingInput>,
}

impl Settings {
    /// Build inputs from a flat `load_task` mapping.
    ///
    /// Returns the profile named under [`PROFILE_KEY`], if any. Null values
    /// become empty text; booleans become toggles and numbers selects.
    pub fn from_flat(config: &Map<String, Value>) -> (Option<Profile>, Self) {
        let mut profile = None;
        let mut inputs = Vec::with_capacity(config.len());

        for (key, value) in config {
            if key == PROFILE_KEY {
                profile = value.as_str().map(Profile::new);
                continue;
            }
            let control = match value {
                Value::Bool(b) => SettingControl::Toggle(*b),
                Value::Number(n) => SettingControl::Select(n.to_string()),
                Value::String(s) => SettingControl::Text(s.clone()),
                Value::Null => SettingControl::Text(String::new()),
                other => SettingControl::Text(other.to_string()),
            };
            inputs.push(SettingInput {
                name: key.clone(),
                control,
                picker: picker_for(key),
            });
        }

        (profile, Self { inputs })
    }

    pub fn inputs(&self) -> &[SettingInput] {
        &self.inputs
    }

    pub fn get(&self, name: &str) -> Option<&SettingInput> {
        self.inputs.iter().find(|input| input.name == name)
    }

    /// Text shown in the input, or `None` for toggles and unknown names.
    pub fn text(&self, name: &str) -> Option<&str> {
        match &self.get(name)?.control {
            SettingControl::Text(value) | SettingControl::Select(value) => Some(value),
            SettingControl::Toggle(_) => None,
        }
    }

    /// Set a text or select input, or a toggle from `true`/`false`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let input = self
            .inputs
            .iter_mut()
            .find(|input| input.name == name)
            .ok_or_else(|| DocumentError::UnknownField(name.to_string()))?;
        match &mut input.control {
            SettingControl::Text(current) | SettingControl::Select(current) => {
                *current = value.to_string();
            }
            SettingControl::Toggle(checked) => {
                *checked = value
                    .trim()
                    .parse()
                    .map_err(|_| DocumentError::KindMismatch {
                        field: name.to_string(),
                        given: "non-boolean",
                    })?;
            }
        }
        Ok(())
    }

    /// Store a path returned by the chooser.
    ///
    /// For the output directory the current output name is appended so the
    /// field points at the final artifact folder.
    pub fn apply_picked_path(&mut self, name: &str, path: &str) -> Result<()> {
        let mut value = path.to_string();
        if name == OUTPUT_DIR_KEY {
            if let Some(output_name) = self.text(OUTPUT_NAME_KEY).filter(|n| !n.is_empty()) {
                if !value.ends_with('/') {
                    value.push('/');
                }
                value.push_str(output_name);
            }
        }
        self.set(name, &value)
    }

    /// Flat mapping persisted alongside the document.
    pub fn collect(&self, profile: &Profile) -> BTreeMap<String, SettingValue> {
        let mut out = BTreeMap::new();
        for input in &self.inputs {
            if input.name.is_empty() || input.name == PROFILE_KEY {
                continue;
            }
            let value = match &input.control {
                SettingControl::Toggle(checked) => SettingValue::Bool(*checked),
                SettingControl::Select(raw) => match parse_number(raw) {
                    Some(number) => SettingValue::Number(number),
                    None => SettingValue::Text(raw.clone()),
                },
                SettingControl::Text(raw) => SettingValue::Text(raw.clone()),
            };
            out.insert(input.name.clone(), value);
        }
        out.insert(
            PROFILE_KEY.to_string(),
            SettingValue::Text(profile.name().to_string()),
        );
        out.insert(
            MODEL_VERSION_KEY.to_string(),
            SettingValue::Text(profile.model_version().to_string()),
        );
        out
    }
}

fn picker_for(key: &str) -> Option<PathTarget> {
    let clean = key.strip_prefix(KEY_NAMESPACE).unwrap_or(key);
    if FOLDER_KEYS.contains(&clean) {
        Some(PathTarget::folder())
    } else if WEIGHT_FILE_KEYS.contains(&clean) {
        Some(PathTarget::file(WEIGHT_EXTENSIONS))
    } else {
        None
    }
}
