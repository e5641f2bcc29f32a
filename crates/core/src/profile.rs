use serde::{Deserialize, Serialize};

/// Profile names that train without control images.
pub const STANDARD_PROFILES: &[&str] = &["Qwen-Image", "Qwen-Image-2512", "Z-Image-Turbo"];

/// Structural shape of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Plain text-to-image training.
    Standard,
    /// Image-edit training: adds control directories, a control resolution
    /// and per-sample control images.
    Edit,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Edit => "edit",
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, Self::Edit)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model profile as selected in the editor (persisted under `qwen.lora`).
///
/// Profile names are open-ended; anything outside [`STANDARD_PROFILES`] is an
/// edit profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(String);

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn shape(&self) -> Shape {
        if STANDARD_PROFILES.contains(&self.0.as_str()) {
            Shape::Standard
        } else {
            Shape::Edit
        }
    }

    /// Model version tag derived from the profile name.
    pub fn model_version(&self) -> &'static str {
        let name = self.0.as_str();
        if !name.contains("Edit") {
            "original"
        } else if name.ends_with("Edit") {
            "edit"
        } else if name.ends_with("2509") {
            "edit-2509"
        } else {
            "edit-2511"
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(STANDARD_PROFILES[0])
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Profile {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
