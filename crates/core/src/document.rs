//! Nested training configuration document.
//!
//! The persisted JSON has three sections (`general`, `datasets`, `samples`).
//! Which keys are meaningful depends on the profile [`Shape`], so the
//! document is a tagged union of two concrete record types. Edit-only keys
//! exist only on the edit variant.
//!
//! Reading is lenient: missing, null or malformed values are tolerated and
//! leave the field at its structural default.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::coerce::{parse_float_prefix, parse_int_prefix};
use crate::error::{DocumentError, Result};
use crate::profile::Shape;

/// Width/height pair, persisted as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: i64,
    pub height: i64,
}

impl Resolution {
    pub const DEFAULT_SIDE: i64 = 1024;

    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIDE, Self::DEFAULT_SIDE)
    }
}

impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        [self.width, self.height].serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GeneralSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_bucket: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_no_upscale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_repeats: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StandardDataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_directory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EditDataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qwen_image_edit_no_resize_control: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qwen_image_edit_control_resolution: Option<Resolution>,
}

/// Fallback values used when a sample omits a numeric parameter.
pub mod sample_defaults {
    pub const WIDTH: i64 = 1024;
    pub const HEIGHT: i64 = 1024;
    pub const SEED: i64 = 42;
    pub const GUIDANCE_SCALE: f64 = 3.0;
    pub const SAMPLE_STEPS: i64 = 20;
    pub const DISCRETE_FLOW_SHIFT: f64 = 3.0;
    pub const FRAME_COUNT: i64 = 1;
}

/// Whole floats are written as integers, so a persisted `3` stays `3`.
fn whole_as_integer<S: Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardSample {
    pub prompt: String,
    pub width: i64,
    pub height: i64,
    pub sample_steps: i64,
    #[serde(serialize_with = "whole_as_integer")]
    pub guidance_scale: f64,
    pub seed: i64,
    pub frame_count: i64,
    #[serde(serialize_with = "whole_as_integer")]
    pub discrete_flow_shift: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditSample {
    pub prompt: String,
    pub width: i64,
    pub height: i64,
    pub sample_steps: i64,
    #[serde(serialize_with = "whole_as_integer")]
    pub guidance_scale: f64,
    pub seed: i64,
    #[serde(serialize_with = "whole_as_integer")]
    pub discrete_flow_shift: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub control_image_path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document<D, S> {
    pub general: GeneralSection,
    pub datasets: Vec<D>,
    pub samples: Vec<S>,
}

pub type StandardDocument = Document<StandardDataset, StandardSample>;
pub type EditDocument = Document<EditDataset, EditSample>;

/// A configuration document of either shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigDocument {
    Standard(StandardDocument),
    Edit(EditDocument),
}

impl ConfigDocument {
    pub fn shape(&self) -> Shape {
        match self {
            Self::Standard(_) => Shape::Standard,
            Self::Edit(_) => Shape::Edit,
        }
    }

    pub fn general(&self) -> &GeneralSection {
        match self {
            Self::Standard(doc) => &doc.general,
            Self::Edit(doc) => &doc.general,
        }
    }

    pub fn general_mut(&mut self) -> &mut GeneralSection {
        match self {
            Self::Standard(doc) => &mut doc.general,
            Self::Edit(doc) => &mut doc.general,
        }
    }

    pub fn dataset_count(&self) -> usize {
        match self {
            Self::Standard(doc) => doc.datasets.len(),
            Self::Edit(doc) => doc.datasets.len(),
        }
    }

    pub fn sample_count(&self) -> usize {
        match self {
            Self::Standard(doc) => doc.samples.len(),
            Self::Edit(doc) => doc.samples.len(),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Read a persisted JSON document as the given shape.
    ///
    /// Keys that do not belong to `shape` are dropped. Fails only when the
    /// root is not a JSON object.
    pub fn from_value(shape: Shape, value: &Value) -> Result<Self> {
        let root = value.as_object().ok_or(DocumentError::NotAnObject)?;
        let general = root
            .get("general")
            .and_then(Value::as_object)
            .map(|map| read_general(Fields(map)))
            .unwrap_or_default();
        let datasets = objects(root.get("datasets"));
        let samples = objects(root.get("samples"));

        Ok(match shape {
            Shape::Standard => Self::Standard(Document {
                general,
                datasets: datasets.map(read_standard_dataset).collect(),
                samples: samples.map(read_standard_sample).collect(),
            }),
            Shape::Edit => Self::Edit(Document {
                general,
                datasets: datasets.map(read_edit_dataset).collect(),
                samples: samples.map(read_edit_sample).collect(),
            }),
        })
    }
}

fn objects(value: Option<&Value>) -> impl Iterator<Item = Fields<'_>> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(Fields)
}

fn read_general(fields: Fields<'_>) -> GeneralSection {
    GeneralSection {
        resolution: fields.pair("resolution"),
        enable_bucket: fields.flag("enable_bucket"),
        bucket_no_upscale: fields.flag("bucket_no_upscale"),
        batch_size: fields.int("batch_size"),
        caption_extension: fields.text("caption_extension"),
        num_repeats: fields.int("num_repeats"),
    }
}

fn read_standard_dataset(fields: Fields<'_>) -> StandardDataset {
    StandardDataset {
        resolution: fields.pair("resolution"),
        image_directory: fields.text("image_directory"),
        cache_directory: fields.text("cache_directory"),
    }
}

fn read_edit_dataset(fields: Fields<'_>) -> EditDataset {
    EditDataset {
        resolution: fields.pair("resolution"),
        image_directory: fields.text("image_directory"),
        control_directory: fields.text("control_directory"),
        cache_directory: fields.text("cache_directory"),
        qwen_image_edit_no_resize_control: fields.flag("qwen_image_edit_no_resize_control"),
        qwen_image_edit_control_resolution: fields.pair("qwen_image_edit_control_resolution"),
    }
}

fn read_standard_sample(fields: Fields<'_>) -> StandardSample {
    StandardSample {
        prompt: fields.text("prompt").unwrap_or_default(),
        width: fields.int("width").unwrap_or(sample_defaults::WIDTH),
        height: fields.int("height").unwrap_or(sample_defaults::HEIGHT),
        sample_steps: fields
            .int("sample_steps")
            .unwrap_or(sample_defaults::SAMPLE_STEPS),
        guidance_scale: fields
            .float("guidance_scale")
            .unwrap_or(sample_defaults::GUIDANCE_SCALE),
        seed: fields.int("seed").unwrap_or(sample_defaults::SEED),
        frame_count: fields
            .int("frame_count")
            .unwrap_or(sample_defaults::FRAME_COUNT),
        discrete_flow_shift: fields
            .float("discrete_flow_shift")
            .unwrap_or(sample_defaults::DISCRETE_FLOW_SHIFT),
    }
}

fn read_edit_sample(fields: Fields<'_>) -> EditSample {
    EditSample {
        prompt: fields.text("prompt").unwrap_or_default(),
        width: fields.int("width").unwrap_or(sample_defaults::WIDTH),
        height: fields.int("height").unwrap_or(sample_defaults::HEIGHT),
        sample_steps: fields
            .int("sample_steps")
            .unwrap_or(sample_defaults::SAMPLE_STEPS),
        guidance_scale: fields
            .float("guidance_scale")
            .unwrap_or(sample_defaults::GUIDANCE_SCALE),
        seed: fields.int("seed").unwrap_or(sample_defaults::SEED),
        discrete_flow_shift: fields
            .float("discrete_flow_shift")
            .unwrap_or(sample_defaults::DISCRETE_FLOW_SHIFT),
        control_image_path: fields.text_list("control_image_path"),
    }
}

/// Lenient typed view over one JSON object.
#[derive(Clone, Copy)]
struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_text)
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(int_value)
    }

    fn float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_float_prefix(s),
            _ => None,
        }
    }

    fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A present value always yields a pair; unreadable components fall back
    /// to [`Resolution::DEFAULT_SIDE`].
    fn pair(&self, key: &str) -> Option<Resolution> {
        let value = self.get(key)?;
        let pair = match value.as_array() {
            Some(items) if items.len() > 1 => Resolution::new(
                int_value(&items[0]).unwrap_or(Resolution::DEFAULT_SIDE),
                int_value(&items[1]).unwrap_or(Resolution::DEFAULT_SIDE),
            ),
            _ => Resolution::default(),
        };
        Some(pair)
    }

    fn text_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
            Some(value) => scalar_text(value).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}
