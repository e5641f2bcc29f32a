//! Editor form model and the document <-> form mapping.
//!
//! Every editable document field is described once in [`FIELD_SPECS`] by a
//! typed [`FieldPath`] and a [`FieldKind`]. Loading and saving walk that
//! table, so no code branches on individual field names. Samples are a
//! repeating block handled by [`SampleBlock`].
//!
//! Saving never merges into the previously loaded document: it starts from
//! the profile's template and overwrites whatever the form holds. Only the
//! first dataset entry is represented, and at most
//! [`CONTROL_IMAGE_SLOTS`] control images per sample.

use serde_json::{Map, Value, json};

use crate::coerce::{parse_float_prefix, parse_int_prefix};
use crate::document::{
    ConfigDocument, EditSample, Resolution, StandardSample, sample_defaults,
};
use crate::error::{DocumentError, Result};
use crate::profile::{Profile, Shape};
use crate::settings::PathKind;
use crate::template;

/// Number of control image inputs rendered per sample in edit shape.
pub const CONTROL_IMAGE_SLOTS: usize = 3;

const INTEGER_FALLBACK: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    General,
    /// The first (and only edited) dataset entry.
    Datasets,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Datasets => "datasets",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub section: Section,
    pub key: &'static str,
}

impl FieldPath {
    pub const fn new(section: Section, key: &'static str) -> Self {
        Self { section, key }
    }

    /// Parse `section.key`, e.g. `general.batch_size`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (section, key) = raw.split_once('.')?;
        FIELD_SPECS
            .iter()
            .map(|spec| spec.path)
            .find(|path| path.section.as_str() == section && path.key == key)
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.section.as_str(), self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Text,
    /// Parsed as an integer on save; unreadable or zero input becomes `1`.
    Integer,
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarType),
    /// Coupled width/height inputs; unreadable or zero sides become `1024`.
    ResolutionPair,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub path: FieldPath,
    pub label: &'static str,
    pub kind: FieldKind,
    pub edit_only: bool,
    pub picker: Option<PathKind>,
}

const fn spec(
    section: Section,
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
) -> FieldSpec {
    FieldSpec {
        path: FieldPath::new(section, key),
        label,
        kind,
        edit_only: false,
        picker: None,
    }
}

const fn edit_only(mut field: FieldSpec) -> FieldSpec {
    field.edit_only = true;
    field
}

const fn folder(mut field: FieldSpec) -> FieldSpec {
    field.picker = Some(PathKind::Folder);
    field
}

const TEXT: FieldKind = FieldKind::Scalar(ScalarType::Text);
const INTEGER: FieldKind = FieldKind::Scalar(ScalarType::Integer);
const FLAG: FieldKind = FieldKind::Scalar(ScalarType::Flag);
const PAIR: FieldKind = FieldKind::ResolutionPair;

/// Editable document fields in display order.
pub const FIELD_SPECS: &[FieldSpec] = &[
    spec(Section::General, "batch_size", "BATCH", INTEGER),
    spec(Section::General, "num_repeats", "RPT", INTEGER),
    spec(Section::General, "resolution", "RES", PAIR),
    spec(Section::Datasets, "resolution", "DS_RES", PAIR),
    edit_only(spec(
        Section::Datasets,
        "qwen_image_edit_control_resolution",
        "CTRL_RES",
        PAIR,
    )),
    folder(spec(Section::Datasets, "image_directory", "IMG_DIR", TEXT)),
    edit_only(folder(spec(
        Section::Datasets,
        "control_directory",
        "CTRL_DIR",
        TEXT,
    ))),
    folder(spec(Section::Datasets, "cache_directory", "CACHE_DIR", TEXT)),
    spec(Section::General, "enable_bucket", "BUCKET", FLAG),
    spec(Section::General, "bucket_no_upscale", "NO_UPSCALE", FLAG),
    spec(Section::General, "caption_extension", "CAPTION_EXT", TEXT),
    edit_only(spec(
        Section::Datasets,
        "qwen_image_edit_no_resize_control",
        "NO_RESIZE_CTRL",
        FLAG,
    )),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Pair { width: String, height: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub spec: &'static FieldSpec,
    pub value: FieldValue,
}

impl FormField {
    fn render(spec: &'static FieldSpec, raw: &Value) -> Option<Self> {
        let value = match spec.kind {
            FieldKind::Scalar(ScalarType::Flag) => FieldValue::Flag(raw.as_bool()?),
            FieldKind::Scalar(_) => FieldValue::Text(value_text(raw)?),
            FieldKind::ResolutionPair => {
                let pair = match raw.as_array() {
                    Some(items) if items.len() > 1 => (
                        value_text(&items[0]).unwrap_or_default(),
                        value_text(&items[1]).unwrap_or_default(),
                    ),
                    _ => (
                        Resolution::DEFAULT_SIDE.to_string(),
                        Resolution::DEFAULT_SIDE.to_string(),
                    ),
                };
                FieldValue::Pair {
                    width: pair.0,
                    height: pair.1,
                }
            }
        };
        Some(Self { spec, value })
    }

    fn coerce(&self) -> Value {
        match (&self.value, self.spec.kind) {
            (FieldValue::Flag(checked), _) => Value::Bool(*checked),
            (FieldValue::Text(raw), FieldKind::Scalar(ScalarType::Integer)) => {
                json!(int_or(raw, INTEGER_FALLBACK))
            }
            (FieldValue::Text(raw), _) => Value::String(raw.clone()),
            (FieldValue::Pair { width, height }, _) => json!([
                int_or(width, Resolution::DEFAULT_SIDE),
                int_or(height, Resolution::DEFAULT_SIDE)
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleParam {
    Width,
    Height,
    Seed,
    GuidanceScale,
    SampleSteps,
    DiscreteFlowShift,
    FrameCount,
}

const STANDARD_PARAMS: &[SampleParam] = &[
    SampleParam::Width,
    SampleParam::Height,
    SampleParam::Seed,
    SampleParam::GuidanceScale,
    SampleParam::SampleSteps,
    SampleParam::DiscreteFlowShift,
    SampleParam::FrameCount,
];

const EDIT_PARAMS: &[SampleParam] = &[
    SampleParam::Width,
    SampleParam::Height,
    SampleParam::Seed,
    SampleParam::GuidanceScale,
    SampleParam::SampleSteps,
    SampleParam::DiscreteFlowShift,
];

impl SampleParam {
    pub fn for_shape(shape: Shape) -> &'static [SampleParam] {
        match shape {
            Shape::Standard => STANDARD_PARAMS,
            Shape::Edit => EDIT_PARAMS,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::Seed => "seed",
            Self::GuidanceScale => "guidance_scale",
            Self::SampleSteps => "sample_steps",
            Self::DiscreteFlowShift => "discrete_flow_shift",
            Self::FrameCount => "frame_count",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Width => "W",
            Self::Height => "H",
            Self::Seed => "SEED",
            Self::GuidanceScale => "CFG",
            Self::SampleSteps => "STEP",
            Self::DiscreteFlowShift => "SFT",
            Self::FrameCount => "FRAME",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        STANDARD_PARAMS.iter().copied().find(|param| param.key() == key)
    }

    fn default_int(&self) -> Option<i64> {
        match self {
            Self::Width => Some(sample_defaults::WIDTH),
            Self::Height => Some(sample_defaults::HEIGHT),
            Self::Seed => Some(sample_defaults::SEED),
            Self::SampleSteps => Some(sample_defaults::SAMPLE_STEPS),
            Self::FrameCount => Some(sample_defaults::FRAME_COUNT),
            Self::GuidanceScale | Self::DiscreteFlowShift => None,
        }
    }

    fn default_float(&self) -> f64 {
        match self {
            Self::GuidanceScale => sample_defaults::GUIDANCE_SCALE,
            Self::DiscreteFlowShift => sample_defaults::DISCRETE_FLOW_SHIFT,
            _ => self.default_int().unwrap_or_default() as f64,
        }
    }

    fn default_text(&self) -> String {
        match self.default_int() {
            Some(value) => value.to_string(),
            None => self.default_float().to_string(),
        }
    }
}

/// One repeatable sample block of the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    pub prompt: String,
    params: Vec<(SampleParam, String)>,
    /// Exactly [`CONTROL_IMAGE_SLOTS`] entries in edit shape, none otherwise.
    control_images: Vec<String>,
}

impl SampleBlock {
    /// A fresh block with every parameter at its label default.
    pub fn empty(shape: Shape) -> Self {
        Self {
            prompt: String::new(),
            params: SampleParam::for_shape(shape)
                .iter()
                .map(|param| (*param, param.default_text()))
                .collect(),
            control_images: control_slots(shape, &[]),
        }
    }

    fn render(shape: Shape, sample: &Map<String, Value>) -> Self {
        let mut block = Self::empty(shape);
        block.prompt = sample.get("prompt").and_then(value_text).unwrap_or_default();
        for (param, text) in &mut block.params {
            if let Some(value) = sample.get(param.key()).and_then(value_text) {
                *text = value;
            }
        }
        if shape.is_edit() {
            let paths: Vec<String> = sample
                .get("control_image_path")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(value_text).collect())
                .unwrap_or_default();
            block.control_images = control_slots(shape, &paths);
        }
        block
    }

    pub fn params(&self) -> &[(SampleParam, String)] {
        &self.params
    }

    pub fn param(&self, param: SampleParam) -> Option<&str> {
        self.params
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_param(&mut self, key: &str, value: &str) -> Result<()> {
        let param =
            SampleParam::from_key(key).ok_or_else(|| DocumentError::UnknownSampleParam(key.into()))?;
        let slot = self
            .params
            .iter_mut()
            .find(|(p, _)| *p == param)
            .ok_or_else(|| DocumentError::UnknownSampleParam(key.into()))?;
        slot.1 = value.to_string();
        Ok(())
    }

    pub fn control_images(&self) -> &[String] {
        &self.control_images
    }

    pub fn set_control_image(&mut self, slot: usize, path: &str) -> Result<()> {
        let target = self
            .control_images
            .get_mut(slot)
            .ok_or(DocumentError::ControlSlotOutOfRange(slot))?;
        *target = path.to_string();
        Ok(())
    }

    /// A blank prompt marks the block as deleted.
    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }

    fn int(&self, param: SampleParam) -> i64 {
        let fallback = param.default_int().unwrap_or_default();
        self.param(param)
            .and_then(parse_int_prefix)
            .unwrap_or(fallback)
    }

    fn float(&self, param: SampleParam) -> f64 {
        self.param(param)
            .and_then(parse_float_prefix)
            .unwrap_or_else(|| param.default_float())
    }

    fn to_standard(&self) -> StandardSample {
        StandardSample {
            prompt: self.prompt.clone(),
            width: self.int(SampleParam::Width),
            height: self.int(SampleParam::Height),
            sample_steps: self.int(SampleParam::SampleSteps),
            guidance_scale: self.float(SampleParam::GuidanceScale),
            seed: self.int(SampleParam::Seed),
            frame_count: self.int(SampleParam::FrameCount),
            discrete_flow_shift: self.float(SampleParam::DiscreteFlowShift),
        }
    }

    fn to_edit(&self) -> EditSample {
        EditSample {
            prompt: self.prompt.clone(),
            width: self.int(SampleParam::Width),
            height: self.int(SampleParam::Height),
            sample_steps: self.int(SampleParam::SampleSteps),
            guidance_scale: self.float(SampleParam::GuidanceScale),
            seed: self.int(SampleParam::Seed),
            discrete_flow_shift: self.float(SampleParam::DiscreteFlowShift),
            control_image_path: self
                .control_images
                .iter()
                .map(|path| path.trim())
                .filter(|path| !path.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// The editable state of one configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorForm {
    profile: Profile,
    fields: Vec<FormField>,
    samples: Vec<SampleBlock>,
}

impl EditorForm {
    /// Render `doc` for `profile`. Fields absent from the document are not
    /// rendered; edit-only fields render only for edit profiles.
    pub fn load(profile: Profile, doc: &ConfigDocument) -> Result<Self> {
        let shape = profile.shape();
        let value = doc.to_value()?;
        let general = value.get("general").and_then(Value::as_object);
        let dataset = value
            .get("datasets")
            .and_then(Value::as_array)
            .and_then(|entries| entries.first())
            .and_then(Value::as_object);

        let fields = FIELD_SPECS
            .iter()
            .filter(|spec| !spec.edit_only || shape.is_edit())
            .filter_map(|spec| {
                let section = match spec.path.section {
                    Section::General => general,
                    Section::Datasets => dataset,
                }?;
                let raw = section.get(spec.path.key).filter(|v| !v.is_null())?;
                FormField::render(spec, raw)
            })
            .collect();

        let samples = value
            .get("samples")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .map(|sample| SampleBlock::render(shape, sample))
            .collect();

        Ok(Self {
            profile,
            fields,
            samples,
        })
    }

    /// Form populated from the profile's template.
    pub fn from_template(profile: Profile) -> Result<Self> {
        let doc = template::default_for(&profile);
        Self::load(profile, &doc)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn shape(&self) -> Shape {
        self.profile.shape()
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, path: FieldPath) -> Option<&FormField> {
        self.fields.iter().find(|field| field.spec.path == path)
    }

    /// Current text of a scalar field, if rendered.
    pub fn text(&self, path: FieldPath) -> Option<&str> {
        match &self.field(path)?.value {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    fn field_mut(&mut self, path: FieldPath) -> Result<&mut FormField> {
        self.fields
            .iter_mut()
            .find(|field| field.spec.path == path)
            .ok_or_else(|| DocumentError::UnknownField(path.to_string()))
    }

    pub fn set_text(&mut self, path: FieldPath, value: &str) -> Result<()> {
        let field = self.field_mut(path)?;
        match &mut field.value {
            FieldValue::Text(current) => {
                *current = value.to_string();
                Ok(())
            }
            _ => Err(kind_mismatch(path, "text")),
        }
    }

    pub fn set_flag(&mut self, path: FieldPath, checked: bool) -> Result<()> {
        let field = self.field_mut(path)?;
        match &mut field.value {
            FieldValue::Flag(current) => {
                *current = checked;
                Ok(())
            }
            _ => Err(kind_mismatch(path, "flag")),
        }
    }

    pub fn set_resolution(&mut self, path: FieldPath, width: &str, height: &str) -> Result<()> {
        let field = self.field_mut(path)?;
        match &mut field.value {
            FieldValue::Pair {
                width: w,
                height: h,
            } => {
                *w = width.to_string();
                *h = height.to_string();
                Ok(())
            }
            _ => Err(kind_mismatch(path, "resolution")),
        }
    }

    /// Set any field from text: `true`/`false` for flags, `WxH` for pairs.
    pub fn set_from_text(&mut self, path: FieldPath, raw: &str) -> Result<()> {
        let kind = self.field_mut(path)?.spec.kind;
        match kind {
            FieldKind::Scalar(ScalarType::Flag) => {
                let checked = raw
                    .trim()
                    .parse()
                    .map_err(|_| kind_mismatch(path, "non-boolean"))?;
                self.set_flag(path, checked)
            }
            FieldKind::Scalar(_) => self.set_text(path, raw),
            FieldKind::ResolutionPair => {
                let (width, height) = raw
                    .split_once(['x', 'X'])
                    .ok_or_else(|| kind_mismatch(path, "non-WxH"))?;
                self.set_resolution(path, width.trim(), height.trim())
            }
        }
    }

    pub fn samples(&self) -> &[SampleBlock] {
        &self.samples
    }

    pub fn sample_mut(&mut self, index: usize) -> Result<&mut SampleBlock> {
        self.samples
            .get_mut(index)
            .ok_or(DocumentError::SampleOutOfRange(index))
    }

    /// Append an empty block and return its index.
    pub fn add_sample(&mut self) -> usize {
        self.samples.push(SampleBlock::empty(self.shape()));
        self.samples.len() - 1
    }

    pub fn remove_sample(&mut self, index: usize) -> Result<SampleBlock> {
        if index >= self.samples.len() {
            return Err(DocumentError::SampleOutOfRange(index));
        }
        Ok(self.samples.remove(index))
    }

    /// Re-render the form for another profile.
    ///
    /// Only the batch size and repeat count typed so far survive; every
    /// other field and all samples reset to the new profile's template.
    pub fn switch_profile(&mut self, profile: Profile) -> Result<()> {
        let doc = template::switch_profile(
            &profile,
            self.text(FieldPath::new(Section::General, "batch_size")),
            self.text(FieldPath::new(Section::General, "num_repeats")),
        );
        *self = Self::load(profile, &doc)?;
        Ok(())
    }

    /// Rebuild the full document from the form.
    pub fn to_document(&self) -> Result<ConfigDocument> {
        let shape = self.shape();
        let mut base = template::default_for(&self.profile).to_value()?;

        for field in &self.fields {
            let pointer = match field.spec.path.section {
                Section::General => "/general",
                Section::Datasets => "/datasets/0",
            };
            if let Some(section) = base.pointer_mut(pointer).and_then(Value::as_object_mut) {
                section.insert(field.spec.path.key.to_string(), field.coerce());
            }
        }

        let mut doc = ConfigDocument::from_value(shape, &base)?;
        let kept = self.samples.iter().filter(|block| !block.is_blank());
        match &mut doc {
            ConfigDocument::Standard(standard) => {
                standard.samples = kept.map(SampleBlock::to_standard).collect();
            }
            ConfigDocument::Edit(edit) => {
                edit.samples = kept.map(SampleBlock::to_edit).collect();
            }
        }
        Ok(doc)
    }
}

fn control_slots(shape: Shape, paths: &[String]) -> Vec<String> {
    if !shape.is_edit() {
        return Vec::new();
    }
    (0..CONTROL_IMAGE_SLOTS)
        .map(|slot| paths.get(slot).cloned().unwrap_or_default())
        .collect()
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn int_or(raw: &str, fallback: i64) -> i64 {
    parse_int_prefix(raw)
        .filter(|value| *value != 0)
        .unwrap_or(fallback)
}

fn kind_mismatch(path: FieldPath, given: &'static str) -> DocumentError {
    DocumentError::KindMismatch {
        field: path.to_string(),
        given,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).expect("known field path")
    }

    fn standard_doc(value: Value) -> ConfigDocument {
        ConfigDocument::from_value(Shape::Standard, &value).expect("object root")
    }

    #[test]
    fn field_paths_parse_only_known_fields() {
        assert_eq!(
            FieldPath::parse("general.batch_size"),
            Some(FieldPath::new(Section::General, "batch_size"))
        );
        assert_eq!(
            path("datasets.resolution").to_string(),
            "datasets.resolution"
        );
        assert!(FieldPath::parse("general.unknown").is_none());
        assert!(FieldPath::parse("batch_size").is_none());
    }

    #[test]
    fn unedited_standard_document_saves_typed_values() {
        let doc = standard_doc(json!({
            "general": { "batch_size": 4 },
            "samples": [{ "prompt": "A cat", "width": 512, "height": 512, "seed": 7 }]
        }));
        let form = EditorForm::load(Profile::new("Qwen-Image"), &doc).expect("load");
        let saved = form.to_document().expect("save").to_value().expect("json");

        assert_eq!(saved["general"]["batch_size"], json!(4));
        let samples = saved["samples"].as_array().expect("samples array");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0]["seed"], json!(7));
        assert_eq!(samples[0]["width"], json!(512));
        assert!(samples[0].get("control_image_path").is_none());
    }

    #[test]
    fn load_then_save_reproduces_fixture_documents() {
        use crate::testing;

        let standard = EditorForm::load(Profile::new("Qwen-Image"), &testing::standard_document())
            .expect("load standard");
        assert_eq!(
            standard.to_document().expect("save").to_value().expect("json"),
            testing::standard_json()
        );

        let edit = EditorForm::load(Profile::new("Qwen-Image-Edit-2511"), &testing::edit_document())
            .expect("load edit");
        assert_eq!(
            edit.to_document().expect("save").to_value().expect("json"),
            testing::edit_json()
        );
    }

    #[test]
    fn only_present_fields_are_rendered() {
        let doc = standard_doc(json!({ "general": { "batch_size": 2 } }));
        let form = EditorForm::load(Profile::new("Qwen-Image"), &doc).expect("load");
        assert_eq!(form.fields().len(), 1);
        assert_eq!(form.text(path("general.batch_size")), Some("2"));
        assert!(form.field(path("general.num_repeats")).is_none());
    }

    #[test]
    fn edit_only_fields_hidden_for_standard_profiles() {
        let doc = template::default_for(&Profile::new("Qwen-Image-Edit"));
        let standard = EditorForm::load(Profile::new("Qwen-Image"), &doc).expect("load");
        assert!(standard.field(path("datasets.control_directory")).is_none());
        assert!(standard.samples()[0].control_images().is_empty());

        let edit = EditorForm::load(Profile::new("Qwen-Image-Edit"), &doc).expect("load");
        assert!(edit.field(path("datasets.control_directory")).is_some());
        assert_eq!(edit.samples()[0].control_images().len(), CONTROL_IMAGE_SLOTS);
    }

    #[test]
    fn integer_fields_fall_back_to_one() {
        let mut form = EditorForm::from_template(Profile::new("Qwen-Image")).expect("template");
        form.set_text(path("general.batch_size"), "lots").expect("text field");
        form.set_text(path("general.num_repeats"), "0").expect("text field");
        let doc = form.to_document().expect("save");
        assert_eq!(doc.general().batch_size, Some(1));
        assert_eq!(doc.general().num_repeats, Some(1));
    }

    #[test]
    fn resolution_pairs_fall_back_to_1024() {
        let mut form = EditorForm::from_template(Profile::new("Qwen-Image")).expect("template");
        form.set_from_text(path("general.resolution"), "768 x wide")
            .expect("pair field");
        let doc = form.to_document().expect("save");
        assert_eq!(doc.general().resolution, Some(Resolution::new(768, 1024)));
    }

    #[test]
    fn malformed_resolution_renders_as_default_pair() {
        let doc = standard_doc(json!({ "general": { "resolution": "big" } }));
        let form = EditorForm::load(Profile::new("Qwen-Image"), &doc).expect("load");
        assert_eq!(
            form.field(path("general.resolution")).map(|f| f.value.clone()),
            Some(FieldValue::Pair {
                width: "1024".into(),
                height: "1024".into()
            })
        );
    }

    #[test]
    fn text_fields_are_saved_verbatim() {
        let mut form = EditorForm::from_template(Profile::new("Qwen-Image")).expect("template");
        form.set_text(path("datasets.image_directory"), "/data/cats")
            .expect("text field");
        form.set_from_text(path("general.enable_bucket"), "false")
            .expect("flag field");
        let value = form.to_document().expect("save").to_value().expect("json");
        assert_eq!(value["datasets"][0]["image_directory"], json!("/data/cats"));
        assert_eq!(value["general"]["enable_bucket"], json!(false));
    }

    #[test]
    fn set_rejects_unknown_and_mismatched_fields() {
        let mut form = EditorForm::from_template(Profile::new("Qwen-Image")).expect("template");
        assert!(matches!(
            form.set_text(path("datasets.control_directory"), "/x"),
            Err(DocumentError::UnknownField(_))
        ));
        assert!(matches!(
            form.set_text(path("general.resolution"), "1"),
            Err(DocumentError::KindMismatch { .. })
        ));
        assert!(form.set_from_text(path("general.enable_bucket"), "yes").is_err());
    }

    #[test]
    fn blank_prompt_blocks_are_dropped() {
        let mut form = EditorForm::from_template(Profile::new("Qwen-Image")).expect("template");
        let blank = form.add_sample();
        let spaces = form.add_sample();
        form.sample_mut(spaces).expect("block").prompt = "   \n".into();
        let kept = form.add_sample();
        form.sample_mut(kept).expect("block").prompt = "A dog".into();
        assert!(form.samples()[blank].is_blank());

        let value = form.to_document().expect("save").to_value().expect("json");
        let prompts: Vec<&str> = value["samples"]
            .as_array()
            .expect("samples array")
            .iter()
            .filter_map(|s| s["prompt"].as_str())
            .collect();
        assert_eq!(prompts, vec!["A futuristic space station", "A dog"]);
    }

    #[test]
    fn sample_params_are_coerced_by_type() {
        let mut form = EditorForm::from_template(Profile::new("Qwen-Image")).expect("template");
        let block = form.sample_mut(0).expect("block");
        block.set_param("seed", "123abc").expect("param");
        block.set_param("guidance_scale", "4.5").expect("param");
        block.set_param("sample_steps", "").expect("param");
        block.set_param("frame_count", "2.9").expect("param");
        assert!(block.set_param("strength", "1").is_err());

        let value = form.to_document().expect("save").to_value().expect("json");
        let sample = &value["samples"][0];
        assert_eq!(sample["seed"], json!(123));
        assert_eq!(sample["guidance_scale"], json!(4.5));
        assert_eq!(sample["sample_steps"], json!(20));
        assert_eq!(sample["frame_count"], json!(2));
    }

    #[test]
    fn edit_blocks_have_no_frame_count_param() {
        let mut form =
            EditorForm::from_template(Profile::new("Qwen-Image-Edit")).expect("template");
        let block = form.sample_mut(0).expect("block");
        assert!(block.param(SampleParam::FrameCount).is_none());
        assert!(block.set_param("frame_count", "3").is_err());
    }

    #[test]
    fn control_images_keep_first_three_non_blank() {
        let doc = ConfigDocument::from_value(
            Shape::Edit,
            &json!({
                "samples": [{
                    "prompt": "swap",
                    "control_image_path": ["a.png", "b.png", "c.png", "d.png"]
                }]
            }),
        )
        .expect("object root");
        let mut form = EditorForm::load(Profile::new("Qwen-Image-Edit"), &doc).expect("load");
        assert_eq!(form.samples()[0].control_images(), ["a.png", "b.png", "c.png"]);

        let block = form.sample_mut(0).expect("block");
        block.set_control_image(1, "  ").expect("slot");
        block.set_control_image(2, " e.png ").expect("slot");
        assert!(block.set_control_image(3, "f.png").is_err());

        let value = form.to_document().expect("save").to_value().expect("json");
        assert_eq!(value["samples"][0]["control_image_path"], json!(["a.png", "e.png"]));
    }

    #[test]
    fn empty_control_images_are_omitted() {
        let mut form =
            EditorForm::from_template(Profile::new("Qwen-Image-Edit")).expect("template");
        form.sample_mut(0).expect("block").prompt = "swap".into();
        let value = form.to_document().expect("save").to_value().expect("json");
        assert!(value["samples"][0].get("control_image_path").is_none());
    }

    #[test]
    fn extra_datasets_are_dropped_on_save() {
        let doc = standard_doc(json!({
            "datasets": [
                { "image_directory": "/first" },
                { "image_directory": "/second" }
            ]
        }));
        let form = EditorForm::load(Profile::new("Qwen-Image"), &doc).expect("load");
        let saved = form.to_document().expect("save");
        assert_eq!(saved.dataset_count(), 1);
        assert_eq!(
            saved.to_value().expect("json")["datasets"][0]["image_directory"],
            json!("/first")
        );
    }

    #[test]
    fn switch_profile_carries_only_batch_and_repeats() {
        let mut form = EditorForm::from_template(Profile::new("Qwen-Image")).expect("template");
        form.set_text(path("general.batch_size"), "8").expect("text field");
        form.set_text(path("general.num_repeats"), "3").expect("text field");
        form.set_text(path("datasets.image_directory"), "/mine").expect("text field");

        form.switch_profile(Profile::new("Qwen-Image-Edit"))
            .expect("switch");
        let value = form.to_document().expect("save").to_value().expect("json");

        assert_eq!(value["general"]["batch_size"], json!(8));
        assert_eq!(value["general"]["num_repeats"], json!(3));
        assert_eq!(value["datasets"][0]["image_directory"], json!("./dataset/target"));
        assert!(value["datasets"][0].get("control_directory").is_some());
        assert!(
            value["datasets"][0]
                .get("qwen_image_edit_control_resolution")
                .is_some()
        );
    }

    #[test]
    fn switching_away_and_back_resets_to_pristine_template() {
        let standard = Profile::new("Qwen-Image");
        let mut form = EditorForm::load(standard.clone(), &crate::testing::standard_document())
            .expect("load");

        form.switch_profile(Profile::new("Qwen-Image-Edit-2511"))
            .expect("switch to edit");
        assert_eq!(form.shape(), Shape::Edit);
        form.switch_profile(standard.clone()).expect("switch back");

        let mut expected = template::default_for(&standard);
        expected.general_mut().batch_size = Some(4);
        expected.general_mut().num_repeats = Some(5);
        assert_eq!(form.to_document().expect("save"), expected);
    }

    #[test]
    fn removing_out_of_range_sample_fails() {
        let mut form = EditorForm::from_template(Profile::new("Qwen-Image")).expect("template");
        assert!(form.remove_sample(5).is_err());
        let removed = form.remove_sample(0).expect("first block");
        assert_eq!(removed.prompt, "A futuristic space station");
        assert!(form.samples().is_empty());
    }
}
