//! Canonical default documents per shape.
//!
//! Every call builds a fresh value, so callers may mutate the result freely.

use crate::coerce::parse_int_prefix;
use crate::document::{
    ConfigDocument, Document, EditDataset, EditSample, GeneralSection, Resolution,
    StandardDataset, StandardSample,
};
use crate::profile::{Profile, Shape};

/// Default document for the profile's shape.
pub fn default_for(profile: &Profile) -> ConfigDocument {
    default_for_shape(profile.shape())
}

pub fn default_for_shape(shape: Shape) -> ConfigDocument {
    match shape {
        Shape::Standard => ConfigDocument::Standard(standard_template()),
        Shape::Edit => ConfigDocument::Edit(edit_template()),
    }
}

/// Default document for `new_profile`, carrying over the batch size and
/// repeat count typed into the current form.
///
/// Values that are absent or do not start with an integer leave the
/// template default in place. Every other field is reset.
pub fn switch_profile(
    new_profile: &Profile,
    current_batch_size: Option<&str>,
    current_num_repeats: Option<&str>,
) -> ConfigDocument {
    let mut doc = default_for(new_profile);
    let general = doc.general_mut();
    if let Some(batch_size) = current_batch_size.and_then(parse_int_prefix) {
        general.batch_size = Some(batch_size);
    }
    if let Some(num_repeats) = current_num_repeats.and_then(parse_int_prefix) {
        general.num_repeats = Some(num_repeats);
    }
    doc
}

fn standard_template() -> Document<StandardDataset, StandardSample> {
    Document {
        general: GeneralSection {
            resolution: Some(Resolution::new(1024, 1024)),
            ..common_general()
        },
        datasets: vec![StandardDataset {
            resolution: None,
            image_directory: Some("./dataset/a".to_string()),
            cache_directory: Some("./dataset/a/cache".to_string()),
        }],
        samples: vec![StandardSample {
            prompt: "A futuristic space station".to_string(),
            width: 1024,
            height: 576,
            sample_steps: 25,
            guidance_scale: 3.0,
            seed: 42,
            frame_count: 1,
            discrete_flow_shift: 3.0,
        }],
    }
}

fn edit_template() -> Document<EditDataset, EditSample> {
    Document {
        general: common_general(),
        datasets: vec![EditDataset {
            resolution: Some(Resolution::new(1024, 1024)),
            image_directory: Some("./dataset/target".to_string()),
            control_directory: Some("./dataset/ctrl".to_string()),
            cache_directory: Some("./dataset/target/cache".to_string()),
            qwen_image_edit_no_resize_control: Some(false),
            qwen_image_edit_control_resolution: Some(Resolution::new(1024, 1024)),
        }],
        samples: vec![EditSample {
            prompt: "Replace face...".to_string(),
            width: 1024,
            height: 1024,
            sample_steps: 25,
            guidance_scale: 3.0,
            seed: 42,
            discrete_flow_shift: 3.0,
            control_image_path: Vec::new(),
        }],
    }
}

fn common_general() -> GeneralSection {
    GeneralSection {
        resolution: None,
        enable_bucket: Some(true),
        bucket_no_upscale: Some(false),
        batch_size: Some(1),
        caption_extension: Some(".txt".to_string()),
        num_repeats: Some(10),
    }
}
