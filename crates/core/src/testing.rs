use serde_json::{Value, json};

use crate::document::ConfigDocument;
use crate::profile::Shape;

/// Persisted standard document with one sample (`batch_size` 4, seed 7).
pub fn standard_json() -> Value {
    json!({
        "general": {
            "resolution": [768, 768],
            "enable_bucket": true,
            "bucket_no_upscale": false,
            "batch_size": 4,
            "caption_extension": ".txt",
            "num_repeats": 5
        },
        "datasets": [{
            "image_directory": "/data/cats",
            "cache_directory": "/data/cats/cache"
        }],
        "samples": [{
            "prompt": "A cat",
            "width": 512,
            "height": 512,
            "sample_steps": 30,
            "guidance_scale": 4,
            "seed": 7,
            "frame_count": 1,
            "discrete_flow_shift": 3
        }]
    })
}

/// Persisted edit document with two control images on its sample.
pub fn edit_json() -> Value {
    json!({
        "general": {
            "enable_bucket": true,
            "bucket_no_upscale": false,
            "batch_size": 2,
            "caption_extension": ".txt",
            "num_repeats": 10
        },
        "datasets": [{
            "resolution": [1024, 1024],
            "image_directory": "/data/target",
            "control_directory": "/data/ctrl",
            "cache_directory": "/data/target/cache",
            "qwen_image_edit_no_resize_control": false,
            "qwen_image_edit_control_resolution": [512, 512]
        }],
        "samples": [{
            "prompt": "Swap the face",
            "width": 1024,
            "height": 1024,
            "sample_steps": 25,
            "guidance_scale": 3,
            "seed": 42,
            "discrete_flow_shift": 3,
            "control_image_path": ["/data/ctrl/a.png", "/data/ctrl/b.png"]
        }]
    })
}

pub fn standard_document() -> ConfigDocument {
    ConfigDocument::from_value(Shape::Standard, &standard_json())
        .expect("standard fixture is an object")
}

pub fn edit_document() -> ConfigDocument {
    ConfigDocument::from_value(Shape::Edit, &edit_json()).expect("edit fixture is an object")
}

/// Flat `load_task` settings for a task on `profile`.
pub fn flat_settings(profile: &str) -> Value {
    json!({
        "qwen.lora": profile,
        "qwen.output_name": "run1",
        "qwen.output_dir": "/srv/out",
        "qwen.dit": null,
        "qwen.learning_rate": "1e-4",
        "qwen.network_dim": 16,
        "qwen.fp8_base": true
    })
}
