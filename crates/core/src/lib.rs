pub mod coerce;
pub mod console;
pub mod decode;
pub mod document;
pub mod error;
pub mod form;
pub mod profile;
pub mod settings;
pub mod template;

pub use document::ConfigDocument;
pub use error::{DocumentError, Result};
pub use form::EditorForm;
pub use profile::{Profile, Shape};
pub use settings::{SettingValue, Settings};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
