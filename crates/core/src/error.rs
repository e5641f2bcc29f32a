#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("configuration document must be a JSON object")]
    NotAnObject,

    #[error("form has no field {0}")]
    UnknownField(String),

    #[error("field {field} does not accept a {given} value")]
    KindMismatch { field: String, given: &'static str },

    #[error("no sample block at index {0}")]
    SampleOutOfRange(usize),

    #[error("unknown sample parameter: {0}")]
    UnknownSampleParam(String),

    #[error("control image slot {0} does not exist")]
    ControlSlotOutOfRange(usize),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
