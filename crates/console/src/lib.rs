pub mod editor;
pub mod picker;
pub mod stream;
pub mod task;

pub use editor::{DocumentSource, EditorSession, SaveOutcome};
pub use picker::PathPicker;
pub use stream::{GenerationToken, LogSource, LogStream, StreamSession, StreamTiming};
pub use task::{AssumeYes, Confirm, ExecuteOutcome, StopOutcome, TaskController};
