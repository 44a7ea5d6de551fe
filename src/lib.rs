pub mod events;
pub mod reader;

pub use crate::events::{EventSink, ProgressEvent};
pub use crate::reader::ReaderService;
