pub mod event;
pub mod logger;

pub use event::{ProbeTraceEvent, text_fingerprint};
pub use logger::TraceLogger;
