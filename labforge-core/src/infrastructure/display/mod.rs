pub mod console;
pub mod html;

pub use console::{ConsoleDisplay, RecordingDisplay};
pub use html::HtmlLinkRenderer;
