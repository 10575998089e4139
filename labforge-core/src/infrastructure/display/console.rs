// labforge-core/src/infrastructure/display/console.rs

use std::sync::Mutex;

use crate::application::ports::DisplayChannel;

/// Prints each fragment on stdout, whitespace collapsed onto one line.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl DisplayChannel for ConsoleDisplay {
    fn show_html(&self, html: &str) {
        let compact = html.split_whitespace().collect::<Vec<_>>().join(" ");
        println!("   🔗 {}", compact);
    }
}

/// Keeps every fragment in memory.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    shown: Mutex<Vec<String>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown
            .lock()
            .map(|v| v.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl DisplayChannel for RecordingDisplay {
    fn show_html(&self, html: &str) {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(html.to_string());
        }
    }
}
