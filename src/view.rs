//! View surface.
//! `Label` stands in for the `thresholdValue` text element and `ImageView`
//! for the `combinedImage` element. Terminal implementations print to stdout
//! and remember what they last showed.

use parking_lot::Mutex;

pub trait Label: Send + Sync {
    fn set_text(&self, text: &str);
}

pub trait ImageView: Send + Sync {
    fn set_source(&self, src: &str);
}

/// `/` + path + `?` + timestamp, so the viewer can't serve a cached copy.
pub fn cache_busted_source(path: &str, timestamp_ms: i64) -> String {
    format!("/{}?{}", path, timestamp_ms)
}

#[derive(Default)]
pub struct TerminalLabel {
    last: Mutex<Option<String>>,
}

impl TerminalLabel {
    pub fn last(&self) -> Option<String> {
        self.last.lock().clone()
    }
}

impl Label for TerminalLabel {
    fn set_text(&self, text: &str) {
        println!("Threshold: {}", text);
        *self.last.lock() = Some(text.to_string());
    }
}

#[derive(Default)]
pub struct TerminalImage {
    last: Mutex<Option<String>>,
}

impl TerminalImage {
    pub fn last(&self) -> Option<String> {
        self.last.lock().clone()
    }
}

impl ImageView for TerminalImage {
    fn set_source(&self, src: &str) {
        println!("Combined image: {}", src);
        *self.last.lock() = Some(src.to_string());
    }
}
