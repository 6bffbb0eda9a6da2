//! Debounced threshold updates against an image-regenerating backend.
//!
//! [`ThresholdUpdater`] mirrors a slider: every value is shown immediately,
//! and once the slider has been still for the quiet interval a single
//! request asks the backend to regenerate the image for the last value.

pub mod client;
pub mod config;
pub mod debounce;
pub mod threshold;
pub mod updater;
pub mod view;

pub use client::{HttpBackend, ThresholdBackend, UpdateRequest, UpdateResponse};
pub use config::Config;
pub use debounce::Debouncer;
pub use threshold::Threshold;
pub use updater::{FailurePolicy, ThresholdUpdater};
pub use view::{ImageView, Label, TerminalImage, TerminalLabel, cache_busted_source};
