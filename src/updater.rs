//! Threshold updater.
//! Echoes each slider value into the label right away, then debounces a
//! regenerate request to the backend and swaps the image source to the
//! returned path with a millisecond cache-buster.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{ThresholdBackend, UpdateRequest};
use crate::debounce::Debouncer;
use crate::threshold::Threshold;
use crate::view::{ImageView, Label, cache_busted_source};

/// What to do with a regenerate request that failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Drop it. The image stays as it was and nothing is reported.
    Ignore,
    /// Log at `warn` and leave the image unchanged.
    #[default]
    Log,
}

pub struct ThresholdUpdater<B: ThresholdBackend + 'static> {
    backend: Arc<B>,
    label: Arc<dyn Label>,
    image: Arc<dyn ImageView>,
    debouncer: Debouncer,
    quiet_interval: Duration,
    failure_policy: FailurePolicy,
}

impl<B: ThresholdBackend + 'static> ThresholdUpdater<B> {
    pub fn new(
        backend: Arc<B>,
        label: Arc<dyn Label>,
        image: Arc<dyn ImageView>,
        quiet_interval: Duration,
    ) -> Self {
        Self {
            backend,
            label,
            image,
            debouncer: Debouncer::new(),
            quiet_interval,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the label now and (re)arms the debounced regenerate request.
    /// Must be called from inside a tokio runtime.
    pub fn update_threshold_value(&self, value: impl Into<Threshold>, image_filename: &str) {
        let threshold = value.into();
        self.label.set_text(&threshold.to_string());

        let request = UpdateRequest {
            threshold,
            image_filename: image_filename.to_string(),
        };
        let backend = Arc::clone(&self.backend);
        let image = Arc::clone(&self.image);
        let policy = self.failure_policy;

        tracing::debug!(
            "scheduling update for {} (threshold {}) in {:?}",
            request.image_filename,
            request.threshold,
            self.quiet_interval
        );
        self.debouncer.schedule(self.quiet_interval, async move {
            match backend.update_threshold(&request).await {
                Ok(response) => {
                    let src = cache_busted_source(
                        &response.combined_image,
                        chrono::Utc::now().timestamp_millis(),
                    );
                    tracing::info!("combined image updated: {}", src);
                    image.set_source(&src);
                }
                Err(e) => match policy {
                    FailurePolicy::Ignore => {}
                    FailurePolicy::Log => {
                        tracing::warn!("threshold update for {} failed: {:#}", request.image_filename, e)
                    }
                },
            }
        });
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_armed()
    }

    /// Drops the pending request, if any. Requests already sent still complete.
    pub fn cancel_pending(&self) {
        self.debouncer.cancel_pending();
    }

    /// Waits until the pending request (if any) has been sent and every sent
    /// request has finished.
    pub async fn settle(&self) {
        self.debouncer.settle().await;
    }
}
