// Request pipeline: classify → acquire → transcode → size check → deliver → count
//
// The acquire/transcode/size stage runs in a spawned task behind a semaphore
// (the worker pool) and under a wall-clock deadline. Delivery happens after
// the worker permit is released.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::delivery::{build_caption, DeliveryAdapter};
use crate::downloader::size_guard::{self, SizeCheck, MAX_FILE_SIZE};
use crate::downloader::utils::{format_megabytes, truncate_chars};
use crate::downloader::{
    classify, AcquisitionEngine, AcquisitionResult, FailureReason, PlaybackHints, Platform,
    Transcode, TranscodeOutcome, WorkArea,
};
use crate::ledger::{current_period, UsageLedger};

const GENERIC_ERROR: &str =
    "❌ An error occurred while processing the video. Please try again later.";

// Telegram rejects very long messages, and backend stderr can be huge
const MAX_ERROR_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_file_size: u64,
    pub request_timeout: Duration,
    pub fallback_to_raw: bool,
    pub bot_username: String,
    pub max_concurrent_jobs: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            request_timeout: Duration::from_secs(420),
            fallback_to_raw: true,
            bot_username: "eyysavebot".to_string(),
            max_concurrent_jobs: 4,
        }
    }
}

/// Final result of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Unsupported,
    Delivered {
        platform: Platform,
        title: String,
        size: u64,
    },
    AccessDenied {
        platform: Platform,
    },
    ExtractionFailed {
        platform: Platform,
        message: String,
    },
    TooLarge {
        actual: u64,
        limit: u64,
    },
    ProcessingFailed(String),
    TimedOut,
}

impl Outcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Reply for the requester; `None` when the video itself is the reply
    pub fn user_message(&self) -> Option<String> {
        let text = match self {
            Self::Delivered { .. } => return None,
            Self::Unsupported => "❌ Please send a valid TikTok or Instagram video link.".to_string(),
            Self::AccessDenied { platform } => {
                format!("❌ This {} video is private or requires login.", platform)
            }
            Self::ExtractionFailed { platform, message } => format!(
                "❌ Failed to download {} video: {}",
                platform,
                truncate_chars(message, MAX_ERROR_CHARS)
            ),
            Self::TooLarge { actual, limit } => format!(
                "❌ Video is too large ({} > {}MB).",
                format_megabytes(*actual),
                limit / (1024 * 1024)
            ),
            Self::ProcessingFailed(_) => GENERIC_ERROR.to_string(),
            Self::TimedOut => "❌ Processing took too long. Please try again later.".to_string(),
        };
        Some(text)
    }
}

/// A checked deliverable, still owned by its work area
struct Prepared {
    work_area: WorkArea,
    file: PathBuf,
    title: String,
    hints: PlaybackHints,
    size: u64,
}

pub struct Pipeline {
    engine: Arc<AcquisitionEngine>,
    transcoder: Arc<dyn Transcode>,
    ledger: Arc<dyn UsageLedger>,
    workers: Arc<Semaphore>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        engine: AcquisitionEngine,
        transcoder: Arc<dyn Transcode>,
        ledger: Arc<dyn UsageLedger>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            transcoder,
            ledger,
            workers: Arc::new(Semaphore::new(options.max_concurrent_jobs.max(1))),
            options,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn UsageLedger> {
        &self.ledger
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run one request end to end. Never panics and never affects other requests.
    pub async fn process(&self, url: &str, delivery: &dyn DeliveryAdapter) -> Outcome {
        let platform = classify(url);
        if !platform.is_supported() {
            return Outcome::Unsupported;
        }
        info!(%platform, url, "processing request");

        let prepared = match self.prepare(url, platform).await {
            Ok(prepared) => prepared,
            Err(outcome) => {
                warn!(%platform, ?outcome, "request ended before delivery");
                return outcome;
            }
        };

        let caption = build_caption(platform, &prepared.title, &self.options.bot_username);
        let outcome = match delivery
            .deliver(&prepared.file, &caption, &prepared.hints)
            .await
        {
            Ok(()) => {
                self.record_delivery().await;
                info!(%platform, size = prepared.size, "video delivered");
                Outcome::Delivered {
                    platform,
                    title: prepared.title.clone(),
                    size: prepared.size,
                }
            }
            Err(e) => {
                error!(%platform, "delivery failed: {}", e);
                Outcome::ProcessingFailed(e.to_string())
            }
        };

        // close() already logs; the outcome stands either way
        let _ = prepared.work_area.close();
        outcome
    }

    /// Acquire, transcode and size-check on the worker pool under the deadline
    async fn prepare(&self, url: &str, platform: Platform) -> Result<Prepared, Outcome> {
        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Outcome::ProcessingFailed("worker pool closed".to_string()))?;

        let engine = self.engine.clone();
        let transcoder = self.transcoder.clone();
        let url = url.to_string();
        let deadline = self.options.request_timeout;
        let max_file_size = self.options.max_file_size;
        let fallback_to_raw = self.options.fallback_to_raw;

        let task = tokio::spawn(async move {
            let _permit = permit;
            let stage = run_stage(
                &engine,
                transcoder.as_ref(),
                &url,
                platform,
                max_file_size,
                fallback_to_raw,
            );
            match tokio::time::timeout(deadline, stage).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%platform, "request deadline of {}s reached", deadline.as_secs());
                    Err(Outcome::TimedOut)
                }
            }
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(%platform, "worker task failed: {}", e);
                Err(Outcome::ProcessingFailed(format!("worker task failed: {}", e)))
            }
        }
    }

    async fn record_delivery(&self) {
        let period = match current_period() {
            Ok(period) => period,
            Err(e) => {
                error!("could not compute usage period: {}", e);
                return;
            }
        };
        match self.ledger.increment(&period).await {
            Ok(count) => info!(period = %period, count, "usage recorded"),
            Err(e) => error!(period = %period, "failed to record usage: {}", e),
        }
    }
}

async fn run_stage(
    engine: &AcquisitionEngine,
    transcoder: &dyn Transcode,
    url: &str,
    platform: Platform,
    max_file_size: u64,
    fallback_to_raw: bool,
) -> Result<Prepared, Outcome> {
    let acquired = match engine.acquire(url, platform).await {
        AcquisitionResult::Success(acquired) => acquired,
        AcquisitionResult::Failure { reason, message } => {
            return Err(match reason {
                FailureReason::AuthRequired => Outcome::AccessDenied { platform },
                FailureReason::TransientNetwork => Outcome::TimedOut,
                FailureReason::Exhausted => Outcome::ExtractionFailed { platform, message },
            })
        }
    };

    let file = match transcoder
        .transcode(&acquired.path, acquired.work_area.path())
        .await
    {
        TranscodeOutcome::Transcoded(path) => path,
        TranscodeOutcome::Skipped => acquired.path.clone(),
        TranscodeOutcome::Failed(msg) if fallback_to_raw => {
            warn!("transcode failed ({}), delivering the raw download", msg);
            acquired.path.clone()
        }
        TranscodeOutcome::Failed(msg) => return Err(Outcome::ProcessingFailed(msg)),
    };

    let size = match size_guard::check(&file, max_file_size) {
        Ok(SizeCheck::Ok(size)) => size,
        Ok(SizeCheck::TooLarge(actual)) => {
            warn!(actual, limit = max_file_size, "video over size ceiling");
            return Err(Outcome::TooLarge {
                actual,
                limit: max_file_size,
            });
        }
        Err(e) => {
            return Err(Outcome::ProcessingFailed(format!(
                "could not stat {}: {}",
                file.display(),
                e
            )))
        }
    };

    Ok(Prepared {
        hints: PlaybackHints::from_metadata(&acquired.metadata),
        title: acquired.title,
        work_area: acquired.work_area,
        file,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message() {
        let outcome = Outcome::TooLarge {
            actual: 60 * 1024 * 1024 + 300_000,
            limit: MAX_FILE_SIZE,
        };
        assert_eq!(
            outcome.user_message().unwrap(),
            "❌ Video is too large (60.3MB > 50MB)."
        );
    }

    #[test]
    fn test_delivered_has_no_reply() {
        let outcome = Outcome::Delivered {
            platform: Platform::TikTok,
            title: "x".to_string(),
            size: 1,
        };
        assert!(outcome.user_message().is_none());
        assert!(outcome.is_delivered());
    }

    #[test]
    fn test_access_denied_names_platform() {
        let msg = Outcome::AccessDenied {
            platform: Platform::Instagram,
        }
        .user_message()
        .unwrap();
        assert_eq!(msg, "❌ This Instagram video is private or requires login.");
    }

    #[test]
    fn test_long_errors_are_truncated() {
        let message = "é".repeat(2000);
        let text = Outcome::ExtractionFailed {
            platform: Platform::TikTok,
            message,
        }
        .user_message()
        .unwrap();
        assert!(text.chars().count() < 600);
        assert!(text.ends_with('…'));
    }
}
