// Acquisition engine - ordered strategy fallback over one extraction backend

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::diagnostics::{diagnose_error, BlockingReason};
use super::models::{MediaMetadata, NetworkConfig, Platform};
use super::strategies::{strategies_for, ExtractionStrategy, OUTPUT_STEM};
use super::traits::{BackendRequest, ExtractionBackend};
use super::work_area::WorkArea;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov"];

/// Why an acquisition failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The time budget ran out before any strategy finished
    TransientNetwork,
    /// Private post or login wall; no strategy can help
    AuthRequired,
    /// Every strategy failed
    Exhausted,
}

/// A downloaded file together with the work area that owns it
#[derive(Debug)]
pub struct Acquired {
    pub work_area: WorkArea,
    pub path: PathBuf,
    pub title: String,
    pub metadata: MediaMetadata,
    /// 1-based index of the strategy that succeeded
    pub strategy_index: usize,
}

#[derive(Debug)]
pub enum AcquisitionResult {
    Success(Acquired),
    Failure {
        reason: FailureReason,
        message: String,
    },
}

impl AcquisitionResult {
    fn failure(reason: FailureReason, message: impl Into<String>) -> Self {
        Self::Failure {
            reason,
            message: message.into(),
        }
    }
}

pub struct AcquisitionEngine {
    backend: Arc<dyn ExtractionBackend>,
    network: NetworkConfig,
    scratch_root: Option<PathBuf>,
    budget: Option<Duration>,
}

impl AcquisitionEngine {
    pub fn new(backend: Arc<dyn ExtractionBackend>, network: NetworkConfig) -> Self {
        Self {
            backend,
            network,
            scratch_root: None,
            budget: None,
        }
    }

    /// Bound the whole strategy loop; running out yields `TransientNetwork`
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Create work areas under `root` instead of the system temp dir
    pub fn with_scratch_root(mut self, root: PathBuf) -> Self {
        self.scratch_root = Some(root);
        self
    }

    /// Acquire the media behind `url` using the platform's strategy table
    pub async fn acquire(&self, url: &str, platform: Platform) -> AcquisitionResult {
        self.acquire_with(url, platform, strategies_for(platform))
            .await
    }

    /// Acquire using an explicit strategy list, tried in order
    pub async fn acquire_with(
        &self,
        url: &str,
        platform: Platform,
        strategies: &[ExtractionStrategy],
    ) -> AcquisitionResult {
        if strategies.is_empty() {
            return AcquisitionResult::failure(
                FailureReason::Exhausted,
                format!("No extraction strategies for {}", platform),
            );
        }

        let work_area = match self.new_work_area() {
            Ok(area) => area,
            Err(e) => {
                return AcquisitionResult::failure(
                    FailureReason::Exhausted,
                    format!("Failed to prepare download: {}", e),
                )
            }
        };

        let started = Instant::now();
        let mut last_error = String::from("No strategy produced a file");

        for (i, strategy) in strategies.iter().enumerate() {
            let n = i + 1;
            let remaining = self.budget.map(|b| b.saturating_sub(started.elapsed()));
            if remaining == Some(Duration::ZERO) {
                return self.out_of_time(&last_error);
            }
            info!(
                backend = self.backend.name(),
                %platform,
                strategy = strategy.label,
                "Trying {} extraction method {}/{}",
                platform,
                n,
                strategies.len()
            );

            let attempt_dir = match work_area.attempt_dir(n) {
                Ok(dir) => dir,
                Err(e) => {
                    last_error = format!("Failed to prepare attempt {}: {}", n, e);
                    warn!("{}", last_error);
                    continue;
                }
            };

            let request = BackendRequest::from_strategy(
                strategy,
                attempt_dir.join(format!("{}.%(ext)s", OUTPUT_STEM)),
                &self.network,
            );

            let attempt = self.backend.download(url, &request);
            let result = match remaining {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_) => return self.out_of_time(&last_error),
                },
                None => attempt.await,
            };

            match result {
                Ok(metadata) => match find_output(&attempt_dir) {
                    Some(path) => {
                        if let Some(vcodec) = &metadata.vcodec {
                            info!(vcodec = %vcodec, "Downloaded video codec");
                        }
                        info!(%platform, strategy = strategy.label, path = %path.display(), "✓ extraction succeeded");
                        let title = metadata.display_title();
                        return AcquisitionResult::Success(Acquired {
                            work_area,
                            path,
                            title,
                            metadata,
                            strategy_index: n,
                        });
                    }
                    None => {
                        last_error = format!(
                            "{} method {} reported success but produced no video file",
                            platform, n
                        );
                        warn!("{}", last_error);
                    }
                },
                Err(e) => {
                    let text = e.to_string();
                    let reason = diagnose_error(&text);
                    warn!(
                        %platform,
                        strategy = strategy.label,
                        reason = reason.map_or("unrecognized", |r| r.description()),
                        "✗ {} method {} failed: {}",
                        platform,
                        n,
                        text
                    );

                    if let Some(reason) = reason.filter(BlockingReason::is_fatal) {
                        info!(reason = reason.description(), "access denied, skipping remaining strategies");
                        return AcquisitionResult::failure(FailureReason::AuthRequired, text);
                    }
                    last_error = text;
                }
            }
        }

        AcquisitionResult::failure(FailureReason::Exhausted, last_error)
    }

    fn out_of_time(&self, last_error: &str) -> AcquisitionResult {
        let secs = self.budget.unwrap_or_default().as_secs();
        warn!("acquisition budget of {}s used up", secs);
        AcquisitionResult::failure(
            FailureReason::TransientNetwork,
            format!("Gave up after {}s. Last error: {}", secs, last_error),
        )
    }

    fn new_work_area(&self) -> std::io::Result<WorkArea> {
        match &self.scratch_root {
            Some(root) => WorkArea::create_in(root),
            None => WorkArea::create(),
        }
    }
}

/// Find the finished output file in an attempt directory
fn find_output(dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_video_output(path))
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

fn is_video_output(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.starts_with(OUTPUT_STEM));
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()));
    name_ok && ext_ok
}
