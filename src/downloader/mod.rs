// Downloader module - classification, strategy fallback, transcoding, size guard

pub mod backends;
pub mod classifier;
pub mod diagnostics;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod size_guard;
pub mod strategies;
pub mod tools;
pub mod traits;
pub mod transcoder;
pub mod utils;
pub mod work_area;

pub use classifier::{classify, extract_url};
pub use errors::{DownloadError, ProcessError};
pub use models::{MediaMetadata, NetworkConfig, PlaybackHints, Platform};
pub use orchestrator::{AcquisitionEngine, AcquisitionResult, Acquired, FailureReason};
pub use size_guard::{SizeCheck, MAX_FILE_SIZE};
pub use strategies::{strategies_for, ExtractionStrategy};
pub use traits::{BackendRequest, ExtractionBackend};
pub use transcoder::{FfmpegTranscoder, Transcode, TranscodeOutcome};
pub use work_area::WorkArea;
