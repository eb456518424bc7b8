pub mod config;
pub mod delivery;
pub mod downloader;
pub mod ledger;
pub mod pipeline;
pub mod telegram;

use anyhow::{bail, Context};
use std::sync::Arc;
use tracing::{info, warn};

use config::Config;
use downloader::backends::YtDlpBackend;
use downloader::tools::{ToolManager, ToolType};
use downloader::{AcquisitionEngine, FfmpegTranscoder};
use ledger::JsonFileLedger;
use pipeline::{Pipeline, PipelineOptions};
use teloxide::Bot;

/// Wire the components from configuration and serve until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    let tools = ToolManager::new();
    let ytdlp = tools.get_tool_info(ToolType::YtDlp, config.ytdlp_path.as_deref());
    let ytdlp_path = match (ytdlp.is_available, ytdlp.path) {
        (true, Some(path)) => path,
        _ => bail!("yt-dlp was not found; install it or set YTDLP_PATH"),
    };

    let ffmpeg = tools.get_tool_info(ToolType::Ffmpeg, config.ffmpeg_path.as_deref());
    let ffmpeg_path = if ffmpeg.is_available {
        ffmpeg.path
    } else {
        warn!("ffmpeg not found, videos will be delivered without transcoding");
        None
    };

    let backend = YtDlpBackend::new(ytdlp_path, config.backend_timeout);
    let engine = AcquisitionEngine::new(Arc::new(backend), config.network.clone())
        .with_budget(config.acquire_timeout);
    let transcoder = FfmpegTranscoder::new(ffmpeg_path, config.transcode_timeout);

    let ledger = JsonFileLedger::open(&config.ledger_path)
        .await
        .with_context(|| format!("opening usage ledger {}", config.ledger_path.display()))?;
    info!(path = %config.ledger_path.display(), "usage ledger ready");

    let options = PipelineOptions {
        request_timeout: config.request_timeout,
        fallback_to_raw: config.fallback_to_raw,
        bot_username: config.bot_username.clone(),
        max_concurrent_jobs: config.max_concurrent_jobs,
        ..PipelineOptions::default()
    };
    let pipeline = Pipeline::new(engine, Arc::new(transcoder), Arc::new(ledger), options);

    telegram::run(Bot::new(&config.bot_token), Arc::new(pipeline)).await;

    Ok(())
}
