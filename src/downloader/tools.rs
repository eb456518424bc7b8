// External tool discovery, probed once at startup

use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // ffmpeg uses a single dash
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

#[derive(Debug, Default)]
pub struct ToolManager;

impl ToolManager {
    pub fn new() -> Self {
        Self
    }

    /// Probe a tool. An explicit path wins over discovery.
    pub fn get_tool_info(&self, tool_type: ToolType, explicit: Option<&str>) -> ToolInfo {
        let path = match explicit {
            Some(p) => Some(p.to_string()),
            None => self.detect_tool(tool_type),
        };
        let version = path.as_deref().and_then(|p| self.get_version(p, tool_type));

        // A path that cannot report its version is not usable
        let is_available = version.is_some();
        if is_available {
            info!(
                tool = tool_type.as_str(),
                path = path.as_deref().unwrap_or_default(),
                version = version.as_deref().unwrap_or_default(),
                "tool available"
            );
        } else {
            warn!(tool = tool_type.as_str(), "tool not available");
        }

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version,
            path,
            is_available,
        }
    }

    fn detect_tool(&self, tool_type: ToolType) -> Option<String> {
        let binary_name = tool_type.as_str();

        // 1. Try common paths first
        let common_paths = [
            format!("/opt/homebrew/bin/{}", binary_name),
            format!("/usr/local/bin/{}", binary_name),
            format!("/usr/bin/{}", binary_name),
        ];

        for path in common_paths {
            if Path::new(&path).exists() {
                return Some(path);
            }
        }

        // 2. Try PATH
        if let Ok(output) = Command::new("which").arg(binary_name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }

        None
    }

    fn get_version(&self, path: &str, tool_type: ToolType) -> Option<String> {
        match Command::new(path).arg(tool_type.version_arg()).output() {
            Ok(output) if output.status.success() => {
                // ffmpeg prints a banner; the first line carries the version
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
            }
            _ => None,
        }
    }
}
