use serde::Deserialize;
use tracing::debug;

use crate::{error::ToolError, model::Candidate};

use super::locate::EXTRACTOR;

/// The subset of `--dump-json` output the wizard reads.
#[derive(Debug, Deserialize)]
struct VideoInfo {
    id: String,
    #[serde(default)]
    title: String,
    uploader: Option<String>,
    channel: Option<String>,
    webpage_url: Option<String>,
}

impl VideoInfo {
    fn uploader(&self) -> String {
        self.uploader
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.channel.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    fn into_candidate(self, source_url: Option<String>) -> Candidate {
        let uploader = self.uploader();
        let url = source_url
            .or(self.webpage_url)
            .unwrap_or_else(|| {
                format!("https://www.youtube.com/watch?v={}", self.id)
            });
        Candidate::video(self.id, self.title, uploader, url)
    }
}

/// One JSON document per line; lines that do not parse are skipped.
pub(super) fn parse_search_output(stdout: &str) -> Vec<Candidate> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<VideoInfo>(line) {
            Ok(info) => Some(info.into_candidate(None)),
            Err(err) => {
                debug!(error = %err, "skipping unreadable search result");
                None
            }
        })
        .collect()
}

/// The queried URL becomes the candidate's source URL.
pub(super) fn parse_resolved_output(
    stdout: &str,
    url: &str,
) -> Result<Candidate, ToolError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| ToolError::Parse {
            tool: EXTRACTOR,
            message: "no video information was returned".to_string(),
        })?;
    let info: VideoInfo =
        serde_json::from_str(line).map_err(|err| ToolError::Parse {
            tool: EXTRACTOR,
            message: err.to_string(),
        })?;
    Ok(info.into_candidate(Some(url.to_string())))
}
