use async_trait::async_trait;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Output, Stdio},
    time::Duration,
};
use tokio::{process::Command, time::timeout};
use tracing::{debug, info, warn};

use super::{
    ToolAdapter,
    locate::{EXTRACTOR, TRANSCODER, locate_tools},
    ytdlp::{parse_resolved_output, parse_search_output},
};
use crate::{
    error::ToolError,
    model::{Candidate, MergeRequest, ToolPaths},
};

/// Locations and limits for [`CommandLineTools`].
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Explicit yt-dlp path.
    pub extractor_override: Option<PathBuf>,
    /// Explicit ffmpeg path.
    pub transcoder_override: Option<PathBuf>,
    /// Directory searched for a bundled `yt-dlp` executable.
    pub working_dir: PathBuf,
    /// Search and URL resolution.
    pub tool_timeout: Duration,
    /// Audio extraction.
    pub download_timeout: Duration,
    /// FLAC merge.
    pub transcode_timeout: Duration,
    /// Videos per search.
    pub video_results: u32,
}

/// [`ToolAdapter`] backed by real `yt-dlp` and `ffmpeg` processes.
///
/// Children are killed when the awaiting future is dropped, so a timed out
/// or abandoned call never leaves a process behind.
#[derive(Debug, Clone)]
pub struct CommandLineTools {
    settings: ToolSettings,
}

impl CommandLineTools {
    /// Adapter using `settings` for every call.
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }

    async fn run(
        tool: &'static str,
        program: &Path,
        args: Vec<OsString>,
        limit: Duration,
    ) -> Result<Output, ToolError> {
        debug!(
            tool,
            program = %program.display(),
            ?args,
            "running external tool"
        );

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn { tool, source })?;

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|source| ToolError::Spawn { tool, source })?
            }
            Err(_) => {
                warn!(tool, timeout = ?limit, "external tool timed out");
                return Err(ToolError::Timeout { tool, after: limit });
            }
        };

        if !output.status.success() {
            let mut combined =
                String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            warn!(tool, status = %output.status, "external tool failed");
            return Err(ToolError::Failed {
                tool,
                status: output.status.to_string(),
                output: combined,
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl ToolAdapter for CommandLineTools {
    async fn locate(&self) -> Result<ToolPaths, ToolError> {
        locate_tools(
            self.settings.extractor_override.as_deref(),
            self.settings.transcoder_override.as_deref(),
            &self.settings.working_dir,
        )
    }

    async fn search_videos(
        &self,
        tools: &ToolPaths,
        query: &str,
    ) -> Result<Vec<Candidate>, ToolError> {
        let output = Self::run(
            EXTRACTOR,
            &tools.extractor,
            search_args(self.settings.video_results, query),
            self.settings.tool_timeout,
        )
        .await?;

        let candidates =
            parse_search_output(&String::from_utf8_lossy(&output.stdout));
        info!(query, results = candidates.len(), "video search finished");
        Ok(candidates)
    }

    async fn resolve_url(
        &self,
        tools: &ToolPaths,
        url: &str,
    ) -> Result<Candidate, ToolError> {
        let output = Self::run(
            EXTRACTOR,
            &tools.extractor,
            resolve_args(url),
            self.settings.tool_timeout,
        )
        .await?;

        parse_resolved_output(&String::from_utf8_lossy(&output.stdout), url)
    }

    async fn extract_audio(
        &self,
        tools: &ToolPaths,
        url: &str,
        output: &Path,
    ) -> Result<PathBuf, ToolError> {
        Self::run(
            EXTRACTOR,
            &tools.extractor,
            extract_args(url, output),
            self.settings.download_timeout,
        )
        .await?;

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(ToolError::Failed {
                tool: EXTRACTOR,
                status: "success".to_string(),
                output: format!(
                    "no audio file was written to {}",
                    output.display()
                ),
            });
        }
        Ok(output.to_path_buf())
    }

    async fn transcode(
        &self,
        tools: &ToolPaths,
        request: &MergeRequest,
    ) -> Result<(), ToolError> {
        Self::run(
            TRANSCODER,
            &tools.transcoder,
            merge_args(request),
            self.settings.transcode_timeout,
        )
        .await?;
        info!(output = %request.output.display(), "merge finished");
        Ok(())
    }
}

/// `ffmpeg` arguments for a merge: audio in, optional attached cover,
/// FLAC out with one `-metadata` pair per tag.
// User text always follows `--` so a query like "-v" is never read as a flag.
fn search_args(limit: u32, query: &str) -> Vec<OsString> {
    vec![
        "--quiet".into(),
        "--no-warnings".into(),
        "--dump-json".into(),
        "--default-search".into(),
        format!("ytsearch{limit}").into(),
        "--".into(),
        query.into(),
    ]
}

fn resolve_args(url: &str) -> Vec<OsString> {
    vec![
        "--quiet".into(),
        "--no-warnings".into(),
        "--dump-json".into(),
        "--".into(),
        url.into(),
    ]
}

fn extract_args(url: &str, output: &Path) -> Vec<OsString> {
    vec![
        "-f".into(),
        "bestaudio".into(),
        "-o".into(),
        output.as_os_str().to_owned(),
        "--".into(),
        url.into(),
    ]
}

/// ffmpeg arguments for one merge: audio, optional attached cover, FLAC
/// codec, metadata pairs, output path.
pub fn merge_args(request: &MergeRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-i".into(),
        request.audio.as_os_str().to_owned(),
    ];
    if let Some(cover) = &request.cover {
        let cover_args: [OsString; 8] = [
            "-i".into(),
            cover.as_os_str().to_owned(),
            "-map".into(),
            "0:a:0".into(),
            "-map".into(),
            "1:v:0".into(),
            "-disposition:v".into(),
            "attached_pic".into(),
        ];
        args.extend(cover_args);
    }
    args.push("-c:a".into());
    args.push("flac".into());
    for (key, value) in &request.metadata {
        args.push("-metadata".into());
        args.push(format!("{key}={value}").into());
    }
    args.push(request.output.as_os_str().to_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn tagless_merge_is_a_plain_conversion() {
        let request = MergeRequest {
            audio: "/tmp/x/audio.tmp".into(),
            cover: None,
            metadata: Vec::new(),
            output: "/out/Song.flac".into(),
        };

        assert_eq!(
            strings(merge_args(&request)),
            ["-y", "-i", "/tmp/x/audio.tmp", "-c:a", "flac", "/out/Song.flac"]
        );
    }

    #[test]
    fn cover_and_tags_are_embedded() {
        let request = MergeRequest {
            audio: "a.tmp".into(),
            cover: Some("cover.jpg".into()),
            metadata: vec![
                ("title".into(), "Song".into()),
                ("LYRICS".into(), "la la".into()),
            ],
            output: "out.flac".into(),
        };

        assert_eq!(
            strings(merge_args(&request)),
            [
                "-y",
                "-i",
                "a.tmp",
                "-i",
                "cover.jpg",
                "-map",
                "0:a:0",
                "-map",
                "1:v:0",
                "-disposition:v",
                "attached_pic",
                "-c:a",
                "flac",
                "-metadata",
                "title=Song",
                "-metadata",
                "LYRICS=la la",
                "out.flac",
            ]
        );
    }

    #[test]
    fn dash_leading_queries_stay_positional() {
        assert_eq!(
            strings(search_args(5, "-v --exec rm")),
            [
                "--quiet",
                "--no-warnings",
                "--dump-json",
                "--default-search",
                "ytsearch5",
                "--",
                "-v --exec rm",
            ]
        );
        assert_eq!(
            strings(resolve_args("-https://x")),
            ["--quiet", "--no-warnings", "--dump-json", "--", "-https://x"]
        );

        let args = strings(extract_args("--batch-file=x", Path::new("a.tmp")));
        let separator = args.iter().position(|arg| arg == "--").unwrap();
        assert_eq!(&args[separator + 1..], ["--batch-file=x"]);
        assert_eq!(args[..separator], ["-f", "bestaudio", "-o", "a.tmp"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_reports_combined_output() {
        let err = CommandLineTools::run(
            "sh",
            Path::new("sh"),
            vec!["-c".into(), "echo out; echo err >&2; exit 3".into()],
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        match err {
            ToolError::Failed { output, .. } => {
                assert!(output.contains("out"));
                assert!(output.contains("err"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let err = CommandLineTools::run(
            "sleep",
            Path::new("sleep"),
            vec!["5".into()],
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ToolError::Timeout { tool: "sleep", .. }));
    }
}
