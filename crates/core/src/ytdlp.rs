//! [`Extractor`] backed by the `yt-dlp` executable.

use std::process::Stdio;

use serde::Deserialize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    process::Command,
};

use crate::{
    error::{Result, TubeBatchError},
    events::RunObserver,
    extractor::{
        DownloadRequest, Extractor, ExtractorSettings, FORMAT_UP_TO_1080P, SUBTITLE_FORMAT,
        SUBTITLE_LANG,
    },
    format::format_size,
    progress::{ProgressReporter, ProgressStatus, ProgressUpdate},
    types::{Candidate, VideoDetails},
};

const PROGRESS_MARKER: &str = "[tubebatch]";

/// Fields are space separated; yt-dlp prints `NA` for anything missing.
const PROGRESS_TEMPLATE: &str = "download:[tubebatch] %(progress.status)s \
%(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s \
%(progress.speed)s %(progress.eta)s %(progress.elapsed)s";

#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

pub struct YtDlp {
    settings: ExtractorSettings,
}

impl YtDlp {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    fn common_args(&self) -> Vec<String> {
        vec![
            "--retries".to_string(),
            self.settings.retries.to_string(),
            "--socket-timeout".to_string(),
            self.settings.socket_timeout_secs.to_string(),
            "--encoding".to_string(),
            "utf-8".to_string(),
        ]
    }

    pub fn flat_list_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            "--ignore-errors".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.common_args());
        args.push(url.to_string());
        args
    }

    pub fn details_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "-f".to_string(),
            FORMAT_UP_TO_1080P.to_string(),
        ];
        args.extend(self.common_args());
        args.push(url.to_string());
        args
    }

    pub fn download_args(&self, request: &DownloadRequest) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            FORMAT_UP_TO_1080P.to_string(),
            "-o".to_string(),
            request.output_template.clone(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--concurrent-fragments".to_string(),
            self.settings.concurrent_fragments.to_string(),
            "--http-chunk-size".to_string(),
            self.settings.chunk_size.clone(),
        ];
        args.extend(self.common_args());

        if request.subtitles {
            args.extend([
                "--write-subs".to_string(),
                "--write-auto-subs".to_string(),
                "--sub-langs".to_string(),
                SUBTITLE_LANG.to_string(),
                "--sub-format".to_string(),
                SUBTITLE_FORMAT.to_string(),
            ]);
        }

        args.push(request.url.clone());
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.settings.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group: the pause hotkey is a terminal signal sent to
        // the whole foreground group and must not reach yt-dlp.
        #[cfg(unix)]
        cmd.process_group(0);
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);

        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> TubeBatchError {
        TubeBatchError::ExtractorSpawn {
            program: self.settings.program.display().to_string(),
            source,
        }
    }

    async fn run_json(&self, url: &str, args: &[String]) -> Result<Vec<u8>> {
        tracing::debug!(?args, "running yt-dlp");
        let output = self
            .command(args)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        // With --ignore-errors a partial listing still exits non-zero.
        if !output.status.success() && output.stdout.is_empty() {
            return Err(TubeBatchError::ExtractorFailed {
                url: url.to_string(),
                reason: summarize_stderr(&String::from_utf8_lossy(&output.stderr))
                    .unwrap_or_else(|| output.status.to_string()),
            });
        }

        Ok(output.stdout)
    }
}

impl Extractor for YtDlp {
    async fn list_candidates(&self, url: &str) -> Result<Vec<Candidate>> {
        let stdout = self.run_json(url, &self.flat_list_args(url)).await?;
        parse_flat_listing(&stdout)
    }

    async fn video_details(&self, url: &str) -> Result<VideoDetails> {
        let stdout = self.run_json(url, &self.details_args(url)).await?;
        parse_details(&stdout)
    }

    async fn download<O: RunObserver>(
        &self,
        request: &DownloadRequest,
        reporter: &mut ProgressReporter<'_, O>,
    ) -> Result<()> {
        let args = self.download_args(request);
        tracing::debug!(?args, "spawning yt-dlp download");

        let mut child = self.command(&args).spawn().map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TubeBatchError::MalformedOutput {
                reason: "yt-dlp stdout was not captured".to_string(),
            })?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TubeBatchError::MalformedOutput {
                reason: "yt-dlp stderr was not captured".to_string(),
            })?;

        let stderr_reader = tokio::spawn(async move {
            let mut collected = String::new();
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            loop {
                match read_lossy_line(&mut reader, &mut buf).await {
                    Ok(Some(line)) => {
                        collected.push_str(&line);
                        collected.push('\n');
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(error = %e, "stopped reading yt-dlp stderr");
                        break;
                    }
                }
            }
            collected
        });

        // One line at a time: while the reporter is held by a pause we stop
        // draining the pipe and yt-dlp stalls on its own writes.
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        while let Some(line) = read_lossy_line(&mut reader, &mut buf).await? {
            match parse_progress_line(&line) {
                Some(update) => reporter.report(update).await,
                None => tracing::trace!(line = %line, "yt-dlp output"),
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            return Err(TubeBatchError::ExtractorFailed {
                url: request.url.clone(),
                reason: summarize_stderr(&stderr).unwrap_or_else(|| status.to_string()),
            });
        }

        Ok(())
    }
}

/// Next line with the terminator stripped. Bytes that are not UTF-8 (a
/// filename in a legacy code page, say) are replaced instead of failing.
async fn read_lossy_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Prefer the last `ERROR:` line, otherwise the last non-empty line.
fn summarize_stderr(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
}

fn parse_number(field: &str) -> Option<f64> {
    match field {
        "NA" | "None" | "" => None,
        value => value.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

fn parse_bytes(field: &str) -> Option<u64> {
    parse_number(field).filter(|v| *v >= 0.0).map(|v| v as u64)
}

/// Parse a line produced by [`PROGRESS_TEMPLATE`]. Other output yields `None`.
pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let [status, downloaded, total, estimate, speed, eta, elapsed] = fields.as_slice() else {
        return None;
    };

    Some(ProgressUpdate {
        status: ProgressStatus::parse(status),
        downloaded_bytes: parse_bytes(downloaded),
        total_bytes: parse_bytes(total),
        total_bytes_estimate: parse_bytes(estimate),
        speed: parse_number(speed),
        eta: parse_number(eta),
        elapsed: parse_number(elapsed),
    })
}

#[derive(Debug, Deserialize)]
struct FlatListing {
    id: Option<String>,
    title: Option<String>,
    entries: Option<Vec<Option<FlatEntry>>>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
}

fn candidate(id: String, title: Option<String>) -> Candidate {
    Candidate {
        title: title.unwrap_or_else(|| id.clone()),
        source_id: id,
    }
}

/// Candidates from `--flat-playlist --dump-single-json` output.
pub fn parse_flat_listing(json: &[u8]) -> Result<Vec<Candidate>> {
    let listing: FlatListing = serde_json::from_slice(json)?;

    let candidates = match listing.entries {
        Some(entries) => entries
            .into_iter()
            .flatten()
            .filter_map(|entry| Some(candidate(entry.id?, entry.title)))
            .collect(),
        None => listing
            .id
            .map(|id| vec![candidate(id, listing.title)])
            .unwrap_or_default(),
    };

    Ok(candidates)
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    height: Option<f64>,
    ext: Option<String>,
    format_note: Option<String>,
    resolution: Option<String>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
}

impl FormatInfo {
    fn size(&self) -> Option<f64> {
        self.filesize.or(self.filesize_approx)
    }
}

#[derive(Debug, Deserialize)]
struct DetailsJson {
    title: Option<String>,
    #[serde(flatten)]
    format: FormatInfo,
    requested_formats: Option<Vec<FormatInfo>>,
}

/// Display metadata from `--dump-single-json` output for one video.
pub fn parse_details(json: &[u8]) -> Result<VideoDetails> {
    let details: DetailsJson = serde_json::from_slice(json)?;
    let fallback = VideoDetails::default();

    let format = match (&details.format.height, &details.format.ext) {
        (Some(height), Some(ext)) => format!("{}p ({})", *height as u64, ext),
        (Some(height), None) => format!("{}p", *height as u64),
        _ => details
            .format
            .format_note
            .clone()
            .or_else(|| details.format.resolution.clone())
            .unwrap_or(fallback.format),
    };

    let size = match &details.requested_formats {
        Some(parts) if !parts.is_empty() => {
            let sizes: Vec<f64> = parts.iter().filter_map(FormatInfo::size).collect();
            (!sizes.is_empty()).then(|| sizes.iter().sum::<f64>())
        }
        _ => details.format.size(),
    };

    Ok(VideoDetails {
        title: details.title.unwrap_or(fallback.title),
        format,
        size: size
            .map(|bytes| format_size(bytes as u64))
            .unwrap_or(fallback.size),
    })
}
