//! `YtDlp` against a stand-in executable: a shell script that prints what
//! yt-dlp would and exits with a chosen status.
#![cfg(unix)]

use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tubebatch_core::{
    DownloadRequest, Extractor, ExtractorSettings, PauseController, ProgressLine,
    ProgressReporter, RecordingObserver, TubeBatchError, YtDlp,
};

const DOWNLOADING: &str = "[tubebatch] downloading 512 1024 NA 1024 1 1";
const FINISHED: &str = "[tubebatch] finished 1024 1024 NA NA NA 2";

fn fake_ytdlp(dir: &Path, body: &str) -> YtDlp {
    let program = dir.join("yt-dlp");
    std::fs::write(&program, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
    YtDlp::new(ExtractorSettings {
        program,
        ..ExtractorSettings::default()
    })
}

fn request(dir: &Path) -> DownloadRequest {
    DownloadRequest {
        url: "https://www.youtube.com/watch?v=abc".to_string(),
        output_template: dir.join("1 - Intro.%(ext)s").to_string_lossy().into_owned(),
        subtitles: false,
    }
}

async fn download(
    ytdlp: &YtDlp,
    request: &DownloadRequest,
) -> (tubebatch_core::Result<()>, RecordingObserver) {
    let mut observer = RecordingObserver::default();
    let result = {
        let mut reporter = ProgressReporter::new(Arc::new(PauseController::new()), &mut observer);
        ytdlp.download(request, &mut reporter).await
    };
    (result, observer)
}

fn is_redraw_at(line: &ProgressLine, percent: &str) -> bool {
    matches!(line, ProgressLine::Redraw(text) if text.starts_with(percent))
}

#[tokio::test]
async fn progress_lines_reach_the_observer() {
    let dir = tempfile::tempdir().unwrap();
    let args_file: PathBuf = dir.path().join("args");
    let ytdlp = fake_ytdlp(
        dir.path(),
        &format!(
            "printf '%s\\n' \"$@\" > '{}'\n\
             echo '[youtube] abc: Downloading webpage'\n\
             echo '{DOWNLOADING}'\n\
             echo '{FINISHED}'",
            args_file.display()
        ),
    );

    let (result, observer) = download(&ytdlp, &request(dir.path())).await;

    result.unwrap();
    assert_eq!(observer.progress.len(), 2);
    assert!(is_redraw_at(&observer.progress[0], "Downloading: 50.0%"));
    assert_eq!(
        observer.progress[1],
        ProgressLine::Done("Download finished.".to_string())
    );

    let args = std::fs::read_to_string(&args_file).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert!(args.contains(&"--no-playlist"));
    assert!(args.contains(&"--encoding"));
    assert_eq!(args.last(), Some(&"https://www.youtube.com/watch?v=abc"));
}

#[tokio::test]
async fn failed_exit_reports_the_error_line() {
    let dir = tempfile::tempdir().unwrap();
    let ytdlp = fake_ytdlp(
        dir.path(),
        "printf 'WARNING: Caf\\351 unreachable\\n' >&2\n\
         echo 'ERROR: [youtube] abc: Video unavailable' >&2\n\
         echo 'retrying later' >&2\n\
         exit 1",
    );

    let (result, observer) = download(&ytdlp, &request(dir.path())).await;

    let (url, reason) = match result {
        Err(TubeBatchError::ExtractorFailed { url, reason }) => (url, reason),
        other => panic!("expected ExtractorFailed, got {other:?}"),
    };
    assert_eq!(url, "https://www.youtube.com/watch?v=abc");
    assert_eq!(reason, "ERROR: [youtube] abc: Video unavailable");
    assert!(observer.progress.is_empty());
}

#[tokio::test]
async fn non_utf8_output_keeps_a_good_download() {
    let dir = tempfile::tempdir().unwrap();
    let ytdlp = fake_ytdlp(
        dir.path(),
        &format!(
            "printf '[download] Destination: Caf\\351.mp4\\n'\n\
             echo '{DOWNLOADING}'\n\
             echo '{FINISHED}'"
        ),
    );

    let (result, observer) = download(&ytdlp, &request(dir.path())).await;

    result.unwrap();
    assert_eq!(observer.progress.len(), 2);
}

#[tokio::test]
async fn paused_reporter_holds_the_output_reader() {
    let dir = tempfile::tempdir().unwrap();
    let ytdlp = fake_ytdlp(
        dir.path(),
        &format!("echo '{DOWNLOADING}'\necho '{DOWNLOADING}'\necho '{FINISHED}'"),
    );
    let request = request(dir.path());
    let pause = Arc::new(PauseController::new());
    pause.request_pause();

    let transfer = {
        let pause = Arc::clone(&pause);
        tokio::spawn(async move {
            let mut observer = RecordingObserver::default();
            let result = {
                let mut reporter = ProgressReporter::new(pause, &mut observer);
                ytdlp.download(&request, &mut reporter).await
            };
            (result, observer)
        })
    };

    // The script has long exited, but its output sits unread behind the pause.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!transfer.is_finished());

    pause.resume();
    let (result, observer) = tokio::time::timeout(Duration::from_secs(5), transfer)
        .await
        .expect("download should finish after resume")
        .unwrap();

    result.unwrap();
    assert_eq!(observer.progress.len(), 3);
}

/// The pause hotkey reaches the whole foreground process group. The
/// extractor has to lead a group of its own so the signal leaves it alone.
#[cfg(target_os = "linux")]
#[tokio::test]
async fn download_runs_in_its_own_process_group() {
    let dir = tempfile::tempdir().unwrap();
    let ytdlp = fake_ytdlp(
        dir.path(),
        &format!(
            "read -r pid comm state ppid pgrp rest < /proc/$$/stat\n\
             if [ \"$pgrp\" != \"$$\" ]; then\n\
               echo \"ERROR: sharing process group $pgrp\" >&2\n\
               exit 1\n\
             fi\n\
             echo '{FINISHED}'"
        ),
    );

    let (result, observer) = download(&ytdlp, &request(dir.path())).await;

    result.unwrap();
    assert_eq!(observer.progress.len(), 1);
}

#[tokio::test]
async fn partial_listing_survives_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let ytdlp = fake_ytdlp(
        dir.path(),
        r#"echo '{"id":"PL1","title":"Course","entries":[{"id":"a","title":"One"},null,{"id":"b","title":"Two"}]}'
echo 'ERROR: [youtube] c: Private video' >&2
exit 1"#,
    );

    let candidates = ytdlp
        .list_candidates("https://www.youtube.com/playlist?list=PL1")
        .await
        .unwrap();

    let titles: Vec<&str> = candidates.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["One", "Two"]);
}

#[tokio::test]
async fn empty_listing_with_nonzero_exit_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ytdlp = fake_ytdlp(
        dir.path(),
        "echo 'ERROR: Unsupported URL: https://example.com' >&2\nexit 1",
    );

    let err = ytdlp
        .list_candidates("https://example.com")
        .await
        .unwrap_err();

    let reason = match err {
        TubeBatchError::ExtractorFailed { reason, .. } => reason,
        other => panic!("expected ExtractorFailed, got {other:?}"),
    };
    assert_eq!(reason, "ERROR: Unsupported URL: https://example.com");
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let dir = tempfile::tempdir().unwrap();
    let ytdlp = YtDlp::new(ExtractorSettings {
        program: dir.path().join("no-such-yt-dlp"),
        ..ExtractorSettings::default()
    });

    let (result, _) = download(&ytdlp, &request(dir.path())).await;

    assert!(matches!(result, Err(TubeBatchError::ExtractorSpawn { .. })));
}
