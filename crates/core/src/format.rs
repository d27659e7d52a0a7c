/// Format seconds for humans: `45 sec`, `2:05`, `1:02:05`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if total < 60 {
        format!("{} sec", secs)
    } else if hours == 0 {
        format!("{}:{:02}", mins, secs)
    } else {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    }
}

/// Format a byte count as MiB with two decimals.
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Make a title safe to use as a file name on every platform.
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// File stem shared by the media file, its subtitles and transcripts.
pub fn output_base_name(serial: Option<usize>, title: &str) -> String {
    match serial {
        Some(serial) => format!("{} - {}", serial, title),
        None => title.to_string(),
    }
}

/// Escape a literal path fragment for use inside a yt-dlp output template.
pub fn escape_template(literal: &str) -> String {
    literal.replace('%', "%%")
}
