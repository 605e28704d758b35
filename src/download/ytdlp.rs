//! YT-DLP Provider - media download through the yt-dlp executable
//!
//! Runs yt-dlp as a child process, preferring mp4 streams under the size
//! ceiling and merging separate audio/video into one mp4 container.

use super::{DownloadError, DownloadProvider, MERGED_EXTENSION};
use crate::config::Settings;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tracing::{debug, warn};

/// Output template: one file per content id, so concurrent requests don't collide
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

/// Exit code yt-dlp uses for rejected command line options
const USAGE_ERROR_CODE: i32 = 2;

/// Longest extractor message kept in an error
const MAX_ERROR_LENGTH: usize = 1_000;

/// Provider backed by the yt-dlp command line tool
#[derive(Debug, Clone)]
pub struct YtdlpProvider {
    binary: String,
    output_dir: PathBuf,
    max_file_size_mb: u64,
    cookies_file: Option<PathBuf>,
}

impl YtdlpProvider {
    /// Create a provider writing into `output_dir`
    #[must_use]
    pub fn new(
        binary: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        max_file_size_mb: u64,
    ) -> Self {
        Self {
            binary: binary.into(),
            output_dir: output_dir.into(),
            max_file_size_mb,
            cookies_file: None,
        }
    }

    /// Build a provider from application settings
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let provider = Self::new(
            settings.ytdlp_path.clone(),
            settings.download_dir.clone(),
            settings.max_file_size_mb,
        );
        match settings.ytdlp_cookies_file {
            Some(ref cookies) => provider.with_cookies_file(cookies.clone()),
            None => provider,
        }
    }

    /// Pass a Netscape cookies file to yt-dlp
    #[must_use]
    pub fn with_cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }

    /// Format selector: mp4 streams under the ceiling, else whatever is best
    fn format_selector(&self) -> String {
        let limit = self.max_file_size_mb;
        format!(
            "bestvideo[ext=mp4][filesize<{limit}M]+bestaudio[ext=m4a]/best[ext=mp4][filesize<{limit}M]/best"
        )
    }

    fn build_args(&self, url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--format".into(),
            self.format_selector().into(),
            "--output".into(),
            self.output_dir.join(OUTPUT_TEMPLATE).into_os_string(),
            "--merge-output-format".into(),
            MERGED_EXTENSION.into(),
            // Only the first entry when the link points at a playlist
            "--playlist-items".into(),
            "1".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "--no-progress".into(),
            "--no-check-certificates".into(),
            // --print implies --simulate; we still want the download
            "--no-simulate".into(),
            "--print".into(),
            "filename".into(),
        ];

        if let Some(ref cookies) = self.cookies_file {
            args.push("--cookies".into());
            args.push(cookies.clone().into_os_string());
        }

        args.push("--".into());
        args.push(url.into());
        args
    }

    fn run(&self, url: &str) -> Result<Output, DownloadError> {
        let args = self.build_args(url);
        debug!(binary = %self.binary, url = %url, "Executing yt-dlp command");

        Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| DownloadError::Unexpected(format!("failed to run {}: {e}", self.binary)))
    }
}

impl DownloadProvider for YtdlpProvider {
    fn download(&self, url: &str) -> Result<PathBuf, DownloadError> {
        let output = self.run(url)?;
        parse_output(&output)
    }
}

/// Turn the finished process into the declared output path or a classified error
fn parse_output(output: &Output) -> Result<PathBuf, DownloadError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = extract_error_message(&stderr);

        // Neither a signal nor a usage error is the extractor's verdict on the link
        return match output.status.code() {
            None => {
                warn!(error = %message, "yt-dlp terminated by signal");
                Err(DownloadError::Unexpected(format!(
                    "yt-dlp terminated by signal: {message}"
                )))
            }
            Some(USAGE_ERROR_CODE) => {
                warn!(error = %message, "yt-dlp rejected its arguments");
                Err(DownloadError::Unexpected(format!(
                    "yt-dlp usage error: {message}"
                )))
            }
            Some(_) => Err(DownloadError::ExtractionFailed(message)),
        };
    }

    let stdout = std::str::from_utf8(&output.stdout)
        .map_err(|e| DownloadError::Unexpected(format!("yt-dlp printed a non UTF-8 path: {e}")))?;

    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| DownloadError::Unexpected("yt-dlp reported no output file".to_string()))
}

/// Pick the `ERROR:` lines out of yt-dlp's stderr, falling back to the whole text
fn extract_error_message(stderr: &str) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    let message = if errors.is_empty() {
        stderr.trim().to_string()
    } else {
        errors.join("\n")
    };

    if message.is_empty() {
        return "yt-dlp exited with an error and no message".to_string();
    }

    if message.chars().count() > MAX_ERROR_LENGTH {
        let truncated: String = message.chars().take(MAX_ERROR_LENGTH).collect();
        format!("{truncated}...")
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_as_strings(provider: &YtdlpProvider, url: &str) -> Vec<String> {
        provider
            .build_args(url)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_format_selector_uses_ceiling() {
        let provider = YtdlpProvider::new("yt-dlp", "/tmp/downloads", 50);
        assert_eq!(
            provider.format_selector(),
            "bestvideo[ext=mp4][filesize<50M]+bestaudio[ext=m4a]/best[ext=mp4][filesize<50M]/best"
        );
    }

    #[test]
    fn test_build_args() {
        let provider = YtdlpProvider::new("yt-dlp", "/tmp/downloads", 20);
        let args = args_as_strings(&provider, "https://example.com/video");

        let pos = |flag: &str| args.iter().position(|a| a == flag);
        let output = pos("--output").map(|i| args[i + 1].clone());
        assert_eq!(output.as_deref(), Some("/tmp/downloads/%(id)s.%(ext)s"));

        let merge = pos("--merge-output-format").map(|i| args[i + 1].clone());
        assert_eq!(merge.as_deref(), Some("mp4"));

        assert!(args.contains(&"--no-check-certificates".to_string()));
        assert!(args.contains(&"--no-simulate".to_string()));
        assert!(!args.contains(&"--cookies".to_string()));

        // URL goes last, behind the option terminator
        assert_eq!(args[args.len() - 2], "--");
        assert_eq!(args[args.len() - 1], "https://example.com/video");
    }

    #[test]
    fn test_build_args_with_cookies() {
        let provider =
            YtdlpProvider::new("yt-dlp", "/tmp/downloads", 50).with_cookies_file("/etc/ig.txt");
        let args = args_as_strings(&provider, "https://instagram.com/p/xyz");

        let cookies = args
            .iter()
            .position(|a| a == "--cookies")
            .map(|i| args[i + 1].clone());
        assert_eq!(cookies.as_deref(), Some("/etc/ig.txt"));
    }

    #[test]
    fn test_extract_error_message_prefers_error_lines() {
        let stderr = "WARNING: something odd\nERROR: [Instagram] abc: Requested content is not available\n";
        assert_eq!(
            extract_error_message(stderr),
            "ERROR: [Instagram] abc: Requested content is not available"
        );
    }

    #[test]
    fn test_extract_error_message_fallbacks() {
        assert_eq!(extract_error_message("boom"), "boom");
        assert_eq!(
            extract_error_message("   "),
            "yt-dlp exited with an error and no message"
        );

        let long = "x".repeat(MAX_ERROR_LENGTH + 10);
        assert_eq!(
            extract_error_message(&long).chars().count(),
            MAX_ERROR_LENGTH + 3
        );
    }

    #[cfg(unix)]
    mod process {
        use super::super::*;
        use serial_test::serial;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        /// Write an executable shell script standing in for yt-dlp
        fn fake_ytdlp(dir: &Path, body: &str) -> std::io::Result<PathBuf> {
            let path = dir.join("fake-yt-dlp");
            fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
            Ok(path)
        }

        #[test]
        #[serial]
        fn test_download_returns_printed_path() -> Result<(), Box<dyn std::error::Error>> {
            let dir = tempfile::tempdir()?;
            let target = dir.path().join("abc123.mp4");
            let script = fake_ytdlp(
                dir.path(),
                &format!(
                    "printf 'data' > '{0}'\necho '{0}'",
                    target.display()
                ),
            )?;

            let provider = YtdlpProvider::new(script.to_string_lossy(), dir.path(), 50);
            let path = provider.download("https://example.com/video")?;

            assert_eq!(path, target);
            assert!(path.exists());
            Ok(())
        }

        #[test]
        #[serial]
        fn test_download_classifies_extractor_error() -> Result<(), Box<dyn std::error::Error>> {
            let dir = tempfile::tempdir()?;
            let script = fake_ytdlp(
                dir.path(),
                "echo 'ERROR: [Instagram] xyz: This account is private' >&2\nexit 1",
            )?;

            let provider = YtdlpProvider::new(script.to_string_lossy(), dir.path(), 50);
            let result = provider.download("https://instagram.com/p/xyz");

            match result {
                Err(DownloadError::ExtractionFailed(msg)) => {
                    assert!(msg.contains("This account is private"));
                }
                other => panic!("expected extraction failure, got {other:?}"),
            }
            Ok(())
        }

        #[test]
        #[serial]
        fn test_usage_error_is_unexpected() -> Result<(), Box<dyn std::error::Error>> {
            let dir = tempfile::tempdir()?;
            let script = fake_ytdlp(
                dir.path(),
                "echo 'yt-dlp: error: no such option: --no-simulate' >&2\nexit 2",
            )?;

            let provider = YtdlpProvider::new(script.to_string_lossy(), dir.path(), 50);
            let result = provider.download("https://example.com/video");

            match result {
                Err(DownloadError::Unexpected(msg)) => assert!(msg.contains("no such option")),
                other => panic!("expected unexpected failure, got {other:?}"),
            }
            Ok(())
        }

        #[test]
        #[serial]
        fn test_download_without_output_is_unexpected() -> Result<(), Box<dyn std::error::Error>> {
            let dir = tempfile::tempdir()?;
            let script = fake_ytdlp(dir.path(), "exit 0")?;

            let provider = YtdlpProvider::new(script.to_string_lossy(), dir.path(), 50);
            let result = provider.download("https://example.com/video");

            assert!(matches!(result, Err(DownloadError::Unexpected(_))));
            Ok(())
        }

        #[test]
        #[serial]
        fn test_missing_binary_is_unexpected() {
            let provider = YtdlpProvider::new("/nonexistent/yt-dlp", "/tmp", 50);
            let result = provider.download("https://example.com/video");

            assert!(matches!(result, Err(DownloadError::Unexpected(_))));
        }
    }
}
