use regex::Regex;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use swapper_core::config::LogSettings;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Targets that are too chatty at the configured level.
const QUIET_TARGETS: &str = "hyper=warn,h2=error,reqwest=warn,tokio=warn,tower=warn";

/// Regex patterns for redacting bot tokens
pub struct RedactionPatterns {
    url_token: Regex,
    bare_token: Regex,
    path_token: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            url_token: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            bare_token: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            path_token: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let output = self
            .url_token
            .replace_all(input, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        let output = self
            .bare_token
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        self.path_token
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string()
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let redacted = self.patterns.redact(&String::from_utf8_lossy(buf));
        self.inner.write_all(redacted.as_bytes())?;
        // The caller handed over `buf.len()` bytes, whatever the redacted length.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<M> {
    inner: M,
    patterns: Arc<RedactionPatterns>,
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            patterns: Arc::clone(&self.patterns),
        }
    }
}

/// Filter from `RUST_LOG`, else `level` from the config, else `info`.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{level},{QUIET_TARGETS}")))
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{QUIET_TARGETS}")))
}

/// Console subscriber plus, when `log.file` is set, a plain-text copy
/// appended to that file. Both outputs are redacted.
fn subscriber(
    patterns: &Arc<RedactionPatterns>,
    settings: &LogSettings,
) -> io::Result<impl Subscriber + Send + Sync + 'static> {
    let file_layer = match settings.file_path() {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let writer = RedactingMakeWriter {
                inner: Mutex::new(file),
                patterns: Arc::clone(patterns),
            };
            Some(fmt::layer().with_ansi(false).with_writer(writer))
        }
        None => None,
    };
    let console = RedactingMakeWriter {
        inner: io::stderr,
        patterns: Arc::clone(patterns),
    };

    Ok(tracing_subscriber::registry()
        .with(filter(&settings.level))
        .with(fmt::layer().with_writer(console))
        .with(file_layer))
}

/// Install the global subscriber writing redacted lines to stderr and the
/// optional log file.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened for appending.
pub fn init_logging(
    patterns: &Arc<RedactionPatterns>,
    settings: &LogSettings,
) -> io::Result<()> {
    subscriber(patterns, settings)?.init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> RedactionPatterns {
        match RedactionPatterns::new() {
            Ok(patterns) => patterns,
            Err(err) => panic!("patterns compile: {err}"),
        }
    }

    #[test]
    fn masks_tokens_in_api_urls() {
        let line = "GET https://api.telegram.org/bot123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw/getMe failed";
        let redacted = patterns().redact(line);
        assert!(!redacted.contains("AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw"));
        assert!(redacted.contains("/bot[TELEGRAM_TOKEN]/getMe"));
    }

    #[test]
    fn masks_bare_tokens() {
        let line = "token=123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw0 loaded";
        assert_eq!(patterns().redact(line), "token=[TELEGRAM_TOKEN] loaded");
    }

    #[test]
    fn log_file_is_appended_and_redacted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("swapper.log");
        std::fs::write(&path, "earlier run\n").expect("seed log file");

        let settings = LogSettings {
            level: "info".to_string(),
            file: Some(path.display().to_string()),
        };
        let subscriber = match subscriber(&Arc::new(patterns()), &settings) {
            Ok(subscriber) => subscriber,
            Err(err) => panic!("subscriber: {err}"),
        };
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("login with 123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw0 failed");
        });

        let written = std::fs::read_to_string(&path).expect("read log file");
        assert!(written.starts_with("earlier run\n"));
        assert!(written.contains("login with [TELEGRAM_TOKEN] failed"));
        assert!(!written.contains("AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw0"));
    }

    #[test]
    fn unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("swapper.log");
        let settings = LogSettings {
            level: "info".to_string(),
            file: Some(path.display().to_string()),
        };
        assert!(subscriber(&Arc::new(patterns()), &settings).is_err());
    }

    #[test]
    fn leaves_other_text_alone() {
        let line = "Swap lookup failed chat_id=-100 user_id=7";
        assert_eq!(patterns().redact(line), line);
    }
}
