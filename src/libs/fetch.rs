// Artifact retrieval.
//
// `Fetcher` is the seam every installer downloads through, so tests can swap
// the network for a mock. `HttpFetcher` is the real implementation: a `ureq`
// agent with connect/read timeouts and a bounded retry loop.

use colored::Colorize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request for {url} failed: {reason}")]
    Http { url: String, reason: String },
    #[error("download of {url} timed out")]
    Timeout { url: String },
    #[error("could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("download of {url} produced an empty file")]
    Empty { url: String },
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    Checksum { path: String, expected: String, actual: String },
}

/// Retrieves `url` into the file at `dest`.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

pub struct HttpFetcher {
    agent: ureq::Agent,
    retries: u32,
    backoff: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retries: u32, backoff: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout.min(Duration::from_secs(30)))
            .timeout_read(timeout)
            .build();
        HttpFetcher { agent, retries, backoff }
    }

    fn fetch_once(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        log_debug!("[Devkit::Fetch] GET {}", url.blue());
        let response = self.agent.get(url).call().map_err(|e| classify_ureq_error(url, e))?;

        let io_err = |source: io::Error| FetchError::Io {
            path: dest.display().to_string(),
            source,
        };
        let mut file = File::create(dest).map_err(io_err)?;
        let mut reader = response.into_reader();
        let written = io::copy(&mut reader, &mut file).map_err(|e| {
            if is_timeout(&e) {
                FetchError::Timeout { url: url.to_string() }
            } else {
                io_err(e)
            }
        })?;

        if written == 0 {
            return Err(FetchError::Empty { url: url.to_string() });
        }
        log_debug!(
            "[Devkit::Fetch] Saved {} bytes to {}",
            written,
            dest.display().to_string().green()
        );
        Ok(())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let attempts = self.retries + 1;
        let mut attempt = 1;
        loop {
            match self.fetch_once(url, dest) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    // Never leave a truncated artifact behind.
                    let _ = fs::remove_file(dest);
                    if attempt >= attempts {
                        return Err(e);
                    }
                    let wait = self.backoff * attempt;
                    log_warn!(
                        "[Devkit::Fetch] Attempt {}/{} failed ({}). Retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        wait
                    );
                    thread::sleep(wait);
                    attempt += 1;
                }
            }
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn classify_ureq_error(url: &str, error: ureq::Error) -> FetchError {
    match error {
        ureq::Error::Status(code, _) => FetchError::Http {
            url: url.to_string(),
            reason: format!("server returned status {}", code),
        },
        ureq::Error::Transport(transport) => {
            let reason = transport.to_string();
            let io_timeout = std::error::Error::source(&transport)
                .and_then(|source| source.downcast_ref::<io::Error>())
                .is_some_and(is_timeout);
            if io_timeout || reason.to_lowercase().contains("timed out") {
                FetchError::Timeout { url: url.to_string() }
            } else {
                FetchError::Http { url: url.to_string(), reason }
            }
        }
    }
}

/// Computes the lowercase hex SHA-256 of `path`.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Checks a downloaded artifact against its expected checksum.
pub fn verify_checksum(path: &Path, expected: &str) -> Result<(), FetchError> {
    let actual = sha256_file(path).map_err(|source| FetchError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        log_info!("[Devkit::Fetch] Checksum verified for {}", path.display());
        Ok(())
    } else {
        Err(FetchError::Checksum {
            path: path.display().to_string(),
            expected: expected.trim().to_lowercase(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn checksum_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("artifact.bin");
        fs::write(&file, b"abc").unwrap();

        let abc = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert_eq!(sha256_file(&file).unwrap(), abc);
        assert!(verify_checksum(&file, &abc.to_uppercase()).is_ok());
        assert!(matches!(
            verify_checksum(&file, "00"),
            Err(FetchError::Checksum { .. })
        ));
    }

    #[test]
    fn unreachable_host_is_a_fetch_error_and_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("never.zip");
        // Port 9 on localhost is the discard service and is closed on any sane test box.
        let fetcher = HttpFetcher::new(Duration::from_secs(2), 1, Duration::from_millis(1));

        let result = fetcher.fetch("http://127.0.0.1:9/never.zip", &dest);
        assert!(matches!(result, Err(FetchError::Http { .. }) | Err(FetchError::Timeout { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn stalled_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/slow.zip", listener.local_addr().unwrap());
        thread::spawn(move || {
            // Accept and hold the connection without ever answering.
            if let Ok((_stream, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(5));
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("slow.zip");
        let fetcher = HttpFetcher::new(Duration::from_secs(1), 0, Duration::from_millis(1));

        let result = fetcher.fetch(&url, &dest);
        assert!(matches!(result, Err(FetchError::Timeout { .. })), "got {:?}", result);
        assert!(!dest.exists());
    }

    #[test]
    fn failing_server_is_tried_once_per_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/broken.zip", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                );
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("broken.zip");
        let fetcher = HttpFetcher::new(Duration::from_secs(2), 2, Duration::from_millis(1));

        let result = fetcher.fetch(&url, &dest);
        assert!(matches!(result, Err(FetchError::Http { .. })), "got {:?}", result);
        assert_eq!(connections.load(Ordering::SeqCst), 3);
        assert!(!dest.exists());
    }
}
