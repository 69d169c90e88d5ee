//! Capture of the server's merged stdout/stderr for diagnostics.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::{debug, trace};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::spawn as TokioSpawn;
use tokio::task::JoinHandle;

const MAX_CAPTURED_LINES: usize = 500;

/// Shared, bounded line buffer fed by both output streams in arrival order.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl CapturedOutput {
    pub fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == MAX_CAPTURED_LINES {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    /// Everything captured so far, newline-joined.
    pub fn snapshot(&self) -> String {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

/// Drain `stream` line by line into `output` until EOF.
///
/// Lines are decoded lossily: the reader must outlive the child, since
/// dropping the read end kills the writer with SIGPIPE.
pub(crate) fn capture<R>(stream: R, output: CapturedOutput, label: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    TokioSpawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    trace!("Server {label}: {line}");
                    output.push(line.to_string());
                }
                Err(e) => {
                    debug!("Server {label} read failed: {e}");
                    break;
                }
            }
        }
    })
}
