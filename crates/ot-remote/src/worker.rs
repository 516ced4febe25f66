//! Worker side of the execution boundary.
//!
//! [`run_worker`] serves exactly one exchange of the wire protocol: it reads
//! a [`WorkerRequest`], runs the scan and writes the [`WorkerResponse`].
//! [`execute_request`] is the synchronous core shared with the in-process
//! executor.

use ot_core::Report;
use ot_scanner::Scanner;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ScanFailure;
use crate::protocol::{WorkerRequest, WorkerResponse};

/// Runs one decoded request to completion on the current thread.
///
/// Blocks until the scan is done; call it from a blocking context.
///
/// # Errors
///
/// Any [`ScanFailure`], including a protocol version mismatch.
pub fn execute_request(request: &WorkerRequest, cancel: &CancellationToken) -> Result<Report, ScanFailure> {
    request.check_version()?;

    let scanner = Scanner::new(request.request.clone(), request.root())?
        .with_threads(request.threads.unwrap_or(0));
    Ok(scanner.scan(cancel)?)
}

/// Serves one request read from `input`, answering on `output`.
///
/// A malformed request is answered with a failure response rather than an
/// error, so the caller always gets a decodable answer.
///
/// # Errors
///
/// Returns an I/O error only if `input` cannot be read or `output` cannot be
/// written.
pub async fn run_worker<R, W>(mut input: R, mut output: W, cancel: CancellationToken) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut payload = Vec::new();
    input.read_to_end(&mut payload).await?;

    let result = match serde_json::from_slice::<WorkerRequest>(&payload) {
        Ok(request) => {
            info!(root = %request.root, version = request.version, "Worker received request");
            let token = cancel.clone();
            tokio::task::spawn_blocking(move || execute_request(&request, &token))
                .await
                .unwrap_or_else(|e| Err(ScanFailure::io(format!("scan task failed: {e}"))))
        }
        Err(e) => {
            warn!(error = %e, "Worker received a malformed request");
            Err(ScanFailure::io(format!("malformed worker request: {e}")))
        }
    };

    if let Err(failure) = &result {
        warn!(error = %failure, "Worker scan failed");
    }

    let response = serde_json::to_vec(&WorkerResponse::from_result(result))?;
    output.write_all(&response).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
