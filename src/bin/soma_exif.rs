// soma_exif - BODY organ daemon
// Independent metadata extraction service accessible via Unix Domain Socket

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use soma_exif::organ::{ExifOrgan, Organ, Response, Stimulus};
use soma_exif::ExifTool;

/// Upper bound on a single request frame
const MAX_FRAME_BYTES: usize = 256 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "soma_exif", version, about = "SOMA Exif Daemon - ExifTool Metadata Organ")]
struct Args {
    /// Unix socket path for UDS server
    #[arg(long, default_value = "/tmp/soma_exif.sock")]
    socket_path: String,

    /// exiftool binary to invoke
    #[arg(long, default_value = soma_exif::EXIFTOOL_BINARY)]
    exiftool_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let args = Args::parse();

    info!("📷 Starting SOMA Exif Daemon");
    info!("   Socket: {}", args.socket_path);

    // Track startup time for health checks
    let start_time = std::time::Instant::now();

    let exiftool = ExifTool::with_binary(&args.exiftool_path);
    match exiftool.version().await {
        Ok(version) => info!("   ✓ exiftool {} ({})", version, args.exiftool_path.display()),
        Err(e) => warn!("exiftool not usable at {}: {}", args.exiftool_path.display(), e),
    }

    let organ = Arc::new(ExifOrgan::with_exiftool(exiftool));

    // Remove old socket if exists
    let socket_path = PathBuf::from(&args.socket_path);
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)
            .context("Failed to remove old socket")?;
    }

    let listener = UnixListener::bind(&socket_path)
        .context("Failed to bind Unix socket")?;

    info!("   ✓ Listening on {}", args.socket_path);

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let organ = Arc::clone(&organ);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, organ, start_time).await {
                        error!("Connection error: {:#}", e);
                    }
                });
            }
            Err(e) => {
                error!("Accept error: {}", e);
            }
        }
    }
}

/// Handle a single UDS connection
async fn handle_connection(
    mut stream: UnixStream,
    organ: Arc<ExifOrgan>,
    start_time: std::time::Instant,
) -> Result<()> {
    let mut buffer = vec![0u8; 65536]; // 64KB buffer

    loop {
        // Read request length (4 bytes)
        let mut len_buf = [0u8; 4];
        match stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("Client disconnected");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_FRAME_BYTES {
            anyhow::bail!("Request frame too large: {} bytes", len);
        }
        if len > buffer.len() {
            buffer.resize(len, 0);
        }

        stream.read_exact(&mut buffer[..len]).await?;

        let stimulus: Stimulus = serde_json::from_slice(&buffer[..len])
            .context("Failed to parse stimulus")?;

        debug!("Received: op={}", stimulus.op);

        // Handle health check specially (no organ processing needed)
        let response = if stimulus.op == "health" || stimulus.op == "health.check" {
            let exiftool_version = organ.exiftool().version().await.ok();
            Response {
                ok: true,
                output: serde_json::json!({
                    "status": if exiftool_version.is_some() { "healthy" } else { "degraded" },
                    "organ": "soma_exif",
                    "version": env!("CARGO_PKG_VERSION"),
                    "uptime_ms": start_time.elapsed().as_millis() as u64,
                    "exiftool_version": exiftool_version,
                }),
                latency_ms: 0,
                cost: None,
            }
        } else {
            match organ.stimulate(stimulus).await {
                Ok(resp) => resp,
                Err(e) => {
                    error!("Stimulate error: {:?}", e);
                    Response {
                        ok: false,
                        output: e.to_output(),
                        latency_ms: 0,
                        cost: None,
                    }
                }
            }
        };

        let response_bytes = serde_json::to_vec(&response)
            .context("Failed to serialize response")?;

        // Write response length + body
        let len_bytes = (response_bytes.len() as u32).to_be_bytes();
        stream.write_all(&len_bytes).await?;
        stream.write_all(&response_bytes).await?;
        stream.flush().await?;

        debug!("Sent: ok={}, latency={}ms", response.ok, response.latency_ms);
    }
}
