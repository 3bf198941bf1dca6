//! Unix socket listener

use log::{error, info, warn};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::signal::unix::{SignalKind, signal};
use tokio::time::timeout;
use zeroize::Zeroizing;

use crate::config::ServiceConfig;
use crate::dispatch::Dispatcher;
use crate::error::PasswdSrvError;
use crate::error::handlers::{error_to_result_code, handle_error};
use crate::protocol::{FRAME_SIZE, ResultCode, decode_request};

/// Read limit used when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Server {
    listener: UnixListener,
    socket_path: PathBuf,
    dispatcher: Arc<Dispatcher>,
    request_timeout: Duration,
}

impl Server {
    /// Binds the request socket, replacing a stale socket file if present.
    pub fn bind(socket_path: &Path, dispatcher: Arc<Dispatcher>) -> io::Result<Self> {
        if let Some(parent) = socket_path.parent() {
            fs::create_dir_all(parent)?;
        }

        match fs::remove_file(socket_path) {
            Ok(()) => warn!("Removed stale socket {}", socket_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let listener = UnixListener::bind(socket_path)?;
        // Unprivileged callers must be able to connect.
        fs::set_permissions(socket_path, fs::Permissions::from_mode(0o666))?;
        info!("Server bound to {}", socket_path.display());

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            dispatcher,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> io::Result<Self> {
        let dispatcher = Arc::new(Dispatcher::from_config(config));
        Ok(Self::bind(&config.socket_path(), dispatcher)?
            .with_request_timeout(config.request_timeout()))
    }

    /// Limits how long a client may take to send its frame.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accepts connections forever, one task per connection.
    pub async fn start(&self) {
        info!("Starting password server on {}", self.socket_path.display());

        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let request_timeout = self.request_timeout;

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        match handle_connection(stream, dispatcher, request_timeout).await {
                            Ok(code) => info!("Replied {}", code),
                            Err(e) => handle_error(&e),
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }

    /// Runs until SIGINT or SIGTERM.
    pub async fn run_until_shutdown(&self) -> io::Result<()> {
        let mut terminate = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = self.start() => {}
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down"),
            _ = terminate.recv() => info!("Received SIGTERM, shutting down"),
        }

        Ok(())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.socket_path);
    }
}

/// Reads one request frame, dispatches it and writes the result code back.
pub async fn handle_connection(
    mut stream: UnixStream,
    dispatcher: Arc<Dispatcher>,
    request_timeout: Duration,
) -> Result<ResultCode, PasswdSrvError> {
    let mut frame = Zeroizing::new(vec![0u8; FRAME_SIZE]);

    let code = match timeout(request_timeout, stream.read_exact(&mut frame)).await {
        Err(_) => {
            warn!("No complete request frame within {:?}", request_timeout);
            ResultCode::InvalidParam
        }
        Ok(Ok(_)) => match decode_request(&frame) {
            Ok(request) => {
                info!("Received {:?}", request.operation);
                tokio::task::spawn_blocking(move || dispatcher.dispatch(request))
                    .await
                    .unwrap_or_else(|e| {
                        error!("Request task failed: {}", e);
                        ResultCode::Fatal
                    })
            }
            Err(e) => {
                let err = PasswdSrvError::from(e);
                handle_error(&err);
                error_to_result_code(&err)
            }
        },
        Ok(Err(e)) => {
            warn!("Incomplete request frame: {}", e);
            ResultCode::InvalidParam
        }
    };

    stream
        .write_all(&code.to_bytes())
        .await
        .map_err(PasswdSrvError::SendFailed)?;
    stream.flush().await.map_err(PasswdSrvError::SendFailed)?;

    Ok(code)
}
