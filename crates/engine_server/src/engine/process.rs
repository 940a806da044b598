//! A single UCI engine subprocess.
//!
//! The process' stdin and stdout are bridged to two bounded queues by two
//! tasks:
//!
//! * the **reader** forwards every stdout line to the shared output queue,
//!   dropping lines (with a warning) when the queue is full;
//! * the **writer** drains the input queue into stdin, one `\n`-terminated,
//!   flushed line per command.
//!
//! Both tasks watch a broadcast stop signal so [`EngineProcess::stop`] can
//! end them cooperatively.

use crate::error::EngineError;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Capacity of the engine-to-clients output queue.
pub const OUTPUT_QUEUE_CAPACITY: usize = 100;

/// Capacity of the clients-to-engine input queue.
pub const INPUT_QUEUE_CAPACITY: usize = 10;

/// Name reported before the engine sends `id name`.
pub const UNKNOWN_ENGINE_NAME: &str = "Unknown";

/// How long a stopping engine gets to exit after `quit` before it is killed.
const EXIT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Builds a `position` command.
///
/// An empty FEN or `startpos` selects the start position.
pub fn position_command(fen: Option<&str>, moves: &[String]) -> String {
    let mut command = match fen.map(str::trim) {
        None | Some("") | Some("startpos") => "position startpos".to_string(),
        Some(fen) => format!("position fen {}", fen),
    };
    if !moves.is_empty() {
        command.push_str(" moves ");
        command.push_str(&moves.join(" "));
    }
    command
}

/// A running engine subprocess and its I/O tasks.
#[derive(Debug)]
pub struct EngineProcess {
    path: PathBuf,
    child: Child,
    input: mpsc::Sender<String>,
    name: Arc<OnceCell<String>>,
    ready: Arc<watch::Sender<bool>>,
    stop_signal: broadcast::Sender<()>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl EngineProcess {
    /// Spawns the engine at `path` and starts its I/O tasks.
    ///
    /// # Arguments
    ///
    /// * `path` - Engine executable
    /// * `output` - Queue receiving every line the engine prints
    ///
    /// # Returns
    ///
    /// The running process, or an error if it could not be spawned.
    pub fn start(path: &Path, output: mpsc::Sender<String>) -> Result<Self, EngineError> {
        info!("♟️ Starting engine: {}", path.display());

        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.display().to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(EngineError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(EngineError::MissingPipe("stdout"))?;

        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);
        let (stop_signal, _) = broadcast::channel(1);
        let (ready, _) = watch::channel(false);
        let ready = Arc::new(ready);
        let name = Arc::new(OnceCell::new());

        let reader = tokio::spawn(read_output(
            stdout,
            output,
            name.clone(),
            ready.clone(),
            stop_signal.subscribe(),
        ));
        let writer = tokio::spawn(write_input(stdin, input_rx, stop_signal.subscribe()));

        info!("✅ Engine process started (pid {:?})", child.id());

        Ok(Self {
            path: path.to_path_buf(),
            child,
            input: input_tx,
            name,
            ready,
            stop_signal,
            reader,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name from the engine's first `id name` line.
    pub fn name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// Whether `readyok` has been seen since the last handshake began.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Queues a command without waiting.
    ///
    /// A full queue drops the command and reports
    /// [`EngineError::InputQueueFull`].
    pub fn send_command(&self, command: impl Into<String>) -> Result<(), EngineError> {
        match self.input.try_send(command.into()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(command)) => {
                warn!("⚠️ Engine input queue full, dropping: {}", command);
                Err(EngineError::InputQueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(EngineError::NotRunning),
        }
    }

    /// Queues a command, waiting for room in the queue.
    pub async fn queue_command(&self, command: impl Into<String>) -> Result<(), EngineError> {
        self.input
            .send(command.into())
            .await
            .map_err(|_| EngineError::NotRunning)
    }

    /// Runs the UCI handshake.
    ///
    /// Sends `uci`, the given option commands and `isready`, then waits for
    /// `readyok`.
    ///
    /// # Arguments
    ///
    /// * `commands` - Commands sent between `uci` and `isready`
    /// * `handshake_timeout` - How long to wait for `readyok`
    pub async fn initialize(
        &self,
        commands: &[String],
        handshake_timeout: Duration,
    ) -> Result<(), EngineError> {
        info!("🤝 Initializing engine with {} option commands", commands.len());

        self.ready.send_replace(false);
        let mut ready = self.ready.subscribe();

        self.queue_command("uci").await?;
        for command in commands {
            debug!("Engine option: {}", command);
            self.queue_command(command.as_str()).await?;
        }
        self.queue_command("isready").await?;

        let outcome = tokio::time::timeout(handshake_timeout, ready.wait_for(|ready| *ready))
            .await
            .map(|result| result.is_ok());

        match outcome {
            Ok(true) => {
                info!(
                    "✅ Engine ready: {}",
                    self.name().unwrap_or(UNKNOWN_ENGINE_NAME)
                );
                Ok(())
            }
            Ok(false) => Err(EngineError::NotRunning),
            Err(_) => Err(EngineError::HandshakeTimeout(handshake_timeout)),
        }
    }

    pub fn set_option(&self, name: &str, value: &str) -> Result<(), EngineError> {
        self.send_command(format!("setoption name {} value {}", name, value))
    }

    pub fn new_game(&self) -> Result<(), EngineError> {
        self.send_command("ucinewgame")
    }

    pub fn set_position(&self, fen: Option<&str>, moves: &[String]) -> Result<(), EngineError> {
        self.send_command(position_command(fen, moves))
    }

    /// Starts a search, e.g. `go("depth 20")`.
    pub fn go(&self, params: &str) -> Result<(), EngineError> {
        let params = params.trim();
        if params.is_empty() {
            self.send_command("go")
        } else {
            self.send_command(format!("go {}", params))
        }
    }

    /// Stops the engine.
    ///
    /// Sends `quit`, signals both I/O tasks to finish and waits for the
    /// process to exit, killing it after a grace period.
    pub async fn stop(mut self) -> Result<(), EngineError> {
        info!("🛑 Stopping engine: {}", self.path.display());

        if let Err(e) = self.send_command("quit") {
            debug!("Could not queue quit: {}", e);
        }
        let _ = self.stop_signal.send(());

        if tokio::time::timeout(EXIT_GRACE_PERIOD, &mut self.writer).await.is_err() {
            warn!("Engine writer task did not finish in time");
            self.writer.abort();
        }
        if tokio::time::timeout(EXIT_GRACE_PERIOD, &mut self.reader).await.is_err() {
            warn!("Engine reader task did not finish in time");
            self.reader.abort();
        }

        match tokio::time::timeout(EXIT_GRACE_PERIOD, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!("✅ Engine exited with {}", status);
                Ok(())
            }
            Ok(Err(e)) => Err(EngineError::Io(e)),
            Err(_) => {
                warn!("Engine did not exit after quit, killing it");
                self.child.kill().await?;
                Ok(())
            }
        }
    }
}

async fn read_output(
    stdout: ChildStdout,
    output: mpsc::Sender<String>,
    name: Arc<OnceCell<String>>,
    ready: Arc<watch::Sender<bool>>,
    mut stop: broadcast::Receiver<()>,
) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        let line = tokio::select! {
            _ = stop.recv() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line.trim_end_matches('\r').to_string(),
            Ok(None) => {
                debug!("Engine closed its output");
                break;
            }
            Err(e) => {
                error!("Error reading engine output: {}", e);
                break;
            }
        };
        trace!("Engine output: {}", line);

        if let Some(engine_name) = line.strip_prefix("id name ") {
            if name.set(engine_name.trim().to_string()).is_ok() {
                info!("🏷️ Engine identified: {}", engine_name.trim());
            }
        } else if line.trim() == "readyok" {
            ready.send_replace(true);
        }

        match output.try_send(line) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("⚠️ Engine output queue full, dropping line");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Engine output queue closed");
            }
        }
    }
}

async fn write_input(
    mut stdin: ChildStdin,
    mut input: mpsc::Receiver<String>,
    mut stop: broadcast::Receiver<()>,
) {
    loop {
        // Queued commands win over the stop signal so `quit` gets written.
        let command = tokio::select! {
            biased;
            command = input.recv() => match command {
                Some(command) => command,
                None => break,
            },
            _ = stop.recv() => break,
        };

        trace!("Sending to engine: {}", command);
        let mut line = command.into_bytes();
        line.push(b'\n');
        if let Err(e) = stdin.write_all(&line).await {
            error!("Error writing to engine: {}", e);
            break;
        }
        if let Err(e) = stdin.flush().await {
            error!("Error flushing engine input: {}", e);
            break;
        }
    }
}
