//! UCI engine session: one child process per analysis (async I/O)

use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::analysis::{AnalysisRequest, AnalysisResult};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ranking;
use crate::uci::{self, PvSlots};

/// Lifecycle of a session; only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Starting,
    AwaitingUciOk,
    Configuring,
    AwaitingReadyOk,
    Searching,
    Collecting,
    Terminated(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    Success,
    Error,
}

/// A running engine process with its stdout and stderr merged into one
/// line stream. The process is killed when the session is dropped.
pub struct EngineSession {
    process: Child,
    stdin: ChildStdin,
    lines: mpsc::Receiver<io::Result<String>>,
    state: SessionState,
}

impl EngineSession {
    /// Spawn the engine binary.
    pub async fn spawn(path: &Path) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::ProcessStart)?;

        let (Some(stdin), Some(stdout), Some(stderr)) = (
            process.stdin.take(),
            process.stdout.take(),
            process.stderr.take(),
        ) else {
            let _ = process.start_kill();
            return Err(EngineError::ProcessStart(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "engine pipes unavailable",
            )));
        };

        let (tx, lines) = mpsc::channel(256);
        tokio::spawn(forward_lines(stdout, tx.clone()));
        tokio::spawn(forward_lines(stderr, tx));

        debug!(path = %path.display(), pid = ?process.id(), "Engine process started");

        Ok(Self {
            process,
            stdin,
            lines,
            state: SessionState::Starting,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(next >= self.state, "{:?} -> {:?}", self.state, next);
        debug!(from = ?self.state, to = ?next, "Engine session");
        self.state = next;
    }

    /// Send a command line to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "UCI <");
        self.stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Next line of engine output, `None` once both pipes have closed
    async fn next_line(&mut self) -> Result<Option<String>, EngineError> {
        match self.lines.recv().await {
            Some(Ok(line)) => {
                debug!(line = line.as_str(), "UCI >");
                Ok(Some(line))
            }
            Some(Err(e)) => Err(EngineError::Io(e)),
            None => Ok(None),
        }
    }

    /// Read until a line containing `token`; end of stream is a handshake failure.
    async fn wait_for(&mut self, token: &str, missing: &'static str) -> Result<(), EngineError> {
        while let Some(line) = self.next_line().await? {
            if line.contains(token) {
                return Ok(());
            }
        }
        Err(EngineError::Handshake(missing))
    }

    /// `uci` → `uciok`
    pub async fn handshake(&mut self) -> Result<(), EngineError> {
        self.advance(SessionState::AwaitingUciOk);
        self.send("uci").await?;
        self.wait_for("uciok", "uciok not received").await
    }

    /// Set search options, then `isready` → `readyok`
    pub async fn configure(&mut self, config: &EngineConfig, multipv: usize) -> Result<(), EngineError> {
        self.advance(SessionState::Configuring);
        self.send(&format!("setoption name Threads value {}", config.threads)).await?;
        self.send(&format!("setoption name Hash value {}", config.hash_mb)).await?;
        self.send(&format!("setoption name Contempt value {}", config.contempt)).await?;
        self.send(&format!("setoption name Aggressiveness value {}", config.aggressiveness))
            .await?;
        self.send(&format!("setoption name MultiPV value {multipv}")).await?;

        self.advance(SessionState::AwaitingReadyOk);
        self.send("isready").await?;
        self.wait_for("readyok", "readyok not received").await
    }

    /// Search `fen` for `movetime_ms` and collect MultiPV lines until `bestmove`.
    ///
    /// A stream that ends before `bestmove` yields whatever was collected.
    pub async fn search(
        &mut self,
        fen: &str,
        movetime_ms: u128,
        multipv: usize,
    ) -> Result<PvSlots, EngineError> {
        self.advance(SessionState::Searching);
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go movetime {movetime_ms}")).await?;

        self.advance(SessionState::Collecting);
        let mut slots = PvSlots::with_lines(multipv);
        while let Some(line) = self.next_line().await? {
            if uci::is_multipv_info(&line) {
                if let Some(candidate) = uci::parse_info(&line) {
                    slots.record(candidate);
                }
            }
            if line.starts_with("bestmove") {
                return Ok(slots);
            }
        }

        warn!("Engine output ended before bestmove");
        Ok(slots)
    }

    pub fn finish(&mut self) {
        self.advance(SessionState::Terminated(Outcome::Success));
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        if !matches!(self.state, SessionState::Terminated(_)) {
            debug!(state = ?self.state, "Engine session aborted");
            self.state = SessionState::Terminated(Outcome::Error);
        }
        // Best-effort: signal only, never wait
        let _ = self.process.start_kill();
    }
}

/// Forward every line of `reader` into `tx` until EOF, a read error, or the
/// receiver going away.
async fn forward_lines<R>(reader: R, tx: mpsc::Sender<io::Result<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader).lines();
    loop {
        match reader.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim_end().to_string();
                if tx.send(Ok(line)).await.is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }
}

/// Run one complete analysis against the engine at `binary`.
///
/// The session (and with it the child process) is torn down on every exit
/// path, including cancellation of the returned future.
pub async fn run_analysis(
    binary: &Path,
    config: &EngineConfig,
    request: &AnalysisRequest,
) -> Result<AnalysisResult, EngineError> {
    let multipv = config.multipv_for(request.limit);

    let mut session = EngineSession::spawn(binary).await?;
    session.handshake().await?;
    session.configure(config, multipv).await?;
    let slots = session
        .search(&request.fen, config.move_time.as_millis(), multipv)
        .await?;
    session.finish();

    Ok(ranking::rank(&slots, request.limit))
}
