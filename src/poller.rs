extern crate anyhow;
extern crate chrono;

use crate::board;
use crate::client;
use crate::render;
use crate::result;
use crate::snapshot;
use crate::token;

use anyhow::Context;

pub const DEFAULT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(15);

pub struct SessionOptions {
    pub interval: std::time::Duration,
    pub explicit_token: Option<String>,
    pub cookie_name: String,
    pub token_element_id: String,
    pub output: Option<std::path::PathBuf>,
}

impl SessionOptions {
    pub fn defaults() -> SessionOptions {
        return SessionOptions{
            interval: DEFAULT_INTERVAL,
            explicit_token: None,
            cookie_name: token::COOKIE_NAME.to_string(),
            token_element_id: token::FALLBACK_ELEMENT_ID.to_string(),
            output: None,
        };
    }
}

struct Worker {
    stop_tx: std::sync::mpsc::Sender<()>,
    handle: std::thread::JoinHandle<()>,
}

pub struct PollingSession<S: client::PageInfoSource + Send + Sync + 'static> {
    source: std::sync::Arc<S>,
    token: std::sync::Arc<String>,
    board: board::SharedBoard,
    interval: std::time::Duration,
    output: Option<std::path::PathBuf>,
    worker: Option<Worker>,
}

impl<S: client::PageInfoSource + Send + Sync + 'static> PollingSession<S> {
    // Reads the token once; it is fixed for the life of the session.
    pub fn new(source: S, board: board::SharedBoard, options: SessionOptions) -> PollingSession<S> {
        let token = match options.explicit_token {
            Some(token) => token,
            None => acquire_token(&source, &options.cookie_name, &options.token_element_id),
        };

        lock(&board).set_element(board::COOKIE_TOKEN_ID, render::escape_html(&token));

        return PollingSession{
            source: std::sync::Arc::new(source),
            token: std::sync::Arc::new(token),
            board: board,
            interval: options.interval,
            output: options.output,
            worker: None,
        };
    }

    pub fn token(&self) -> &str {
        return &self.token;
    }

    pub fn board(&self) -> board::SharedBoard {
        return self.board.clone();
    }

    pub fn is_running(&self) -> bool {
        return self.worker.is_some();
    }

    pub fn poll_once(&self) -> result::CommuterResult<()> {
        return run_cycle(&*self.source, &self.token, &self.board, self.output.as_ref());
    }

    pub fn start(&mut self) -> result::CommuterResult<()> {
        if self.worker.is_some() {
            warn!("Polling session already running");
            return Ok(());
        }

        let (stop_tx, stop_rx) = std::sync::mpsc::channel();
        let source = self.source.clone();
        let token = self.token.clone();
        let board = self.board.clone();
        let interval = self.interval;
        let output = self.output.clone();

        let handle = std::thread::Builder::new()
            .name("poller".to_string())
            .spawn(move || {
                poll_loop(&*source, &token, &board, output.as_ref(), interval, stop_rx);
            })?;

        info!("Polling every {:?}", interval);
        self.worker = Some(Worker{stop_tx: stop_tx, handle: handle});
        return Ok(());
    }

    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            if worker.handle.join().is_err() {
                error!("Poller thread panicked");
            }
            info!("Polling stopped");
        }
    }

    // Blocks until the poller thread exits; it only does so after stop().
    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.handle.join().is_err() {
                error!("Poller thread panicked");
            }
        }
    }
}

impl<S: client::PageInfoSource + Send + Sync + 'static> Drop for PollingSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn acquire_token<S: client::PageInfoSource>(source: &S, cookie_name: &str, element_id: &str) -> String {
    match source.bootstrap() {
        Ok(bootstrap) => {
            return token::acquire(&bootstrap.cookie_header, &bootstrap.html, cookie_name, element_id);
        },
        Err(err) => {
            warn!("Couldn't load landing page for CSRF token, continuing without one: {}", err);
            return "".to_string();
        },
    }
}

fn lock(board: &board::SharedBoard) -> std::sync::MutexGuard<board::Board> {
    return board.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
}

fn fetch_updates<S: client::PageInfoSource>(source: &S, token: &str) -> result::CommuterResult<Vec<(&'static str, String)>> {
    let body = source.fetch_page_info(token)?;
    let snapshot = snapshot::parse_snapshot(&body)?;
    return Ok(render::region_updates(&snapshot));
}

fn run_cycle<S: client::PageInfoSource>(source: &S,
                                         token: &str,
                                         board: &board::SharedBoard,
                                         output: Option<&std::path::PathBuf>) -> result::CommuterResult<()> {
    let page = match fetch_updates(source, token) {
        Ok(updates) => {
            let mut board = lock(board);
            board.record_refresh(updates, chrono::Utc::now());
            debug!("Board refreshed ({} polls)", board.successful_polls);
            board.to_html()
        },
        Err(err) => {
            lock(board).record_failure(&err.to_string());
            return Err(err);
        },
    };

    // The board itself is already up to date here; only the copy on disk
    // is stale.
    if let Some(path) = output {
        if let Err(err) = write_page(path, &page) {
            lock(board).record_output_failure(&err.to_string());
            return Err(err);
        }
    }

    return Ok(());
}

fn write_page(path: &std::path::PathBuf, page: &str) -> result::CommuterResult<()> {
    // Write-then-rename so anything watching the file never sees half a page.
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, page)
        .with_context(|| format!("while writing board to {:?}", tmp_path))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("while moving board into place at {:?}", path))?;
    return Ok(());
}

// Requests never overlap: a tick that comes due while a request is still
// outstanding is dropped, and the schedule picks up at the next one.
fn poll_loop<S: client::PageInfoSource>(source: &S,
                                         token: &str,
                                         board: &board::SharedBoard,
                                         output: Option<&std::path::PathBuf>,
                                         interval: std::time::Duration,
                                         stop_rx: std::sync::mpsc::Receiver<()>) {
    let mut next_tick = std::time::Instant::now();

    loop {
        if let Err(err) = run_cycle(source, token, board, output) {
            warn!("Poll cycle failed, will try again in {:?}: {}", interval, err);
        }

        next_tick += interval;
        let now = std::time::Instant::now();
        let mut dropped = 0;
        while next_tick <= now {
            next_tick += interval;
            dropped += 1;
        }
        if dropped > 0 {
            debug!("Request outlasted the interval, dropped {} tick(s)", dropped);
        }

        match stop_rx.recv_timeout(next_tick - now) {
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}
