//! Background search thread.
//!
//! The worker owns an [`Engine`] (and with it the transposition table) on a
//! dedicated thread. One request is in flight at a time; each request gets
//! exactly one response.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use log::{debug, warn};
use thiserror::Error;

use crate::engine::{Engine, EngineConfig, SearchRequest, SearchResponse};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to start search thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("a search is already running")]
    Busy,
    #[error("no search has been submitted")]
    Idle,
    #[error("search thread is gone")]
    Disconnected,
}

enum Job {
    Search(Box<SearchRequest>),
    NewGame,
}

#[derive(Debug)]
pub struct Worker {
    jobs: Option<Sender<Job>>,
    responses: Receiver<SearchResponse>,
    handle: Option<JoinHandle<()>>,
    pending: bool,
}

impl Worker {
    pub fn spawn(config: EngineConfig) -> Result<Self, WorkerError> {
        let (job_tx, job_rx) = channel::unbounded::<Job>();
        let (resp_tx, resp_rx) = channel::bounded::<SearchResponse>(1);

        let handle = thread::Builder::new()
            .name("search".to_string())
            .spawn(move || run(Engine::new(config), job_rx, resp_tx))?;

        Ok(Self {
            jobs: Some(job_tx),
            responses: resp_rx,
            handle: Some(handle),
            pending: false,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.pending
    }

    fn send(&self, job: Job) -> Result<(), WorkerError> {
        let jobs = self.jobs.as_ref().ok_or(WorkerError::Disconnected)?;
        jobs.send(job).map_err(|_| WorkerError::Disconnected)
    }

    pub fn submit(&mut self, request: SearchRequest) -> Result<(), WorkerError> {
        if self.pending {
            return Err(WorkerError::Busy);
        }
        self.send(Job::Search(Box::new(request)))?;
        self.pending = true;
        Ok(())
    }

    /// Clear the engine's cached state between games.
    pub fn new_game(&self) -> Result<(), WorkerError> {
        if self.pending {
            return Err(WorkerError::Busy);
        }
        self.send(Job::NewGame)
    }

    /// Non-blocking poll for the pending response.
    pub fn try_result(&mut self) -> Result<Option<SearchResponse>, WorkerError> {
        if !self.pending {
            return Err(WorkerError::Idle);
        }
        match self.responses.try_recv() {
            Ok(response) => {
                self.pending = false;
                Ok(Some(response))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.pending = false;
                Err(WorkerError::Disconnected)
            }
        }
    }

    /// Block until the pending response arrives.
    pub fn wait(&mut self) -> Result<SearchResponse, WorkerError> {
        if !self.pending {
            return Err(WorkerError::Idle);
        }
        let response = self.responses.recv().map_err(|_| WorkerError::Disconnected);
        self.pending = false;
        response
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the job channel ends the thread's receive loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }
}

fn run(mut engine: Engine, jobs: Receiver<Job>, responses: Sender<SearchResponse>) {
    for job in jobs {
        match job {
            Job::Search(request) => {
                let response = engine.think(&request);
                if responses.send(response).is_err() {
                    break;
                }
            }
            Job::NewGame => engine.new_game(),
        }
    }
    debug!("search thread exiting");
}
