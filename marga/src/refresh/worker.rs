//! Where refresh searches run.
//!
//! Two modes, mirroring how the foreground is deployed:
//! 1. **Threaded**: a named worker thread fed through crossbeam channels.
//!    The foreground polls for the result and never blocks.
//! 2. **Inline**: the search runs when dispatched and is handed back on the
//!    next poll. Deterministic, used by tests and single-threaded hosts.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use tracing::{debug, error, info};

use crate::core::Vec3;
use crate::error::{MargaError, Result};

use super::search::{PlanSearch, SearchOutcome};

/// One search request, tagged with the refresher's ticket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchRequest {
    /// Ticket identifying the dispatch
    pub ticket: u64,
    /// Agent position at dispatch time
    pub origin: Vec3,
}

/// A finished search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResponse {
    /// Ticket of the request this answers
    pub ticket: u64,
    /// What the search found
    pub outcome: SearchOutcome,
}

/// Handle to the background search thread.
pub struct SearchWorker {
    request_tx: Option<Sender<SearchRequest>>,
    response_rx: Receiver<SearchResponse>,
    handle: Option<JoinHandle<()>>,
}

impl SearchWorker {
    /// Spawn the worker thread.
    pub fn spawn(search: Arc<PlanSearch>) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<SearchRequest>();
        let (response_tx, response_rx) = unbounded::<SearchResponse>();

        let handle = thread::Builder::new()
            .name("marga-search".into())
            .spawn(move || run_search_loop(search, request_rx, response_tx))?;

        Ok(Self {
            request_tx: Some(request_tx),
            response_rx,
            handle: Some(handle),
        })
    }

    /// Queue a search.
    pub fn submit(&self, request: SearchRequest) -> Result<()> {
        let tx = self
            .request_tx
            .as_ref()
            .ok_or_else(|| MargaError::Worker("search worker stopped".into()))?;
        tx.send(request)
            .map_err(|_| MargaError::Worker("search worker disconnected".into()))
    }

    /// Take a finished result if one is waiting.
    pub fn try_receive(&self) -> Result<Option<SearchResponse>> {
        match self.response_rx.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(MargaError::Worker("search worker exited".into()))
            }
        }
    }

    /// Stop accepting requests and wait for the thread to finish.
    pub fn shutdown(&mut self) {
        // Closing the request channel ends the worker loop
        self.request_tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("[Refresh] Search worker panicked");
        }
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_search_loop(
    search: Arc<PlanSearch>,
    requests: Receiver<SearchRequest>,
    responses: Sender<SearchResponse>,
) {
    info!("[Refresh] Search worker started");

    for request in requests.iter() {
        let outcome = search.run(request.origin);
        let response = SearchResponse {
            ticket: request.ticket,
            outcome,
        };
        if responses.send(response).is_err() {
            break;
        }
    }

    debug!("[Refresh] Search worker stopped");
}

/// Backend a refresher dispatches searches to.
pub enum SearchDispatch {
    /// Background worker thread
    Threaded(SearchWorker),
    /// Run on dispatch, deliver on next poll
    Inline {
        /// The search
        search: Arc<PlanSearch>,
        /// Result waiting to be collected
        ready: Option<SearchResponse>,
    },
}

impl SearchDispatch {
    /// Spawn a threaded backend.
    pub fn threaded(search: Arc<PlanSearch>) -> Result<Self> {
        Ok(SearchDispatch::Threaded(SearchWorker::spawn(search)?))
    }

    /// Inline backend.
    pub fn inline(search: Arc<PlanSearch>) -> Self {
        SearchDispatch::Inline {
            search,
            ready: None,
        }
    }

    /// Is this the threaded backend?
    pub fn is_threaded(&self) -> bool {
        matches!(self, SearchDispatch::Threaded(_))
    }

    /// Start a search.
    pub fn dispatch(&mut self, request: SearchRequest) -> Result<()> {
        match self {
            SearchDispatch::Threaded(worker) => worker.submit(request),
            SearchDispatch::Inline { search, ready } => {
                *ready = Some(SearchResponse {
                    ticket: request.ticket,
                    outcome: search.run(request.origin),
                });
                Ok(())
            }
        }
    }

    /// Collect a finished search without blocking.
    pub fn poll(&mut self) -> Result<Option<SearchResponse>> {
        match self {
            SearchDispatch::Threaded(worker) => worker.try_receive(),
            SearchDispatch::Inline { ready, .. } => Ok(ready.take()),
        }
    }
}
