use std::{path::PathBuf, sync::mpsc::{self, Receiver, Sender, TryRecvError}, thread::{self, JoinHandle}};

use resources::{library, Dataset, DatasetError, SkeletonSchema, ValidationReport};

use crate::viewer::LoadTicket;

pub type LoadResult = Result<(Dataset, ValidationReport), DatasetError>;

struct Request {
    ticket: LoadTicket,
    path: PathBuf,
}

/// Parses dataset files off the render thread. Every result carries the ticket
/// of its request, the viewer decides whether it is still wanted.
pub struct DatasetLoader {
    requests: Option<Sender<Request>>,
    results: Receiver<(LoadTicket, LoadResult)>,
    handle: Option<JoinHandle<()>>,
}


impl DatasetLoader {
    pub fn spawn(schema: SkeletonSchema) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (result_tx, result_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("dataset-loader".to_string())
            .spawn(move || {
                // Closed when the loader is dropped.
                while let Ok(Request { ticket, path }) = request_rx.recv() {
                    tracing::debug!(?path, "loading dataset");
                    let result = library::load_dataset(&path, &schema);
                    if result_tx.send((ticket, result)).is_err() {break};
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::error!(%err, "cannot spawn dataset loader thread");
                None
            }
        };

        Self { requests: handle.as_ref().map(|_| request_tx), results: result_rx, handle }
    }

    /// Queues `path`. Returns false when the worker is gone.
    pub fn request(&self, ticket: LoadTicket, path: PathBuf) -> bool {
        let Some(requests) = &self.requests else {return false};
        requests.send(Request { ticket, path }).is_ok()
    }

    /// Results that arrived since the last call, oldest first.
    pub fn poll(&self) -> Vec<(LoadTicket, LoadResult)> {
        let mut results = vec![];
        loop {
            match self.results.try_recv() {
                Ok(result) => results.push(result),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        results
    }

    /// Blocks until the next result. `None` once the worker has stopped.
    pub fn wait(&self) -> Option<(LoadTicket, LoadResult)> {
        self.results.recv().ok()
    }
}


impl Drop for DatasetLoader {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("dataset loader thread panicked");
            }
        }
    }
}
