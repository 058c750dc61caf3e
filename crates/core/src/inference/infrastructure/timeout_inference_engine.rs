use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, SendTimeoutError};
use ndarray::{Array4, ArrayView4};

use crate::inference::domain::inference_engine::{InferenceEngine, NamedOutputs};
use crate::shared::error::InferenceError;

struct Request {
    id: u64,
    input: Array4<f32>,
}

struct Response {
    id: u64,
    result: Result<NamedOutputs, InferenceError>,
}

/// Decorator that bounds how long a caller waits for a forward pass.
///
/// The wrapped engine runs on a dedicated worker thread. When a call times
/// out the worker keeps going; its late answer is recognised by request id
/// and dropped, so a frame never receives another frame's outputs.
pub struct TimeoutInferenceEngine {
    request_tx: Option<crossbeam_channel::Sender<Request>>,
    response_rx: crossbeam_channel::Receiver<Response>,
    worker: Option<JoinHandle<()>>,
    timeout: Duration,
    next_id: u64,
}

impl TimeoutInferenceEngine {
    pub fn new(inner: Box<dyn InferenceEngine>, timeout: Duration) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::bounded::<Request>(1);
        let (response_tx, response_rx) = crossbeam_channel::unbounded::<Response>();
        let worker = spawn_worker(inner, request_rx, response_tx);
        Self {
            request_tx: Some(request_tx),
            response_rx,
            worker: Some(worker),
            timeout,
            next_id: 0,
        }
    }
}

fn spawn_worker(
    mut inner: Box<dyn InferenceEngine>,
    request_rx: crossbeam_channel::Receiver<Request>,
    response_tx: crossbeam_channel::Sender<Response>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for request in request_rx {
            let result = inner.infer(request.input.view());
            let response = Response {
                id: request.id,
                result,
            };
            if response_tx.send(response).is_err() {
                break;
            }
        }
    })
}

impl InferenceEngine for TimeoutInferenceEngine {
    fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<NamedOutputs, InferenceError> {
        let deadline = Instant::now() + self.timeout;
        let id = self.next_id;
        self.next_id += 1;

        let request_tx = self
            .request_tx
            .as_ref()
            .ok_or("inference worker has shut down")?;
        let request = Request {
            id,
            input: input.to_owned(),
        };
        match request_tx.send_timeout(request, self.timeout) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                return Err(format!(
                    "inference engine still busy after {}ms",
                    self.timeout.as_millis()
                )
                .into())
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                return Err("inference worker has shut down".into())
            }
        }

        loop {
            match self.response_rx.recv_deadline(deadline) {
                Ok(response) if response.id == id => return response.result,
                Ok(stale) => {
                    log::debug!("Discarding late inference response for request {}", stale.id);
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "Inference request {id} timed out after {}ms",
                        self.timeout.as_millis()
                    );
                    return Err(format!(
                        "inference timed out after {}ms",
                        self.timeout.as_millis()
                    )
                    .into());
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err("inference worker has shut down".into())
                }
            }
        }
    }
}

impl Drop for TimeoutInferenceEngine {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop. A worker stuck in
        // a hung forward pass is detached rather than joined.
        self.request_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            }
        }
    }
}
