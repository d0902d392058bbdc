use std::collections::HashMap;
use std::sync::Arc;

use tether_types::StreamStatus;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::error::{EngineError, Result};

/// Notification delivered to attached observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    Delta(String),
    Error(String),
    Finished(StreamStatus),
}

/// What an observer sees when it attaches
#[derive(Debug)]
pub struct Subscription {
    /// Chunks from the requested cursor up to the moment of attaching
    pub replay: Vec<String>,
    pub status: StreamStatus,
    pub last_error: Option<String>,
    /// Live tail. `None` when the broadcast had already reached a terminal state.
    pub receiver: Option<mpsc::UnboundedReceiver<HubEvent>>,
}

#[derive(Debug)]
struct BroadcastState {
    chunks: Vec<String>,
    status: StreamStatus,
    last_error: Option<String>,
    finished: bool,
    /// Chunks below this index have been delivered to observers
    published: usize,
    subscribers: HashMap<u64, mpsc::UnboundedSender<HubEvent>>,
    next_id: u64,
}

impl BroadcastState {
    fn publish(&mut self, event: &HubEvent) {
        self.subscribers
            .retain(|_, subscriber| subscriber.send(event.clone()).is_ok());
    }
}

/// In-memory fan-out for one in-flight generation.
///
/// A chunk is buffered first and delivered to observers once it is durable.
/// `subscribe` replays only delivered chunks, under the same lock that `publish`
/// takes, so an observer sees each chunk exactly once: either in its replay or on
/// the live tail, never both.
#[derive(Debug)]
pub struct LiveBroadcast {
    thread_id: String,
    state: Mutex<BroadcastState>,
}

impl LiveBroadcast {
    fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            state: Mutex::new(BroadcastState {
                chunks: Vec::new(),
                status: StreamStatus::Active,
                last_error: None,
                finished: false,
                published: 0,
                subscribers: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Buffer a chunk without notifying observers. Returns the full buffer.
    pub async fn append(&self, chunk: String) -> Vec<String> {
        let mut state = self.state.lock().await;
        state.chunks.push(chunk);
        state.chunks.clone()
    }

    /// Deliver every buffered chunk observers have not seen yet
    pub async fn publish(&self) {
        let mut state = self.state.lock().await;
        let pending: Vec<String> = state.chunks[state.published..].to_vec();
        state.published = state.chunks.len();
        for chunk in pending {
            state.publish(&HubEvent::Delta(chunk));
        }
    }

    /// Drop buffered chunks that were never published
    pub async fn discard_unpublished(&self) {
        let mut state = self.state.lock().await;
        let published = state.published;
        state.chunks.truncate(published);
    }

    /// Record an error. The status becomes aborted and observers detach.
    pub async fn fail(&self, error: String) {
        let mut state = self.state.lock().await;
        state.status = StreamStatus::Aborted;
        state.last_error = Some(error.clone());
        state.publish(&HubEvent::Error(error));
        state.subscribers.clear();
    }

    /// Final notification. Drains and clears every observer.
    pub async fn finish(&self, status: StreamStatus) {
        let mut state = self.state.lock().await;
        state.status = status;
        state.finished = true;
        state.publish(&HubEvent::Finished(status));
        state.subscribers.clear();
    }

    /// Buffered chunks and current status
    pub async fn snapshot(&self) -> (Vec<String>, StreamStatus) {
        let state = self.state.lock().await;
        (state.chunks.clone(), state.status)
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    pub async fn subscribe(&self, cursor: usize) -> Subscription {
        let mut state = self.state.lock().await;
        let replay = state.chunks[..state.published]
            .get(cursor..)
            .unwrap_or(&[])
            .to_vec();

        let receiver = if state.status.is_terminal() || state.finished {
            None
        } else {
            let (tx, rx) = mpsc::unbounded_channel();
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.insert(id, tx);
            Some(rx)
        };

        Subscription {
            replay,
            status: state.status,
            last_error: state.last_error.clone(),
            receiver,
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.state.lock().await.subscribers.len()
    }
}

/// Registry of live broadcasts, at most one per thread
#[derive(Debug, Default)]
pub struct StreamHub {
    broadcasts: RwLock<HashMap<String, Arc<LiveBroadcast>>>,
}

impl StreamHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a broadcast for the thread, failing if one is already live
    pub async fn register(&self, thread_id: &str) -> Result<Arc<LiveBroadcast>> {
        let mut broadcasts = self.broadcasts.write().await;
        if broadcasts.contains_key(thread_id) {
            return Err(EngineError::StreamInProgress(thread_id.to_string()));
        }

        let broadcast = Arc::new(LiveBroadcast::new(thread_id));
        broadcasts.insert(thread_id.to_string(), broadcast.clone());
        Ok(broadcast)
    }

    pub async fn get(&self, thread_id: &str) -> Option<Arc<LiveBroadcast>> {
        self.broadcasts.read().await.get(thread_id).cloned()
    }

    /// Remove the thread's broadcast if it is still `broadcast`
    pub async fn release(&self, broadcast: &Arc<LiveBroadcast>) {
        let mut broadcasts = self.broadcasts.write().await;
        if let Some(current) = broadcasts.get(broadcast.thread_id()) {
            if Arc::ptr_eq(current, broadcast) {
                broadcasts.remove(broadcast.thread_id());
            }
        }
    }

    pub async fn is_live(&self, thread_id: &str) -> bool {
        self.broadcasts.read().await.contains_key(thread_id)
    }

    pub async fn live_count(&self) -> usize {
        self.broadcasts.read().await.len()
    }
}
