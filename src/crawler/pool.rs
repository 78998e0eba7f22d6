//! Bounded worker pool
//!
//! This module handles:
//! - A fixed pool of reusable HTTP clients, checked out for one fetch at a time
//! - Dispatching fetches in input order, at most one per available client
//! - Streaming results back as they complete
//! - Cooperative cancellation at dispatch boundaries with a graceful drain

use crate::config::FetchConfig;
use crate::crawler::fetcher::{build_http_client, FetchResult, HttpGetter};
use crate::CrawlerError;
use reqwest::Client;
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A fixed set of HTTP clients
///
/// The semaphore counts free clients, so holding a [`PooledClient`] is
/// exactly holding one permit. No two fetches can share a client.
pub struct ClientPool {
    clients: Mutex<Vec<Client>>,
    available: Arc<Semaphore>,
    size: usize,
}

/// A client checked out of a [`ClientPool`]; checked back in on drop
pub struct PooledClient {
    client: Option<Client>,
    pool: Arc<ClientPool>,
    _permit: OwnedSemaphorePermit,
}

impl ClientPool {
    /// Builds a pool of `size` clients (at least one)
    pub fn new(size: usize, config: &FetchConfig) -> Result<Arc<Self>, reqwest::Error> {
        let clients = (0..size.max(1))
            .map(|_| build_http_client(config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Arc::new(Self::from_clients(clients)))
    }

    /// Wraps already built clients
    ///
    /// Returns None for an empty list: a pool without clients could never
    /// hand one out.
    pub fn with_clients(clients: Vec<Client>) -> Option<Arc<Self>> {
        if clients.is_empty() {
            return None;
        }
        Some(Arc::new(Self::from_clients(clients)))
    }

    fn from_clients(clients: Vec<Client>) -> Self {
        let size = clients.len();
        Self {
            clients: Mutex::new(clients),
            available: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Number of clients owned by the pool
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of clients currently checked in
    pub fn available(&self) -> usize {
        self.available.available_permits()
    }

    /// Waits for a free client
    ///
    /// Returns None only if the pool has been shut down.
    pub async fn checkout(self: &Arc<Self>) -> Option<PooledClient> {
        let permit = self.available.clone().acquire_owned().await.ok()?;
        let client = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()?;

        Some(PooledClient {
            client: Some(client),
            pool: Arc::clone(self),
            _permit: permit,
        })
    }
}

impl Deref for PooledClient {
    type Target = Client;

    fn deref(&self) -> &Client {
        // Only taken in drop
        self.client.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledClient {
    fn drop(&mut self) {
        // The client goes back before the permit is released
        if let Some(client) = self.client.take() {
            self.pool
                .clients
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(client);
        }
    }
}

/// Runs fetches concurrently over a [`ClientPool`]
#[derive(Clone)]
pub struct WorkerPool {
    getter: Arc<dyn HttpGetter>,
}

impl WorkerPool {
    pub fn new(getter: Arc<dyn HttpGetter>) -> Self {
        Self { getter }
    }

    /// Fetches every URL with at most `concurrency_limit` requests in flight
    ///
    /// Results arrive on the returned channel in completion order. The
    /// channel closes once every dispatched fetch has delivered its result.
    /// When `cancel` fires, no further URL is dispatched but fetches already
    /// running complete and are delivered. Dropping the receiver stops
    /// dispatching the same way.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP clients cannot be built.
    pub fn run(
        &self,
        urls: Vec<String>,
        config: Arc<FetchConfig>,
        concurrency_limit: usize,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<FetchResult>, CrawlerError> {
        let clients =
            ClientPool::new(concurrency_limit.max(1), &config).map_err(CrawlerError::ClientBuild)?;
        Ok(self.run_with_clients(urls, config, clients, cancel))
    }

    /// Same as [`WorkerPool::run`] with a caller-supplied client pool
    pub fn run_with_clients(
        &self,
        urls: Vec<String>,
        config: Arc<FetchConfig>,
        clients: Arc<ClientPool>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<FetchResult> {
        // Room for every result, so workers never wait on a slow consumer
        let (tx, rx) = mpsc::channel(urls.len().max(1));
        tokio::spawn(dispatch(
            Arc::clone(&self.getter),
            urls,
            config,
            clients,
            tx,
            cancel,
        ));
        rx
    }
}

async fn dispatch(
    getter: Arc<dyn HttpGetter>,
    urls: Vec<String>,
    config: Arc<FetchConfig>,
    clients: Arc<ClientPool>,
    tx: mpsc::Sender<FetchResult>,
    cancel: CancellationToken,
) {
    let total = urls.len();
    let mut workers = JoinSet::new();

    for (dispatched, url) in urls.into_iter().enumerate() {
        let client = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(
                    "Cancelled after dispatching {}/{} URL(s), waiting for workers to finish...",
                    dispatched,
                    total
                );
                break;
            }
            _ = tx.closed() => {
                tracing::info!(
                    "Result stream dropped after dispatching {}/{} URL(s), stopping",
                    dispatched,
                    total
                );
                break;
            }
            client = clients.checkout() => match client {
                Some(client) => client,
                None => break,
            },
        };

        let getter = Arc::clone(&getter);
        let config = Arc::clone(&config);
        let tx = tx.clone();
        workers.spawn(async move {
            let result = getter.get(&client, &url, &config).await;
            drop(client);
            if tx.send(result).await.is_err() {
                tracing::debug!("Result stream closed, dropping result");
            }
        });
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Fetch worker failed: {}", e);
        }
    }
    // Last sender goes away here, which closes the stream
    drop(tx);
}
