//! Simple stateless pub-sub event handler
//!
//! This module provides a hook system that lets components of the storefront subscribe to engine events and react to
//! them. The handlers are stateless: they have no access to the internal state of the engine and only receive the
//! event itself. Handlers can be async.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    name: &'static str,
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(name: &'static str, buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { name, listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for in-flight handler jobs to finish.
    pub async fn start_handler(mut self) {
        let name = self.name;
        debug!("📬️ Starting {name} event handler");
        // Shut down once the last producer is dropped
        drop(self.sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling {name} event");
            let handler = Arc::clone(&self.handler);
            jobs.spawn(async move { (handler)(ev).await });
            // Reap finished jobs
            while let Some(res) = jobs.try_join_next() {
                if let Err(e) = res {
                    warn!("📬️ A {name} event handler job failed: {e}");
                }
            }
        }
        debug!("📬️ All {name} producers are gone. Waiting for {} jobs to complete", jobs.len());
        while let Some(res) = jobs.join_next().await {
            if let Err(e) = res {
                warn!("📬️ A {name} event handler job failed: {e}");
            }
        }
        debug!("📬️ {name} event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
