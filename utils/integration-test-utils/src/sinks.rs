/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use async_trait::async_trait;
use bus_streamer::{EventSink, SinkError, SubscribeResponse};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, Semaphore};
use tracing::debug;

/// Sink that stores everything it receives.
pub struct RecordingSink {
    peer: String,
    messages: Mutex<Vec<Arc<SubscribeResponse>>>,
    received: Notify,
}

impl RecordingSink {
    pub fn new(peer: &str) -> Arc<Self> {
        Arc::new(Self {
            peer: peer.to_string(),
            messages: Mutex::new(Vec::new()),
            received: Notify::new(),
        })
    }

    pub async fn messages(&self) -> Vec<Arc<SubscribeResponse>> {
        self.messages.lock().await.clone()
    }

    pub async fn topics(&self) -> Vec<String> {
        self.messages
            .lock()
            .await
            .iter()
            .map(|message| message.topic.clone())
            .collect()
    }

    /// Waits until at least `count` messages arrived. Returns `false` on timeout.
    pub async fn wait_for(&self, count: usize, limit: Duration) -> bool {
        tokio::time::timeout(limit, async {
            loop {
                let notified = self.received.notified();
                if self.messages.lock().await.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn send(&self, message: Arc<SubscribeResponse>) -> Result<(), SinkError> {
        debug!(peer = self.peer.as_str(), topic = message.topic.as_str(), "recorded message");
        self.messages.lock().await.push(message);
        self.received.notify_waiters();
        Ok(())
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}

/// Sink whose every delivery fails.
pub struct FailingSink {
    peer: String,
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new(peer: &str) -> Arc<Self> {
        Arc::new(Self {
            peer: peer.to_string(),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for FailingSink {
    async fn send(&self, _message: Arc<SubscribeResponse>) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Failed(format!("{} refused delivery", self.peer)))
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}

/// Sink that holds every delivery until [`BlockingSink::release`] is called.
pub struct BlockingSink {
    peer: String,
    gate: Semaphore,
    waiting: AtomicUsize,
    delivered: AtomicUsize,
}

impl BlockingSink {
    pub fn new(peer: &str) -> Arc<Self> {
        Arc::new(Self {
            peer: peer.to_string(),
            gate: Semaphore::new(0),
            waiting: AtomicUsize::new(0),
            delivered: AtomicUsize::new(0),
        })
    }

    /// Lets `count` held or future deliveries complete.
    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for BlockingSink {
    async fn send(&self, _message: Arc<SubscribeResponse>) -> Result<(), SinkError> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);

        match permit {
            Ok(permit) => {
                permit.forget();
                self.delivered.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(_) => Err(SinkError::Closed),
        }
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}
