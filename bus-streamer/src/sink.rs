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

//! Delivery endpoints of active subscriptions.

use crate::messages::SubscribeResponse;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SinkError {
    #[error("receiver is gone")]
    Closed,
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Capability to push one message to the remote side of a subscription.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, message: Arc<SubscribeResponse>) -> Result<(), SinkError>;

    /// Label of the remote peer, used in logs.
    fn peer(&self) -> &str;
}

/// Sink backed by a bounded tokio channel.
///
/// A full channel makes [`EventSink::send`] wait, which stalls the dispatch pass
/// that is delivering to it.
pub struct ChannelSink {
    peer: String,
    sender: mpsc::Sender<Arc<SubscribeResponse>>,
}

impl ChannelSink {
    pub fn new(
        peer: impl Into<String>,
        buffer: usize,
    ) -> (Self, mpsc::Receiver<Arc<SubscribeResponse>>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let sink = Self {
            peer: peer.into(),
            sender,
        };
        (sink, receiver)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&self, message: Arc<SubscribeResponse>) -> Result<(), SinkError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| SinkError::Closed)
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}
