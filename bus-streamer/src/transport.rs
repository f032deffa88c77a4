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

//! Seam towards the physical field-bus connection.

use crate::event::Event;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BusError {
    /// The connection is gone and will not deliver further events.
    #[error("bus connection closed")]
    Closed,
    #[error("bus send failed: {0}")]
    Send(String),
    #[error("bus receive failed: {0}")]
    Receive(String),
}

/// Connection to one bus segment.
///
/// Connection handling, keep-alive and framing live behind this trait. An error
/// from [`BusTransport::receive`] means the connection entered a failed state;
/// the streamer stops reading and shuts down.
#[async_trait]
pub trait BusTransport: Send + Sync {
    async fn send(&self, event: &Event) -> Result<(), BusError>;

    async fn receive(&self) -> Result<Event, BusError>;
}
