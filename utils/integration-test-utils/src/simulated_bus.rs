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

use async_broadcast::{broadcast, InactiveReceiver, Receiver, RecvError, Sender};
use async_trait::async_trait;
use bus_streamer::{BusError, BusTransport, Event};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Sender id used for frames injected by [`SimulatedBusSegment::inject`].
const DEVICE_SENDER_ID: u64 = 0;

#[derive(Clone, Debug)]
struct Frame {
    sender_id: u64,
    event: Event,
}

/// In-memory bus segment shared by any number of connected clients.
///
/// Like a real tunnelling gateway, the segment never echoes a frame back to the
/// client that sent it.
#[derive(Clone)]
pub struct SimulatedBusSegment {
    sender: Sender<Frame>,
    idle_receiver: InactiveReceiver<Frame>,
    next_client_id: Arc<AtomicU64>,
}

impl SimulatedBusSegment {
    pub fn new(capacity: usize) -> Self {
        let (mut sender, receiver) = broadcast(capacity);
        sender.set_overflow(true);
        sender.set_await_active(false);
        Self {
            sender,
            idle_receiver: receiver.deactivate(),
            next_client_id: Arc::new(AtomicU64::new(DEVICE_SENDER_ID + 1)),
        }
    }

    pub fn connect(&self) -> SimulatedBusClient {
        let client_id = self.next_client_id.fetch_add(1, Ordering::SeqCst);
        debug!(client_id, "client connected to simulated bus segment");
        SimulatedBusClient {
            client_id,
            sender: self.sender.clone(),
            receiver: Mutex::new(self.idle_receiver.activate_cloned()),
        }
    }

    /// Puts a frame on the segment as if a field device had sent it.
    pub async fn inject(&self, event: Event) {
        let frame = Frame {
            sender_id: DEVICE_SENDER_ID,
            event,
        };
        if let Err(err) = self.sender.broadcast(frame).await {
            warn!(err = ?err, "unable to inject frame into simulated bus segment");
        }
    }

    /// Disconnects every client. Pending and later receives fail with `Closed`.
    pub fn close(&self) {
        self.sender.close();
    }
}

/// One connection to a [`SimulatedBusSegment`].
pub struct SimulatedBusClient {
    client_id: u64,
    sender: Sender<Frame>,
    receiver: Mutex<Receiver<Frame>>,
}

impl SimulatedBusClient {
    pub fn client_id(&self) -> u64 {
        self.client_id
    }
}

#[async_trait]
impl BusTransport for SimulatedBusClient {
    async fn send(&self, event: &Event) -> Result<(), BusError> {
        let frame = Frame {
            sender_id: self.client_id,
            event: event.clone(),
        };
        self.sender
            .broadcast(frame)
            .await
            .map(|_| ())
            .map_err(|_| BusError::Closed)
    }

    async fn receive(&self) -> Result<Event, BusError> {
        let mut receiver = self.receiver.lock().await;
        loop {
            match receiver.recv().await {
                Ok(frame) if frame.sender_id == self.client_id => continue,
                Ok(frame) => return Ok(frame.event),
                Err(RecvError::Overflowed(skipped)) => {
                    warn!(
                        client_id = self.client_id,
                        skipped, "simulated bus client lagged"
                    );
                }
                Err(RecvError::Closed) => return Err(BusError::Closed),
            }
        }
    }
}

/// Bus whose every operation fails, for exercising error paths.
pub struct FailingBus {
    reason: String,
}

impl FailingBus {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl BusTransport for FailingBus {
    async fn send(&self, _event: &Event) -> Result<(), BusError> {
        Err(BusError::Send(self.reason.clone()))
    }

    async fn receive(&self) -> Result<Event, BusError> {
        Err(BusError::Receive(self.reason.clone()))
    }
}

/// Bus that accepts sends and never delivers anything.
#[derive(Default)]
pub struct SilentBus;

#[async_trait]
impl BusTransport for SilentBus {
    async fn send(&self, _event: &Event) -> Result<(), BusError> {
        Ok(())
    }

    async fn receive(&self) -> Result<Event, BusError> {
        std::future::pending().await
    }
}

#[cfg(test)]
mod tests {
    use super::SimulatedBusSegment;
    use bus_streamer::{BusError, BusTransport, Command, Event, Topic};

    fn event(raw: u16) -> Event {
        Event::new(Topic::from_raw(raw), Command::Write, vec![raw as u8])
    }

    #[tokio::test]
    async fn clients_do_not_see_their_own_frames() {
        let segment = SimulatedBusSegment::new(16);
        let streamer_side = segment.connect();
        let other_side = segment.connect();

        streamer_side.send(&event(1)).await.unwrap();
        other_side.send(&event(2)).await.unwrap();

        assert_eq!(other_side.receive().await.unwrap(), event(1));
        assert_eq!(streamer_side.receive().await.unwrap(), event(2));
    }

    #[tokio::test]
    async fn injected_frames_reach_every_client() {
        let segment = SimulatedBusSegment::new(16);
        let first = segment.connect();
        let second = segment.connect();

        segment.inject(event(7)).await;

        assert_eq!(first.receive().await.unwrap(), event(7));
        assert_eq!(second.receive().await.unwrap(), event(7));
    }

    #[tokio::test]
    async fn closing_the_segment_fails_receivers() {
        let segment = SimulatedBusSegment::new(4);
        let client = segment.connect();

        segment.close();

        assert_eq!(client.receive().await, Err(BusError::Closed));
    }
}
