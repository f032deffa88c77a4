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

//! Single consumer of the inbound side of the bus.

use crate::context::ShutdownSignal;
use crate::data_plane::dispatcher::Dispatcher;
use crate::observability::events;
use crate::observability::fields::FormattedEventFields;
use crate::streamer::StreamerError;
use crate::transport::BusTransport;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, Level};

const COMPONENT: &str = "bus_reader";

pub(crate) struct BusReader<'a> {
    bus: &'a dyn BusTransport,
    dispatcher: &'a Dispatcher,
    shutdown: &'a ShutdownSignal,
    inactivity_timeout: Option<Duration>,
}

impl<'a> BusReader<'a> {
    pub(crate) fn new(
        bus: &'a dyn BusTransport,
        dispatcher: &'a Dispatcher,
        shutdown: &'a ShutdownSignal,
        inactivity_timeout: Option<Duration>,
    ) -> Self {
        Self {
            bus,
            dispatcher,
            shutdown,
            inactivity_timeout,
        }
    }

    /// Reads and dispatches events until shutdown or a bus failure.
    ///
    /// Every exit fires the shutdown signal so parked streams end with it.
    pub(crate) async fn run(&self) -> Result<(), StreamerError> {
        info!(
            event = events::BUS_READER_START,
            component = COMPONENT,
            inactivity_timeout = ?self.inactivity_timeout,
            "bus reader started"
        );

        let result = self.read_loop().await;

        match &result {
            Ok(()) => {
                self.shutdown.trigger("bus reader stopped");
                info!(
                    event = events::BUS_READER_STOP,
                    component = COMPONENT,
                    cause = self.shutdown.cause(),
                    "bus reader stopped"
                );
            }
            Err(err) => {
                self.shutdown.trigger(err.to_string());
                error!(
                    event = events::BUS_READER_STOP,
                    component = COMPONENT,
                    err = %err,
                    "bus reader failed; shutting down"
                );
            }
        }

        result
    }

    async fn read_loop(&self) -> Result<(), StreamerError> {
        loop {
            let received = tokio::select! {
                biased;
                _ = self.shutdown.triggered() => return Ok(()),
                received = self.receive() => received,
            };

            let event = match received {
                Ok(event) => event,
                Err(err) => {
                    if let StreamerError::Inactive(_) = err {
                        info!(
                            event = events::BUS_INACTIVE,
                            component = COMPONENT,
                            err = %err,
                            "bus went silent"
                        );
                    } else {
                        error!(
                            event = events::BUS_RECEIVE_FAILED,
                            component = COMPONENT,
                            err = %err,
                            "bus receive failed"
                        );
                    }
                    return Err(err);
                }
            };

            if tracing::enabled!(Level::DEBUG) {
                let fields = FormattedEventFields::from_event(&event);
                debug!(
                    event = events::BUS_RECEIVE,
                    component = COMPONENT,
                    topic = fields.topic.as_str(),
                    origin = fields.origin.as_str(),
                    command = fields.command,
                    payload_len = fields.payload_len,
                    "received bus event"
                );
            }

            self.dispatcher.dispatch(&event).await;
        }
    }

    async fn receive(&self) -> Result<crate::event::Event, StreamerError> {
        let Some(limit) = self.inactivity_timeout else {
            return self.bus.receive().await.map_err(StreamerError::Bus);
        };

        match timeout(limit, self.bus.receive()).await {
            Ok(received) => received.map_err(StreamerError::Bus),
            Err(_) => Err(StreamerError::Inactive(limit)),
        }
    }
}
