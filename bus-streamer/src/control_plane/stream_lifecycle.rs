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

//! Per-call lifecycle of a streaming subscription.

use crate::address::Topic;
use crate::context::{CallContext, CallEnd, ShutdownSignal};
use crate::control_plane::subscriber_registry::{Subscriber, SubscriberRegistry};
use crate::messages::SubscribeRequest;
use crate::observability::{events, fields};
use crate::sink::EventSink;
use crate::status::{Code, Status};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, trace, warn};

const COMPONENT: &str = "stream_lifecycle";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum StreamState {
    Init,
    Registered,
    Parked,
    Unregistering,
    Closed,
}

impl Display for StreamState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StreamState::Init => "init",
            StreamState::Registered => "registered",
            StreamState::Parked => "parked",
            StreamState::Unregistering => "unregistering",
            StreamState::Closed => "closed",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ParkEnd {
    Call(CallEnd),
    Shutdown,
}

/// Parses requested topics in order, dropping repeats.
pub(crate) fn parse_topics(topics: &[String]) -> Result<Vec<Topic>, Status> {
    let mut parsed: Vec<Topic> = Vec::with_capacity(topics.len());
    for (index, raw) in topics.iter().enumerate() {
        let topic = raw.parse::<Topic>().map_err(|err| {
            Status::fail_with_code(Code::InvalidArgument, format!("parse topic({index}): {err}"))
        })?;
        if !parsed.contains(&topic) {
            parsed.push(topic);
        }
    }
    Ok(parsed)
}

/// Registration of one handle, undone exactly once.
///
/// Dropping an armed registration schedules the removal on the current runtime,
/// so a call future that is dropped while parked still leaves the registry clean.
struct Registration {
    registry: Arc<SubscriberRegistry>,
    topics: Vec<Topic>,
    handle: Arc<Subscriber>,
    armed: bool,
}

impl Registration {
    async fn register(
        registry: Arc<SubscriberRegistry>,
        topics: Vec<Topic>,
        handle: Arc<Subscriber>,
    ) -> Self {
        if topics.is_empty() {
            registry.add_sniffer(&handle).await;
        } else {
            registry.add_by_topics(&topics, &handle).await;
        }
        Self {
            registry,
            topics,
            handle,
            armed: true,
        }
    }

    async fn release(mut self) {
        remove(&self.registry, &self.topics, &self.handle).await;
        self.armed = false;
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let registry = self.registry.clone();
        let topics = std::mem::take(&mut self.topics);
        let handle = self.handle.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    remove(&registry, &topics, &handle).await;
                });
            }
            Err(_) => warn!(
                event = events::STREAM_ABORTED,
                component = COMPONENT,
                peer = self.handle.peer(),
                "no runtime left to unregister a dropped stream"
            ),
        }
    }
}

async fn remove(registry: &SubscriberRegistry, topics: &[Topic], handle: &Arc<Subscriber>) {
    if topics.is_empty() {
        registry.remove_sniffer(handle).await;
    } else {
        registry.remove_by_topics(topics, handle).await;
    }
}

/// Drives one streaming call through register, park and unregister.
pub(crate) struct StreamLifecycle {
    registry: Arc<SubscriberRegistry>,
    shutdown: ShutdownSignal,
    peer: String,
    state: StreamState,
}

impl StreamLifecycle {
    pub(crate) fn new(
        registry: Arc<SubscriberRegistry>,
        shutdown: ShutdownSignal,
        peer: &str,
    ) -> Self {
        Self {
            registry,
            shutdown,
            peer: peer.to_string(),
            state: StreamState::Init,
        }
    }

    /// Runs the call to completion.
    ///
    /// Returns `Ok` when the call itself ended, `Aborted` when the streamer shut
    /// down first and `InvalidArgument` when a topic does not parse. Shutdown wins
    /// when both signals are already set.
    pub(crate) async fn run(
        mut self,
        request: &SubscribeRequest,
        sink: Arc<dyn EventSink>,
        ctx: &CallContext,
    ) -> Result<(), Status> {
        let topics = parse_topics(&request.topics).map_err(|status| {
            warn!(
                event = events::STREAM_INVALID_TOPIC,
                component = COMPONENT,
                peer = self.peer.as_str(),
                err = status.message(),
                "rejecting subscription"
            );
            status
        })?;

        debug!(
            event = events::STREAM_TRANSITION,
            component = COMPONENT,
            peer = self.peer.as_str(),
            kind = %request.kind,
            topics = fields::format_topics(&topics).as_str(),
            "opening stream"
        );

        let handle = Subscriber::new(request.kind, sink);
        let registration = Registration::register(self.registry.clone(), topics, handle).await;
        self.transition(StreamState::Registered);

        self.transition(StreamState::Parked);
        let end = self.park(ctx).await;

        self.transition(StreamState::Unregistering);
        registration.release().await;
        self.transition(StreamState::Closed);

        match end {
            ParkEnd::Call(reason) => {
                debug!(
                    event = events::STREAM_TRANSITION,
                    component = COMPONENT,
                    peer = self.peer.as_str(),
                    reason = match reason {
                        CallEnd::Canceled => fields::REASON_CALL_CANCELED,
                        CallEnd::DeadlineExceeded => fields::REASON_DEADLINE_EXCEEDED,
                    },
                    "stream closed"
                );
                Ok(())
            }
            ParkEnd::Shutdown => {
                let cause = self.shutdown.cause().unwrap_or(fields::REASON_SHUTDOWN);
                debug!(
                    event = events::STREAM_ABORTED,
                    component = COMPONENT,
                    peer = self.peer.as_str(),
                    cause,
                    "stream aborted by shutdown"
                );
                Err(Status::fail_with_code(
                    Code::Aborted,
                    format!("streamer shutting down: {cause}"),
                ))
            }
        }
    }

    async fn park(&self, ctx: &CallContext) -> ParkEnd {
        tokio::select! {
            biased;
            _ = self.shutdown.triggered() => ParkEnd::Shutdown,
            end = ctx.done() => ParkEnd::Call(end),
        }
    }

    fn transition(&mut self, next: StreamState) {
        trace!(
            event = events::STREAM_TRANSITION,
            component = COMPONENT,
            peer = self.peer.as_str(),
            from = %self.state,
            to = %next,
            "stream state transition"
        );
        self.state = next;
    }
}
