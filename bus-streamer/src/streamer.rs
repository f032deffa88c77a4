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

use crate::config::{ConfigError, StreamerConfig};
use crate::context::{CallContext, ShutdownSignal};
use crate::control_plane::stream_lifecycle::StreamLifecycle;
use crate::control_plane::subscriber_registry::SubscriberRegistry;
use crate::data_plane::bus_reader::BusReader;
use crate::data_plane::dispatcher::{DispatchReport, Dispatcher};
use crate::event::Event;
use crate::messages::{
    PublishRequest, PublishResponse, SubscribeRequest, SubscribeResponse, SubscribeUnaryRequest,
    SubscribeUnaryResponse,
};
use crate::observability::events;
use crate::sink::{ChannelSink, EventSink};
use crate::status::{Code, Status};
use crate::transport::{BusError, BusTransport};
use crate::unary;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "bus_streamer";

#[derive(Debug, Error)]
pub enum StreamerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("bus failed: {0}")]
    Bus(#[from] BusError),
    #[error("no bus activity for {}", format_limit(.0))]
    Inactive(Duration),
}

fn format_limit(limit: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*limit)
}

struct Inner {
    name: String,
    config: StreamerConfig,
    bus: Arc<dyn BusTransport>,
    registry: Arc<SubscriberRegistry>,
    dispatcher: Dispatcher,
    shutdown: ShutdownSignal,
}

/// Fans bus events out to streaming and unary subscribers.
///
/// Cloning is cheap; clones share the registry, the bus and the shutdown signal.
///
/// ```
/// use async_trait::async_trait;
/// use bus_streamer::{
///     BusError, BusStreamer, BusTransport, CallContext, Event, EventKind, PublishRequest,
///     StreamerConfig, SubscribeRequest,
/// };
/// use std::sync::Arc;
///
/// struct LoopbackOnlyBus;
///
/// #[async_trait]
/// impl BusTransport for LoopbackOnlyBus {
///     async fn send(&self, _event: &Event) -> Result<(), BusError> {
///         Ok(())
///     }
///
///     async fn receive(&self) -> Result<Event, BusError> {
///         std::future::pending().await
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let streamer = BusStreamer::new(StreamerConfig::default(), Arc::new(LoopbackOnlyBus)).unwrap();
/// let mut stream = streamer.open_stream(
///     SubscribeRequest::topics(["1/2/3"], EventKind::Write),
///     CallContext::new(),
/// );
/// # while streamer.registry().topic_count().await == 0 { tokio::task::yield_now().await; }
///
/// streamer
///     .publish(PublishRequest {
///         topic: "1/2/3".to_string(),
///         payload: vec![0x01],
///         ..Default::default()
///     })
///     .await
///     .unwrap();
///
/// let message = stream.recv().await.unwrap();
/// assert_eq!(message.kind, EventKind::Write);
/// stream.finish().await.unwrap();
/// # });
/// ```
#[derive(Clone)]
pub struct BusStreamer {
    inner: Arc<Inner>,
}

impl BusStreamer {
    pub fn new(config: StreamerConfig, bus: Arc<dyn BusTransport>) -> Result<Self, StreamerError> {
        Self::with_shutdown(config, bus, ShutdownSignal::new())
    }

    /// Builds a streamer that stops when `shutdown` fires.
    pub fn with_shutdown(
        config: StreamerConfig,
        bus: Arc<dyn BusTransport>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, StreamerError> {
        config.validate()?;

        let registry = Arc::new(SubscriberRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone());
        let name = config.streamer.name.clone();

        info!(
            event = events::STREAMER_CREATED,
            component = COMPONENT,
            name = name.as_str(),
            sink_buffer = config.streamer.sink_buffer,
            send_timeout = %humantime::format_duration(config.bus.send_timeout),
            "bus streamer created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                name,
                config,
                bus,
                registry,
                dispatcher,
                shutdown,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.inner.registry
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.inner.shutdown
    }

    /// Stops the streamer. Parked streams end with `Aborted`.
    pub fn shutdown(&self, cause: impl Into<String>) {
        let cause = cause.into();
        if self.inner.shutdown.trigger(cause.as_str()) {
            info!(
                event = events::SHUTDOWN_TRIGGERED,
                component = COMPONENT,
                name = self.inner.name.as_str(),
                cause = cause.as_str(),
                "shutdown triggered"
            );
        }
    }

    /// Reads the bus until shutdown, a bus failure or inactivity.
    pub async fn run(&self) -> Result<(), StreamerError> {
        BusReader::new(
            self.inner.bus.as_ref(),
            &self.inner.dispatcher,
            &self.inner.shutdown,
            self.inner.config.bus.inactivity_timeout,
        )
        .run()
        .await
    }

    /// Delivers `event` to every matching subscription without touching the bus.
    pub async fn dispatch(&self, event: &Event) -> DispatchReport {
        self.inner.dispatcher.dispatch(event).await
    }

    /// Sends an event to the bus, then loops it back to local subscribers.
    ///
    /// The bus does not echo frames back to their sender, so the loop-back is the
    /// only way local subscribers see it.
    pub async fn publish(&self, request: PublishRequest) -> Result<PublishResponse, Status> {
        let event = Event::try_from(&request).map_err(|err| {
            warn!(
                event = events::PUBLISH_INVALID_REQUEST,
                component = COMPONENT,
                topic = request.topic.as_str(),
                origin = request.origin_address.as_str(),
                err = %err,
                "rejecting publish request"
            );
            Status::fail_with_code(Code::InvalidArgument, err.to_string())
        })?;

        let send_timeout = self.inner.config.bus.send_timeout;
        match timeout(send_timeout, self.inner.bus.send(&event)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(
                    event = events::PUBLISH_BUS_SEND_FAILED,
                    component = COMPONENT,
                    topic = %event.destination,
                    err = %err,
                    "bus send failed"
                );
                return Err(Status::fail_with_code(Code::Internal, err.to_string()));
            }
            Err(_) => {
                let limit = humantime::format_duration(send_timeout).to_string();
                warn!(
                    event = events::PUBLISH_BUS_SEND_TIMEOUT,
                    component = COMPONENT,
                    topic = %event.destination,
                    limit = limit.as_str(),
                    "bus send timed out"
                );
                return Err(Status::fail_with_code(
                    Code::Internal,
                    format!("bus send timed out after {limit}"),
                ));
            }
        }

        let report = self.inner.dispatcher.dispatch(&event).await;
        debug!(
            event = events::PUBLISH_OK,
            component = COMPONENT,
            topic = %event.destination,
            command = event.command.as_str(),
            delivered = report.delivered,
            failed = report.failed,
            "published event"
        );

        Ok(PublishResponse {})
    }

    /// Streams matching events into `sink` until `ctx` ends or the streamer stops.
    ///
    /// Empty `topics` subscribes to every topic. Returns `Ok` when the call ended,
    /// `Aborted` on shutdown and `InvalidArgument` for malformed topics. The
    /// subscription is removed before this returns.
    pub async fn subscribe(
        &self,
        request: SubscribeRequest,
        sink: Arc<dyn EventSink>,
        ctx: CallContext,
    ) -> Result<(), Status> {
        StreamLifecycle::new(
            self.inner.registry.clone(),
            self.inner.shutdown.clone(),
            sink.peer(),
        )
        .run(&request, sink, &ctx)
        .await
    }

    /// Runs [`BusStreamer::subscribe`] on a task and hands back the receiving end.
    ///
    /// The stream runs under a child of `ctx`; finishing or dropping it leaves
    /// `ctx` itself untouched.
    pub fn open_stream(&self, request: SubscribeRequest, ctx: CallContext) -> EventStream {
        self.open_labelled_stream(format!("stream/{}", Uuid::new_v4()), request, ctx)
    }

    pub(crate) fn open_labelled_stream(
        &self,
        peer: String,
        request: SubscribeRequest,
        ctx: CallContext,
    ) -> EventStream {
        let ctx = ctx.child();
        let (sink, receiver) = ChannelSink::new(peer, self.inner.config.streamer.sink_buffer);
        let streamer = self.clone();
        let call_ctx = ctx.clone();
        let task =
            tokio::spawn(async move { streamer.subscribe(request, Arc::new(sink), call_ctx).await });

        EventStream {
            receiver,
            ctx,
            task: Some(task),
        }
    }

    /// Collects matching events for a bounded window and returns them at once.
    ///
    /// Without a `for` window the call returns after the first message.
    pub async fn subscribe_unary(
        &self,
        request: SubscribeUnaryRequest,
        ctx: CallContext,
    ) -> Result<SubscribeUnaryResponse, Status> {
        unary::collect(self, request, ctx).await
    }
}

/// Receiving end of a subscription opened with [`BusStreamer::open_stream`].
///
/// Dropping the stream cancels its call, so the subscription is unregistered
/// even when [`EventStream::finish`] is never awaited.
pub struct EventStream {
    receiver: mpsc::Receiver<Arc<SubscribeResponse>>,
    ctx: CallContext,
    task: Option<JoinHandle<Result<(), Status>>>,
}

impl EventStream {
    /// Next delivered message, or `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<Arc<SubscribeResponse>> {
        self.receiver.recv().await
    }

    pub fn context(&self) -> &CallContext {
        &self.ctx
    }

    /// Ends the subscription and returns how the call finished.
    ///
    /// The channel is closed before cancelling, so a dispatch pass blocked on
    /// this stream's full channel lets go of the registry first.
    pub async fn finish(mut self) -> Result<(), Status> {
        self.receiver.close();
        self.ctx.cancel();

        let Some(task) = self.task.take() else {
            return Ok(());
        };
        task.await.map_err(|err| {
            Status::fail_with_code(Code::Internal, format!("stream task failed: {err}"))
        })?
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.receiver.close();
        self.ctx.cancel();
    }
}
