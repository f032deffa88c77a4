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

//! # bus-streamer
//!
//! `bus-streamer` fans KNX group telegrams out to many concurrent subscribers.
//!
//! Events enter from two sides: the bus reader ([`BusStreamer::run`]) and the publish
//! path ([`BusStreamer::publish`]), which forwards to the bus and loops the event back
//! because the bus never echoes a sender's own frames. Both feed one dispatcher that
//! delivers to every subscription whose topic and kind filter match.
//!
//! Subscriptions come in two shapes:
//!
//! - streaming, via [`BusStreamer::subscribe`] with a caller-provided [`EventSink`], or
//!   [`BusStreamer::open_stream`] for a channel-backed [`EventStream`];
//! - unary, via [`BusStreamer::subscribe_unary`], which collects for a `for` window
//!   (or until the first message) and returns everything at once.
//!
//! A subscription with no topics is a sniffer and sees every topic.
//!
//! The physical bus is reached only through [`BusTransport`]. Errors from its
//! `receive` side stop the reader and shut the streamer down; parked streams then end
//! with [`Code::Aborted`].
//!
//! ```
//! use async_trait::async_trait;
//! use bus_streamer::{
//!     BusError, BusStreamer, BusTransport, CallContext, Code, Event, EventKind,
//!     StreamerConfig, SubscribeRequest, SubscribeUnaryRequest,
//! };
//! use std::sync::Arc;
//!
//! struct ClosedBus;
//!
//! #[async_trait]
//! impl BusTransport for ClosedBus {
//!     async fn send(&self, _event: &Event) -> Result<(), BusError> {
//!         Err(BusError::Closed)
//!     }
//!
//!     async fn receive(&self) -> Result<Event, BusError> {
//!         Err(BusError::Closed)
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let streamer = BusStreamer::new(StreamerConfig::default(), Arc::new(ClosedBus)).unwrap();
//!
//! // A collection window that sees no traffic still succeeds.
//! let response = streamer
//!     .subscribe_unary(
//!         SubscribeUnaryRequest {
//!             request: SubscribeRequest::topics(["1/2/3"], EventKind::Unspecified),
//!             r#for: "20ms".to_string(),
//!         },
//!         CallContext::new(),
//!     )
//!     .await
//!     .unwrap();
//! assert!(response.messages.is_empty());
//!
//! // A failed bus stops the reader and aborts the remaining calls.
//! assert!(streamer.run().await.is_err());
//! let status = streamer
//!     .subscribe_unary(SubscribeUnaryRequest::default(), CallContext::new())
//!     .await
//!     .unwrap_err();
//! assert_eq!(status.code(), Code::Internal);
//! # });
//! ```

mod address;
pub use address::{AddressError, OriginAddress, Topic};

mod event;
pub use event::{Command, Event, EventKind, UnknownEventKind};

mod messages;
pub use messages::{
    PublishRequest, PublishRequestError, PublishResponse, SubscribeRequest, SubscribeResponse,
    SubscribeUnaryRequest, SubscribeUnaryResponse,
};

mod status;
pub use status::{Code, Status};

mod context;
pub use context::{CallContext, CallEnd, ShutdownSignal};

mod sink;
pub use sink::{ChannelSink, EventSink, SinkError};

mod transport;
pub use transport::{BusError, BusTransport};

mod config;
pub use config::{BusSection, ConfigError, LogSection, StreamerConfig, StreamerSection};

mod control_plane;
pub use control_plane::subscriber_registry::{Subscriber, SubscriberRegistry};

mod data_plane;
pub use data_plane::dispatcher::DispatchReport;

mod observability;

mod streamer;
pub use streamer::{BusStreamer, EventStream, StreamerError};

mod unary;
