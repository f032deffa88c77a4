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

//! Fan-out of one event to every matching subscription.

use crate::control_plane::subscriber_registry::{Subscriber, SubscriberRegistry};
use crate::event::Event;
use crate::messages::SubscribeResponse;
use crate::observability::events;
use crate::observability::fields::FormattedEventFields;
use std::sync::Arc;
use tracing::{debug, warn, Level};

const COMPONENT: &str = "dispatcher";

/// Outcome of one dispatch pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone, Copy)]
enum Phase {
    Topic,
    Sniffer,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Topic => "topic",
            Phase::Sniffer => "sniffer",
        }
    }
}

pub(crate) struct Dispatcher {
    registry: Arc<SubscriberRegistry>,
}

impl Dispatcher {
    pub(crate) fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    /// Delivers `event` to topic subscribers first, then to sniffers.
    ///
    /// Each phase holds its registry lock for the whole pass, so a handle that
    /// finished unregistering never receives a later event. Failed sends are logged
    /// and skipped; the handle stays registered.
    pub(crate) async fn dispatch(&self, event: &Event) -> DispatchReport {
        let message = Arc::new(SubscribeResponse::from(event));
        let mut event_fields =
            tracing::enabled!(Level::DEBUG).then(|| FormattedEventFields::from_event(event));
        let mut report = DispatchReport::default();

        if let Some(fields) = event_fields.as_ref() {
            debug!(
                event = events::DISPATCH_START,
                component = COMPONENT,
                topic = fields.topic.as_str(),
                origin = fields.origin.as_str(),
                command = fields.command,
                payload_len = fields.payload_len,
                "dispatching event"
            );
        }

        {
            let by_topic = self.registry.lock_topics().await;
            if let Some(subscribers) = by_topic.get(&event.destination) {
                deliver(
                    Phase::Topic,
                    subscribers.iter(),
                    event,
                    &message,
                    &mut event_fields,
                    &mut report,
                )
                .await;
            }
        }

        {
            let sniffers = self.registry.lock_sniffers().await;
            deliver(
                Phase::Sniffer,
                sniffers.iter(),
                event,
                &message,
                &mut event_fields,
                &mut report,
            )
            .await;
        }

        if let Some(fields) = event_fields.as_ref() {
            debug!(
                event = events::DISPATCH_DONE,
                component = COMPONENT,
                topic = fields.topic.as_str(),
                delivered = report.delivered,
                failed = report.failed,
                "dispatch finished"
            );
        }

        report
    }
}

async fn deliver<'a>(
    phase: Phase,
    subscribers: impl Iterator<Item = &'a Arc<Subscriber>>,
    event: &Event,
    message: &Arc<SubscribeResponse>,
    event_fields: &mut Option<FormattedEventFields>,
    report: &mut DispatchReport,
) {
    for subscriber in subscribers {
        if !subscriber.kind().matches(event.command) {
            continue;
        }

        match subscriber.sink().send(message.clone()).await {
            Ok(()) => report.delivered += 1,
            Err(err) => {
                report.failed += 1;
                if tracing::enabled!(Level::WARN) {
                    let fields =
                        event_fields.get_or_insert_with(|| FormattedEventFields::from_event(event));
                    warn!(
                        event = events::DISPATCH_SEND_FAILED,
                        component = COMPONENT,
                        phase = phase.as_str(),
                        peer = subscriber.peer(),
                        topic = fields.topic.as_str(),
                        command = fields.command,
                        err = %err,
                        "unable to deliver event to subscriber"
                    );
                }
            }
        }
    }
}
