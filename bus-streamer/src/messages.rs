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

//! Request and response messages of the streamer RPC surface, plus their mapping
//! onto [`Event`].

use crate::address::{AddressError, OriginAddress, Topic};
use crate::event::{Command, Event, EventKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct PublishRequest {
    /// Destination group address, `"main/middle/sub"`.
    pub topic: String,
    /// Optional individual address, `"area.line.device"`. Empty means unset.
    pub origin_address: String,
    pub kind: EventKind,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PublishResponse {}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct SubscribeRequest {
    /// Topics to receive. Empty subscribes to every topic.
    pub topics: Vec<String>,
    pub kind: EventKind,
}

impl SubscribeRequest {
    pub fn sniffer(kind: EventKind) -> Self {
        Self {
            topics: Vec::new(),
            kind,
        }
    }

    pub fn topics<I, S>(topics: I, kind: EventKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
            kind,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SubscribeResponse {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_address: Option<String>,
    pub kind: EventKind,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct SubscribeUnaryRequest {
    pub request: SubscribeRequest,
    /// Collection window such as `"500ms"`. Empty returns after the first message.
    #[serde(rename = "for")]
    pub r#for: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SubscribeUnaryResponse {
    pub messages: Vec<SubscribeResponse>,
}

/// Why a [`PublishRequest`] could not become an [`Event`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PublishRequestError {
    #[error("parse topic: {0}")]
    Topic(#[source] AddressError),
    #[error("parse origin address: {0}")]
    OriginAddress(#[source] AddressError),
}

impl TryFrom<&PublishRequest> for Event {
    type Error = PublishRequestError;

    fn try_from(request: &PublishRequest) -> Result<Self, Self::Error> {
        let destination: Topic = request
            .topic
            .parse()
            .map_err(PublishRequestError::Topic)?;

        let mut event = Event::new(
            destination,
            Command::from_requested(request.kind),
            request.payload.clone(),
        );

        if request.origin_address.is_empty() {
            return Ok(event);
        }

        let origin: OriginAddress = request
            .origin_address
            .parse()
            .map_err(PublishRequestError::OriginAddress)?;
        event.origin = Some(origin);

        Ok(event)
    }
}

impl From<&Event> for SubscribeResponse {
    fn from(event: &Event) -> Self {
        Self {
            topic: event.destination.to_string(),
            origin_address: event.origin.map(|origin| origin.to_string()),
            kind: event.command.into(),
            payload: event.payload.clone(),
        }
    }
}

impl From<&Event> for PublishRequest {
    fn from(event: &Event) -> Self {
        Self {
            topic: event.destination.to_string(),
            origin_address: event
                .origin
                .map(|origin| origin.to_string())
                .unwrap_or_default(),
            kind: event.command.into(),
            payload: event.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PublishRequest, PublishRequestError, SubscribeResponse, SubscribeUnaryRequest};
    use crate::event::{Command, Event, EventKind};

    fn publish(topic: &str, origin: &str, kind: EventKind) -> PublishRequest {
        PublishRequest {
            topic: topic.to_string(),
            origin_address: origin.to_string(),
            kind,
            payload: vec![0x01],
        }
    }

    #[test]
    fn publish_request_without_origin_becomes_event() {
        let event = Event::try_from(&publish("1/2/3", "", EventKind::Read)).unwrap();

        assert_eq!(event.destination.to_string(), "1/2/3");
        assert_eq!(event.origin, None);
        assert_eq!(event.command, Command::Read);
        assert_eq!(event.payload, vec![0x01]);
    }

    #[test]
    fn publish_request_kind_unspecified_writes() {
        let event = Event::try_from(&publish("1/2/3", "1.1.5", EventKind::Unspecified)).unwrap();

        assert_eq!(event.command, Command::Write);
        assert_eq!(event.origin.map(|o| o.to_string()), Some("1.1.5".into()));
    }

    #[test]
    fn publish_request_with_bad_addresses_names_the_field() {
        let bad_topic = Event::try_from(&publish("1/2", "", EventKind::Write));
        assert!(bad_topic.is_ok());

        let bad_topic = Event::try_from(&publish("x/2/3", "", EventKind::Write)).unwrap_err();
        assert!(matches!(bad_topic, PublishRequestError::Topic(_)));
        assert!(bad_topic.to_string().starts_with("parse topic:"));

        let bad_origin = Event::try_from(&publish("1/2/3", "1/1/5", EventKind::Write)).unwrap_err();
        assert!(matches!(bad_origin, PublishRequestError::OriginAddress(_)));
    }

    #[test]
    fn subscribe_response_mirrors_the_event() {
        let event = Event::try_from(&publish("4/5/6", "1.1.5", EventKind::Response)).unwrap();
        let response = SubscribeResponse::from(&event);

        assert_eq!(response.topic, "4/5/6");
        assert_eq!(response.origin_address.as_deref(), Some("1.1.5"));
        assert_eq!(response.kind, EventKind::Response);
        assert_eq!(response.payload, vec![0x01]);
    }

    #[test]
    fn unary_request_uses_for_on_the_wire() {
        let request: SubscribeUnaryRequest = serde_json::from_str(
            r#"{"request":{"topics":["1/2/3"],"kind":"write"},"for":"500ms"}"#,
        )
        .unwrap();

        assert_eq!(request.r#for, "500ms");
        assert_eq!(request.request.kind, EventKind::Write);
        assert_eq!(request.request.topics, vec!["1/2/3".to_string()]);
    }
}
