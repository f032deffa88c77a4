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

//! Canonical structured field keys and value-format helpers.

use crate::event::Event;

pub const NONE: &str = "none";
pub const REASON_SHUTDOWN: &str = "shutdown";
pub const REASON_CALL_CANCELED: &str = "call_canceled";
pub const REASON_DEADLINE_EXCEEDED: &str = "deadline_exceeded";

/// Preformatted event fields, built only when the log level needs them.
pub(crate) struct FormattedEventFields {
    pub(crate) topic: String,
    pub(crate) origin: String,
    pub(crate) command: &'static str,
    pub(crate) payload_len: usize,
}

impl FormattedEventFields {
    pub(crate) fn from_event(event: &Event) -> Self {
        Self {
            topic: event.destination.to_string(),
            origin: format_origin(event),
            command: event.command.as_str(),
            payload_len: event.payload.len(),
        }
    }
}

pub fn format_origin(event: &Event) -> String {
    event
        .origin
        .map(|origin| origin.to_string())
        .unwrap_or_else(|| NONE.to_string())
}

/// Renders a topic list the way it is logged, e.g. `[1/2/3, 4/5/6]`.
pub fn format_topics<T: std::fmt::Display>(topics: &[T]) -> String {
    let joined = topics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}
