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

//! Bus event model shared by the dispatcher, the publish path and bus transports.

use crate::address::{OriginAddress, Topic};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Event kind as seen on the RPC surface.
///
/// `Unspecified` never describes a real telegram. Used as a subscription filter it
/// matches every [`Command`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Unspecified,
    Read,
    Response,
    Write,
}

impl EventKind {
    /// Returns `true` when a subscriber filtering on `self` wants `command`.
    pub fn matches(self, command: Command) -> bool {
        match self {
            EventKind::Unspecified => true,
            kind => kind == EventKind::from(command),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Unspecified => "unspecified",
            EventKind::Read => "read",
            EventKind::Response => "response",
            EventKind::Write => "write",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unsupported event kind {0:?}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unspecified" => Ok(EventKind::Unspecified),
            "read" => Ok(EventKind::Read),
            "response" => Ok(EventKind::Response),
            "write" => Ok(EventKind::Write),
            _ => Err(UnknownEventKind(s.to_string())),
        }
    }
}

/// Group service carried by a real telegram.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Read,
    Response,
    Write,
}

impl Command {
    /// Resolves a requested kind into the command to put on the bus.
    ///
    /// Publishing with `Unspecified` writes.
    pub fn from_requested(kind: EventKind) -> Self {
        match kind {
            EventKind::Read => Command::Read,
            EventKind::Response => Command::Response,
            EventKind::Write | EventKind::Unspecified => Command::Write,
        }
    }

    pub fn as_str(self) -> &'static str {
        EventKind::from(self).as_str()
    }
}

impl From<Command> for EventKind {
    fn from(command: Command) -> Self {
        match command {
            Command::Read => EventKind::Read,
            Command::Response => EventKind::Response,
            Command::Write => EventKind::Write,
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One group telegram, either read from the bus or published locally.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    pub destination: Topic,
    pub origin: Option<OriginAddress>,
    pub command: Command,
    pub payload: Vec<u8>,
}

impl Event {
    pub fn new(destination: Topic, command: Command, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            destination,
            origin: None,
            command,
            payload: payload.into(),
        }
    }

    pub fn with_origin(mut self, origin: OriginAddress) -> Self {
        self.origin = Some(origin);
        self
    }
}
