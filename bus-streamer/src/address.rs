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

//! Textual codec for bus addresses.
//!
//! A [`Topic`] is a KNX group address, the destination events are routed by.
//! An [`OriginAddress`] is a KNX individual address naming the device that sent a
//! telegram.

use std::fmt::{self, Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

/// Syntax errors produced while parsing addresses.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AddressError {
    #[error("empty address")]
    Empty,
    #[error("unexpected number of parts: {0}")]
    PartCount(usize),
    #[error("invalid number {part:?}: {source}")]
    InvalidNumber {
        part: String,
        #[source]
        source: ParseIntError,
    },
    #[error("{name} {value} out of range (max {max})")]
    OutOfRange {
        name: &'static str,
        value: u32,
        max: u32,
    },
}

fn parse_part(part: &str, name: &'static str, max: u32) -> Result<u32, AddressError> {
    let value = part
        .trim()
        .parse::<u32>()
        .map_err(|source| AddressError::InvalidNumber {
            part: part.to_string(),
            source,
        })?;
    if value > max {
        return Err(AddressError::OutOfRange { name, value, max });
    }
    Ok(value)
}

/// KNX group address, the routing key of the streamer.
///
/// Accepted forms are three-level `"main/middle/sub"`, two-level `"main/sub"` and a
/// raw 16-bit number. Formatting always yields the three-level form.
///
/// ```
/// use bus_streamer::Topic;
///
/// let topic: Topic = "1/2/3".parse().unwrap();
/// assert_eq!(topic.to_string(), "1/2/3");
/// assert_eq!("1/515".parse::<Topic>().unwrap(), topic);
/// assert!("32/0/0".parse::<Topic>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Topic(u16);

impl Topic {
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn new(main: u8, middle: u8, sub: u8) -> Result<Self, AddressError> {
        let main = parse_range(main.into(), "main group", 31)?;
        let middle = parse_range(middle.into(), "middle group", 7)?;
        Ok(Self(((main as u16) << 11) | ((middle as u16) << 8) | sub as u16))
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn main(self) -> u8 {
        (self.0 >> 11) as u8 & 0x1f
    }

    pub const fn middle(self) -> u8 {
        (self.0 >> 8) as u8 & 0x07
    }

    pub const fn sub(self) -> u8 {
        self.0 as u8
    }
}

fn parse_range(value: u32, name: &'static str, max: u32) -> Result<u32, AddressError> {
    if value > max {
        return Err(AddressError::OutOfRange { name, value, max });
    }
    Ok(value)
}

impl FromStr for Topic {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(AddressError::Empty);
        }

        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [main, middle, sub] => {
                let main = parse_part(main, "main group", 31)?;
                let middle = parse_part(middle, "middle group", 7)?;
                let sub = parse_part(sub, "sub group", 255)?;
                Ok(Self(((main << 11) | (middle << 8) | sub) as u16))
            }
            [main, sub] => {
                let main = parse_part(main, "main group", 31)?;
                let sub = parse_part(sub, "sub group", 2047)?;
                Ok(Self(((main << 11) | sub) as u16))
            }
            [raw] => Ok(Self(parse_part(raw, "group address", u16::MAX.into())? as u16)),
            _ => Err(AddressError::PartCount(parts.len())),
        }
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

/// KNX individual address of a bus device, written `"area.line.device"`.
///
/// ```
/// use bus_streamer::OriginAddress;
///
/// let origin: OriginAddress = "1.1.5".parse().unwrap();
/// assert_eq!(origin.to_string(), "1.1.5");
/// assert!("16.0.0".parse::<OriginAddress>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OriginAddress(u16);

impl OriginAddress {
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn area(self) -> u8 {
        (self.0 >> 12) as u8 & 0x0f
    }

    pub const fn line(self) -> u8 {
        (self.0 >> 8) as u8 & 0x0f
    }

    pub const fn device(self) -> u8 {
        self.0 as u8
    }
}

impl FromStr for OriginAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(AddressError::Empty);
        }

        let parts: Vec<&str> = s.split('.').collect();
        let [area, line, device] = parts.as_slice() else {
            return Err(AddressError::PartCount(parts.len()));
        };
        let area = parse_part(area, "area", 15)?;
        let line = parse_part(line, "line", 15)?;
        let device = parse_part(device, "device", 255)?;
        Ok(Self(((area << 12) | (line << 8) | device) as u16))
    }
}

impl Display for OriginAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.area(), self.line(), self.device())
    }
}
