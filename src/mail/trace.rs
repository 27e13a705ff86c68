// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Trace fields, [RFC 5322 section 3.6.7](
//! https://datatracker.ietf.org/doc/html/rfc5322#section-3.6.7)

use serde::Serialize;
use std::fmt;

use crate::syntax::*;
use super::{
    address::{addr_spec, angle_addr, Address},
    date::{date_time, DateTime},
    syntax::cfws,
    token::{tokens, Token},
};

/// Value of a `Received` field
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Received {
    /// Everything before the date, white space collapsed
    pub info: String,
    pub date_time: Option<DateTime>,
}

impl fmt::Display for Received {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.date_time {
            Some(ref date) => write!(f, "{}; {}", self.info, date),
            None => f.write_str(&self.info),
        }
    }
}

/// Parse the rest of `buf` as a `Received` value
///
/// This never fails: a date which can't be read is logged and left out.
pub fn received(buf: &mut Buffer) -> Result<Received> {
    // received       = "Received:" *received-token ";" date-time CRLF
    // received-token = word / angle-addr / addr-spec / domain
    let value = buf.take(buf.len());

    let semicolon = tokens(value)
        .filter(|(_, token)| *token == Token::Special(';'))
        .last()
        .map(|(offset, _)| offset);

    let Some(semicolon) = semicolon else {
        log::trace!("received field without a date");
        return Ok(Received { info: collapse(value), date_time: None });
    };

    let mut date = Buffer::new(&value[semicolon + 1..]);
    let date_time = match date_time(&mut date) {
        Ok(parsed) => {
            if !date.is_empty() {
                log::debug!("ignoring text after date in received field: {:?}", date.rest());
            }
            Some(parsed)
        }
        Err(err) => {
            log::debug!("invalid date in received field: {err}");
            None
        }
    };

    Ok(Received {
        info: collapse(&value[..semicolon]),
        date_time,
    })
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Value of a `Return-Path` field
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Path {
    /// `<>`, used for bounces
    Null,
    Address(Address),
}

impl Path {
    pub fn address(&self) -> Option<&Address> {
        match self {
            Path::Null => None,
            Path::Address(address) => Some(address),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Path::Null => f.write_str("<>"),
            Path::Address(address) => write!(f, "<{address}>"),
        }
    }
}

pub fn path(buf: &mut Buffer) -> Result<Path> {
    // path = angle-addr / ([CFWS] "<" [CFWS] ">" [CFWS])
    angle_addr(buf)
        .map(|(_, address)| Path::Address(address))
        .or_else(|_| buf.atomic(|buf| {
            buf.maybe(cfws);
            buf.expect("<")?;
            buf.maybe(cfws);
            buf.expect(">")?;
            buf.maybe(cfws);
            Ok(Path::Null)
        }))
        .or_else(|_| addr_spec(buf).map(Path::Address))
}
