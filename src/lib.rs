// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Parsing of Internet message header fields
//!
//! [`Message::parse`] splits a message into its header fields and body.
//! Values of known fields (addresses, dates, message identifiers, trace
//! fields) are parsed on first access, accepting the obsolete syntax found
//! in real mail, and can be written back with [`Message::encoded`].

pub mod mail;
pub mod syntax;

mod util;

pub use self::mail::{EncodeOptions, FieldKind, FieldValue, HeaderField, Message};
