// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Header fields and their lazily parsed values

use serde::Serialize;
use std::sync::OnceLock;

use crate::{syntax::*, util};
use super::{
    address::{address_list, AddressList},
    date::{date_time, DateTime},
    fold::{self, Unfolded},
    id::{msg_id, msg_id_list, MessageId, MessageIdList},
    syntax::keywords,
    trace::{path, received, Path, Received},
};

/// Fields known to this crate, [RFC 5322 section 3.6](
/// https://datatracker.ietf.org/doc/html/rfc5322#section-3.6)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    Date,
    From,
    Sender,
    ReplyTo,
    To,
    Cc,
    Bcc,
    MessageId,
    InReplyTo,
    References,
    Subject,
    Comments,
    Keywords,
    ResentDate,
    ResentFrom,
    ResentSender,
    ResentTo,
    ResentCc,
    ResentBcc,
    ResentMessageId,
    ReturnPath,
    Received,
    /// Any other field
    Optional,
    /// A line which is not a field at all
    Invalid,
}

static FIELD_NAMES: &[(&str, FieldKind)] = &[
    ("Date", FieldKind::Date),
    ("From", FieldKind::From),
    ("Sender", FieldKind::Sender),
    ("Reply-To", FieldKind::ReplyTo),
    ("To", FieldKind::To),
    ("Cc", FieldKind::Cc),
    ("Bcc", FieldKind::Bcc),
    ("Message-ID", FieldKind::MessageId),
    ("In-Reply-To", FieldKind::InReplyTo),
    ("References", FieldKind::References),
    ("Subject", FieldKind::Subject),
    ("Comments", FieldKind::Comments),
    ("Keywords", FieldKind::Keywords),
    ("Resent-Date", FieldKind::ResentDate),
    ("Resent-From", FieldKind::ResentFrom),
    ("Resent-Sender", FieldKind::ResentSender),
    ("Resent-To", FieldKind::ResentTo),
    ("Resent-Cc", FieldKind::ResentCc),
    ("Resent-Bcc", FieldKind::ResentBcc),
    ("Resent-Message-ID", FieldKind::ResentMessageId),
    ("Return-Path", FieldKind::ReturnPath),
    ("Received", FieldKind::Received),
];

impl FieldKind {
    /// Kind of a field called `name`, ignoring ASCII case
    pub fn from_name(name: &str) -> FieldKind {
        FIELD_NAMES.iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map_or(FieldKind::Optional, |&(_, kind)| kind)
    }

    /// Name as spelled in RFC 5322
    pub fn name(self) -> Option<&'static str> {
        FIELD_NAMES.iter()
            .find(|(_, kind)| *kind == self)
            .map(|&(name, _)| name)
    }

    fn is_address(self) -> bool {
        matches!(self,
            FieldKind::From | FieldKind::Sender | FieldKind::ReplyTo | FieldKind::To
            | FieldKind::Cc | FieldKind::Bcc | FieldKind::ResentFrom | FieldKind::ResentSender
            | FieldKind::ResentTo | FieldKind::ResentCc | FieldKind::ResentBcc)
    }
}

/// Parsed value of a field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Addresses(AddressList),
    DateTime(DateTime),
    MessageId(MessageId),
    MessageIds(MessageIdList),
    Received(Received),
    ReturnPath(Path),
    Keywords(Vec<String>),
    /// Text of an unstructured or unknown field, as it appeared
    Unstructured(String),
    /// Value of a structured field which did not match its grammar
    Malformed(Located<SyntaxError>),
}

#[derive(Clone, Debug)]
pub struct HeaderField {
    name: String,
    value: String,
    kind: FieldKind,
    line: Unfolded,
    parsed: OnceLock<FieldValue>,
}

impl HeaderField {
    /// Create a field from a logical line, see [`fold::logical_lines`]
    pub fn new(line: &str) -> HeaderField {
        let line = fold::unfold(line);

        let (name, value, kind) = match fold::split_field(&line.text) {
            Some((name, value)) => (name.to_string(), value.to_string(), FieldKind::from_name(name)),
            None => {
                log::trace!("not a header field: {:?}", util::escaped(&line.text));
                (String::new(), line.text.clone(), FieldKind::Invalid)
            }
        };

        if kind == FieldKind::Optional {
            log::trace!("unrecognized header {name}: {:?}", util::escaped(&value));
        }

        HeaderField {
            name,
            value,
            kind,
            line,
            parsed: OnceLock::new(),
        }
    }

    /// Field name as it appeared, empty for invalid lines
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unfolded value, leading white space removed
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether this field is called `name`, ignoring ASCII case
    pub fn is_named(&self, name: &str) -> bool {
        self.kind != FieldKind::Invalid && self.name.eq_ignore_ascii_case(name)
    }

    /// The line exactly as it appeared in the source, without its final line
    /// break
    pub fn raw(&self) -> String {
        self.line.refold()
    }

    /// Value parsed according to this field's kind
    ///
    /// Parsing happens on first access and is cached.
    pub fn parsed(&self) -> &FieldValue {
        self.parsed.get_or_init(|| parse_value(self.kind, &self.name, &self.value))
    }

    /// Why the value of this field could not be parsed
    pub fn error(&self) -> Option<&Located<SyntaxError>> {
        match self.parsed() {
            FieldValue::Malformed(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_addresses(&self) -> Option<&AddressList> {
        match self.parsed() {
            FieldValue::Addresses(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<&DateTime> {
        match self.parsed() {
            FieldValue::DateTime(date) => Some(date),
            _ => None,
        }
    }

    pub fn as_message_id(&self) -> Option<&MessageId> {
        match self.parsed() {
            FieldValue::MessageId(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_message_ids(&self) -> Option<&MessageIdList> {
        match self.parsed() {
            FieldValue::MessageIds(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_received(&self) -> Option<&Received> {
        match self.parsed() {
            FieldValue::Received(received) => Some(received),
            _ => None,
        }
    }

    pub fn as_return_path(&self) -> Option<&Path> {
        match self.parsed() {
            FieldValue::ReturnPath(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_keywords(&self) -> Option<&[String]> {
        match self.parsed() {
            FieldValue::Keywords(keywords) => Some(keywords),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self.parsed() {
            FieldValue::Unstructured(text) => Some(text),
            _ => None,
        }
    }
}

/// Run `f`, requiring that it consumes all of `buf`
fn whole<'a, T>(buf: &mut Buffer<'a>, f: impl FnOnce(&mut Buffer<'a>) -> Result<T>) -> Result<T> {
    let value = f(buf)?;
    buf.expect_empty()?;
    Ok(value)
}

fn parse_value(kind: FieldKind, name: &str, value: &str) -> FieldValue {
    let mut buf = Buffer::new(value);

    let result = match kind {
        _ if kind.is_address() => whole(&mut buf, address_list).map(FieldValue::Addresses),
        FieldKind::Date | FieldKind::ResentDate => date_time(&mut buf).map(|date| {
            if !buf.is_empty() {
                log::debug!("ignoring text after date in {name}: {:?}", util::escaped(buf.rest()));
            }
            FieldValue::DateTime(date)
        }),
        FieldKind::MessageId | FieldKind::ResentMessageId =>
            whole(&mut buf, msg_id).map(FieldValue::MessageId),
        FieldKind::InReplyTo | FieldKind::References =>
            whole(&mut buf, msg_id_list).map(FieldValue::MessageIds),
        FieldKind::Keywords => whole(&mut buf, keywords).map(FieldValue::Keywords),
        FieldKind::ReturnPath => whole(&mut buf, path).map(FieldValue::ReturnPath),
        FieldKind::Received => received(&mut buf).map(FieldValue::Received),
        _ => Ok(FieldValue::Unstructured(value.to_string())),
    };

    result.unwrap_or_else(|error| {
        log::debug!("malformed {name} field {:?}: {error}", util::escaped(value));
        FieldValue::Malformed(error)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_ignore_case() {
        assert_eq!(FieldKind::from_name("message-id"), FieldKind::MessageId);
        assert_eq!(FieldKind::from_name("RESENT-CC"), FieldKind::ResentCc);
        assert_eq!(FieldKind::from_name("X-Mailer"), FieldKind::Optional);
        assert_eq!(FieldKind::ReplyTo.name(), Some("Reply-To"));
        assert_eq!(FieldKind::Optional.name(), None);
    }

    #[test]
    fn lazily_parsed_values() {
        let field = HeaderField::new("To: Mary Smith\r\n <mary@example.net>");
        assert_eq!(field.kind(), FieldKind::To);
        assert_eq!(field.value(), "Mary Smith <mary@example.net>");
        assert_eq!(field.raw(), "To: Mary Smith\r\n <mary@example.net>");
        let list = field.as_addresses().unwrap();
        assert_eq!(list.formatted(), ["Mary Smith <mary@example.net>"]);
        assert!(std::ptr::eq(list, field.as_addresses().unwrap()));
        assert!(field.as_date_time().is_none());
    }

    #[test]
    fn malformed_values() {
        let field = HeaderField::new("From: <broken@");
        assert!(field.as_addresses().is_none());
        let error = field.error().unwrap();
        assert_eq!(error.at.line, 1);
        assert_eq!(field.value(), "<broken@");

        let field = HeaderField::new("Message-ID:");
        assert!(field.error().is_some());

        let field = HeaderField::new("Date: 31 Feb 2003 10:00 +0000");
        assert!(matches!(field.parsed(), FieldValue::Malformed(_)));
    }

    #[test]
    fn empty_values() {
        let field = HeaderField::new("Bcc:");
        assert!(field.as_addresses().unwrap().is_empty());
        let field = HeaderField::new("References: ");
        assert!(field.as_message_ids().unwrap().is_empty());
    }

    #[test]
    fn trailing_text_after_date() {
        let field = HeaderField::new("Date: Tue, 1 Jul 2003 10:52:37 +0200 (CEST) junk");
        assert!(field.as_date_time().is_some());
    }

    #[test]
    fn invalid_lines() {
        let field = HeaderField::new("this is not a field");
        assert_eq!(field.kind(), FieldKind::Invalid);
        assert_eq!(field.name(), "");
        assert!(!field.is_named(""));
        assert_eq!(field.as_text(), Some("this is not a field"));
    }

    #[test]
    fn unstructured_values() {
        let field = HeaderField::new("Subject: Re: Saying Hello ");
        assert_eq!(field.as_text(), Some("Re: Saying Hello "));
        let field = HeaderField::new("Keywords: hello, \"big world\"");
        assert_eq!(field.as_keywords().unwrap(), ["hello", "big world"]);
    }
}
