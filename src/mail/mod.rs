// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Implementation of [RFC 5322](
//! https://datatracker.ietf.org/doc/html/rfc5322): Internet Message Format,
//! accepting the obsolete syntax of its section 4

pub use self::{
    address::{Address, AddressList, AddressOrGroup, Group, Mailbox},
    date::DateTime,
    encode::EncodeOptions,
    field::{FieldKind, FieldValue, HeaderField},
    id::{MessageId, MessageIdList},
    trace::{Path, Received},
};

pub mod address;
pub mod date;
pub mod encode;
pub mod field;
pub mod fold;
pub mod id;
pub mod syntax;
pub mod token;
pub mod trace;

/// A message split into header fields and body
///
/// Field values are parsed when first asked for. Malformed values never
/// cause an error: typed accessors return `None` for them, while
/// [`Message::field`] still gives access to their text.
#[derive(Clone, Debug)]
pub struct Message {
    source: String,
    fields: Vec<HeaderField>,
    /// Offset of the body in `source`
    body: usize,
}

impl Message {
    pub fn parse(source: impl Into<String>) -> Message {
        let source = source.into();
        let (header, body) = fold::separate_message(&source);
        let fields = fold::logical_lines(header).map(HeaderField::new).collect::<Vec<_>>();
        let body = source.len() - body.len();

        log::trace!("parsed {} header fields, {} bytes of body", fields.len(), source.len() - body);

        Message { source, fields, body }
    }

    /// Text this message was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn body(&self) -> &str {
        &self.source[self.body..]
    }

    /// All header fields in order of appearance, including invalid lines
    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    /// First field called `name`, ignoring ASCII case
    pub fn field(&self, name: &str) -> Option<&HeaderField> {
        self.fields.iter().find(|field| field.is_named(name))
    }

    /// All fields called `name`, ignoring ASCII case
    pub fn fields_named<'a, 'b>(&'a self, name: &'b str)
    -> impl Iterator<Item = &'a HeaderField> + 'b
    where
        'a: 'b,
    {
        self.fields.iter().filter(move |field| field.is_named(name))
    }

    fn first(&self, kind: FieldKind) -> Option<&HeaderField> {
        self.fields.iter().find(|field| field.kind() == kind)
    }

    fn addresses(&self, kind: FieldKind) -> Option<&AddressList> {
        self.first(kind)?.as_addresses()
    }

    pub fn from(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::From)
    }

    pub fn sender(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::Sender)
    }

    pub fn reply_to(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::ReplyTo)
    }

    pub fn to(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::To)
    }

    pub fn cc(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::Cc)
    }

    pub fn bcc(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::Bcc)
    }

    pub fn resent_from(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::ResentFrom)
    }

    pub fn resent_sender(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::ResentSender)
    }

    pub fn resent_to(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::ResentTo)
    }

    pub fn resent_cc(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::ResentCc)
    }

    pub fn resent_bcc(&self) -> Option<&AddressList> {
        self.addresses(FieldKind::ResentBcc)
    }

    pub fn date(&self) -> Option<&DateTime> {
        self.first(FieldKind::Date)?.as_date_time()
    }

    pub fn resent_date(&self) -> Option<&DateTime> {
        self.first(FieldKind::ResentDate)?.as_date_time()
    }

    pub fn message_id(&self) -> Option<&MessageId> {
        self.first(FieldKind::MessageId)?.as_message_id()
    }

    pub fn resent_message_id(&self) -> Option<&MessageId> {
        self.first(FieldKind::ResentMessageId)?.as_message_id()
    }

    pub fn in_reply_to(&self) -> Option<&MessageIdList> {
        self.first(FieldKind::InReplyTo)?.as_message_ids()
    }

    pub fn references(&self) -> Option<&MessageIdList> {
        self.first(FieldKind::References)?.as_message_ids()
    }

    pub fn subject(&self) -> Option<&str> {
        self.first(FieldKind::Subject)?.as_text()
    }

    pub fn comments(&self) -> Option<&str> {
        self.first(FieldKind::Comments)?.as_text()
    }

    pub fn keywords(&self) -> Option<&[String]> {
        self.first(FieldKind::Keywords)?.as_keywords()
    }

    /// All `Received` fields, most recent (topmost) first
    pub fn received(&self) -> Vec<&Received> {
        self.fields.iter()
            .filter(|field| field.kind() == FieldKind::Received)
            .filter_map(HeaderField::as_received)
            .collect()
    }

    pub fn return_path(&self) -> Option<&Path> {
        self.first(FieldKind::ReturnPath)?.as_return_path()
    }

    /// This message as text, with structured fields written out from their
    /// parsed values
    pub fn encoded(&self) -> String {
        self.encoded_with(&EncodeOptions::default())
    }

    pub fn encoded_with(&self, options: &EncodeOptions) -> String {
        encode::message(self, options)
    }
}

impl std::str::FromStr for Message {
    type Err = std::convert::Infallible;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Ok(Message::parse(source))
    }
}
