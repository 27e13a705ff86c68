use mail_syntax::mail::{
    AddressList, FieldKind, FieldValue, HeaderField, Message, MessageId, Received,
};
use serde::Serialize;
use std::io::{self, Write};
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct MessageData<'a> {
    id: Option<&'a MessageId>,
    #[serde(with = "time::serde::timestamp::option")]
    date: Option<OffsetDateTime>,
    from: Option<&'a AddressList>,
    subject: Option<&'a str>,
    to: Option<&'a AddressList>,
    cc: Option<&'a AddressList>,
    received: Vec<&'a Received>,
    fields: Vec<FieldData<'a>>,
}

#[derive(Debug, Serialize)]
struct FieldData<'a> {
    name: &'a str,
    kind: FieldKind,
    value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a Message> for MessageData<'a> {
    fn from(message: &'a Message) -> Self {
        MessageData {
            id: message.message_id(),
            date: message.date().map(|date| date.0),
            from: message.from(),
            subject: message.subject(),
            to: message.to(),
            cc: message.cc(),
            received: message.received(),
            fields: message.fields().iter().map(FieldData::from).collect(),
        }
    }
}

impl<'a> From<&'a HeaderField> for FieldData<'a> {
    fn from(field: &'a HeaderField) -> Self {
        FieldData {
            name: field.name(),
            kind: field.kind(),
            value: field.value(),
            error: field.error().map(ToString::to_string),
        }
    }
}

/// Write one line per field, showing how it was understood
pub fn summary(message: &Message, out: &mut impl Write) -> io::Result<()> {
    for field in message.fields() {
        if field.kind() == FieldKind::Invalid {
            writeln!(out, "invalid line: {:?}", field.value())?;
            continue;
        }

        let name = field.name();

        match field.parsed() {
            FieldValue::Addresses(list) => {
                writeln!(out, "{name}: {} address(es)", list.addresses().count())?;
                for mailbox in list.formatted() {
                    writeln!(out, "    {mailbox}")?;
                }
                for group in list.group_names() {
                    writeln!(out, "    group {group:?}")?;
                }
            }
            FieldValue::DateTime(date) => writeln!(out, "{name}: {date}")?,
            FieldValue::MessageId(id) => writeln!(out, "{name}: {id}")?,
            FieldValue::MessageIds(ids) => writeln!(out, "{name}: {ids}")?,
            FieldValue::Received(received) => {
                writeln!(out, "{name}: {}", received.info)?;
                match received.date_time {
                    Some(ref date) => writeln!(out, "    at {date}")?,
                    None => writeln!(out, "    at unknown time")?,
                }
            }
            FieldValue::ReturnPath(path) => writeln!(out, "{name}: {path}")?,
            FieldValue::Keywords(keywords) => writeln!(out, "{name}: {}", keywords.join(", "))?,
            FieldValue::Unstructured(text) => writeln!(out, "{name}: {text}")?,
            FieldValue::Malformed(error) =>
                writeln!(out, "{name}: malformed ({error}): {:?}", field.value())?,
        }
    }

    writeln!(out, "body: {} bytes", message.body().len())
}
