// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Writing messages back as text

use std::borrow::Cow;

use crate::syntax::is_wsp;
use super::{
    field::{FieldKind, FieldValue, HeaderField},
    token,
    Message,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Lines longer than this are folded where possible
    pub line_width: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        // RFC 5322 section 2.1.1 recommends 78 characters
        EncodeOptions { line_width: 78 }
    }
}

pub fn message(message: &Message, options: &EncodeOptions) -> String {
    let mut out = String::with_capacity(message.source().len() + 64);

    for field in message.fields() {
        if field.kind() == FieldKind::Invalid {
            out.push_str(&field.raw());
            out.push_str("\r\n");
        } else {
            let line = format!("{}: {}", field.name(), value(field));
            fold_line(&line, options.line_width, &mut out);
        }
    }

    out.push_str("\r\n");
    out.push_str(message.body());
    out
}

/// Text of a field's value as it should be written
fn value(field: &HeaderField) -> Cow<'_, str> {
    match field.parsed() {
        FieldValue::Addresses(list) => list.to_string().into(),
        FieldValue::DateTime(date) => date.to_string().into(),
        FieldValue::MessageId(id) => id.to_string().into(),
        FieldValue::MessageIds(list) => list.to_string().into(),
        FieldValue::Received(received) if received.date_time.is_some() =>
            received.to_string().into(),
        FieldValue::ReturnPath(path) => path.to_string().into(),
        FieldValue::Keywords(keywords) => keywords.iter()
            .map(|keyword| token::phrase(keyword, false))
            .collect::<Vec<_>>()
            .join(", ")
            .into(),
        FieldValue::Received(_) | FieldValue::Unstructured(_) | FieldValue::Malformed(_) =>
            field.value().into(),
    }
}

/// Append `line` to `out`, breaking it before white space so that no line is
/// longer than `width` unless it has nowhere to break
pub fn fold_line(line: &str, width: usize, out: &mut String) {
    let mut rest = line;

    while rest.len() > width {
        // Never break inside the white space a line starts or ends with, or a
        // line made of white space alone would be written.
        let start = rest.len() - rest.trim_start_matches(is_wsp).len();
        let end = rest.trim_end_matches(is_wsp).len();
        let mut split = None;

        for (at, _) in rest.char_indices().filter(|&(at, c)| at > start && at < end && is_wsp(c)) {
            if at <= width {
                split = Some(at);
            } else {
                split = split.or(Some(at));
                break;
            }
        }

        match split {
            Some(at) => {
                out.push_str(&rest[..at]);
                out.push_str("\r\n");
                rest = &rest[at..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out.push_str("\r\n");
}
