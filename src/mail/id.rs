// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Identification fields, [RFC 5322 section 3.6.4](
//! https://datatracker.ietf.org/doc/html/rfc5322#section-3.6.4)

use serde::Serialize;
use std::fmt;

use crate::syntax::*;
use super::{
    syntax::{cfws, comment, literal, phrase, quoted},
    token::{render, Retention},
};

/// Message identifier, stored without its angle brackets
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Bare form, `left@right`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Form used in fields, `<left@right>`
    pub fn enclosed(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// Value of `In-Reply-To` and `References` fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageIdList(pub Vec<MessageId>);

impl MessageIdList {
    pub fn first(&self) -> Option<&MessageId> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bare forms of all identifiers, in order
    pub fn message_ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(MessageId::as_str)
    }
}

impl fmt::Display for MessageIdList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, id) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

pub fn msg_id(buf: &mut Buffer) -> Result<MessageId> {
    // msg-id        = [CFWS] "<" id-left "@" id-right ">" [CFWS]
    // obs-id-left   = local-part
    // obs-id-right  = domain
    buf.atomic(|buf| {
        buf.maybe(cfws);
        buf.expect("<")?;

        let at = buf.location();
        let content = buf.take_matching(|buf| {
            loop {
                match buf.peek() {
                    None | Some(b'>') => break,
                    Some(b'(') => {
                        comment(buf)?;
                    }
                    Some(b'"') => {
                        quoted(buf)?;
                    }
                    Some(b'[') => {
                        literal(buf)?;
                    }
                    Some(b'<') => return buf.error("unexpected '<' in message identifier"),
                    Some(_) => buf.advance_char(),
                }
            }
            Ok(())
        })?;

        buf.expect(">")?;
        buf.maybe(cfws);

        let id = render(content, Retention::Discard);

        if id.is_empty() {
            return Err(Located::new(at, "empty message identifier"));
        }

        if !id.contains('@') {
            log::trace!("message identifier {id:?} has no domain part");
        }

        Ok(MessageId(id))
    })
}

pub fn msg_id_list(buf: &mut Buffer) -> Result<MessageIdList> {
    // references     = "References:" 1*msg-id CRLF
    // obs-references = "References:" *(phrase / msg-id) CRLF
    // obs-in-reply-to = "In-Reply-To:" *(phrase / msg-id) CRLF
    let mut ids = Vec::new();

    loop {
        if let Some(id) = buf.maybe(msg_id) {
            ids.push(id);
        } else if buf.maybe(cfws).is_some() || buf.expect(",").is_ok() {
            continue;
        } else if let Some(text) = buf.maybe(phrase) {
            log::trace!("skipping phrase {:?} in identifier list", text.0);
        } else {
            break;
        }
    }

    Ok(MessageIdList(ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_list(text: &str) -> MessageIdList {
        let mut buf = Buffer::new(text);
        let list = msg_id_list(&mut buf).unwrap();
        buf.expect_empty().unwrap();
        list
    }

    #[test]
    fn simple_id() {
        let id = msg_id(&mut Buffer::new("              <testabcd.1234@silly.test>")).unwrap();
        assert_eq!(id.as_str(), "testabcd.1234@silly.test");
        assert_eq!(id.enclosed(), "<testabcd.1234@silly.test>");
    }

    #[test]
    fn obsolete_white_space_and_comments() {
        let id = msg_id(&mut Buffer::new("<1234   @   local(blah)  .machine .example>")).unwrap();
        assert_eq!(id.to_string(), "<1234@local.machine.example>");
    }

    #[test]
    fn missing_or_broken_ids() {
        assert!(msg_id(&mut Buffer::new("")).is_err());
        assert!(msg_id(&mut Buffer::new("<>")).is_err());
        assert!(msg_id(&mut Buffer::new("<abc@def")).is_err());
        assert!(msg_id(&mut Buffer::new("abc@def")).is_err());
    }

    #[test]
    fn lists() {
        let list = parse_list("<1234@local.machine.example> <3456@example.net>");
        assert_eq!(list.message_ids().collect::<Vec<_>>(),
            ["1234@local.machine.example", "3456@example.net"]);
        assert_eq!(list.to_string(), "<1234@local.machine.example> <3456@example.net>");
        assert_eq!(list.first().map(MessageId::enclosed).as_deref(),
            Some("<1234@local.machine.example>"));
    }

    #[test]
    fn obsolete_lists() {
        let list = parse_list("Your message of \"Tue, 1 Jul\" <a@b.test>,\r\n <c@d.test>");
        assert_eq!(list.message_ids().collect::<Vec<_>>(), ["a@b.test", "c@d.test"]);

        assert!(parse_list("").is_empty());
        assert!(parse_list("  ").is_empty());
    }
}
