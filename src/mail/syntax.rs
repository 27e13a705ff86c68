// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Lexical tokens of [RFC 5322 section 3.2](
//! https://datatracker.ietf.org/doc/html/rfc5322#section-3.2), shared by all
//! structured field grammars
//!
//! Compared with the RFC these are lenient in two ways: unterminated
//! comments, quoted strings and domain literals are closed at the end of
//! input, and comments nest to any depth without recursion.

use std::borrow::Cow;

use crate::syntax::*;
use super::token::{self, Retention};

/// Folding white space
pub fn fws(buf: &mut Buffer) -> Result<()> {
    // FWS = ([*WSP CRLF] 1*WSP) / obs-FWS
    // Field bodies are unfolded before they get here, but stray line breaks
    // are still accepted as white space.
    if buf.take_while(|c, _| is_fws(c)).is_empty() {
        buf.error("expected one of ' ' or '\\t'")
    } else {
        Ok(())
    }
}

/// Comment, returned with its parentheses
pub fn comment<'a>(buf: &mut Buffer<'a>) -> Result<&'a str> {
    // comment  = "(" *([FWS] ccontent) [FWS] ")"
    // ccontent = ctext / quoted-pair / comment
    buf.take_matching(|buf| {
        buf.expect("(")?;

        let mut depth = 1usize;

        while depth > 0 {
            match buf.peek() {
                None => {
                    log::trace!("unterminated comment closed at end of input");
                    break;
                }
                Some(b'(') => {
                    depth += 1;
                    buf.advance(1);
                }
                Some(b')') => {
                    depth -= 1;
                    buf.advance(1);
                }
                // quoted-pair = ("\" (VCHAR / WSP)) / obs-qp
                Some(b'\\') => {
                    buf.advance(1);
                    buf.advance_char();
                }
                Some(_) => buf.advance_char(),
            }
        }

        Ok(())
    })
}

/// Comment or folding white space
pub fn cfws(buf: &mut Buffer) -> Result<()> {
    // CFWS = (1*([FWS] comment) [FWS]) / FWS
    let value = buf.take_matching(|buf| {
        buf.maybe(fws);

        while comment(buf).is_ok() {
            buf.maybe(fws);
        }

        Ok(())
    })?;

    if value.is_empty() {
        buf.error("expected one of ' ', '\\t', or comment")
    } else {
        Ok(())
    }
}

pub fn atom<'a>(buf: &mut Buffer<'a>) -> Result<&'a str> {
    // atom = [CFWS] 1*atext [CFWS]
    buf.atomic(|buf| {
        buf.maybe(cfws);
        let atom = crate::syntax::atom(buf)?;
        buf.maybe(cfws);
        Ok(atom)
    })
}

/// Content of a quoted string, with quoted-pairs still escaped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quoted<'a>(pub &'a str);

impl<'a> Quoted<'a> {
    /// Resolve quoted-pairs and drop folding line breaks
    pub fn unquote(&self) -> Cow<'a, str> {
        if !self.0.contains(&['\\', '\r', '\n'][..]) {
            return Cow::from(self.0);
        }

        let mut result = String::with_capacity(self.0.len());
        let mut chars = self.0.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '\\' => result.extend(chars.next()),
                '\r' | '\n' => {}
                _ => result.push(ch),
            }
        }

        Cow::from(result)
    }
}

/// Quoted string without surrounding CFWS
pub fn quoted<'a>(buf: &mut Buffer<'a>) -> Result<Quoted<'a>> {
    // DQUOTE *([FWS] qcontent) [FWS] DQUOTE
    buf.atomic(|buf| {
        buf.expect("\"")?;

        // qcontent    = qtext / quoted-pair
        // quoted-pair = ("\" (VCHAR / WSP)) / obs-qp
        let content = buf.take_matching(|buf| {
            loop {
                match buf.peek() {
                    None => {
                        log::trace!("unterminated quoted string closed at end of input");
                        break;
                    }
                    Some(b'"') => break,
                    Some(b'\\') => {
                        buf.advance(1);
                        buf.advance_char();
                    }
                    Some(_) => buf.advance_char(),
                }
            }
            Ok(())
        })?;

        buf.maybe(|buf| buf.expect("\""));

        Ok(Quoted(content))
    })
}

pub fn quoted_string<'a>(buf: &mut Buffer<'a>) -> Result<Quoted<'a>> {
    // quoted-string = [CFWS]
    //                 DQUOTE *([FWS] qcontent) [FWS] DQUOTE
    //                 [CFWS]
    buf.atomic(|buf| {
        buf.maybe(cfws);
        let content = quoted(buf)?;
        buf.maybe(cfws);
        Ok(content)
    })
}

/// Domain literal without surrounding CFWS, returned with its brackets
pub fn literal<'a>(buf: &mut Buffer<'a>) -> Result<&'a str> {
    // "[" *([FWS] dtext) [FWS] "]"
    buf.take_matching(|buf| {
        buf.expect("[")?;

        loop {
            match buf.peek() {
                None => {
                    log::trace!("unterminated domain literal closed at end of input");
                    break;
                }
                Some(b']') => {
                    buf.advance(1);
                    break;
                }
                // obs-dtext = obs-NO-WS-CTL / quoted-pair
                Some(b'\\') => {
                    buf.advance(1);
                    buf.advance_char();
                }
                Some(_) => buf.advance_char(),
            }
        }

        Ok(())
    })
}

pub fn domain_literal<'a>(buf: &mut Buffer<'a>) -> Result<&'a str> {
    // domain-literal = [CFWS] "[" *([FWS] dtext) [FWS] "]" [CFWS]
    buf.atomic(|buf| {
        buf.maybe(cfws);
        let value = literal(buf)?;
        buf.maybe(cfws);
        Ok(value)
    })
}

pub fn word<'a>(buf: &mut Buffer<'a>) -> Result<Quoted<'a>> {
    // word = atom / quoted-string
    atom(buf).map(Quoted).or_else(|_| quoted_string(buf))
}

/// Phrase as it appeared in the field, surrounding CFWS included
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phrase<'a>(pub &'a str);

impl Phrase<'_> {
    /// Words of this phrase separated by single spaces, comments removed
    pub fn text(&self) -> String {
        token::render(self.0, Retention::Phrase)
    }

    /// Like [`Phrase::text`], but comments stay in place and trailing white
    /// space is kept as one space
    pub fn with_comments(&self) -> String {
        token::render(self.0, Retention::GroupName)
    }
}

impl<'a> Parse<'a> for Phrase<'a> {
    fn parse(from: &mut Buffer<'a>) -> Result<Self> {
        phrase(from)
    }
}

pub fn phrase<'a>(buf: &mut Buffer<'a>) -> Result<Phrase<'a>> {
    // phrase     = 1*word / obs-phrase
    // obs-phrase = word *(word / "." / CFWS)
    buf.take_matching(|buf| {
        word(buf)?;

        loop {
            if word(buf).is_ok() {
                continue;
            }

            if buf.atomic(|buf| {
                buf.expect(".")?;
                buf.maybe(cfws);
                Ok(())
            }).is_ok() {
                continue;
            }

            break;
        }

        Ok(())
    }).map(Phrase)
}

/// Comma separated list of `T`
///
/// Empty elements (`a, , b`, obsolete syntax) are skipped. Parsing stops in
/// front of the first text that is neither a separator nor a `T`; it is up to
/// the caller to decide what may follow.
pub fn list_of<'a, T: Parse<'a>>(buf: &mut Buffer<'a>) -> Vec<T> {
    // obs-list = *([CFWS] ",") element *("," [element / CFWS])
    let mut items = Vec::new();
    let mut separated = true;

    loop {
        let mut cursor = *buf;
        cursor.maybe(cfws);

        if cursor.expect(",").is_ok() {
            if separated {
                log::trace!("skipping empty list element at {}", buf.location());
            }
            *buf = cursor;
            separated = true;
            continue;
        }

        if !separated {
            break;
        }

        match buf.maybe(T::parse) {
            Some(item) => {
                items.push(item);
                separated = false;
            }
            None => break,
        }
    }

    items
}

// ------------------------------------------- 3.6.5. Informational Fields ---

pub fn keywords(buf: &mut Buffer) -> Result<Vec<String>> {
    // keywords = phrase *("," phrase)
    let keywords = list_of::<Phrase>(buf)
        .into_iter()
        .map(|phrase| phrase.text())
        .collect::<Vec<_>>();

    if keywords.is_empty() {
        buf.error("expected a keyword")
    } else {
        Ok(keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_comment_with_escaped_paren() {
        let mut buf = Buffer::new("(A wonderful \\) chap (really)) <pete>");
        assert_eq!(comment(&mut buf).unwrap(), "(A wonderful \\) chap (really))");
        assert_eq!(buf.rest(), " <pete>");
    }

    #[test]
    fn unterminated_comment_is_closed_at_end() {
        let mut buf = Buffer::new("(never (closed");
        assert_eq!(comment(&mut buf).unwrap(), "(never (closed");
        assert!(buf.is_empty());
    }

    #[test]
    fn deep_comment_nesting_is_iterative() {
        let depth = 100_000;
        let text = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        let mut buf = Buffer::new(&text);
        cfws(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn cfws_requires_something() {
        let mut buf = Buffer::new("abc");
        assert!(cfws(&mut buf).is_err());
        let mut buf = Buffer::new(" (a) (b)\t abc");
        cfws(&mut buf).unwrap();
        assert_eq!(buf.rest(), "abc");
    }

    #[test]
    fn quoted_string_unquotes() {
        let mut buf = Buffer::new(r#" "Giant; \"Big\" Box" <x>"#);
        let value = quoted_string(&mut buf).unwrap();
        assert_eq!(value.0, r#"Giant; \"Big\" Box"#);
        assert_eq!(value.unquote(), r#"Giant; "Big" Box"#);
        assert_eq!(buf.rest(), "<x>");
    }

    #[test]
    fn unterminated_quoted_string() {
        let mut buf = Buffer::new("\"open to the end");
        assert_eq!(quoted(&mut buf).unwrap(), Quoted("open to the end"));
        assert!(buf.is_empty());
    }

    #[test]
    fn phrase_text_and_comments() {
        let mut buf = Buffer::new("Pete(A wonderful \\) chap) <pete@silly.test>");
        let name = phrase(&mut buf).unwrap();
        assert_eq!(name.text(), "Pete");
        assert_eq!(buf.rest(), "<pete@silly.test>");

        let mut buf = Buffer::new("(Empty list)(start)Undisclosed recipients  :;");
        let name = phrase(&mut buf).unwrap();
        assert_eq!(name.with_comments(), "(Empty list)(start)Undisclosed recipients ");
        assert_eq!(name.text(), "Undisclosed recipients");
    }

    #[test]
    fn obsolete_phrase_with_dots() {
        let mut buf = Buffer::new("Joe Q. Public <john.q.public@example.com>");
        assert_eq!(phrase(&mut buf).unwrap().text(), "Joe Q. Public");
    }

    #[test]
    fn keyword_list() {
        let mut buf = Buffer::new(" hello, \"big world\" ,, greeting");
        assert_eq!(keywords(&mut buf).unwrap(), ["hello", "big world", "greeting"]);
        assert!(buf.is_empty());

        let mut buf = Buffer::new(" ");
        assert!(keywords(&mut buf).is_err());
    }

    #[test]
    fn domain_literal_keeps_brackets() {
        let mut buf = Buffer::new(" [192.168.0.1] >");
        assert_eq!(domain_literal(&mut buf).unwrap(), "[192.168.0.1]");
        assert_eq!(buf.rest(), ">");
    }
}
