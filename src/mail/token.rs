// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Token stream over structured field bodies
//!
//! Grammar functions in this module tree only decide *where* a production
//! begins and ends. What text the resulting value carries is decided by
//! [`render`], which re-reads the matched span as a sequence of tokens and
//! keeps or drops comments and white space according to a [`Retention`]
//! policy.

use crate::syntax::{Buffer, is_atext, is_fws};
use super::syntax;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// Run of white space, line breaks included
    Space(&'a str),
    /// Comment with its parentheses
    Comment(&'a str),
    /// Quoted string with its quotes
    Quoted(&'a str),
    /// Domain literal with its brackets
    Literal(&'a str),
    Atom(&'a str),
    Special(char),
}

impl Token<'_> {
    pub fn is_cfws(&self) -> bool {
        matches!(self, Token::Space(_) | Token::Comment(_))
    }
}

/// Iterator over `(offset, token)` pairs, see [`tokens`]
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    buf: Buffer<'a>,
}

/// Split `text` into tokens
///
/// Every byte of `text` belongs to exactly one token, so concatenating all
/// tokens gives back the original text.
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens { buf: Buffer::new(text) }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (usize, Token<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let buf = &mut self.buf;
        let offset = buf.offset();

        let token = match buf.chars().next()? {
            c if is_fws(c) => Token::Space(buf.take_while(|c, _| is_fws(c))),
            '(' => Token::Comment(syntax::comment(buf).ok()?),
            '"' => Token::Quoted(buf.take_matching(syntax::quoted).ok()?),
            '[' => Token::Literal(syntax::literal(buf).ok()?),
            c if is_atext(c) => Token::Atom(buf.take_while(|c, _| is_atext(c))),
            c => {
                buf.advance_char();
                Token::Special(c)
            }
        };

        Some((offset, token))
    }
}

/// What survives when a matched span is turned into a value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retention {
    /// Comments between the first and the last token are kept verbatim, white
    /// space and outer comments are dropped. Used for addr-specs.
    AddrSpec,
    /// Only the tokens themselves remain. Used for message identifiers,
    /// routes and the local part and domain of an address.
    Discard,
    /// Comments are dropped, quoted strings unescaped and every run of CFWS
    /// becomes a single space, trimmed at both ends. Used for display names
    /// and keywords.
    Phrase,
    /// Like [`Retention::Phrase`], but comments stay in place and a trailing
    /// run of white space is kept as a single space. Used for group names.
    GroupName,
}

/// Render `text` under `retention`
pub fn render(text: &str, retention: Retention) -> String {
    let mut out = String::with_capacity(text.len());

    match retention {
        Retention::AddrSpec | Retention::Discard => {
            let tokens = tokens(text).map(|(_, token)| token).collect::<Vec<_>>();
            let first = tokens.iter().position(|token| !token.is_cfws());
            let last = tokens.iter().rposition(|token| !token.is_cfws());

            for (index, token) in tokens.into_iter().enumerate() {
                match token {
                    Token::Space(_) => {}
                    Token::Comment(comment) => {
                        let inside = matches!((first, last),
                            (Some(first), Some(last)) if first < index && index < last);

                        if retention == Retention::AddrSpec && inside {
                            out.push_str(comment);
                        }
                    }
                    Token::Quoted(text) | Token::Literal(text) | Token::Atom(text) =>
                        out.push_str(text),
                    Token::Special(c) => out.push(c),
                }
            }
        }
        Retention::Phrase | Retention::GroupName => {
            let keep_comments = retention == Retention::GroupName;
            let mut space = false;

            for (_, token) in tokens(text) {
                match token {
                    Token::Space(_) => {
                        space = true;
                        continue;
                    }
                    Token::Comment(_) if !keep_comments => {
                        space = true;
                        continue;
                    }
                    _ => {}
                }

                if space && !out.is_empty() {
                    out.push(' ');
                }
                space = false;

                match token {
                    Token::Quoted(text) => out.push_str(&unquote(text)),
                    Token::Comment(text) | Token::Literal(text) | Token::Atom(text) =>
                        out.push_str(text),
                    Token::Special(c) => out.push(c),
                    Token::Space(_) => {}
                }
            }

            if keep_comments && space && !out.is_empty() {
                out.push(' ');
            }
        }
    }

    out
}

/// Content of a quoted string token with quoted-pairs resolved
fn unquote(token: &str) -> String {
    let mut buf = Buffer::new(token);
    match syntax::quoted(&mut buf) {
        Ok(quoted) => quoted.unquote().into_owned(),
        Err(_) => token.to_string(),
    }
}

/// Whether `text` would read back differently if written out as-is in a
/// phrase position
///
/// With `comments` set, comments in `text` are considered part of it (as in
/// group names); otherwise any parenthesis forces quoting.
pub fn needs_quoting(text: &str, comments: bool) -> bool {
    if text.is_empty() {
        return true;
    }

    tokens(text).any(|(_, token)| match token {
        Token::Space(space) => space != " ",
        Token::Atom(_) => false,
        Token::Comment(_) => !comments,
        Token::Quoted(_) | Token::Literal(_) | Token::Special(_) => true,
    }) || text.chars().any(|c| c.is_control())
}

/// Write `text` as a quoted string
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Write `text` so that it reads back as the same phrase
pub fn phrase(text: &str, comments: bool) -> String {
    if needs_quoting(text, comments) {
        quote(text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_cover_input() {
        let text = "a.b (c (d)) \"e\\\"f\" [g] <h>";
        let list = tokens(text).collect::<Vec<_>>();
        assert_eq!(list, [
            (0, Token::Atom("a")),
            (1, Token::Special('.')),
            (2, Token::Atom("b")),
            (3, Token::Space(" ")),
            (4, Token::Comment("(c (d))")),
            (11, Token::Space(" ")),
            (12, Token::Quoted("\"e\\\"f\"")),
            (18, Token::Space(" ")),
            (19, Token::Literal("[g]")),
            (22, Token::Space(" ")),
            (23, Token::Special('<')),
            (24, Token::Atom("h")),
            (25, Token::Special('>')),
        ]);
        let joined = list.iter()
            .map(|(_, token)| match *token {
                Token::Space(t) | Token::Comment(t) | Token::Quoted(t)
                | Token::Literal(t) | Token::Atom(t) => t.to_string(),
                Token::Special(c) => c.to_string(),
            })
            .collect::<String>();
        assert_eq!(joined, text);
    }

    #[test]
    fn addr_spec_keeps_interior_comments() {
        assert_eq!(render(" pete(his account)@silly.test(his host) ", Retention::AddrSpec),
            "pete(his account)@silly.test");
        assert_eq!(render("jdoe@test   . example", Retention::AddrSpec), "jdoe@test.example");
    }

    #[test]
    fn discard_drops_all_comments() {
        assert_eq!(render("pete(his account)@silly.test", Retention::Discard),
            "pete@silly.test");
        assert_eq!(render(" 1234   @   local(blah)  .machine .example", Retention::Discard),
            "1234@local.machine.example");
    }

    #[test]
    fn phrase_collapses_and_unquotes() {
        assert_eq!(render(" \"Joe Q. Public\" ", Retention::Phrase), "Joe Q. Public");
        assert_eq!(render("Mary (the cat)\tSmith", Retention::Phrase), "Mary Smith");
        assert_eq!(render("\"Giant; \\\"Big\\\" Box\"", Retention::Phrase),
            "Giant; \"Big\" Box");
    }

    #[test]
    fn group_name_keeps_comments() {
        assert_eq!(render("A Group(Some people)\r\n     ", Retention::GroupName),
            "A Group(Some people) ");
        assert_eq!(render(" Undisclosed recipients", Retention::GroupName),
            "Undisclosed recipients");
    }

    #[test]
    fn quoting() {
        assert!(!needs_quoting("Mary Smith", false));
        assert!(needs_quoting("Joe Q. Public", false));
        assert!(needs_quoting("Giant; \"Big\" Box", false));
        assert!(!needs_quoting("A Group(Some people) ", true));
        assert!(needs_quoting("A Group(Some people)", false));
        assert_eq!(quote("Giant; \"Big\" Box"), "\"Giant; \\\"Big\\\" Box\"");
        assert_eq!(phrase("Mary Smith", false), "Mary Smith");
    }
}
