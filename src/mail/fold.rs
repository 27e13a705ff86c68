// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Splitting a message into header fields, and long header lines into
//! logical ones

use memchr::{memchr, memchr_iter};

use crate::syntax::is_fws;
use super::token::{tokens, Token};

/// Separate message into its header and body sections
///
/// The header ends at the first empty line and keeps its final line break.
/// Without an empty line the whole message is header.
pub fn separate_message(message: &str) -> (&str, &str) {
    if let Some(body) = message.strip_prefix("\r\n").or_else(|| message.strip_prefix('\n')) {
        return ("", body);
    }

    let bytes = message.as_bytes();

    for index in memchr_iter(b'\n', bytes) {
        let rest = &message[index + 1..];

        if let Some(body) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) {
            return (&message[..index + 1], body);
        }
    }

    (message, "")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineBreak {
    CrLf,
    Lf,
}

impl LineBreak {
    pub fn as_str(self) -> &'static str {
        match self {
            LineBreak::CrLf => "\r\n",
            LineBreak::Lf => "\n",
        }
    }
}

/// Line break removed during unfolding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fold {
    /// Byte offset in the unfolded text at which the break stood
    pub at: usize,
    pub line_break: LineBreak,
}

/// Logical header line with its folds removed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Unfolded {
    pub text: String,
    pub folds: Vec<Fold>,
}

impl Unfolded {
    /// Put removed line breaks back, reproducing the source line exactly
    pub fn refold(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + 2 * self.folds.len());
        let mut last = 0;

        for fold in &self.folds {
            out.push_str(&self.text[last..fold.at]);
            out.push_str(fold.line_break.as_str());
            last = fold.at;
        }

        out.push_str(&self.text[last..]);
        out
    }
}

/// Remove folding line breaks from a logical line, keeping the white space
/// that follows each of them
pub fn unfold(line: &str) -> Unfolded {
    let mut text = String::with_capacity(line.len());
    let mut folds = Vec::new();
    let mut rest = line;

    while let Some(index) = memchr(b'\n', rest.as_bytes()) {
        let (before, line_break) = match rest[..index].strip_suffix('\r') {
            Some(before) => (before, LineBreak::CrLf),
            None => (&rest[..index], LineBreak::Lf),
        };

        text.push_str(before);
        folds.push(Fold { at: text.len(), line_break });
        rest = &rest[index + 1..];
    }

    text.push_str(rest);

    Unfolded { text, folds }
}

/// Iterator over logical lines of a header section, see [`logical_lines`]
#[derive(Clone, Debug)]
pub struct LogicalLines<'a> {
    rest: &'a str,
}

/// Split a header section into logical lines
///
/// A line ends at a line break (CRLF or a bare LF) which is not followed by
/// white space. Yielded lines still contain their folds, but not their
/// terminating line break.
pub fn logical_lines(header: &str) -> LogicalLines<'_> {
    LogicalLines { rest: header }
}

impl<'a> Iterator for LogicalLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        let bytes = self.rest.as_bytes();

        for index in memchr_iter(b'\n', bytes) {
            if matches!(bytes.get(index + 1), Some(b' ' | b'\t')) {
                continue;
            }

            let end = if index > 0 && bytes[index - 1] == b'\r' { index - 1 } else { index };
            let line = &self.rest[..end];
            self.rest = &self.rest[index + 1..];
            return Some(line);
        }

        // Last line without a line break; a fold left open here simply ends.
        let line = self.rest;
        self.rest = "";
        Some(line)
    }
}

/// Split an unfolded line into field name and value
///
/// The name ends at the first colon which is not part of a quoted string or
/// a comment. White space around the name and at the start of the value is
/// removed. Returns `None` for lines which are not fields.
pub fn split_field(line: &str) -> Option<(&str, &str)> {
    let colon = tokens(line)
        .find(|(_, token)| *token == Token::Special(':'))
        .map(|(offset, _)| offset)?;

    let name = line[..colon].trim_matches(is_fws);
    let value = line[colon + 1..].trim_start_matches(is_fws);

    if name.is_empty() {
        None
    } else {
        Some((name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separate_at_first_empty_line() {
        assert_eq!(separate_message("A: b\r\nC: d\r\n\r\nbody\r\n\r\nmore"),
            ("A: b\r\nC: d\r\n", "body\r\n\r\nmore"));
        assert_eq!(separate_message("A: b\n\nbody"), ("A: b\n", "body"));
        assert_eq!(separate_message("A: b\r\n"), ("A: b\r\n", ""));
        assert_eq!(separate_message("\r\nbody"), ("", "body"));
    }

    #[test]
    fn logical_lines_follow_folds() {
        let header = "Subject: This\r\n is a test\r\nTo: a@b\n\tc@d\nX: y";
        let lines = logical_lines(header).collect::<Vec<_>>();
        assert_eq!(lines, ["Subject: This\r\n is a test", "To: a@b\n\tc@d", "X: y"]);
    }

    #[test]
    fn white_space_only_continuation() {
        let header = "To: a@b,\r\n \r\n c@d\r\n";
        let lines = logical_lines(header).collect::<Vec<_>>();
        assert_eq!(lines, ["To: a@b,\r\n \r\n c@d"]);
        assert_eq!(unfold(lines[0]).text, "To: a@b,  c@d");
    }

    #[test]
    fn refold_restores_source() {
        for line in ["Subject: This\r\n is a test", "To: a@b\n\tc@d\r\n  e@f", "X: y", ""] {
            let unfolded = unfold(line);
            assert_eq!(unfolded.refold(), line);
        }

        let unfolded = unfold("A:\r\n b\n c");
        assert_eq!(unfolded.text, "A: b c");
        assert_eq!(unfolded.folds, [
            Fold { at: 2, line_break: LineBreak::CrLf },
            Fold { at: 4, line_break: LineBreak::Lf },
        ]);
    }

    #[test]
    fn split_field_names() {
        assert_eq!(split_field("Subject: Hello: world"), Some(("Subject", "Hello: world")));
        assert_eq!(split_field("From  : John Doe <jdoe@machine.example>"),
            Some(("From", "John Doe <jdoe@machine.example>")));
        assert_eq!(split_field("Bcc:"), Some(("Bcc", "")));
        assert_eq!(split_field("X-Tag:   two  spaces "), Some(("X-Tag", "two  spaces ")));
        assert_eq!(split_field("no colon here"), None);
        assert_eq!(split_field(": empty name"), None);
        assert_eq!(split_field("\"a:b\" (c:d) x: y"), Some(("\"a:b\" (c:d) x", "y")));
    }
}
