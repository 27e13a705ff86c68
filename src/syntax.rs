// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Utilities for parsing

use std::{borrow::Cow, fmt};
use memchr::memchr_iter;
use thiserror::Error;

use crate::util;
use self::SyntaxError::*;

pub type Result<T, E = Located<SyntaxError>> = std::result::Result<T, E>;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("at {at} - {item}")]
pub struct Located<E> {
    pub at: Location,
    #[source]
    pub item: E,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("expected {:?}", util::escaped(.0))]
    Expected(&'static str),
    #[error("unexpected characters")]
    ExpectedEnd,
    #[error("{0}")]
    Custom(Cow<'static, str>),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl From<&'static str> for SyntaxError {
    fn from(error: &'static str) -> Self {
        SyntaxError::Custom(error.into())
    }
}

impl From<String> for SyntaxError {
    fn from(error: String) -> Self {
        SyntaxError::Custom(error.into())
    }
}

impl<E> Located<E> {
    pub fn new(at: Location, error: impl Into<E>) -> Self {
        Located { at, item: error.into() }
    }
}

impl Location {
    pub const ZERO: Location = Location {
        offset: 0,
        line: 1,
        column: 1,
    };
}

pub trait Parse<'a>: Sized {
    fn parse(from: &mut Buffer<'a>) -> Result<Self>;
}

/// Cursor over already-decoded text
///
/// All grammar functions take a `&mut Buffer` and either advance it past what
/// they recognised or, through [`Buffer::atomic`], leave it untouched on
/// failure.
#[derive(Clone, Copy)]
pub struct Buffer<'a> {
    location: Location,
    data: &'a str,
}

impl<'a> Buffer<'a> {
    pub fn new(data: &'a str) -> Self {
        Buffer {
            location: Location::ZERO,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn offset(&self) -> usize {
        self.location.offset
    }

    /// Remaining text
    pub fn rest(&self) -> &'a str {
        self.data
    }

    /// First remaining byte, if any
    pub fn peek(&self) -> Option<u8> {
        self.data.as_bytes().first().copied()
    }

    pub fn error<T>(&self, kind: impl Into<SyntaxError>) -> Result<T> {
        Err(Located::new(self.location, kind))
    }

    /// Advance this slice by `number` bytes
    ///
    /// `number` must fall on a character boundary.
    pub fn advance(&mut self, number: usize) {
        let skipped = &self.data.as_bytes()[..number];
        let mut breaks = memchr_iter(b'\n', skipped);
        let last = breaks.next_back();

        self.location.offset += number;
        self.location.line += breaks.count() + usize::from(last.is_some());
        self.location.column = match last {
            Some(index) => number - index,
            None => self.location.column + number,
        };

        self.data = &self.data[number..];
    }

    /// Advance past the next character, whatever its encoded length
    pub fn advance_char(&mut self) {
        if let Some(ch) = self.data.chars().next() {
            self.advance(ch.len_utf8());
        }
    }

    pub fn take(&mut self, number: usize) -> &'a str {
        let value = &self.data[..number];
        self.advance(number);
        value
    }

    /// Execute `f`, advancing `self` only if it succeeds
    pub fn atomic<T>(&mut self, f: impl FnOnce(&mut Buffer<'a>) -> Result<T>) -> Result<T> {
        let mut cursor = *self;
        let value = f(&mut cursor)?;
        *self = cursor;
        Ok(value)
    }

    /// Return `Ok(())` and advance this slice if it begins with `needle`
    pub fn expect(&mut self, needle: &'static str) -> Result<()> {
        if self.data.starts_with(needle) {
            self.advance(needle.len());
            Ok(())
        } else {
            self.error(Expected(needle))
        }
    }

    /// Return `Ok(())` if this slice is empty
    pub fn expect_empty(&self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            self.error(ExpectedEnd)
        }
    }

    /// Return longest prefix whose characters match `test`, advancing this
    /// slice by its length
    pub fn take_while(&mut self, mut test: impl FnMut(char, usize) -> bool) -> &'a str {
        let length = self.data
            .char_indices()
            .find(|&(index, ch)| !test(ch, index))
            .map_or(self.len(), |(index, _)| index);

        self.take(length)
    }

    /// Execute `f`, returning both its value and the text it consumed
    pub fn consumed<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>)
    -> Result<(&'a str, T)> {
        let mut cursor = *self;
        let value = f(&mut cursor)?;
        let length = self.len() - cursor.len();
        let text = &self.data[..length];
        *self = cursor;
        Ok((text, value))
    }

    pub fn take_matching<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<&'a str> {
        self.consumed(f).map(|(text, _)| text)
    }

    /// Execute `f`, advancing `self` only if it succeeds
    pub fn maybe<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Option<T> {
        self.atomic(f).ok()
    }
}

impl std::ops::Deref for Buffer<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("at", &format_args!("{}", self.location))
            .field("data", &util::escaped(self.data))
            .finish()
    }
}

pub fn read_number<T>(buf: &mut Buffer, radix: u32, min_digits: usize, max_digits: usize) -> Result<T>
where
    T: TryFrom<u32>,
    T::Error: std::fmt::Display,
{
    buf.atomic(|buf| {
        let start = buf.location();
        let mut value: u32 = 0;
        let mut count = 0;

        while count < max_digits {
            let digit = match buf.peek().and_then(|b| char::from(b).to_digit(radix)) {
                Some(digit) => digit,
                None => break,
            };
            value = value.saturating_mul(radix).saturating_add(digit);
            count += 1;
            buf.advance(1);
        }

        if count < min_digits {
            buf.error(format!("expected at least {} digit{}", min_digits,
                if min_digits == 1 { "" } else { "s" }))
        } else {
            T::try_from(value).map_err(|err| Located::new(start, err.to_string()))
        }
    })
}

// ---------------------------------------------------------------- RFC 5234 ---

#[inline]
pub fn is_wsp(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

/// White space as it appears in unfolded or still-folded field bodies
#[inline]
pub fn is_fws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

#[inline]
pub fn is_atext(c: char) -> bool {
    // atext = ALPHA / DIGIT / "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "/" /
    //         "=" / "?" / "^" / "_" / "`" / "{" / "|" / "}" / "~" / UTF8-non-ascii
    match c {
        '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '/' | '=' | '?' |
        '^' | '_' | '`' | '{' | '|' | '}' | '~' => true,
        _ => c.is_ascii_alphanumeric() || !c.is_ascii(),
    }
}

pub fn atom<'a>(buf: &mut Buffer<'a>) -> Result<&'a str> {
    // atom = 1*atext
    let text = buf.take_while(|c, _| is_atext(c));

    if text.is_empty() {
        buf.error("expected an atom")
    } else {
        Ok(text)
    }
}
