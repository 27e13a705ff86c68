// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

use std::fmt;

/// Show `text` with control characters escaped, for logs and error messages
pub fn escaped(text: &str) -> Escaped<'_> {
    Escaped(text)
}

pub struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for ch in self.0.chars() {
            if ch.is_control() && ch != '\t' {
                write!(f, "\\x{:02x}", u32::from(ch))?;
            } else {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("\"")?;
        for ch in self.0.chars() {
            match ch {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                ' ' => f.write_str(" ")?,
                _ if ch.is_control() || ch.is_whitespace() =>
                    write!(f, "\\x{:02x}", u32::from(ch))?,
                _ => write!(f, "{ch}")?,
            }
        }
        f.write_str("\"")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_line_breaks() {
        assert_eq!(escaped("a\r\n b").to_string(), "a\\x0d\\x0a b");
        assert_eq!(format!("{:?}", escaped("say \"hi\"\n")), "\"say \\\"hi\\\"\\x0a\"");
    }
}
