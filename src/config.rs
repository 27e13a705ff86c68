use anyhow::{Context, Result};
use argh::FromArgs;
use mail_syntax::mail::EncodeOptions;
use serde::Deserialize;
use std::{fs, path::PathBuf, str::FromStr};

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: Output,
    pub encoding: Encoding,
    /// Message to read, standard input when not set
    #[serde(skip)]
    pub input: Option<PathBuf>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct Output {
    pub format: Format,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// One line per field
    #[default]
    Text,
    /// Parsed values as JSON
    Json,
    /// The message written back out
    Encoded,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            "encoded" => Ok(Format::Encoded),
            _ => Err(format!("unknown format {value:?}, expected text, json, or encoded")),
        }
    }
}

#[derive(Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Encoding {
    pub line_width: usize,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding { line_width: EncodeOptions::default().line_width }
    }
}

impl Encoding {
    pub fn options(&self) -> EncodeOptions {
        EncodeOptions { line_width: self.line_width }
    }
}

/// Inspect header fields of an Internet message
#[derive(FromArgs)]
struct Args {
    /// configuration file to use
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
    /// output format: text, json, or encoded
    #[argh(option)]
    format: Option<Format>,
    /// maximum line length when writing the message back out
    #[argh(option)]
    line_width: Option<usize>,
    /// message file to read, standard input if omitted
    #[argh(positional)]
    file: Option<PathBuf>,
}

pub fn load() -> Result<Config> {
    let args: Args = argh::from_env();

    let mut config = match args.config {
        None => Config::default(),
        Some(path) => {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("could not read {}", path.display()))?;
            toml::from_str(&data)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
    };

    if let Some(format) = args.format {
        config.output.format = format;
    }

    if let Some(width) = args.line_width {
        config.encoding.line_width = width;
    }

    config.input = args.file;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_optional() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.output.format, Format::Text);
        assert_eq!(config.encoding.line_width, 78);

        let config: Config = toml::from_str("[output]\nformat = \"json\"\n\n[encoding]\nline-width = 100\n").unwrap();
        assert_eq!(config.output.format, Format::Json);
        assert_eq!(config.encoding.options(), EncodeOptions { line_width: 100 });
    }

    #[test]
    fn format_names() {
        assert_eq!("encoded".parse::<Format>(), Ok(Format::Encoded));
        assert!("yaml".parse::<Format>().is_err());
    }
}
