use anyhow::{Context, Result};
use mail_syntax::mail::Message;
use std::{fs, io::{self, Read, Write}};

use self::config::Format;

mod config;
mod report;

fn main() -> Result<()> {
    env_logger::init();

    let config = config::load()?;

    let source = match config.input {
        Some(ref path) => fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?,
        None => {
            let mut data = String::new();
            io::stdin().read_to_string(&mut data).context("could not read standard input")?;
            data
        }
    };

    let message = Message::parse(source);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match config.output.format {
        Format::Text => report::summary(&message, &mut out)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &report::MessageData::from(&message))?;
            writeln!(out)?;
        }
        Format::Encoded => out.write_all(message.encoded_with(&config.encoding.options()).as_bytes())?,
    }

    out.flush()?;

    Ok(())
}
