//! Interactive console mode.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Paths entered at the console prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleParams {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Print the banner shown when console mode starts.
pub fn print_intro<W: Write>(out: &mut W) -> io::Result<()> {
    let rule = "-".repeat(36);
    writeln!(out, "{}", rule)?;
    writeln!(out)?;
    writeln!(out, "pdfelem {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "Extract the text and images of a PDF file")?;
    writeln!(out)?;
    writeln!(out, "{}", rule)?;
    Ok(())
}

/// Ask for the source file and the destination directory.
///
/// Returns `None` if the input ends before both answers were given. Empty
/// answers are passed through and rejected later by the extractor.
pub fn prompt_params<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<ConsoleParams>> {
    let Some(source) = ask(input, out, "Enter the path to the PDF file:")? else {
        return Ok(None);
    };
    let Some(destination) = ask(
        input,
        out,
        "Enter the directory the elements should be extracted to:",
    )?
    else {
        return Ok(None);
    };
    writeln!(out)?;

    Ok(Some(ConsoleParams {
        source: PathBuf::from(source),
        destination: PathBuf::from(destination),
    }))
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> io::Result<Option<String>> {
    writeln!(out, "{}", question)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
