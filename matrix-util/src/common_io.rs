#![allow(dead_code)]

use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Delimiter to handle both `&str` and `Vec<char>`
pub enum Delimiter {
    Str(String),
    Chars(Vec<char>),
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Delimiter::Str(s.to_string())
    }
}

impl From<Vec<char>> for Delimiter {
    fn from(chars: Vec<char>) -> Self {
        Delimiter::Chars(chars)
    }
}

impl From<&[char]> for Delimiter {
    fn from(chars: &[char]) -> Self {
        Delimiter::Chars(chars.to_vec())
    }
}

impl<const N: usize> From<&[char; N]> for Delimiter {
    fn from(chars: &[char; N]) -> Self {
        Delimiter::Chars(chars.to_vec())
    }
}

impl Delimiter {
    fn split_line<T, F>(&self, line: &str, convert: F) -> Vec<T>
    where
        F: Fn(&str) -> T,
    {
        match self {
            Delimiter::Str(s) => line.split(s.as_str()).map(|x| convert(x)).collect(),
            Delimiter::Chars(chars) => line.split(chars.as_slice()).map(|x| convert(x)).collect(),
        }
    }
}

/// Words or typed values parsed from each line, with an optional
/// header line
pub struct ReadLinesOut<T: Send> {
    pub lines: Vec<Vec<T>>,
    pub header: Vec<Box<str>>,
}

///
/// Read every line of the input file into memory, skipping comment
/// lines (`#` or `%`)
///
/// * `input_file` - file name--either gzipped or not
///
pub fn read_lines(input_file: &str) -> anyhow::Result<Vec<Box<str>>> {
    let buf: Box<dyn BufRead> = open_buf_reader(input_file)?;
    let mut lines = vec![];
    for x in buf.lines() {
        let x = x?;
        if x.starts_with('#') || x.starts_with('%') {
            continue;
        }
        lines.push(x.into_boxed_str());
    }
    Ok(lines)
}

///
/// Write every line into the output file
///
/// * `lines` - vector of lines
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines(lines: &[Box<str>], output_file: &str) -> anyhow::Result<()> {
    write_types(lines, output_file)
}

///
/// Write every displayable item as a line into the output file
///
pub fn write_types<T>(lines: &[T], output_file: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file)?;
    for line in lines {
        writeln!(buf, "{}", line)?;
    }
    buf.flush()?;
    Ok(())
}

///
/// Read lines and split each of them into words by the delimiter.
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - delimiter
/// * `hdr_line` - location of a header line (-1 = no header line)
///
pub fn read_lines_of_words_delim(
    input_file: &str,
    delim: impl Into<Delimiter>,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut<Box<str>>> {
    let delim = delim.into();
    let parse = |line: &str| -> Vec<Box<str>> {
        delim.split_line(line, |w| w.to_owned().into_boxed_str())
    };

    let raw = read_lines(input_file)?;

    let mut header = vec![];
    let body: &[Box<str>] = if hdr_line < 0 {
        &raw
    } else {
        let skip = hdr_line as usize;
        if raw.len() < skip + 1 {
            return Err(anyhow::anyhow!("not enough lines in {}", input_file));
        }
        header.extend(parse(&raw[skip]));
        &raw[(skip + 1)..]
    };

    // indexed parallel map keeps the line order
    let lines: Vec<Vec<Box<str>>> = body.par_iter().map(|s| parse(s)).collect();

    Ok(ReadLinesOut { lines, header })
}

///
/// Read lines and split each of them into whitespace-separated words.
///
pub fn read_lines_of_words(
    input_file: &str,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut<Box<str>>> {
    read_lines_of_words_delim(input_file, &[' ', '\t'], hdr_line)
}

///
/// Read lines and parse each word into the type `T`.
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - delimiter
/// * `hdr_line` - location of a header line (-1 = no header line)
///
pub fn read_lines_of_types<T>(
    input_file: &str,
    delim: impl Into<Delimiter>,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut<T>>
where
    T: Send + std::str::FromStr,
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    let words = read_lines_of_words_delim(input_file, delim, hdr_line)?;

    let lines: anyhow::Result<Vec<Vec<T>>> = words
        .lines
        .par_iter()
        .map(|ws| {
            ws.iter()
                .map(|w| {
                    w.parse::<T>()
                        .map_err(|e| anyhow::anyhow!("failed to parse '{}': {:?}", w, e))
                })
                .collect()
        })
        .collect();

    Ok(ReadLinesOut {
        lines: lines?,
        header: words.header,
    })
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let ext = Path::new(input_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let input_file = File::open(input_file)?;
            let decoder = GzDecoder::new(input_file);
            Ok(Box::new(BufReader::new(decoder)))
        }
        _ => {
            let input_file = File::open(input_file)?;
            Ok(Box::new(BufReader::new(input_file)))
        }
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn std::io::Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    let ext = Path::new(output_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let output_file = File::create(output_file)?;
            let encoder =
                flate2::write::GzEncoder::new(output_file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => {
            let output_file = File::create(output_file)?;
            Ok(Box::new(BufWriter::new(output_file)))
        }
    }
}

///
/// Create the parent directory of a file if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

