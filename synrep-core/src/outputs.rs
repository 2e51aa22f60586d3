use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::date_range::DateRange;
use crate::error::{Error, Result};
use crate::format::{Cell, Table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV file encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Encoding {
    #[default]
    #[strum(to_string = "utf8-bom", serialize = "utf-8", serialize = "utf8")]
    Utf8Bom,

    #[strum(to_string = "sjis", serialize = "shift_jis", serialize = "cp932")]
    ShiftJis,
}

fn needs_quoting(field: &str) -> bool {
    field.chars().any(|c| matches!(c, ',' | '"' | '\n' | '\r'))
}

fn push_field(out: &mut String, field: &str) {
    if needs_quoting(field) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str("\r\n");
}

/// Renders the table as RFC 4180 CSV text, header first.
pub fn to_csv_string(table: &Table) -> String {
    let mut out = String::new();
    push_record(&mut out, table.headers().iter().map(String::as_str));
    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(Cell::to_string).collect();
        push_record(&mut out, cells.iter().map(String::as_str));
    }
    out
}

/// Encodes the table; characters Shift_JIS cannot represent are an error.
pub fn encode_csv(table: &Table, encoding: Encoding) -> Result<Vec<u8>> {
    let text = to_csv_string(table);
    match encoding {
        Encoding::Utf8Bom => {
            let mut bytes = Vec::with_capacity(UTF8_BOM.len() + text.len());
            bytes.extend_from_slice(UTF8_BOM);
            bytes.extend_from_slice(text.as_bytes());
            Ok(bytes)
        }
        Encoding::ShiftJis => {
            let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(&text);
            if had_errors {
                return Err(first_unencodable(&text));
            }
            Ok(bytes.into_owned())
        }
    }
}

fn first_unencodable(text: &str) -> Error {
    let mut buf = [0u8; 4];
    for (row, line) in text.split("\r\n").enumerate() {
        for ch in line.chars() {
            let (_, _, bad) = encoding_rs::SHIFT_JIS.encode(ch.encode_utf8(&mut buf));
            if bad {
                return Error::Unencodable {
                    ch,
                    row,
                    encoding: "Shift_JIS",
                };
            }
        }
    }
    Error::Unencodable {
        ch: char::REPLACEMENT_CHARACTER,
        row: 0,
        encoding: "Shift_JIS",
    }
}

/// `synthetic_metrics_{range}_{YYYYmmddHHMMSS}.csv`
pub fn output_filename<Tz>(range: &DateRange, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "synthetic_metrics_{}_{}.csv",
        range.file_label(),
        now.format("%Y%m%d%H%M%S")
    )
}

fn sanitize_file_name(name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(p)), None) => Ok(PathBuf::from(p)),
        _ => Err(Error::InvalidOutputPath(name.to_string())),
    }
}

/// Writes the encoded report into `dir` (created if missing) and returns the
/// full path.
pub fn write_report(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let name = sanitize_file_name(file_name)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "report written");
    Ok(path)
}
