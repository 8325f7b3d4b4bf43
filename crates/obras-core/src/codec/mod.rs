//! CSV import and export of works.
//!
//! Import reads the `titulo`, `editora`, `foto` and `autores` columns (in any
//! order, extra columns ignored) into [`CreateObra`] values. Export writes
//! every [`Obra`] field, with `autores` in the same bracketed form import
//! accepts, so an exported file can be uploaded again.

pub mod authors;

use std::io;

use chrono::SecondsFormat;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use thiserror::Error;
use tracing::debug;
use validator::{Validate, ValidationErrors};

use crate::model::{CreateObra, Obra};

pub use authors::{AuthorsErrorKind, AuthorsParseError, parse_authors, render_authors};

/// Columns an upload must carry.
pub const IMPORT_COLUMNS: [&str; 4] = ["titulo", "editora", "foto", "autores"];

/// Header row of an export, in field order.
pub const EXPORT_COLUMNS: [&str; 7] = [
    "titulo",
    "editora",
    "foto",
    "autores",
    "id",
    "created_at",
    "updated_at",
];

/// Errors that reject a whole CSV upload.
#[derive(Debug, Error)]
pub enum CsvImportError {
    /// The header row lacks one of [`IMPORT_COLUMNS`].
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    /// A data row is shorter than the header and lacks a required cell.
    #[error("line {line}: missing value for column `{column}`")]
    MissingCell { line: u64, column: &'static str },

    /// The `autores` cell is not a bracketed list of strings.
    #[error("line {line}: invalid `autores` value: {source}")]
    Authors {
        line: u64,
        #[source]
        source: AuthorsParseError,
    },

    /// A row parsed but its fields break the create-request rules.
    #[error("line {line}: invalid row: {source}")]
    InvalidRow {
        line: u64,
        #[source]
        source: ValidationErrors,
    },

    /// The input is not UTF-8 CSV.
    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors while writing an export.
#[derive(Debug, Error)]
pub enum CsvExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Column positions of the required fields within the header.
struct ImportColumns {
    title: usize,
    publisher: usize,
    photo: usize,
    authors: usize,
}

impl ImportColumns {
    fn locate(headers: &StringRecord) -> Result<Self, CsvImportError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(CsvImportError::MissingColumn(name))
        };
        Ok(Self {
            title: find("titulo")?,
            publisher: find("editora")?,
            photo: find("foto")?,
            authors: find("autores")?,
        })
    }

    fn read_row(&self, record: &StringRecord) -> Result<CreateObra, CsvImportError> {
        let line = record.position().map_or(0, |p| p.line());
        let cell = |index: usize, column: &'static str| {
            record
                .get(index)
                .ok_or(CsvImportError::MissingCell { line, column })
        };
        let authors = parse_authors(cell(self.authors, "autores")?)
            .map_err(|source| CsvImportError::Authors { line, source })?;
        let request = CreateObra {
            title: cell(self.title, "titulo")?.to_owned(),
            publisher: cell(self.publisher, "editora")?.to_owned(),
            photo: cell(self.photo, "foto")?.to_owned(),
            authors,
        };
        request
            .validate()
            .map_err(|source| CsvImportError::InvalidRow { line, source })?;
        Ok(request)
    }
}

/// Parse an uploaded CSV document into create requests, in row order.
///
/// Spaces at the start of a field are dropped, as with a
/// `skipinitialspace` reader, before quoting is interpreted. Any failure
/// rejects the whole document.
pub fn read_obras(input: &str) -> Result<Vec<CreateObra>, CsvImportError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let normalized = skip_initial_space(input);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(normalized.as_bytes());

    let columns = ImportColumns::locate(reader.headers()?)?;

    let mut obras = Vec::new();
    for record in reader.records() {
        obras.push(columns.read_row(&record?)?);
    }
    debug!(rows = obras.len(), "csv import parsed");
    Ok(obras)
}

/// Write `obras` as CSV: header row, then one row per work, `\n`-terminated.
pub fn write_obras<W: io::Write>(writer: W, obras: &[Obra]) -> Result<(), CsvExportError> {
    let mut out = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    out.write_record(EXPORT_COLUMNS)?;
    for obra in obras {
        let id = obra.id.to_string();
        let authors = render_authors(&obra.authors);
        let created_at = obra.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, false);
        let updated_at = obra.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, false);
        out.write_record([
            obra.title.as_str(),
            obra.publisher.as_str(),
            obra.photo.as_str(),
            authors.as_str(),
            id.as_str(),
            created_at.as_str(),
            updated_at.as_str(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Drop spaces that open a field (after a delimiter or at line start),
/// leaving quoted content untouched.
fn skip_initial_space(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut field_start = true;
    let mut quoted = false;

    while let Some(c) = chars.next() {
        if quoted {
            out.push(c);
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    out.push('"');
                    chars.next();
                } else {
                    quoted = false;
                }
            }
            continue;
        }
        if field_start && c == ' ' {
            continue;
        }
        out.push(c);
        quoted = field_start && c == '"';
        field_start = matches!(c, ',' | '\n' | '\r');
    }
    out
}
