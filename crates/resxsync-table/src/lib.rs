//! Translation tables: a CSV workbook holding one worksheet of
//! (key, English value, translated value) rows below three header rows.

use std::io::{Read, Write};
use std::path::Path;

use resxsync_core::{ResxError, Result, TranslationEntry};

/// Rows above the data: title, notes, column captions.
pub const HEADER_ROWS: usize = 3;
/// First data row, 1-based like spreadsheet row numbers.
pub const DATA_START_ROW: usize = HEADER_ROWS + 1;
/// CSV workbooks carry exactly one worksheet.
pub const DEFAULT_SHEET: usize = 1;

const KEY_COLUMN: usize = 0;
const ENGLISH_COLUMN: usize = 1;
const TRANSLATION_COLUMN: usize = 2;

fn default_header() -> Vec<Vec<String>> {
    vec![
        vec!["Resource translation table".to_string()],
        vec!["Rows below are matched by key, or by English value when the key is blank.".to_string()],
        vec!["Key".to_string(), "English".to_string(), "Translation".to_string()],
    ]
}

fn check_sheet(sheet: usize) -> std::result::Result<(), ResxError> {
    if sheet == DEFAULT_SHEET {
        Ok(())
    } else {
        Err(ResxError::SheetNotFound { sheet })
    }
}

/// Read every data row of worksheet `sheet`, skipping rows with all three cells blank.
pub fn read_rows(path: &Path, sheet: usize) -> Result<Vec<TranslationEntry>> {
    check_sheet(sheet)?;
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ResxError::NotFound {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(e) => return Err(e.into()),
    };
    let rows = read_from(file)?;
    tracing::debug!(event = "table_read", path = %path.display(), rows = rows.len());
    Ok(rows)
}

pub fn read_from<R: Read>(reader: R) -> Result<Vec<TranslationEntry>> {
    let mut out = Vec::new();
    for (row, record) in numbered_records(reader)? {
        if row < DATA_START_ROW {
            continue;
        }
        let cell = |i: usize| unguard(record.get(i).unwrap_or("").trim());
        let key = cell(KEY_COLUMN);
        let entry = TranslationEntry {
            key: (!key.is_empty()).then_some(key),
            english_value: cell(ENGLISH_COLUMN),
            translated_value: cell(TRANSLATION_COLUMN),
        };
        if !entry.is_blank() {
            out.push(entry);
        }
    }
    Ok(out)
}

/// Write `entries` as the data rows of worksheet `sheet`. The header rows of
/// an existing file are kept; its previous data rows are replaced.
pub fn write_rows(entries: &[TranslationEntry], path: &Path, sheet: usize) -> Result<()> {
    check_sheet(sheet)?;
    let header = match std::fs::File::open(path) {
        Ok(f) => read_header(f)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => default_header(),
        Err(e) => return Err(e.into()),
    };

    let mut buf = Vec::new();
    write_to(&mut buf, &header, entries)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, buf)?;
    tracing::info!(event = "table_written", path = %path.display(), rows = entries.len());
    Ok(())
}

pub fn write_to<W: Write>(writer: W, header: &[Vec<String>], entries: &[TranslationEntry]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    // short or blank template rows still take up a row each
    for row in header.iter().take(HEADER_ROWS) {
        if row.is_empty() {
            wtr.write_record([""])?;
        } else {
            wtr.write_record(row)?;
        }
    }
    for _ in header.len()..HEADER_ROWS {
        wtr.write_record([""])?;
    }

    for e in entries {
        let key = guard(e.key.as_deref().unwrap_or(""));
        let english = guard(&e.english_value);
        let translated = guard(&e.translated_value);
        wtr.write_record([key.as_str(), english.as_str(), translated.as_str()])?;
    }

    wtr.flush()?;
    Ok(())
}

/// The first three spreadsheet rows of a file, blank rows included.
fn read_header<R: Read>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut rows = vec![Vec::new(); HEADER_ROWS];
    let mut any = false;
    for (row, record) in numbered_records(reader)? {
        if row >= DATA_START_ROW {
            break;
        }
        rows[row - 1] = record.iter().map(str::to_string).collect();
        any = true;
    }
    if !any {
        return Ok(default_header());
    }
    Ok(rows)
}

/// Records paired with their 1-based spreadsheet row. The csv reader skips
/// empty lines, which a spreadsheet still counts as rows.
fn numbered_records<R: Read>(reader: R) -> Result<Vec<(usize, csv::StringRecord)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut out = Vec::new();
    let mut next_row = 1;
    let mut next_line = 1;
    for record in rdr.records() {
        let record = record?;
        let line = record
            .position()
            .map_or(next_line, |p| p.line() as usize);
        let row = next_row + line.saturating_sub(next_line);
        // quoted cells may span several lines of one row
        let spanned: usize = record.iter().map(|f| f.matches('\n').count()).sum();
        next_row = row + 1;
        next_line = line + 1 + spanned;
        out.push((row, record));
    }
    Ok(out)
}

/// Cells a spreadsheet would evaluate as formulas get a leading quote.
fn guard(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

fn unguard(cell: &str) -> String {
    match cell.strip_prefix('\'') {
        Some(rest) if rest.starts_with(['=', '+', '-', '@']) => rest.to_string(),
        _ => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
Translations,,
generated by hand,,
Key,English,Spanish
Greeting,\"Hello, world\",\"Hola, mundo\"
,,
, Only a single value should be found. ,  Solo debe encontrarse un valor.
Orphan
";

    #[test]
    fn header_rows_and_blank_rows_are_skipped() {
        let rows = read_from(TABLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], TranslationEntry::new(Some("Greeting"), "Hello, world", "Hola, mundo"));
        assert_eq!(
            rows[1],
            TranslationEntry::new(None, "Only a single value should be found.", "Solo debe encontrarse un valor.")
        );
        // short rows are padded
        assert_eq!(rows[2], TranslationEntry::new(Some("Orphan"), "", ""));
    }

    #[test]
    fn blank_lines_in_the_header_still_count_as_rows() {
        let rows = read_from("Title\n\nKey,English,Spanish\nGreeting,Hello,Hola\n".as_bytes()).unwrap();
        assert_eq!(rows, [TranslationEntry::new(Some("Greeting"), "Hello", "Hola")]);

        // a quoted caption spanning two lines is still one row
        let rows = read_from("Title\n\"two\nlines\"\nKey,English,Spanish\n,Save,Guardar\n".as_bytes()).unwrap();
        assert_eq!(rows, [TranslationEntry::new(None, "Save", "Guardar")]);

        // blank lines between data rows are just skipped
        let rows = read_from("T\n\n\n\nA,One,Uno\n\nB,Two,Dos\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn template_header_with_a_blank_row_keeps_its_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "Title\n\nKey,English,Spanish\nOld,Viejo,Antiguo\n").unwrap();
        let entries = vec![TranslationEntry::new(Some("Greeting"), "Hello", "Hola")];
        write_rows(&entries, &path, DEFAULT_SHEET).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().nth(2), Some("Key,English,Spanish"));
        assert_eq!(text.lines().nth(HEADER_ROWS), Some("Greeting,Hello,Hola"));
        assert_eq!(read_rows(&path, DEFAULT_SHEET).unwrap(), entries);
    }

    #[test]
    fn other_sheets_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, TABLE).unwrap();
        let err = read_rows(&path, 2).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResxError>(),
            Some(ResxError::SheetNotFound { sheet: 2 })
        ));
    }

    #[test]
    fn written_rows_read_back_and_keep_template_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, TABLE).unwrap();
        let entries = vec![
            TranslationEntry::new(Some("Total"), "=SUM(A1)", "-1 items"),
            TranslationEntry::new(Some("Mail"), "@ home", "en casa"),
        ];
        write_rows(&entries, &path, DEFAULT_SHEET).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Translations,,\ngenerated by hand,,\nKey,English,Spanish\n"));
        assert!(text.contains("'=SUM(A1)"));
        assert!(!text.contains("Hola, mundo"));
        assert_eq!(read_rows(&path, DEFAULT_SHEET).unwrap(), entries);
    }

    #[test]
    fn new_file_gets_default_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("new.csv");
        write_rows(&[TranslationEntry::new(Some("A"), "One", "Uno")], &path, DEFAULT_SHEET).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), DATA_START_ROW);
        assert_eq!(text.lines().nth(HEADER_ROWS), Some("A,One,Uno"));
    }
}
