//! Comma-separated import and export.
//!
//! The codec maps between records and text. It never decides whether a row
//! is valid: decoding yields [`CandidateFields`] for the register to resolve.

use std::{borrow::Cow, collections::HashMap, io, iter::Peekable, str::Chars};

use tracing::debug;

use crate::domain::{AssetRecord, CandidateFields, Field, Schema};

const DELIMITER: char = ',';
const QUOTE: char = '"';
const BOM: char = '\u{feff}';

/// Encodes records as a header line followed by one line per record.
#[must_use]
pub fn encode(records: &[AssetRecord]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        Schema::columns().iter().map(|field| Cow::Borrowed(field.header())),
    );
    for record in records {
        push_line(
            &mut out,
            Schema::columns().iter().map(|&field| record.value(field)),
        );
    }
    out
}

/// Encodes records into a writer.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn encode_to<W: io::Write>(records: &[AssetRecord], writer: &mut W) -> io::Result<()> {
    writer.write_all(encode(records).as_bytes())
}

fn push_line<'a>(out: &mut String, values: impl Iterator<Item = Cow<'a, str>>) {
    for (i, value) in values.enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        out.push_str(&escape(&value));
    }
    out.push('\n');
}

/// Quotes a value if it contains a delimiter, a quote or a line break.
fn escape(value: &str) -> Cow<'_, str> {
    if value.contains([DELIMITER, QUOTE, '\n', '\r']) {
        let escaped = value.replace(QUOTE, "\"\"");
        Cow::Owned(format!("\"{escaped}\""))
    } else {
        Cow::Borrowed(value)
    }
}

/// Errors that can occur when decoding an imported table.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The text has no header row.
    #[error("the file is empty: expected a header row")]
    MissingHeader,
    /// Required columns are absent from the header.
    #[error("missing required columns: {}", display_fields(.0))]
    MissingColumns(Vec<Field>),
    /// Two header cells name the same field.
    #[error("column '{column}' appears more than once")]
    DuplicateColumn {
        /// The second header naming the field.
        column: String,
    },
    /// A quoted value is never closed.
    #[error("unterminated quoted value starting on line {line}")]
    UnterminatedQuote {
        /// Line on which the quoted value opens.
        line: usize,
    },
    /// Text follows a closing quote before the next delimiter.
    #[error("unexpected character after closing quote on line {line}")]
    UnexpectedCharacter {
        /// Line of the offending character.
        line: usize,
    },
    /// A row does not have one cell per header column.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// 1-based position of the row, not counting the header.
        row: usize,
        /// Number of header columns.
        expected: usize,
        /// Number of cells in the row.
        found: usize,
    },
}

fn display_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|field| field.header())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decodes an imported table into candidate rows.
///
/// Columns may appear in any order and are matched by header, key or a
/// historical alias. Unknown columns are ignored. Blank lines are skipped.
///
/// # Errors
///
/// Returns an error if the text is not well-formed or lacks a required
/// column. No rows are returned in that case.
pub fn decode(text: &str) -> Result<Vec<CandidateFields>, DecodeError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut reader = Reader::new(text);

    let header = loop {
        match reader.next_record()? {
            None => return Err(DecodeError::MissingHeader),
            Some(cells) if is_blank(&cells) => {}
            Some(cells) => break cells,
        }
    };
    let columns = map_columns(&header)?;

    let mut rows = Vec::new();
    while let Some(cells) = reader.next_record()? {
        if is_blank(&cells) {
            continue;
        }
        let row = rows.len() + 1;
        if cells.len() != columns.len() {
            return Err(DecodeError::RaggedRow {
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        let candidate: CandidateFields = columns
            .iter()
            .zip(cells)
            .filter_map(|(column, cell)| column.map(|field| (field, cell)))
            .collect();
        rows.push(candidate);
    }

    debug!(rows = rows.len(), "decoded table");
    Ok(rows)
}

fn is_blank(cells: &[String]) -> bool {
    matches!(cells, [cell] if cell.is_empty())
}

/// Maps each header cell to the field it names, if any.
fn map_columns(header: &[String]) -> Result<Vec<Option<Field>>, DecodeError> {
    let mut seen = HashMap::new();
    let mut columns = Vec::with_capacity(header.len());
    for name in header {
        let field = Field::from_name(name);
        match field {
            Some(field) => {
                if seen.insert(field, name).is_some() {
                    return Err(DecodeError::DuplicateColumn {
                        column: name.clone(),
                    });
                }
            }
            None => debug!("ignoring unknown column '{name}'"),
        }
        columns.push(field);
    }

    let missing: Vec<_> = Schema::required_columns()
        .filter(|field| !seen.contains_key(field))
        .collect();
    if !missing.is_empty() {
        return Err(DecodeError::MissingColumns(missing));
    }

    Ok(columns)
}

/// How a cell ended.
enum CellEnd {
    Delimiter,
    Record,
    Eof,
}

/// Splits text into records of cells.
///
/// Quoted cells may contain delimiters, doubled quotes and line breaks.
/// Records end at LF, CRLF or a lone CR.
struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn next_record(&mut self) -> Result<Option<Vec<String>>, DecodeError> {
        if self.chars.peek().is_none() {
            return Ok(None);
        }
        let mut cells = Vec::new();
        loop {
            let (cell, end) = self.next_cell()?;
            cells.push(cell);
            match end {
                CellEnd::Delimiter => {}
                CellEnd::Record | CellEnd::Eof => return Ok(Some(cells)),
            }
        }
    }

    fn next_cell(&mut self) -> Result<(String, CellEnd), DecodeError> {
        if self.chars.peek() == Some(&QUOTE) {
            self.chars.next();
            return self.quoted_cell();
        }

        let mut cell = String::new();
        loop {
            match self.chars.next() {
                None => return Ok((cell, CellEnd::Eof)),
                Some(DELIMITER) => return Ok((cell, CellEnd::Delimiter)),
                Some('\n') => {
                    self.line += 1;
                    return Ok((cell, CellEnd::Record));
                }
                Some('\r') => {
                    self.end_carriage_return();
                    return Ok((cell, CellEnd::Record));
                }
                Some(c) => cell.push(c),
            }
        }
    }

    fn quoted_cell(&mut self) -> Result<(String, CellEnd), DecodeError> {
        let opened = self.line;
        let mut cell = String::new();
        loop {
            match self.chars.next() {
                None => return Err(DecodeError::UnterminatedQuote { line: opened }),
                Some(QUOTE) if self.chars.peek() == Some(&QUOTE) => {
                    self.chars.next();
                    cell.push(QUOTE);
                }
                Some(QUOTE) => break,
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    cell.push(c);
                }
            }
        }

        match self.chars.next() {
            None => Ok((cell, CellEnd::Eof)),
            Some(DELIMITER) => Ok((cell, CellEnd::Delimiter)),
            Some('\n') => {
                self.line += 1;
                Ok((cell, CellEnd::Record))
            }
            Some('\r') => {
                self.end_carriage_return();
                Ok((cell, CellEnd::Record))
            }
            Some(_) => Err(DecodeError::UnexpectedCharacter { line: self.line }),
        }
    }

    fn end_carriage_return(&mut self) {
        if self.chars.peek() == Some(&'\n') {
            self.chars.next();
        }
        self.line += 1;
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{BreachActionsStatus, Register, RopaStatus, SharedExternally};

    fn register_with(candidates: &[CandidateFields]) -> Register {
        let mut register = Register::new();
        for candidate in candidates {
            register.append(candidate).unwrap();
        }
        register
    }

    fn payroll() -> CandidateFields {
        CandidateFields::new()
            .with(Field::AssetName, "Payroll Spreadsheet")
            .with(Field::Owner, "Jane Smith")
            .with(Field::Location, "Network Drive")
            .with(Field::LastAuditDate, "2024-01-15")
            .with(Field::IsMobileDevice, "No")
            .with(Field::SharedExternally, "No")
    }

    fn round_trip(register: &Register) -> Register {
        let text = encode(register.snapshot());
        let mut decoded = Register::new();
        let report = decoded.bulk_load(decode(&text).unwrap());
        assert!(report.is_clean(), "{:?}", report.rejected);
        decoded
    }

    #[test_case("plain", "plain")]
    #[test_case("a,b", "\"a,b\"")]
    #[test_case("say \"hi\"", "\"say \"\"hi\"\"\"")]
    #[test_case("two\nlines", "\"two\nlines\"")]
    #[test_case("", "")]
    fn escape_quotes_only_when_needed(input: &str, expected: &str) {
        assert_eq!(escape(input), expected);
    }

    #[test]
    fn encode_writes_header_in_column_order() {
        let text = encode(&[]);
        assert_eq!(
            text,
            "Asset Name,Owner,Supplier,Contract Location,Contract Dates,Purpose,Location,Special \
             Category Data,Shared Externally,ROPA Status,Breach Risks,Security Measures,Mobile \
             Device,Date Issued,Date Returned,Last Audit,Breach Since Audit,Breach Actions \
             Status\n"
        );
    }

    #[test]
    fn encode_uses_canonical_text() {
        let register = register_with(&[payroll()]);
        let text = encode(register.snapshot());
        let line = text.lines().nth(1).unwrap();

        assert_eq!(
            line,
            "Payroll Spreadsheet,Jane Smith,,,,,Network Drive,No,No,N/A,,,No,N/A,N/A,2024-01-15,No,\
             N/A"
        );
    }

    #[test]
    fn payroll_round_trips_into_empty_register() {
        let register = register_with(&[payroll()]);
        assert_eq!(round_trip(&register), register);
    }

    #[test]
    fn awkward_text_round_trips() {
        let awkward = payroll()
            .with(Field::Purpose, "Salaries, bonuses and \"benefits\"\nsecond line")
            .with(Field::BreachRisks, "line one\r\nline two")
            .with(Field::ContractDates, "  01/2024 - 01/2025 ")
            .with(Field::IsMobileDevice, "Yes")
            .with(Field::DateIssued, "2023-05-01")
            .with(Field::SharedExternally, "Yes - Both")
            .with(Field::RopaStatus, "Under Review")
            .with(Field::BreachSinceAudit, "Yes")
            .with(Field::BreachActionsStatus, "In Progress")
            .with(Field::SpecialCategoryData, "Yes");
        let register = register_with(&[payroll(), awkward, payroll().with(Field::Owner, "O'Neil")]);

        let decoded = round_trip(&register);
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded, register);
    }

    #[test]
    fn columns_may_come_in_any_order() {
        let text = "Last Audit,Owner,Location,Asset Name,Unknown\n2024-01-15,Jane,Cabinet,Keys,x\n";
        let rows = decode(text).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Field::AssetName), Some("Keys"));
        assert_eq!(rows[0].get(Field::LastAuditDate), Some("2024-01-15"));
        assert_eq!(rows[0].len(), 4);
    }

    #[test]
    fn legacy_export_decodes() {
        let text = "Asset Name,Owner,Supplier,Purpose,Location,Shared Externally,Breach \
                    Risks,Mobile Device,Last Audit,Breach Since Audit\r\nClient Billing,Jane \
                    Smith,Acme,Invoices,Azure,No,Fraud,No,2024-01-15,No\r\n";

        let mut register = Register::new();
        let report = register.bulk_load(decode(text).unwrap());

        assert!(report.is_clean());
        let record = register.get(0).unwrap();
        assert_eq!(record.supplier(), "Acme");
        assert_eq!(record.location(), "Azure");
    }

    #[test]
    fn legacy_shared_and_breached_rows_import() {
        let text = "Asset Name,Owner,Supplier,Purpose,Location,Shared Externally,Breach \
                    Risks,Mobile Device,Last Audit,Breach Since Audit\n\
                    Client Billing,Jane Smith,Acme,Invoices,Azure,Yes,Fraud,No,2024-01-15,No\n\
                    Laptops,IT,,,Office,No,Theft,Yes,2024-02-01,Yes\n";

        let mut register = Register::new();
        let report = register.bulk_load(decode(text).unwrap());

        assert!(report.is_clean(), "{:?}", report.rejected);
        let billing = register.get(0).unwrap();
        assert_eq!(billing.shared_externally(), SharedExternally::SharedExternally);
        assert_eq!(billing.ropa_status(), RopaStatus::UnderReview);
        let laptops = register.get(1).unwrap();
        assert_eq!(
            laptops.breach_actions_status(),
            BreachActionsStatus::InProgress
        );
        assert_eq!(round_trip(&register), register);
    }

    #[test]
    fn other_location_round_trips_as_its_companion() {
        let mut register = register_with(&[payroll()
            .with(Field::Location, "Other")
            .with(Field::LocationOther, "Basement safe")]);

        let refused = payroll()
            .with(Field::Location, "Other")
            .with(Field::LocationOther, "other");
        assert!(register.append(&refused).is_err());

        assert_eq!(register.len(), 1);
        assert_eq!(round_trip(&register), register);
    }

    #[test]
    fn missing_required_columns_is_an_error() {
        let error = decode("Asset Name,Supplier\nPayroll,Acme\n").unwrap_err();
        assert_eq!(
            error,
            DecodeError::MissingColumns(vec![
                Field::Owner,
                Field::Location,
                Field::LastAuditDate
            ])
        );
        assert_eq!(
            error.to_string(),
            "missing required columns: Owner, Location, Last Audit"
        );
    }

    #[test]
    fn missing_optional_columns_default() {
        let text = "asset_name,owner,location,last_audit_date\nA,B,C,2024-01-15\n";
        let rows = decode(text).unwrap();
        let mut register = Register::new();
        assert!(register.bulk_load(rows).is_clean());
        assert_eq!(register.get(0).unwrap().supplier(), "");
        assert!(!register.get(0).unwrap().special_category_data());
    }

    #[test_case("" ; "empty")]
    #[test_case("\n\n" ; "blank lines")]
    #[test_case("\u{feff}" ; "bom only")]
    fn no_header_is_an_error(text: &str) {
        assert_eq!(decode(text), Err(DecodeError::MissingHeader));
    }

    #[test]
    fn duplicate_column_is_an_error() {
        let error = decode("Asset Name,Owner,Location,Last Audit,asset_name\n").unwrap_err();
        assert_eq!(
            error,
            DecodeError::DuplicateColumn {
                column: "asset_name".to_string()
            }
        );
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let text = "Asset Name,Owner,Location,Last Audit\nA,B,\"C\n,2024-01-15\n";
        assert_eq!(
            decode(text),
            Err(DecodeError::UnterminatedQuote { line: 2 })
        );
    }

    #[test]
    fn text_after_closing_quote_is_an_error() {
        let text = "Asset Name,Owner,Location,Last Audit\n\"A\"x,B,C,2024-01-15\n";
        assert_eq!(
            decode(text),
            Err(DecodeError::UnexpectedCharacter { line: 2 })
        );
    }

    #[test]
    fn ragged_row_is_an_error() {
        let text = "Asset Name,Owner,Location,Last Audit\nA,B,C,2024-01-15\nA,B\n";
        assert_eq!(
            decode(text),
            Err(DecodeError::RaggedRow {
                row: 2,
                expected: 4,
                found: 2
            })
        );
    }

    #[test]
    fn bom_and_blank_lines_are_skipped() {
        let text = "\u{feff}Asset Name,Owner,Location,Last Audit\n\nA,B,C,2024-01-15\n\n";
        let rows = decode(text).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn decode_leaves_validity_to_the_register() {
        let text = "Asset Name,Owner,Location,Last Audit\n,B,C,2024-01-15\nA,B,C,2024-01-15\n";
        let rows = decode(text).unwrap();
        assert_eq!(rows.len(), 2);

        let mut register = Register::new();
        let report = register.bulk_load(rows);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.rejected[0].row, 1);
    }

    #[test]
    fn encode_to_writes_same_text() {
        let register = register_with(&[payroll()]);
        let mut buffer = Vec::new();
        encode_to(register.snapshot(), &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), encode(register.snapshot()));
    }
}
