use crate::error::Result;
use crate::parse::{parse_date, parse_flag, parse_float, parse_int};
use crate::types::LoanRecord;
use csv::ByteRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Equality filter on the borrower's state and the NAICS industry code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub state: String,
    pub naics_code: String,
}

impl RowFilter {
    pub fn new(state: impl Into<String>, naics_code: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            naics_code: naics_code.into(),
        }
    }
}

/// Position of every known column in the header row. Columns the file does
/// not carry stay `None` and read as "no value".
#[derive(Debug)]
struct ColumnIndex {
    loan_number: Option<usize>,
    date_approved: Option<usize>,
    borrower_name: Option<usize>,
    borrower_address: Option<usize>,
    borrower_city: Option<usize>,
    borrower_state: Option<usize>,
    borrower_zip: Option<usize>,
    initial_approval_amount: Option<usize>,
    current_approval_amount: Option<usize>,
    forgiveness_amount: Option<usize>,
    forgiveness_date: Option<usize>,
    loan_status: Option<usize>,
    jobs_reported: Option<usize>,
    naics_code: Option<usize>,
    business_type: Option<usize>,
    originating_lender: Option<usize>,
    payroll_proceed: Option<usize>,
    rent_proceed: Option<usize>,
    utilities_proceed: Option<usize>,
    non_profit: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &ByteRecord) -> Self {
        let names: Vec<String> = headers
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();
        let find = |name: &str| names.iter().position(|h| h == name);

        Self {
            loan_number: find("LoanNumber"),
            date_approved: find("DateApproved"),
            borrower_name: find("BorrowerName"),
            borrower_address: find("BorrowerAddress"),
            borrower_city: find("BorrowerCity"),
            borrower_state: find("BorrowerState"),
            borrower_zip: find("BorrowerZip"),
            initial_approval_amount: find("InitialApprovalAmount"),
            current_approval_amount: find("CurrentApprovalAmount"),
            forgiveness_amount: find("ForgivenessAmount"),
            forgiveness_date: find("ForgivenessDate"),
            loan_status: find("LoanStatus"),
            jobs_reported: find("JobsReported"),
            naics_code: find("NAICSCode"),
            business_type: find("BusinessType"),
            originating_lender: find("OriginatingLender"),
            payroll_proceed: find("PAYROLL_PROCEED"),
            rent_proceed: find("RENT_PROCEED"),
            utilities_proceed: find("UTILITIES_PROCEED"),
            non_profit: find("NonProfit"),
        }
    }

    fn matches(&self, row: &ByteRecord, filter: &RowFilter) -> bool {
        let field = |column: Option<usize>| column.and_then(|i| row.get(i));
        field(self.borrower_state) == Some(filter.state.as_bytes())
            && field(self.naics_code) == Some(filter.naics_code.as_bytes())
    }

    fn to_record(&self, row: &ByteRecord, line: u64) -> LoanRecord {
        let text = |column: Option<usize>| decode(row, column, line);
        let raw = |column: Option<usize>| text(column).unwrap_or_default();

        LoanRecord {
            loan_number: text(self.loan_number),
            date_approved: parse_date(&raw(self.date_approved)),
            borrower_name: text(self.borrower_name),
            borrower_address: text(self.borrower_address),
            borrower_city: text(self.borrower_city),
            borrower_state: text(self.borrower_state),
            borrower_zip: text(self.borrower_zip),
            initial_approval_amount: parse_float(&raw(self.initial_approval_amount)),
            current_approval_amount: parse_float(&raw(self.current_approval_amount)),
            forgiveness_amount: parse_float(&raw(self.forgiveness_amount)),
            forgiveness_date: parse_date(&raw(self.forgiveness_date)),
            loan_status: text(self.loan_status),
            jobs_reported: parse_int(&raw(self.jobs_reported)),
            naics_code: text(self.naics_code),
            business_type: text(self.business_type),
            lender_name: text(self.originating_lender),
            payroll_proceed: parse_float(&raw(self.payroll_proceed)),
            rent_proceed: parse_float(&raw(self.rent_proceed)),
            utilities_proceed: parse_float(&raw(self.utilities_proceed)),
            is_nonprofit: parse_flag(&raw(self.non_profit)),
        }
    }
}

/// Text of one cell. Empty, absent and non-UTF-8 cells have no value; a bad
/// cell never costs the rest of its row.
fn decode(row: &ByteRecord, column: Option<usize>, line: u64) -> Option<String> {
    let bytes = row.get(column?)?;
    if bytes.is_empty() {
        return None;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Some(s.to_string()),
        Err(e) => {
            warn!("Dropping undecodable field {} on line {}: {}", column.unwrap_or_default(), line, e);
            None
        }
    }
}

/// Streams a PPP disclosure CSV and yields the rows that pass a [`RowFilter`].
pub struct LoanExtractor<R: Read> {
    reader: csv::Reader<R>,
    columns: ColumnIndex,
    filter: RowFilter,
}

impl LoanExtractor<File> {
    /// Open the input file. Failing to open it is fatal for the run.
    pub fn from_path(path: &Path, filter: RowFilter) -> Result<Self> {
        let file = File::open(path)?;
        info!("Reading loans from {}", path.display());
        Self::from_reader(file, filter)
    }
}

impl<R: Read> LoanExtractor<R> {
    /// Wrap a reader and read its header row.
    pub fn from_reader(rdr: R, filter: RowFilter) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);
        let columns = ColumnIndex::from_headers(reader.byte_headers()?);
        Ok(Self {
            reader,
            columns,
            filter,
        })
    }

    /// Lazily filter and normalize rows. Rows the CSV reader cannot split are
    /// logged and skipped.
    pub fn records(self) -> impl Iterator<Item = LoanRecord> {
        let Self {
            reader,
            columns,
            filter,
        } = self;
        reader
            .into_byte_records()
            .enumerate()
            .filter_map(move |(index, row)| {
                // header is line 1, first data row is line 2
                let line = index as u64 + 2;
                match row {
                    Ok(row) if columns.matches(&row, &filter) => Some(columns.to_record(&row, line)),
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Skipping unreadable row at line {}: {}", line, e);
                        None
                    }
                }
            })
            .inspect(|record| debug!("Matched loan {}", record.loan_number_or_blank()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "LoanNumber,DateApproved,BorrowerName,BorrowerAddress,BorrowerCity,BorrowerState,BorrowerZip,InitialApprovalAmount,CurrentApprovalAmount,ForgivenessAmount,ForgivenessDate,LoanStatus,JobsReported,NAICSCode,BusinessType,OriginatingLender,PAYROLL_PROCEED,RENT_PROCEED,UTILITIES_PROCEED,NonProfit";

    fn extract(csv: &str) -> Vec<LoanRecord> {
        LoanExtractor::from_reader(csv.as_bytes(), RowFilter::new("MN", "624410"))
            .unwrap()
            .records()
            .collect()
    }

    #[test]
    fn test_only_matching_state_and_naics_are_kept() {
        let csv = format!(
            "{HEADER}\n\
             1,01/15/2021,Little Stars,1 Main St,Duluth,MN,55802,\"160,000.00\",\"160,000.00\",,,Exemption 4,12,624410,Corporation,Bank A,\"150,000.00\",,,N\n\
             2,01/15/2021,Sunny Days,2 Elm St,Fresno,CA,93650,200000,200000,,,Exemption 4,8,624410,LLC,Bank B,,,,N\n\
             3,01/15/2021,Green Acres,3 Oak St,Ely,MN,55731,300000,300000,,,Exemption 4,4,111000,LLC,Bank C,,,,N\n"
        );
        let records = extract(&csv);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].loan_number.as_deref(), Some("1"));
        assert_eq!(records[0].borrower_name.as_deref(), Some("Little Stars"));
    }

    #[test]
    fn test_fields_are_normalized() {
        let csv = format!(
            "{HEADER}\n\
             9547507704,5/1/2020,Kids Corner,10 Lake Rd,Minneapolis,MN,55401-1234,\"1,234.50\",1234.5,1240.12,3/9/2021,Paid in Full,15.0,624410,Non-Profit Organization,Bremer Bank,1000,200,,y\n"
        );
        let record = extract(&csv).remove(0);
        assert_eq!(record.date_approved.as_deref(), Some("2020-05-01"));
        assert_eq!(record.initial_approval_amount, Some(1234.50));
        assert_eq!(record.forgiveness_amount, Some(1240.12));
        assert_eq!(record.forgiveness_date.as_deref(), Some("2021-03-09"));
        assert_eq!(record.jobs_reported, Some(15));
        assert_eq!(record.lender_name.as_deref(), Some("Bremer Bank"));
        assert_eq!(record.payroll_proceed, Some(1000.0));
        assert_eq!(record.utilities_proceed, None);
        assert_eq!(record.borrower_zip.as_deref(), Some("55401-1234"));
        assert!(record.is_nonprofit);
    }

    #[test]
    fn test_columns_are_found_by_name() {
        let csv = "NAICSCode,NonProfit,BorrowerState,LoanNumber,BorrowerName\n\
                   624410,Y,MN,77,Reordered Care\n";
        let records = extract(csv);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.loan_number.as_deref(), Some("77"));
        assert!(record.is_nonprofit);
        assert_eq!(record.date_approved, None);
        assert_eq!(record.jobs_reported, None);
        assert_eq!(record.lender_name, None);
    }

    #[test]
    fn test_duplicate_loan_numbers_pass_through() {
        let csv = "LoanNumber,BorrowerState,NAICSCode\n5,MN,624410\n5,MN,624410\n";
        assert_eq!(extract(csv).len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = LoanExtractor::from_path(&dir.path().join("missing.csv"), RowFilter::new("MN", "624410"));
        assert!(result.is_err());
    }

    #[test]
    fn test_undecodable_field_keeps_the_row() {
        let mut csv = b"LoanNumber,BorrowerName,BorrowerState,NAICSCode,JobsReported\n".to_vec();
        csv.extend_from_slice(b"1,Caf\xe9 Kids,MN,624410,4\n");
        csv.extend_from_slice(b"2,Fine,MN,624410,5\n");

        let records: Vec<LoanRecord> = LoanExtractor::from_reader(csv.as_slice(), RowFilter::new("MN", "624410"))
            .unwrap()
            .records()
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].loan_number.as_deref(), Some("1"));
        assert_eq!(records[0].borrower_name, None);
        assert_eq!(records[0].jobs_reported, Some(4));
        assert_eq!(records[1].borrower_name.as_deref(), Some("Fine"));
    }

    #[test]
    fn test_empty_text_cells_have_no_value() {
        let csv = format!("{HEADER}\n,,,,,MN,,,,,,,,624410,,,,,,\n");
        let records = extract(&csv);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.loan_number, None);
        assert_eq!(record.borrower_name, None);
        assert_eq!(record.business_type, None);
        assert_eq!(record.lender_name, None);
        assert_eq!(record.initial_approval_amount, None);
        assert!(!record.is_nonprofit);
    }
}
