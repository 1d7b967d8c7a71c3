//! Load loans from a CSV file
//!
//! Required columns: `loan_id`, `loan_amount`, `payment_amount`, `loan_term`.
//! Every other column becomes a covariate: numeric when the cell parses as a
//! number, categorical otherwise. Empty cells are skipped.

use csv::{Reader, StringRecord};
use std::path::Path;

use super::{Loan, LoanTerms};
use crate::error::LoadError;
use crate::hazard::CovariateVector;

const ID_COLUMN: &str = "loan_id";
const AMOUNT_COLUMN: &str = "loan_amount";
const PAYMENT_COLUMN: &str = "payment_amount";
const TERM_COLUMN: &str = "loan_term";

/// Positions of the required columns within the header
struct Layout {
    id: usize,
    amount: usize,
    payment: usize,
    term: usize,
}

impl Layout {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            id: find(ID_COLUMN)?,
            amount: find(AMOUNT_COLUMN)?,
            payment: find(PAYMENT_COLUMN)?,
            term: find(TERM_COLUMN)?,
        })
    }

    fn is_reserved(&self, idx: usize) -> bool {
        idx == self.id || idx == self.amount || idx == self.payment || idx == self.term
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<T, LoadError> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse().map_err(|_| LoadError::InvalidRow {
        row,
        reason: format!("cannot parse {} from '{}'", name, raw),
    })
}

fn to_loan(headers: &StringRecord, layout: &Layout, record: &StringRecord, row: usize) -> Result<Loan, LoadError> {
    let loan_id = record.get(layout.id).unwrap_or("").trim().to_string();
    let loan_amount: f64 = parse_field(record, layout.amount, AMOUNT_COLUMN, row)?;
    let payment_amount: f64 = parse_field(record, layout.payment, PAYMENT_COLUMN, row)?;
    let loan_term: u32 = parse_field(record, layout.term, TERM_COLUMN, row)?;

    let terms = LoanTerms::new(loan_amount, payment_amount, loan_term)?;

    let mut covariates = CovariateVector::new();
    for (idx, (name, cell)) in headers.iter().zip(record.iter()).enumerate() {
        if layout.is_reserved(idx) {
            continue;
        }
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        covariates.insert_parsed(name.trim(), cell);
    }

    Ok(Loan::new(loan_id, terms, covariates))
}

/// Load loans from any reader (e.g., string buffer, network stream)
pub fn load_loans_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Loan>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let layout = Layout::from_headers(&headers)?;
    let mut loans = Vec::new();

    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;
        loans.push(to_loan(&headers, &layout, &record, row + 1)?);
    }

    log::debug!("loaded {} loans", loans.len());
    Ok(loans)
}

/// Load all loans from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<Vec<Loan>, LoadError> {
    let file = std::fs::File::open(path)?;
    load_loans_from_reader(file)
}
