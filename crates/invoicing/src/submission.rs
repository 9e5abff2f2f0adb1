//! Normalization of raw submission payloads into [`NewInvoice`]s.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use invoicegate_core::{Money, VendorId};

use crate::fingerprint::{ContentFingerprint, FingerprintError};
use crate::invoice::{DocumentType, NewInvoice, TaxComponents};

/// Date layouts accepted for the invoice date, tried in order.
const INVOICE_DATE_FORMATS: [&str; 2] = ["%d-%m-%Y", "%Y-%m-%d"];

/// Parsed dates outside these years are treated as unparseable.
const INVOICE_YEARS: core::ops::RangeInclusive<i32> = 1900..=9999;

const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("No file uploaded")]
    MissingDocument,

    #[error("invalid file hash: {0}")]
    InvalidFingerprint(#[from] FingerprintError),
}

impl SubmissionError {
    pub fn code(&self) -> &'static str {
        match self {
            SubmissionError::MissingDocument => "missing_document",
            SubmissionError::InvalidFingerprint(_) => "invalid_fingerprint",
        }
    }
}

/// Submission as received from the request layer. Everything is optional;
/// [`SubmissionPayload::normalize`] applies defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionPayload {
    /// Vendor chosen by a back-office user; ignored for vendor callers.
    pub vendor_id: Option<VendorId>,
    pub invoice_no: Option<String>,
    pub invoice_date: Option<String>,
    pub amount: Option<Money>,
    pub tax_amount: Option<Money>,
    pub cgst: Option<Money>,
    pub sgst: Option<Money>,
    pub igst: Option<Money>,
    pub taxable_value: Option<Money>,
    pub non_taxable_value: Option<Money>,
    pub discount: Option<Money>,
    pub document_type: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub file_hash: Option<String>,
}

impl SubmissionPayload {
    /// Apply defaults and parse loosely-typed fields.
    ///
    /// `vendor_id` is the already-resolved owner; `now` is used when the
    /// invoice date is missing or unparseable.
    pub fn normalize(self, vendor_id: VendorId, now: DateTime<Utc>) -> Result<NewInvoice, SubmissionError> {
        let file_path = self
            .file_path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or(SubmissionError::MissingDocument)?;

        let fingerprint = match self.file_hash.as_deref().map(str::trim) {
            Some(hash) if !hash.is_empty() => Some(ContentFingerprint::parse(hash)?),
            _ => None,
        };

        let invoice_no = self
            .invoice_no
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(generate_invoice_no);

        Ok(NewInvoice {
            vendor_id,
            invoice_no,
            document_type: DocumentType::normalize(self.document_type.as_deref()),
            invoice_date: parse_invoice_date(self.invoice_date.as_deref(), now),
            amount: self.amount.unwrap_or(Money::ZERO),
            tax_amount: self.tax_amount,
            taxes: TaxComponents {
                cgst: self.cgst,
                sgst: self.sgst,
                igst: self.igst,
            },
            taxable_value: self.taxable_value.unwrap_or(Money::ZERO),
            non_taxable_value: self.non_taxable_value.unwrap_or(Money::ZERO),
            discount: self.discount.unwrap_or(Money::ZERO),
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            description: self.description,
            file_path,
            fingerprint,
        })
    }
}

/// `INV-` followed by eight uppercase hex characters.
pub fn generate_invoice_no() -> String {
    let token = Uuid::now_v7().simple().to_string();
    // v7 leads with the timestamp; the random tail keeps same-millisecond tokens apart.
    format!("INV-{}", token[token.len() - 8..].to_uppercase())
}

/// First matching layout wins; unparseable, out-of-range or missing input
/// means `now`.
pub fn parse_invoice_date(text: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return now;
    };

    INVOICE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .filter(|d| INVOICE_YEARS.contains(&d.year()))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}
