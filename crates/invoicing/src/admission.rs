//! Admission rules: hard blocks evaluated before an invoice may be persisted.
//!
//! Rules run in a fixed order and the first violation wins:
//!
//! 1. age limit (cheapest, no lookup)
//! 2. same vendor + invoice number (paid match reported separately)
//! 3. same vendor + same base amount within the proximity window
//! 4. same content fingerprint anywhere in the system
//!
//! The validator only reads. Persisting an accepted candidate is the caller's
//! job, inside the same transaction as the lookups.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use invoicegate_core::{InvoiceId, Money, VendorId};

use crate::fingerprint::ContentFingerprint;
use crate::invoice::{InvoiceStatus, NewInvoice};

pub const DEFAULT_AGE_LIMIT_DAYS: i64 = 90;
pub const DEFAULT_PROXIMITY_WINDOW_DAYS: i64 = 180;
/// Upper bound accepted for either window when loading configuration.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Tunable windows of the date-based rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    pub age_limit_days: i64,
    pub proximity_window_days: i64,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            age_limit_days: DEFAULT_AGE_LIMIT_DAYS,
            proximity_window_days: DEFAULT_PROXIMITY_WINDOW_DAYS,
        }
    }
}

/// The fields of a submission the rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionCandidate {
    pub vendor_id: VendorId,
    pub invoice_no: String,
    pub invoice_date: DateTime<Utc>,
    pub amount: Money,
    pub fingerprint: Option<ContentFingerprint>,
}

impl From<&NewInvoice> for AdmissionCandidate {
    fn from(value: &NewInvoice) -> Self {
        Self {
            vendor_id: value.vendor_id,
            invoice_no: value.invoice_no.clone(),
            invoice_date: value.invoice_date,
            amount: value.amount,
            fingerprint: value.fingerprint.clone(),
        }
    }
}

/// An already admitted invoice matched by a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingInvoice {
    pub id: InvoiceId,
    pub invoice_no: String,
    pub status: InvoiceStatus,
}

/// Read access to the admitted population.
///
/// Implemented by the persistence layer, normally on an open transaction.
pub trait AdmissionLookup {
    type Error;

    /// Every invoice of `vendor_id` carrying `invoice_no`.
    fn invoices_with_number(
        &self,
        vendor_id: VendorId,
        invoice_no: &str,
    ) -> Result<Vec<ExistingInvoice>, Self::Error>;

    /// First invoice of `vendor_id` with exactly `amount` dated within `[from, to]`.
    fn same_amount_between(
        &self,
        vendor_id: VendorId,
        amount: Money,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<ExistingInvoice>, Self::Error>;

    /// First invoice of any vendor carrying `fingerprint`.
    fn with_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<ExistingInvoice>, Self::Error>;
}

/// Why a candidate was refused. Each rule has its own code and message.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum AdmissionRejection {
    #[error("Invoice date ({invoice_date}) is older than {limit_days} days limit.")]
    AgeLimit {
        invoice_date: NaiveDate,
        limit_days: i64,
    },

    #[error("An invoice with number {invoice_no} marked as PAID already exists.")]
    DuplicateNumberPaid { invoice_no: String },

    #[error("Invoice number {invoice_no} already exists for this vendor.")]
    DuplicateNumber { invoice_no: String },

    #[error(
        "Potential duplicate found. An invoice with same amount and similar date (within {window_days} days) exists (Inv: {existing_invoice_no})."
    )]
    ProximityDuplicate {
        existing_invoice_no: String,
        window_days: i64,
    },

    #[error("This exact file has already been uploaded (Invoice: {existing_invoice_no}).")]
    ContentDuplicate { existing_invoice_no: String },
}

impl AdmissionRejection {
    pub fn code(&self) -> &'static str {
        match self {
            AdmissionRejection::AgeLimit { .. } => "age_limit",
            AdmissionRejection::DuplicateNumberPaid { .. } => "duplicate_number_paid",
            AdmissionRejection::DuplicateNumber { .. } => "duplicate_number",
            AdmissionRejection::ProximityDuplicate { .. } => "proximity_duplicate",
            AdmissionRejection::ContentDuplicate { .. } => "content_duplicate",
        }
    }
}

/// Verdict of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Rejected(AdmissionRejection),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted)
    }

    pub fn into_result(self) -> Result<(), AdmissionRejection> {
        match self {
            Admission::Accepted => Ok(()),
            Admission::Rejected(r) => Err(r),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdmissionValidator {
    policy: AdmissionPolicy,
}

impl AdmissionValidator {
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Evaluate `candidate` against the admitted population at time `now`.
    ///
    /// Lookup failures are returned as `Err`; rule violations are `Ok(Rejected)`.
    pub fn evaluate<L>(
        &self,
        candidate: &AdmissionCandidate,
        lookup: &L,
        now: DateTime<Utc>,
    ) -> Result<Admission, L::Error>
    where
        L: AdmissionLookup + ?Sized,
    {
        if let Some(rejection) = self.check_age(candidate, now) {
            return Ok(Admission::Rejected(rejection));
        }

        let same_number = lookup.invoices_with_number(candidate.vendor_id, &candidate.invoice_no)?;
        if !same_number.is_empty() {
            let invoice_no = candidate.invoice_no.clone();
            let rejection = if same_number.iter().any(|e| e.status == InvoiceStatus::Paid) {
                AdmissionRejection::DuplicateNumberPaid { invoice_no }
            } else {
                AdmissionRejection::DuplicateNumber { invoice_no }
            };
            return Ok(Admission::Rejected(rejection));
        }

        let days = self.policy.proximity_window_days;
        if let Some(existing) = lookup.same_amount_between(
            candidate.vendor_id,
            candidate.amount,
            days_before(candidate.invoice_date, days),
            days_after(candidate.invoice_date, days),
        )? {
            return Ok(Admission::Rejected(AdmissionRejection::ProximityDuplicate {
                existing_invoice_no: existing.invoice_no,
                window_days: self.policy.proximity_window_days,
            }));
        }

        if let Some(fingerprint) = &candidate.fingerprint {
            if let Some(existing) = lookup.with_fingerprint(fingerprint)? {
                return Ok(Admission::Rejected(AdmissionRejection::ContentDuplicate {
                    existing_invoice_no: existing.invoice_no,
                }));
            }
        }

        Ok(Admission::Accepted)
    }

    fn check_age(&self, candidate: &AdmissionCandidate, now: DateTime<Utc>) -> Option<AdmissionRejection> {
        let oldest_allowed = days_before(now, self.policy.age_limit_days);
        (candidate.invoice_date < oldest_allowed).then(|| AdmissionRejection::AgeLimit {
            invoice_date: candidate.invoice_date.date_naive(),
            limit_days: self.policy.age_limit_days,
        })
    }
}

// Window arithmetic saturates at the representable range instead of panicking.
fn span(days: i64) -> Duration {
    Duration::try_days(days).unwrap_or(Duration::MAX)
}

fn days_before(at: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    at.checked_sub_signed(span(days)).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn days_after(at: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    at.checked_add_signed(span(days)).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
