use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicegate_core::{AggregateRoot, DomainError, Entity, InvoiceId, Money, VendorId};

use crate::fingerprint::ContentFingerprint;
use crate::workflow::WorkflowAction;

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    UnderReview,
    PendingClarification,
    Hold,
    Approved,
    Rejected,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 8] = [
        InvoiceStatus::Pending,
        InvoiceStatus::UnderReview,
        InvoiceStatus::PendingClarification,
        InvoiceStatus::Hold,
        InvoiceStatus::Approved,
        InvoiceStatus::Rejected,
        InvoiceStatus::Paid,
        InvoiceStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::UnderReview => "under_review",
            InvoiceStatus::PendingClarification => "pending_clarification",
            InvoiceStatus::Hold => "hold",
            InvoiceStatus::Approved => "approved",
            InvoiceStatus::Rejected => "rejected",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// `paid`, `rejected` and `cancelled` end the ordinary flow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Paid | InvoiceStatus::Rejected | InvoiceStatus::Cancelled
        )
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    /// Accepts display forms too ("Under Review" → `under_review`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(' ', "_");
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == key)
            .ok_or_else(|| DomainError::validation(format!("unknown invoice status '{s}'")))
    }
}

/// Kind of billing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    Invoice,
    CreditNote,
    DebitNote,
}

impl DocumentType {
    /// Unknown tags silently become [`DocumentType::Invoice`].
    pub fn normalize(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some("credit_note") => DocumentType::CreditNote,
            Some("debit_note") => DocumentType::DebitNote,
            _ => DocumentType::Invoice,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::CreditNote => "credit_note",
            DocumentType::DebitNote => "debit_note",
        }
    }
}

/// Tax split as printed on the document.
///
/// `cgst` + `sgst` apply to intra-state supply; `igst` replaces both for
/// inter-state supply. A missing component counts as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxComponents {
    pub cgst: Option<Money>,
    pub sgst: Option<Money>,
    pub igst: Option<Money>,
}

impl TaxComponents {
    pub fn intra_state(cgst: Money, sgst: Money) -> Self {
        Self {
            cgst: Some(cgst),
            sgst: Some(sgst),
            igst: None,
        }
    }

    pub fn inter_state(igst: Money) -> Self {
        Self {
            cgst: None,
            sgst: None,
            igst: Some(igst),
        }
    }

    pub fn sum(&self) -> Money {
        [self.cgst, self.sgst, self.igst]
            .into_iter()
            .map(|c| c.unwrap_or(Money::ZERO))
            .sum()
    }
}

/// Settlement details captured when an invoice is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// UTR, cheque number or similar. Mandatory.
    pub reference: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    /// Tax deducted at source when paying.
    pub tds_amount: Money,
    /// Amount actually remitted after deductions.
    pub paid_amount: Option<Money>,
}

impl PaymentDetails {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            payment_date: None,
            remarks: None,
            tds_amount: Money::ZERO,
            paid_amount: None,
        }
    }
}

/// A normalized, not-yet-persisted invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub vendor_id: VendorId,
    pub invoice_no: String,
    pub document_type: DocumentType,
    pub invoice_date: DateTime<Utc>,
    /// Base (pre-tax) amount.
    pub amount: Money,
    /// Aggregate tax as entered; `None` or zero means "derive from components".
    pub tax_amount: Option<Money>,
    pub taxes: TaxComponents,
    pub taxable_value: Money,
    pub non_taxable_value: Money,
    pub discount: Money,
    pub category: String,
    pub description: Option<String>,
    /// Opaque reference to the stored document.
    pub file_path: String,
    pub fingerprint: Option<ContentFingerprint>,
}

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    vendor_id: VendorId,
    invoice_no: String,
    document_type: DocumentType,
    invoice_date: DateTime<Utc>,
    amount: Money,
    tax_amount: Option<Money>,
    taxes: TaxComponents,
    taxable_value: Money,
    non_taxable_value: Money,
    discount: Money,
    category: String,
    description: Option<String>,
    file_path: String,
    fingerprint: Option<ContentFingerprint>,
    status: InvoiceStatus,
    rejection_reason: Option<String>,
    payment: Option<PaymentDetails>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Invoice {
    /// Materialize an admitted invoice in its initial status.
    pub fn admitted(id: InvoiceId, new: NewInvoice, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            vendor_id: new.vendor_id,
            invoice_no: new.invoice_no,
            document_type: new.document_type,
            invoice_date: new.invoice_date,
            amount: new.amount,
            tax_amount: new.tax_amount,
            taxes: new.taxes,
            taxable_value: new.taxable_value,
            non_taxable_value: new.non_taxable_value,
            discount: new.discount,
            category: new.category,
            description: new.description,
            file_path: new.file_path,
            fingerprint: new.fingerprint,
            status: InvoiceStatus::Pending,
            rejection_reason: None,
            payment: None,
            created_at,
            updated_at: created_at,
            version: 1,
        }
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub fn invoice_no(&self) -> &str {
        &self.invoice_no
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn invoice_date(&self) -> DateTime<Utc> {
        self.invoice_date
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Raw stored tax. Read paths should use [`crate::derive_tax`] instead.
    pub fn tax_amount(&self) -> Option<Money> {
        self.tax_amount
    }

    pub fn taxes(&self) -> &TaxComponents {
        &self.taxes
    }

    pub fn taxable_value(&self) -> Money {
        self.taxable_value
    }

    pub fn non_taxable_value(&self) -> Money {
        self.non_taxable_value
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn fingerprint(&self) -> Option<&ContentFingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn payment(&self) -> Option<&PaymentDetails> {
        self.payment.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Evolve state from a single event. Version is bumped once per event.
    pub fn apply(&mut self, event: &InvoiceEvent) {
        match event {
            InvoiceEvent::Transitioned(e) => {
                self.status = e.to;
                if let Some(reason) = &e.rejection_reason {
                    self.rejection_reason = Some(reason.clone());
                }
                if let Some(payment) = &e.payment {
                    self.payment = Some(payment.clone());
                }
                self.updated_at = e.occurred_at;
            }
            InvoiceEvent::Recategorised(e) => {
                self.category = e.to.clone();
                self.updated_at = e.occurred_at;
            }
        }

        self.version += 1;
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> InvoiceId {
        self.id
    }
}

impl AggregateRoot for Invoice {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: a lifecycle action moved the invoice to a new status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTransitioned {
    pub invoice_id: InvoiceId,
    pub action: WorkflowAction,
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
    pub rejection_reason: Option<String>,
    pub payment: Option<PaymentDetails>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: the invoice category was edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecategorised {
    pub invoice_id: InvoiceId,
    pub from: String,
    pub to: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    Transitioned(InvoiceTransitioned),
    Recategorised(InvoiceRecategorised),
}

impl InvoiceEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::Transitioned(_) => "invoicing.invoice.transitioned",
            InvoiceEvent::Recategorised(_) => "invoicing.invoice.recategorised",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::Transitioned(e) => e.occurred_at,
            InvoiceEvent::Recategorised(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap()
    }

    pub(crate) fn new_invoice(no: &str) -> NewInvoice {
        NewInvoice {
            vendor_id: VendorId::new(1),
            invoice_no: no.to_string(),
            document_type: DocumentType::Invoice,
            invoice_date: test_time(),
            amount: "1000.00".parse().unwrap(),
            tax_amount: None,
            taxes: TaxComponents::intra_state("90.00".parse().unwrap(), "90.00".parse().unwrap()),
            taxable_value: Money::ZERO,
            non_taxable_value: Money::ZERO,
            discount: Money::ZERO,
            category: "General".to_string(),
            description: None,
            file_path: "uploads/inv-001.pdf".to_string(),
            fingerprint: None,
        }
    }

    #[test]
    fn admitted_invoice_starts_pending_at_version_one() {
        let invoice = Invoice::admitted(InvoiceId::new(7), new_invoice("INV-001"), test_time());
        assert_eq!(invoice.id(), InvoiceId::new(7));
        assert_eq!(invoice.status(), InvoiceStatus::Pending);
        assert_eq!(invoice.version(), 1);
        assert!(invoice.payment().is_none());
    }

    #[test]
    fn transition_event_sets_status_and_payment() {
        let mut invoice = Invoice::admitted(InvoiceId::new(7), new_invoice("INV-001"), test_time());
        let mut payment = PaymentDetails::new("UTR123");
        payment.tds_amount = "10.00".parse().unwrap();

        invoice.apply(&InvoiceEvent::Transitioned(InvoiceTransitioned {
            invoice_id: invoice.id(),
            action: WorkflowAction::Pay,
            from: InvoiceStatus::Pending,
            to: InvoiceStatus::Paid,
            rejection_reason: None,
            payment: Some(payment.clone()),
            occurred_at: test_time(),
        }));

        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.payment(), Some(&payment));
        assert_eq!(invoice.version(), 2);
    }

    #[test]
    fn status_parses_display_forms() {
        assert_eq!(
            "Pending Clarification".parse::<InvoiceStatus>().unwrap(),
            InvoiceStatus::PendingClarification
        );
        assert!("archived".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        let terminal: Vec<_> = InvoiceStatus::ALL
            .into_iter()
            .filter(InvoiceStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![InvoiceStatus::Rejected, InvoiceStatus::Paid, InvoiceStatus::Cancelled]
        );
    }

    #[test]
    fn unknown_document_type_normalizes_to_invoice() {
        assert_eq!(DocumentType::normalize(Some("credit_note")), DocumentType::CreditNote);
        assert_eq!(DocumentType::normalize(Some("receipt")), DocumentType::Invoice);
        assert_eq!(DocumentType::normalize(None), DocumentType::Invoice);
    }
}
