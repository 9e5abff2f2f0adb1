//! Invoice engine: application-level orchestration.
//!
//! The engine composes the pure domain pieces with the persistence and audit
//! ports:
//!
//! ```text
//! submit:     authorize → normalize → begin → admission rules → insert → commit → audit
//! transition: authorize → begin → load → decide → apply → update(version) → commit → audit
//! ```
//!
//! Audit writes happen after commit and never fail the operation.

pub mod error;
pub mod outcome;

use serde::{Deserialize, Serialize};

use invoicegate_audit::{AuditAction, AuditRecord, AuditTrail};
use invoicegate_auth::{Capability, Principal, authorize, ensure_can_view, resolve_submission_vendor};
use invoicegate_core::{Clock, Entity, ExpectedVersion, InvoiceId, VendorId};
use invoicegate_invoicing::{
    Admission, AdmissionCandidate, AdmissionRejection, AdmissionValidator, Invoice, InvoiceStatus,
    LifecycleCommand, MonetarySummary, PortfolioTotals, SubmissionPayload, TransitionCommand,
    TransitionInput, Workflow, WorkflowAction, derive_total, summarize,
};

use crate::config::EngineConfig;
use crate::invoice_store::{InvoiceStore, InvoiceTx, StoreError};

pub use error::EngineError;
pub use outcome::Outcome;

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub invoice_id: InvoiceId,
    pub invoice_no: String,
    pub summary: MonetarySummary,
}

/// An invoice with its derived figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceView {
    pub invoice: Invoice,
    pub summary: MonetarySummary,
}

impl From<Invoice> for InvoiceView {
    fn from(invoice: Invoice) -> Self {
        let summary = derive_total(&invoice);
        Self { invoice, summary }
    }
}

/// One vendor's invoices plus portfolio totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorStatement {
    pub vendor_id: VendorId,
    pub invoices: Vec<InvoiceView>,
    pub totals: PortfolioTotals,
}

fn audit_action(action: WorkflowAction) -> AuditAction {
    match action {
        WorkflowAction::Approve => AuditAction::Approve,
        WorkflowAction::Reject => AuditAction::Reject,
        WorkflowAction::Review => AuditAction::Review,
        WorkflowAction::Clarify => AuditAction::Clarify,
        WorkflowAction::Hold => AuditAction::Hold,
        WorkflowAction::Pay => AuditAction::PaymentProcessed,
    }
}

fn required_capability(action: WorkflowAction) -> Capability {
    match action {
        WorkflowAction::Pay => Capability::RecordPayment,
        _ => Capability::ManageLifecycle,
    }
}

#[derive(Debug)]
pub struct InvoiceEngine<S, A, C> {
    store: S,
    audit: A,
    clock: C,
    validator: AdmissionValidator,
    workflow: Workflow,
}

impl<S, A, C> InvoiceEngine<S, A, C> {
    pub fn new(store: S, audit: A, clock: C, config: &EngineConfig) -> Self {
        Self {
            store,
            audit,
            clock,
            validator: AdmissionValidator::new(config.admission_policy()),
            workflow: Workflow::new(config.transition_policy),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }
}

impl<S, A, C> InvoiceEngine<S, A, C>
where
    S: InvoiceStore,
    A: AuditTrail,
    C: Clock,
{
    /// Admit a new invoice in `pending`, or say which rule refused it.
    pub fn submit(
        &self,
        principal: &Principal,
        payload: SubmissionPayload,
    ) -> Result<SubmissionReceipt, EngineError> {
        let vendor_id = resolve_submission_vendor(principal, payload.vendor_id)?;
        let now = self.clock.now();
        let new = payload.normalize(vendor_id, now)?;
        let candidate = AdmissionCandidate::from(&new);

        let mut tx = self.store.begin()?;
        if let Admission::Rejected(rejection) = self.validator.evaluate(&candidate, &tx, now)? {
            tracing::info!(
                vendor_id = %vendor_id,
                invoice_no = %candidate.invoice_no,
                code = rejection.code(),
                "invoice rejected at admission"
            );
            return Err(EngineError::Rejected(rejection));
        }

        let invoice = tx
            .insert(new, now)
            .map_err(|err| self.unique_race(vendor_id, &candidate.invoice_no, err))?;
        tx.commit()
            .map_err(|err| self.unique_race(vendor_id, &candidate.invoice_no, err))?;

        tracing::info!(
            invoice_id = %invoice.id(),
            vendor_id = %vendor_id,
            invoice_no = %invoice.invoice_no(),
            "invoice admitted"
        );

        self.audit.record(
            Some(principal.actor_id),
            AuditAction::InvoiceUpload,
            Some(invoice.id()),
            Some(format!("Uploaded Invoice {}", invoice.invoice_no())),
        );

        Ok(SubmissionReceipt {
            invoice_id: invoice.id(),
            invoice_no: invoice.invoice_no().to_string(),
            summary: derive_total(&invoice),
        })
    }

    /// Read-only admission check; nothing is written.
    pub fn evaluate(&self, candidate: &AdmissionCandidate) -> Result<Admission, EngineError> {
        let tx = self.store.begin()?;
        Ok(self.validator.evaluate(candidate, &tx, self.clock.now())?)
    }

    /// Apply a lifecycle command and record exactly one audit entry.
    pub fn transition(
        &self,
        principal: &Principal,
        invoice_id: InvoiceId,
        command: LifecycleCommand,
        comment: Option<String>,
    ) -> Result<Invoice, EngineError> {
        let action = command.action();
        authorize(principal, required_capability(action))?;

        let cmd = TransitionCommand {
            invoice_id,
            command,
            comment,
            occurred_at: self.clock.now(),
        };

        let mut tx = self.store.begin()?;
        let current = tx.get(invoice_id)?.ok_or(EngineError::NotFound(invoice_id))?;
        let event = self.workflow.decide(&current, &cmd)?;

        let mut next = current.clone();
        next.apply(&event);
        tx.update(&next, ExpectedVersion::of(&current))?;
        tx.commit()?;

        tracing::info!(
            invoice_id = %invoice_id,
            action = %action,
            from = %current.status(),
            to = %next.status(),
            "invoice transitioned"
        );

        self.audit.record(
            Some(principal.actor_id),
            audit_action(action),
            Some(invoice_id),
            Some(cmd.audit_comment(principal.role.as_str())),
        );

        Ok(next)
    }

    /// Like [`InvoiceEngine::transition`], from a textual action name and raw
    /// request fields. Unknown names change nothing and write no audit record.
    pub fn transition_named(
        &self,
        principal: &Principal,
        invoice_id: InvoiceId,
        action: &str,
        input: TransitionInput,
    ) -> Result<Invoice, EngineError> {
        let action: WorkflowAction = action.parse()?;
        let command = LifecycleCommand::from_input(action, &input)?;
        self.transition(principal, invoice_id, command, input.comment)
    }

    pub fn recategorise(
        &self,
        principal: &Principal,
        invoice_id: InvoiceId,
        category: &str,
    ) -> Result<Invoice, EngineError> {
        authorize(principal, Capability::EditInvoiceMetadata)?;

        let mut tx = self.store.begin()?;
        let current = tx.get(invoice_id)?.ok_or(EngineError::NotFound(invoice_id))?;
        let event = self.workflow.recategorise(&current, category, self.clock.now())?;

        let mut next = current.clone();
        next.apply(&event);
        tx.update(&next, ExpectedVersion::of(&current))?;
        tx.commit()?;

        self.audit.record(
            Some(principal.actor_id),
            AuditAction::Update,
            Some(invoice_id),
            Some(format!(
                "Changed category from {} to {}",
                current.category(),
                next.category()
            )),
        );

        Ok(next)
    }

    pub fn invoice_view(&self, principal: &Principal, invoice_id: InvoiceId) -> Result<InvoiceView, EngineError> {
        let invoice = self
            .store
            .get(invoice_id)?
            .ok_or(EngineError::NotFound(invoice_id))?;
        ensure_can_view(principal, invoice.vendor_id())?;
        Ok(InvoiceView::from(invoice))
    }

    /// Invoices of one vendor, optionally narrowed to a status.
    ///
    /// Back-office callers must name the vendor; vendor callers always get
    /// their own statement.
    pub fn vendor_statement(
        &self,
        principal: &Principal,
        vendor_id: Option<VendorId>,
        status: Option<InvoiceStatus>,
    ) -> Result<VendorStatement, EngineError> {
        let vendor_id = self.statement_vendor(principal, vendor_id)?;

        let invoices: Vec<InvoiceView> = self
            .store
            .list_by_vendor(vendor_id)?
            .into_iter()
            .filter(|inv| status.is_none_or(|s| inv.status() == s))
            .map(InvoiceView::from)
            .collect();
        let totals = summarize(invoices.iter().map(|v| &v.invoice));

        Ok(VendorStatement {
            vendor_id,
            invoices,
            totals,
        })
    }

    /// Audit records of one invoice in write order.
    pub fn audit_trail(&self, principal: &Principal, invoice_id: InvoiceId) -> Result<Vec<AuditRecord>, EngineError> {
        authorize(principal, Capability::ViewAuditTrail)?;
        if self.store.get(invoice_id)?.is_none() {
            return Err(EngineError::NotFound(invoice_id));
        }
        Ok(self.audit.history(invoice_id)?)
    }

    fn statement_vendor(&self, principal: &Principal, requested: Option<VendorId>) -> Result<VendorId, EngineError> {
        if principal.role.grants(Capability::ViewAllInvoices) {
            return Ok(requested.ok_or(invoicegate_auth::AuthzError::VendorNotSelected)?);
        }

        let own = principal
            .vendor_id
            .ok_or(invoicegate_auth::AuthzError::VendorNotLinked)?;
        if let Some(requested) = requested {
            ensure_can_view(principal, requested)?;
        }
        Ok(own)
    }

    /// A concurrent submission won the race for the same number.
    fn unique_race(&self, vendor_id: VendorId, invoice_no: &str, err: StoreError) -> EngineError {
        if matches!(err, StoreError::UniqueViolation { .. }) {
            tracing::warn!(
                vendor_id = %vendor_id,
                invoice_no = %invoice_no,
                "uniqueness constraint hit after admission checks passed"
            );
            return EngineError::Rejected(AdmissionRejection::DuplicateNumber {
                invoice_no: invoice_no.to_string(),
            });
        }
        EngineError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use invoicegate_audit::{AuditRecorder, AuditStore};
    use invoicegate_auth::{AuthzError, Role};
    use invoicegate_core::{ActorId, AggregateRoot, FixedClock, Money};
    use invoicegate_invoicing::{PaymentDetails, TransitionPolicy, WorkflowError};

    use crate::audit_log::{InMemoryActorDirectory, InMemoryAuditStore};
    use crate::invoice_store::InMemoryInvoiceStore;

    type TestEngine = InvoiceEngine<
        InMemoryInvoiceStore,
        AuditRecorder<Arc<InMemoryAuditStore>, Arc<InMemoryActorDirectory>, FixedClock>,
        FixedClock,
    >;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap()
    }

    fn engine_with(config: EngineConfig) -> TestEngine {
        let directory = Arc::new(InMemoryActorDirectory::new());
        directory.upsert(ActorId::new(1), "Meera", Role::Admin);
        directory.upsert(ActorId::new(2), "Kiran", Role::Finance);
        let recorder = AuditRecorder::new(Arc::new(InMemoryAuditStore::new()), directory, FixedClock(now()));
        InvoiceEngine::new(InMemoryInvoiceStore::new(), recorder, FixedClock(now()), &config)
    }

    fn engine() -> TestEngine {
        engine_with(EngineConfig::default())
    }

    fn admin() -> Principal {
        Principal::new(ActorId::new(1), Role::Admin)
    }

    fn vendor(id: u64) -> Principal {
        Principal::vendor(ActorId::new(100 + id), VendorId::new(id))
    }

    fn m(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn payload(no: &str, amount: &str) -> SubmissionPayload {
        SubmissionPayload {
            invoice_no: Some(no.to_string()),
            invoice_date: Some("2026-03-01".to_string()),
            amount: Some(m(amount)),
            file_path: Some(format!("uploads/{no}.pdf")),
            ..SubmissionPayload::default()
        }
    }

    #[test]
    fn vendor_submission_lands_pending_with_upload_audit() {
        let engine = engine();
        let mut p = payload("INV-001", "1000.00");
        p.vendor_id = Some(VendorId::new(42));
        p.cgst = Some(m("90.00"));
        p.sgst = Some(m("90.00"));

        let receipt = engine.submit(&vendor(1), p).unwrap();
        assert_eq!(receipt.summary.tax, m("180.00"));
        assert_eq!(receipt.summary.total, m("1180.00"));

        let view = engine.invoice_view(&admin(), receipt.invoice_id).unwrap();
        assert_eq!(view.invoice.vendor_id(), VendorId::new(1));
        assert_eq!(view.invoice.status(), InvoiceStatus::Pending);

        let trail = engine.audit_trail(&admin(), receipt.invoice_id).unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::InvoiceUpload);
        assert_eq!(trail[0].comment.as_deref(), Some("Uploaded Invoice INV-001"));
        assert_eq!(trail[0].actor.name, "System");
    }

    #[test]
    fn admin_must_pick_a_vendor() {
        let engine = engine();
        let err = engine.submit(&admin(), payload("INV-001", "10.00")).unwrap_err();
        assert_eq!(err, EngineError::Unauthorized(AuthzError::VendorNotSelected));
    }

    #[test]
    fn rejected_submission_writes_nothing() {
        let engine = engine();
        engine.submit(&vendor(1), payload("INV-001", "10.00")).unwrap();

        let err = engine.submit(&vendor(1), payload("INV-001", "25.00")).unwrap_err();
        assert_eq!(err.code(), "duplicate_number");

        let statement = engine.vendor_statement(&vendor(1), None, None).unwrap();
        assert_eq!(statement.totals.count, 1);
        assert_eq!(engine.audit().store().list_all().unwrap().len(), 1);
    }

    #[test]
    fn evaluate_is_read_only() {
        let engine = engine();
        let candidate = AdmissionCandidate {
            vendor_id: VendorId::new(1),
            invoice_no: "INV-001".into(),
            invoice_date: now(),
            amount: m("10.00"),
            fingerprint: None,
        };
        assert!(engine.evaluate(&candidate).unwrap().is_accepted());
        assert!(engine.evaluate(&candidate).unwrap().is_accepted());
        assert!(engine.store().list_by_vendor(VendorId::new(1)).unwrap().is_empty());
    }

    #[test]
    fn vendor_cannot_drive_the_lifecycle() {
        let engine = engine();
        let id = engine.submit(&vendor(1), payload("INV-001", "10.00")).unwrap().invoice_id;

        let err = engine
            .transition(&vendor(1), id, LifecycleCommand::Approve, None)
            .unwrap_err();
        assert_eq!(err, EngineError::Unauthorized(AuthzError::Forbidden(Capability::ManageLifecycle)));
        assert_eq!(engine.audit_trail(&admin(), id).unwrap().len(), 1);
    }

    #[test]
    fn transition_records_role_in_comment() {
        let engine = engine();
        let id = engine.submit(&vendor(1), payload("INV-001", "10.00")).unwrap().invoice_id;
        let finance = Principal::new(ActorId::new(2), Role::Finance);

        let invoice = engine
            .transition(&finance, id, LifecycleCommand::Hold, Some("awaiting PO".into()))
            .unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Hold);
        assert_eq!(invoice.version(), 2);

        let trail = engine.audit_trail(&admin(), id).unwrap();
        let last = trail.last().unwrap();
        assert_eq!(last.action, AuditAction::Hold);
        assert_eq!(last.actor.name, "Kiran");
        assert_eq!(last.comment.as_deref(), Some("Invoice hold by finance. Comment: awaiting PO"));
    }

    #[test]
    fn unknown_action_changes_nothing() {
        let engine = engine();
        let id = engine.submit(&vendor(1), payload("INV-001", "10.00")).unwrap().invoice_id;

        let err = engine
            .transition_named(&admin(), id, "cancel", TransitionInput::default())
            .unwrap_err();
        assert_eq!(err.code(), "unknown_action");
        assert_eq!(engine.invoice_view(&admin(), id).unwrap().invoice.status(), InvoiceStatus::Pending);
        assert_eq!(engine.audit_trail(&admin(), id).unwrap().len(), 1);
    }

    #[test]
    fn strict_policy_freezes_paid_invoices() {
        let engine = engine_with(EngineConfig {
            transition_policy: TransitionPolicy::Strict,
            ..EngineConfig::default()
        });
        let id = engine.submit(&vendor(1), payload("INV-001", "10.00")).unwrap().invoice_id;
        engine
            .transition(&admin(), id, LifecycleCommand::Pay(PaymentDetails::new("UTR9")), None)
            .unwrap();

        let err = engine
            .transition(&admin(), id, LifecycleCommand::Review, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Workflow(WorkflowError::IllegalTransition { .. })));
    }

    #[test]
    fn recategorise_writes_update_audit() {
        let engine = engine();
        let id = engine.submit(&vendor(1), payload("INV-001", "10.00")).unwrap().invoice_id;

        let invoice = engine.recategorise(&admin(), id, "Travel").unwrap();
        assert_eq!(invoice.category(), "Travel");

        let trail = engine.audit_trail(&admin(), id).unwrap();
        assert_eq!(trail[1].action, AuditAction::Update);
        assert_eq!(trail[1].comment.as_deref(), Some("Changed category from General to Travel"));
        assert!(engine.recategorise(&vendor(1), id, "Other").is_err());
    }

    #[test]
    fn vendors_see_only_their_own_invoices() {
        let engine = engine();
        let id = engine.submit(&vendor(1), payload("INV-001", "10.00")).unwrap().invoice_id;

        assert!(engine.invoice_view(&vendor(1), id).is_ok());
        assert_eq!(
            engine.invoice_view(&vendor(2), id).unwrap_err(),
            EngineError::Unauthorized(AuthzError::ForeignVendor(VendorId::new(1)))
        );
        assert!(engine.vendor_statement(&vendor(2), Some(VendorId::new(1)), None).is_err());
        assert!(engine.audit_trail(&vendor(1), id).is_err());
    }

    #[test]
    fn statement_filters_by_status_and_totals() {
        let engine = engine();
        let a = engine.submit(&vendor(1), payload("INV-001", "100.00")).unwrap().invoice_id;
        let mut second = payload("INV-002", "50.00");
        second.tax_amount = Some(m("9.00"));
        second.invoice_date = Some("2026-03-10".into());
        engine.submit(&vendor(1), second).unwrap();
        engine
            .transition(&admin(), a, LifecycleCommand::Approve, None)
            .unwrap();

        let all = engine.vendor_statement(&admin(), Some(VendorId::new(1)), None).unwrap();
        assert_eq!(all.totals.count, 2);
        assert_eq!(all.totals.base, m("150.00"));
        assert_eq!(all.totals.tax, m("9.00"));
        assert_eq!(all.totals.total, m("159.00"));

        let pending = engine
            .vendor_statement(&admin(), Some(VendorId::new(1)), Some(InvoiceStatus::Pending))
            .unwrap();
        assert_eq!(pending.invoices.len(), 1);
        assert_eq!(pending.invoices[0].invoice.invoice_no(), "INV-002");
    }
}
