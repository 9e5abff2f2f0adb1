use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use invoicegate_core::{AggregateRoot, Entity, ExpectedVersion, InvoiceId, Money, VendorId};
use invoicegate_invoicing::{AdmissionLookup, ContentFingerprint, ExistingInvoice, Invoice, NewInvoice};

use super::r#trait::{InvoiceStore, InvoiceTx, StoreError};

#[derive(Debug, Default)]
struct Table {
    last_id: u64,
    rows: BTreeMap<InvoiceId, Invoice>,
}

fn existing(invoice: &Invoice) -> ExistingInvoice {
    ExistingInvoice {
        id: invoice.id(),
        invoice_no: invoice.invoice_no().to_string(),
        status: invoice.status(),
    }
}

/// In-memory invoice table.
///
/// Intended for tests/dev. Transactions are serialized: an open
/// [`InMemoryInvoiceTx`] holds the table lock until it is committed or dropped.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    table: Mutex<Table>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Table>, StoreError> {
        self.table
            .lock()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    type Tx<'a> = InMemoryInvoiceTx<'a>;

    fn begin(&self) -> Result<InMemoryInvoiceTx<'_>, StoreError> {
        let guard = self.lock()?;
        let last_id = guard.last_id;
        Ok(InMemoryInvoiceTx {
            guard,
            last_id,
            pending: BTreeMap::new(),
        })
    }

    fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Invoice>, StoreError> {
        let table = self.lock()?;
        Ok(table
            .rows
            .values()
            .filter(|inv| inv.vendor_id() == vendor_id)
            .cloned()
            .collect())
    }
}

/// Open transaction: reads go through the locked table, writes are kept in
/// `pending` and merged on commit.
#[derive(Debug)]
pub struct InMemoryInvoiceTx<'a> {
    guard: MutexGuard<'a, Table>,
    last_id: u64,
    pending: BTreeMap<InvoiceId, Invoice>,
}

impl InMemoryInvoiceTx<'_> {
    /// Committed rows with pending writes laid over them.
    fn rows(&self) -> impl Iterator<Item = &Invoice> {
        let committed = self
            .guard
            .rows
            .iter()
            .map(move |(id, inv)| self.pending.get(id).unwrap_or(inv));
        let inserted = self
            .pending
            .iter()
            .filter(move |(id, _)| !self.guard.rows.contains_key(*id))
            .map(|(_, inv)| inv);
        committed.chain(inserted)
    }

    fn row(&self, id: InvoiceId) -> Option<&Invoice> {
        self.pending.get(&id).or_else(|| self.guard.rows.get(&id))
    }
}

impl AdmissionLookup for InMemoryInvoiceTx<'_> {
    type Error = StoreError;

    fn invoices_with_number(
        &self,
        vendor_id: VendorId,
        invoice_no: &str,
    ) -> Result<Vec<ExistingInvoice>, StoreError> {
        Ok(self
            .rows()
            .filter(|inv| inv.vendor_id() == vendor_id && inv.invoice_no() == invoice_no)
            .map(existing)
            .collect())
    }

    fn same_amount_between(
        &self,
        vendor_id: VendorId,
        amount: Money,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<ExistingInvoice>, StoreError> {
        Ok(self
            .rows()
            .find(|inv| {
                inv.vendor_id() == vendor_id
                    && inv.amount() == amount
                    && inv.invoice_date() >= from
                    && inv.invoice_date() <= to
            })
            .map(existing))
    }

    fn with_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<ExistingInvoice>, StoreError> {
        Ok(self
            .rows()
            .find(|inv| inv.fingerprint() == Some(fingerprint))
            .map(existing))
    }
}

impl InvoiceTx for InMemoryInvoiceTx<'_> {
    fn insert(&mut self, new: NewInvoice, created_at: DateTime<Utc>) -> Result<Invoice, StoreError> {
        let taken = self
            .rows()
            .any(|inv| inv.vendor_id() == new.vendor_id && inv.invoice_no() == new.invoice_no);
        if taken {
            return Err(StoreError::UniqueViolation {
                vendor_id: new.vendor_id,
                invoice_no: new.invoice_no,
            });
        }

        self.last_id += 1;
        let id = InvoiceId::new(self.last_id);
        let invoice = Invoice::admitted(id, new, created_at);
        self.pending.insert(id, invoice.clone());
        Ok(invoice)
    }

    fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        Ok(self.row(id).cloned())
    }

    fn update(&mut self, invoice: &Invoice, expected: ExpectedVersion) -> Result<(), StoreError> {
        let current = self
            .row(invoice.id())
            .ok_or(StoreError::NotFound(invoice.id()))?;

        expected
            .check(current.version())
            .map_err(|err| StoreError::Concurrency(err.to_string()))?;

        self.pending.insert(invoice.id(), invoice.clone());
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        let Self {
            mut guard,
            last_id,
            pending,
        } = self;
        guard.last_id = last_id;
        guard.rows.extend(pending);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use invoicegate_invoicing::{DocumentType, TaxComponents, Workflow};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap()
    }

    fn new_invoice(vendor: u64, no: &str, amount: &str) -> NewInvoice {
        NewInvoice {
            vendor_id: VendorId::new(vendor),
            invoice_no: no.to_string(),
            document_type: DocumentType::Invoice,
            invoice_date: now(),
            amount: amount.parse().unwrap(),
            tax_amount: None,
            taxes: TaxComponents::default(),
            taxable_value: Money::ZERO,
            non_taxable_value: Money::ZERO,
            discount: Money::ZERO,
            category: "General".to_string(),
            description: None,
            file_path: format!("uploads/{no}.pdf"),
            fingerprint: Some(ContentFingerprint::of(no.as_bytes())),
        }
    }

    #[test]
    fn commit_publishes_and_assigns_sequential_ids() {
        let store = InMemoryInvoiceStore::new();
        let mut tx = store.begin().unwrap();
        let a = tx.insert(new_invoice(1, "A-1", "10.00"), now()).unwrap();
        let b = tx.insert(new_invoice(1, "A-2", "20.00"), now()).unwrap();
        tx.commit().unwrap();

        assert_eq!(a.id(), InvoiceId::new(1));
        assert_eq!(b.id(), InvoiceId::new(2));
        assert_eq!(store.list_by_vendor(VendorId::new(1)).unwrap().len(), 2);
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let store = InMemoryInvoiceStore::new();
        {
            let mut tx = store.begin().unwrap();
            tx.insert(new_invoice(1, "A-1", "10.00"), now()).unwrap();
        }
        assert!(store.get(InvoiceId::new(1)).unwrap().is_none());

        let mut tx = store.begin().unwrap();
        let again = tx.insert(new_invoice(1, "A-1", "10.00"), now()).unwrap();
        assert_eq!(again.id(), InvoiceId::new(1));
    }

    #[test]
    fn number_is_unique_per_vendor_only() {
        let store = InMemoryInvoiceStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert(new_invoice(1, "A-1", "10.00"), now()).unwrap();
        tx.insert(new_invoice(2, "A-1", "10.00"), now()).unwrap();

        let err = tx.insert(new_invoice(1, "A-1", "99.00"), now()).unwrap_err();
        assert_eq!(
            err,
            StoreError::UniqueViolation {
                vendor_id: VendorId::new(1),
                invoice_no: "A-1".to_string()
            }
        );
    }

    #[test]
    fn lookups_see_staged_rows() {
        let store = InMemoryInvoiceStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert(new_invoice(1, "A-1", "10.00"), now()).unwrap();

        assert_eq!(tx.invoices_with_number(VendorId::new(1), "A-1").unwrap().len(), 1);
        assert!(tx.invoices_with_number(VendorId::new(2), "A-1").unwrap().is_empty());

        let hit = tx
            .same_amount_between(VendorId::new(1), "10.00".parse().unwrap(), now(), now())
            .unwrap();
        assert_eq!(hit.map(|e| e.invoice_no), Some("A-1".to_string()));

        let by_content = tx.with_fingerprint(&ContentFingerprint::of(b"A-1")).unwrap();
        assert!(by_content.is_some());
    }

    #[test]
    fn stale_update_is_a_concurrency_conflict() {
        let store = InMemoryInvoiceStore::new();
        let mut tx = store.begin().unwrap();
        let invoice = tx.insert(new_invoice(1, "A-1", "10.00"), now()).unwrap();

        assert!(tx.update(&invoice, ExpectedVersion(1)).is_ok());
        assert!(matches!(
            tx.update(&invoice, ExpectedVersion(7)),
            Err(StoreError::Concurrency(_))
        ));
    }

    #[test]
    fn pending_update_shadows_committed_row_until_commit() {
        let store = InMemoryInvoiceStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert(new_invoice(1, "A-1", "10.00"), now()).unwrap();
        tx.commit().unwrap();

        {
            let mut tx = store.begin().unwrap();
            let current = tx.get(InvoiceId::new(1)).unwrap().unwrap();
            let event = Workflow::default().recategorise(&current, "Travel", now()).unwrap();
            let mut next = current.clone();
            next.apply(&event);
            tx.update(&next, ExpectedVersion::of(&current)).unwrap();

            assert_eq!(tx.get(InvoiceId::new(1)).unwrap().unwrap().category(), "Travel");
            let same_no = tx.invoices_with_number(VendorId::new(1), "A-1").unwrap();
            assert_eq!(same_no.len(), 1);
        }
        assert_eq!(store.get(InvoiceId::new(1)).unwrap().unwrap().category(), "General");

        let mut tx = store.begin().unwrap();
        let current = tx.get(InvoiceId::new(1)).unwrap().unwrap();
        let event = Workflow::default().recategorise(&current, "Travel", now()).unwrap();
        let mut next = current.clone();
        next.apply(&event);
        tx.update(&next, ExpectedVersion::of(&current)).unwrap();
        let second = tx.insert(new_invoice(1, "A-2", "20.00"), now()).unwrap();
        tx.commit().unwrap();

        assert_eq!(second.id(), InvoiceId::new(2));
        assert_eq!(store.get(InvoiceId::new(1)).unwrap().unwrap().category(), "Travel");
        assert_eq!(store.list_by_vendor(VendorId::new(1)).unwrap().len(), 2);
    }
}
