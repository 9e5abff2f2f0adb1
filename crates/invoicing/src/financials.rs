//! Derived monetary figures.
//!
//! Records may carry the aggregate tax, the per-component taxes, or both.
//! Read paths never trust the raw tax column alone: they go through
//! [`derive_tax`], which reconciles the two representations, and totals are
//! recomputed on every call.

use serde::{Deserialize, Serialize};

use invoicegate_core::Money;

use crate::invoice::{Invoice, NewInvoice, TaxComponents};

/// Anything carrying a base amount plus stored tax figures.
pub trait FinancialRecord {
    fn base_amount(&self) -> Money;
    fn stored_tax(&self) -> Option<Money>;
    fn tax_components(&self) -> &TaxComponents;
}

impl FinancialRecord for Invoice {
    fn base_amount(&self) -> Money {
        self.amount()
    }

    fn stored_tax(&self) -> Option<Money> {
        self.tax_amount()
    }

    fn tax_components(&self) -> &TaxComponents {
        self.taxes()
    }
}

impl FinancialRecord for NewInvoice {
    fn base_amount(&self) -> Money {
        self.amount
    }

    fn stored_tax(&self) -> Option<Money> {
        self.tax_amount
    }

    fn tax_components(&self) -> &TaxComponents {
        &self.taxes
    }
}

/// Base, tax and total of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetarySummary {
    pub base: Money,
    pub tax: Money,
    pub total: Money,
}

/// Stored tax when strictly positive, otherwise the sum of the components.
pub fn derive_tax<R: FinancialRecord + ?Sized>(record: &R) -> Money {
    match record.stored_tax() {
        Some(tax) if tax.is_positive() => tax,
        _ => record.tax_components().sum(),
    }
}

pub fn derive_total<R: FinancialRecord + ?Sized>(record: &R) -> MonetarySummary {
    let base = record.base_amount();
    let tax = derive_tax(record);
    MonetarySummary {
        base,
        tax,
        total: base + tax,
    }
}

/// Aggregate figures over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub count: usize,
    pub base: Money,
    pub tax: Money,
    pub total: Money,
}

pub fn summarize<'a, R, I>(records: I) -> PortfolioTotals
where
    R: FinancialRecord + 'a,
    I: IntoIterator<Item = &'a R>,
{
    records
        .into_iter()
        .map(derive_total)
        .fold(PortfolioTotals::default(), |acc, s| PortfolioTotals {
            count: acc.count + 1,
            base: acc.base + s.base,
            tax: acc.tax + s.tax,
            total: acc.total + s.total,
        })
}
