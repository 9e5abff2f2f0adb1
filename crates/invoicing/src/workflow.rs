//! Invoice lifecycle state machine.
//!
//! Transitions are looked up in an explicit `(status, action) → status` table.
//! The table is built from a [`TransitionPolicy`]:
//!
//! - `Permissive`: every action is accepted from every status (historic portal
//!   behaviour; a paid invoice can be sent back to clarification).
//! - `Strict`: no action leaves a terminal status.
//!
//! Which policy a deployment runs is a product decision, so it is configuration
//! rather than code.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use invoicegate_core::{Entity, InvoiceId, Money};

use crate::invoice::{
    Invoice, InvoiceEvent, InvoiceRecategorised, InvoiceStatus, InvoiceTransitioned, PaymentDetails,
};

/// Privileged action driving a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Approve,
    Reject,
    Review,
    Clarify,
    Hold,
    Pay,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 6] = [
        WorkflowAction::Approve,
        WorkflowAction::Reject,
        WorkflowAction::Review,
        WorkflowAction::Clarify,
        WorkflowAction::Hold,
        WorkflowAction::Pay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::Review => "review",
            WorkflowAction::Clarify => "clarify",
            WorkflowAction::Hold => "hold",
            WorkflowAction::Pay => "pay",
        }
    }

    pub fn target_status(&self) -> InvoiceStatus {
        match self {
            WorkflowAction::Approve => InvoiceStatus::Approved,
            WorkflowAction::Reject => InvoiceStatus::Rejected,
            WorkflowAction::Review => InvoiceStatus::UnderReview,
            WorkflowAction::Clarify => InvoiceStatus::PendingClarification,
            WorkflowAction::Hold => InvoiceStatus::Hold,
            WorkflowAction::Pay => InvoiceStatus::Paid,
        }
    }
}

impl core::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowAction {
    type Err = WorkflowError;

    /// Accepts the action verb or the status it leads to ("approve" / "approved").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "approve" | "approved" => Ok(WorkflowAction::Approve),
            "reject" | "rejected" => Ok(WorkflowAction::Reject),
            "review" | "under_review" => Ok(WorkflowAction::Review),
            "clarify" | "pending_clarification" => Ok(WorkflowAction::Clarify),
            "hold" => Ok(WorkflowAction::Hold),
            "pay" | "paid" => Ok(WorkflowAction::Pay),
            other => Err(WorkflowError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

impl FromStr for TransitionPolicy {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(WorkflowError::UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Invalid status: unknown action '{0}'")]
    UnknownAction(String),

    #[error("unknown transition policy '{0}'")]
    UnknownPolicy(String),

    #[error("cannot {action} an invoice that is {from}")]
    IllegalTransition {
        from: InvoiceStatus,
        action: WorkflowAction,
    },

    #[error("a rejection reason is required")]
    MissingRejectionReason,

    #[error("Payment Reference (UTR/Cheque) is required")]
    MissingPaymentReference,

    #[error("a category is required")]
    MissingCategory,

    #[error("command targets invoice {requested} but was applied to {actual}")]
    InvoiceMismatch {
        requested: InvoiceId,
        actual: InvoiceId,
    },
}

impl WorkflowError {
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::UnknownAction(_) => "unknown_action",
            WorkflowError::UnknownPolicy(_) => "unknown_policy",
            WorkflowError::IllegalTransition { .. } => "illegal_transition",
            WorkflowError::MissingRejectionReason => "missing_rejection_reason",
            WorkflowError::MissingPaymentReference => "missing_payment_reference",
            WorkflowError::MissingCategory => "missing_category",
            WorkflowError::InvoiceMismatch { .. } => "invoice_mismatch",
        }
    }
}

/// Explicit `(status, action) → status` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    policy: TransitionPolicy,
    entries: HashMap<(InvoiceStatus, WorkflowAction), InvoiceStatus>,
}

impl TransitionTable {
    pub fn new(policy: TransitionPolicy) -> Self {
        let mut entries = HashMap::new();
        for from in InvoiceStatus::ALL {
            if policy == TransitionPolicy::Strict && from.is_terminal() {
                continue;
            }
            for action in WorkflowAction::ALL {
                entries.insert((from, action), action.target_status());
            }
        }
        Self { policy, entries }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn next(&self, from: InvoiceStatus, action: WorkflowAction) -> Option<InvoiceStatus> {
        self.entries.get(&(from, action)).copied()
    }

    pub fn allowed_actions(&self, from: InvoiceStatus) -> Vec<WorkflowAction> {
        WorkflowAction::ALL
            .into_iter()
            .filter(|action| self.entries.contains_key(&(from, *action)))
            .collect()
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new(TransitionPolicy::default())
    }
}

/// A lifecycle action together with the inputs it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LifecycleCommand {
    Approve,
    Reject { reason: String },
    Review,
    Clarify,
    Hold,
    Pay(PaymentDetails),
}

impl LifecycleCommand {
    pub fn action(&self) -> WorkflowAction {
        match self {
            LifecycleCommand::Approve => WorkflowAction::Approve,
            LifecycleCommand::Reject { .. } => WorkflowAction::Reject,
            LifecycleCommand::Review => WorkflowAction::Review,
            LifecycleCommand::Clarify => WorkflowAction::Clarify,
            LifecycleCommand::Hold => WorkflowAction::Hold,
            LifecycleCommand::Pay(_) => WorkflowAction::Pay,
        }
    }

    /// Build a command from loosely-typed request fields.
    ///
    /// Payment amounts that fail to parse are recorded as zero; a payment date
    /// that is not `YYYY-MM-DD` is dropped.
    pub fn from_input(action: WorkflowAction, input: &TransitionInput) -> Result<Self, WorkflowError> {
        let command = match action {
            WorkflowAction::Approve => LifecycleCommand::Approve,
            WorkflowAction::Review => LifecycleCommand::Review,
            WorkflowAction::Clarify => LifecycleCommand::Clarify,
            WorkflowAction::Hold => LifecycleCommand::Hold,
            WorkflowAction::Reject => LifecycleCommand::Reject {
                reason: non_blank(input.reason.as_deref())
                    .ok_or(WorkflowError::MissingRejectionReason)?,
            },
            WorkflowAction::Pay => {
                let reference = non_blank(input.payment_reference.as_deref())
                    .ok_or(WorkflowError::MissingPaymentReference)?;
                LifecycleCommand::Pay(PaymentDetails {
                    reference,
                    payment_date: input.payment_date.as_deref().and_then(parse_payment_date),
                    remarks: non_blank(input.payment_remarks.as_deref()),
                    tds_amount: input
                        .tds_amount
                        .as_deref()
                        .map(parse_amount_or_zero)
                        .unwrap_or(Money::ZERO),
                    paid_amount: input.paid_amount.as_deref().map(parse_amount_or_zero),
                })
            }
        };
        Ok(command)
    }
}

/// Raw transition request fields as they arrive from the request layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionInput {
    pub reason: Option<String>,
    pub comment: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_date: Option<String>,
    pub payment_remarks: Option<String>,
    pub tds_amount: Option<String>,
    pub paid_amount: Option<String>,
}

/// Command: apply a lifecycle action to one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionCommand {
    pub invoice_id: InvoiceId,
    pub command: LifecycleCommand,
    /// Free text for the audit trail; may be absent.
    pub comment: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TransitionCommand {
    /// Human-readable audit line for this transition, performed by `role`.
    pub fn audit_comment(&self, role: &str) -> String {
        match &self.command {
            LifecycleCommand::Pay(payment) => {
                let mut msg = format!("Payment Processed: {}", payment.reference);
                if payment.tds_amount.is_positive() {
                    msg.push_str(&format!(" (TDS: {})", payment.tds_amount));
                }
                if let Some(paid) = payment.paid_amount.filter(Money::is_positive) {
                    msg.push_str(&format!(" (Paid: {paid})"));
                }
                if let Some(comment) = non_blank(self.comment.as_deref()) {
                    msg.push_str(&format!(". Comment: {comment}"));
                }
                msg
            }
            other => {
                let reason = match other {
                    LifecycleCommand::Reject { reason } => Some(reason.as_str()),
                    _ => None,
                };
                let comment = non_blank(self.comment.as_deref())
                    .or_else(|| non_blank(reason))
                    .unwrap_or_else(|| "N/A".to_string());
                format!(
                    "Invoice {} by {role}. Comment: {comment}",
                    other.action().target_status()
                )
            }
        }
    }
}

/// Decision logic for lifecycle commands (pure; no IO).
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    table: TransitionTable,
}

impl Workflow {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self {
            table: TransitionTable::new(policy),
        }
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Decide the event a command produces against the invoice's current state.
    ///
    /// Does not mutate; apply the returned event with [`Invoice::apply`].
    pub fn decide(&self, invoice: &Invoice, cmd: &TransitionCommand) -> Result<InvoiceEvent, WorkflowError> {
        if invoice.id() != cmd.invoice_id {
            return Err(WorkflowError::InvoiceMismatch {
                requested: cmd.invoice_id,
                actual: invoice.id(),
            });
        }

        let (rejection_reason, payment) = match &cmd.command {
            LifecycleCommand::Reject { reason } => (
                Some(non_blank(Some(reason.as_str())).ok_or(WorkflowError::MissingRejectionReason)?),
                None,
            ),
            LifecycleCommand::Pay(payment) => {
                if payment.reference.trim().is_empty() {
                    return Err(WorkflowError::MissingPaymentReference);
                }
                (None, Some(payment.clone()))
            }
            _ => (None, None),
        };

        let action = cmd.command.action();
        let from = invoice.status();
        let to = self
            .table
            .next(from, action)
            .ok_or(WorkflowError::IllegalTransition { from, action })?;

        Ok(InvoiceEvent::Transitioned(InvoiceTransitioned {
            invoice_id: cmd.invoice_id,
            action,
            from,
            to,
            rejection_reason,
            payment,
            occurred_at: cmd.occurred_at,
        }))
    }

    /// Metadata edit: move the invoice to another category. Status is untouched.
    pub fn recategorise(
        &self,
        invoice: &Invoice,
        category: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<InvoiceEvent, WorkflowError> {
        let to = non_blank(Some(category)).ok_or(WorkflowError::MissingCategory)?;
        Ok(InvoiceEvent::Recategorised(InvoiceRecategorised {
            invoice_id: invoice.id(),
            from: invoice.category().to_string(),
            to,
            occurred_at,
        }))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_payment_date(text: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_amount_or_zero(text: &str) -> Money {
    text.parse().unwrap_or(Money::ZERO)
}
