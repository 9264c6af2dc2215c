//! Built-in field profiles.

use crate::types::ColumnFieldConfig;

pub const ENTRY_ID: &str = "entry_id";
pub const POSTING_DATE: &str = "posting_date";
pub const ACCOUNT: &str = "account";
pub const DEBIT: &str = "debit";
pub const CREDIT: &str = "credit";
pub const AMOUNT: &str = "amount";
pub const DESCRIPTION: &str = "description";
pub const PARTY: &str = "party";
pub const POSTED_BY: &str = "posted_by";

/// Header profile for general-ledger journal entry extracts.
///
/// Debit and credit run before the generic amount field so that
/// "Debit Amount" style headers are never taken by `amount`.
pub fn journal_entry() -> Vec<ColumnFieldConfig> {
    vec![
        ColumnFieldConfig::new(ENTRY_ID, 10)
            .exact(
                r"(je|journal|entry|document|doc|voucher|transaction|txn)[\s_#-]*(id|no\.?|num|number|#)$",
                0.95,
            )
            .partial(r"(entry|journal|voucher)[\s_]*(id|number|no)", 0.85)
            .exact(r"(je|id)$", 0.7)
            .partial(r"reference|ref\b", 0.5),
        ColumnFieldConfig::new(POSTING_DATE, 20)
            .exact(r"(posting|post|entry|transaction|gl|effective|journal)[\s_]*date", 0.95)
            .exact(r"date$", 0.9)
            .partial(r"date", 0.6)
            .partial(r"period", 0.3)
            .required("No posting date column detected; entries cannot be placed in periods"),
        ColumnFieldConfig::new(ACCOUNT, 30)
            .exact(
                r"((gl|general[\s_]*ledger)[\s_]*)?(account|acct)[\s_]*(number|no\.?|num|code|id|#)",
                0.95,
            )
            .exact(r"(account|acct|gl[\s_]*account)$", 0.9)
            .partial(r"gl[\s_]*code", 0.8)
            .partial(r"account", 0.7)
            .required("No account column detected; account-level analysis is unavailable"),
        ColumnFieldConfig::new(DEBIT, 40)
            .exact(r"(debit|dr)([\s_]*(amount|amt|value))?$", 0.95)
            .partial(r"debit", 0.85),
        ColumnFieldConfig::new(CREDIT, 41)
            .exact(r"(credit|cr)([\s_]*(amount|amt|value))?$", 0.95)
            .partial(r"credit", 0.85),
        ColumnFieldConfig::new(AMOUNT, 50)
            .exact(r"((net|transaction|line|entry)[\s_]*)?(amount|amt)$", 0.95)
            .partial(r"amount", 0.7)
            .partial(r"\bamt\b", 0.6)
            .partial(r"value", 0.4)
            .partial(r"balance", 0.3),
        ColumnFieldConfig::new(DESCRIPTION, 60)
            .exact(r"(description|desc|memo|narrative|narration|line[\s_]*description)$", 0.9)
            .partial(r"description|memo|comment|explanation|narrative", 0.7)
            .partial(r"text", 0.3),
        ColumnFieldConfig::new(PARTY, 70)
            .exact(r"(vendor|supplier|payee|customer|counterparty)([\s_]*(name|id))?$", 0.9)
            .partial(r"vendor|supplier|payee|customer|counterparty", 0.75)
            .partial(r"name", 0.3),
        ColumnFieldConfig::new(POSTED_BY, 80)
            .partial(r"(posted|created|entered|prepared|approved)[\s_]*by", 0.9)
            .partial(r"preparer|user", 0.6),
    ]
}
