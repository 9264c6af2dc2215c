//! Reference engine for general-ledger journal entries.

use audit_map::ColumnDetector;
use audit_map::profiles::{
    ACCOUNT, AMOUNT, CREDIT, DEBIT, DESCRIPTION, ENTRY_ID, PARTY, POSTED_BY, POSTING_DATE,
    journal_entry,
};
use audit_sample::{SampleRow, Stratifier, amount_band, month_key};
use audit_validate::{FieldQualityConfig, QualityProfile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::audit_test::AuditEntry;
use crate::engine::{AuditEngine, RowView};
use crate::error::Result;
use crate::statistical::{benford_test, completeness_test, concentration_test, zscore_outlier_test};

pub const ENGINE_NAME: &str = "journal_entries";

/// Test keys registered by [`engine`].
pub const MISSING_CORE_FIELDS: &str = "missing_core_fields";
pub const BENFORD_FIRST_DIGIT: &str = "benford_first_digit";
pub const AMOUNT_OUTLIERS: &str = "amount_outliers";
pub const ACCOUNT_CONCENTRATION: &str = "account_concentration";

/// Stratifier names registered by [`engine`].
pub const STRATIFY_AMOUNT_BAND: &str = "amount_band";
pub const STRATIFY_MONTH: &str = "month";
pub const STRATIFY_ACCOUNT: &str = "account";

/// One journal entry line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub row_index: usize,
    pub entry_id: Option<String>,
    pub posting_date: Option<NaiveDate>,
    pub account: Option<String>,
    /// Signed amount: the amount column, else debit minus credit.
    pub amount: Option<f64>,
    pub debit: Option<f64>,
    pub credit: Option<f64>,
    pub description: Option<String>,
    pub party: Option<String>,
    pub posted_by: Option<String>,
}

impl LedgerEntry {
    pub fn from_row(view: &RowView<'_>) -> Self {
        let debit = view.amount(DEBIT);
        let credit = view.amount(CREDIT);
        let amount = if view.has_field(AMOUNT) {
            view.amount(AMOUNT)
        } else if debit.is_some() || credit.is_some() {
            Some(debit.unwrap_or(0.0) - credit.unwrap_or(0.0))
        } else {
            None
        };

        Self {
            row_index: view.index(),
            entry_id: view.text(ENTRY_ID),
            posting_date: view.date(POSTING_DATE),
            account: view.text(ACCOUNT),
            amount,
            debit,
            credit,
            description: view.text(DESCRIPTION),
            party: view.text(PARTY),
            posted_by: view.text(POSTED_BY),
        }
    }

    /// Unsigned size of the entry, for magnitude-based tests.
    pub fn magnitude(&self) -> Option<f64> {
        self.amount.map(f64::abs)
    }
}

impl SampleRow for LedgerEntry {
    fn row_index(&self) -> usize {
        self.row_index
    }
}

impl AuditEntry for LedgerEntry {
    fn entry_id(&self) -> Option<&str> {
        self.entry_id.as_deref()
    }
}

pub fn quality_profile() -> Result<QualityProfile<LedgerEntry>> {
    Ok(QualityProfile::new(vec![
        FieldQualityConfig::new(POSTING_DATE, |e: &LedgerEntry| e.posting_date.is_some())
            .with_weight(0.30)
            .with_issue(
                0.95,
                "{unfilled} of {total} entries have no readable posting date ({fill_pct}% filled)",
            ),
        FieldQualityConfig::new(ACCOUNT, |e: &LedgerEntry| e.account.is_some())
            .with_weight(0.30)
            .with_issue(0.95, "{unfilled} of {total} entries have no account"),
        FieldQualityConfig::new(AMOUNT, |e: &LedgerEntry| e.amount.is_some())
            .with_weight(0.25)
            .with_issue(0.95, "{unfilled} of {total} entries have no amount"),
        FieldQualityConfig::new(ENTRY_ID, |e: &LedgerEntry| e.entry_id.is_some()),
        FieldQualityConfig::new(DESCRIPTION, |e: &LedgerEntry| e.description.is_some()),
        FieldQualityConfig::new(PARTY, |e: &LedgerEntry| e.party.is_some()),
        FieldQualityConfig::new(POSTED_BY, |e: &LedgerEntry| e.posted_by.is_some()),
    ])?)
}

pub fn stratifiers() -> Vec<Stratifier<LedgerEntry>> {
    vec![
        Stratifier::new(STRATIFY_AMOUNT_BAND, |e: &LedgerEntry| {
            amount_band(e.amount.unwrap_or(0.0)).to_string()
        }),
        Stratifier::new(STRATIFY_MONTH, |e: &LedgerEntry| month_key(e.posting_date)),
        Stratifier::new(STRATIFY_ACCOUNT, |e: &LedgerEntry| {
            e.account.clone().unwrap_or_else(|| "unknown".to_string())
        }),
    ]
}

/// The journal-entry engine with the generic statistical tests.
pub fn engine() -> Result<AuditEngine<LedgerEntry>> {
    let detector = ColumnDetector::new(journal_entry())?;
    let mut engine = AuditEngine::new(
        ENGINE_NAME,
        detector,
        quality_profile()?,
        LedgerEntry::from_row,
    )
    .with_note_rule(|detection| {
        let has_amount = [AMOUNT, DEBIT, CREDIT]
            .iter()
            .any(|field| detection.is_assigned(field));
        (!has_amount).then(|| {
            "No amount, debit or credit column detected; amount-based tests have nothing to analyze"
                .to_string()
        })
    })
    .with_test(
        completeness_test(MISSING_CORE_FIELDS, "Missing Core Fields")
            .field(POSTING_DATE, |e: &LedgerEntry| e.posting_date.is_some())
            .field(ACCOUNT, |e: &LedgerEntry| e.account.is_some())
            .field(AMOUNT, |e: &LedgerEntry| e.amount.is_some()),
    )?
    .with_test(benford_test(
        BENFORD_FIRST_DIGIT,
        "Benford First Digit",
        LedgerEntry::magnitude,
    ))?
    .with_test(zscore_outlier_test(
        AMOUNT_OUTLIERS,
        "Amount Outliers",
        |e: &LedgerEntry| e.amount,
    ))?
    .with_test(
        concentration_test(
            ACCOUNT_CONCENTRATION,
            "Account Concentration",
            "account",
            |e: &LedgerEntry| e.account.clone(),
            LedgerEntry::magnitude,
        )
        .requires(ACCOUNT),
    )?;

    for stratifier in stratifiers() {
        engine = engine.with_stratifier(stratifier);
    }
    Ok(engine)
}
