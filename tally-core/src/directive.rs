//! Directive log model
//!
//! A directive is an intended mutation recorded in the event log:
//! create/update/delete per entity kind, carrying the effective hybrid
//! logical clock derived at directive-creation time. Directives are
//! immutable value objects, validated strictly before the projection
//! engine applies them.
//!
//! Patch fields are `Option`: an absent field leaves the stored value
//! untouched. For optional text fields an empty string clears the value.

use crate::clock::HybridLogicalClock;
use crate::error::Result;
use crate::ids::{AcctId, StmtId, TxnId, VndrId};
use crate::money::Cents;
use crate::types::{
    validate_account_number, validate_date, validate_description, validate_entries,
    validate_name, AccountType, Entry,
};
use crate::Error;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Payload for creating an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Caller-supplied stable id
    pub id: AcctId,
    /// Display name, unique among non-deleted accounts
    pub name: String,
    /// Institution account number
    #[serde(default)]
    pub number: Option<String>,
    /// Classification
    pub kind: AccountType,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update for an account; absent fields are untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountPatch {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New account number; empty string clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// New classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AccountType>,
    /// New description; empty string clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payload for creating a vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVendor {
    /// Caller-supplied stable id
    pub id: VndrId,
    /// Display name, unique among non-deleted vendors
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Default posting account, referenced by account name
    #[serde(default)]
    pub default_account: Option<String>,
    /// Active flag for pick-lists (defaults to true)
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Partial update for a vendor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorPatch {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description; empty string clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New default account; empty string clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_account: Option<String>,
    /// New active flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Payload for creating a transaction with its full entry set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Caller-supplied stable id
    pub id: TxnId,
    /// Transaction date
    pub date: NaiveDate,
    /// Optional check number / code
    #[serde(default)]
    pub code: Option<String>,
    /// Vendor, referenced by vendor name
    #[serde(default)]
    pub vendor: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered, balanced entry set
    pub entries: Vec<Entry>,
}

/// Partial update for a transaction; a supplied entry set replaces the
/// stored set wholesale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    /// New transaction date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// New code; empty string clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// New vendor; empty string clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// New description; empty string clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement entry set (whole-set, single clock)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<Entry>>,
}

/// Payload for creating a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStatement {
    /// Caller-supplied stable id
    pub id: StmtId,
    /// Statement account, referenced by account name
    pub account: String,
    /// Period start
    pub begin_date: NaiveDate,
    /// Period end
    pub end_date: NaiveDate,
    /// Balance at period start
    pub beginning_balance: Cents,
    /// Balance at period end
    pub ending_balance: Cents,
    /// True once reconciliation is finished
    #[serde(default)]
    pub reconciled: bool,
    /// Transactions covered by this statement
    #[serde(default)]
    pub transactions: Vec<TxnId>,
}

/// Partial update for a statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementPatch {
    /// New statement account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// New period start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_date: Option<NaiveDate>,
    /// New period end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// New balance at period start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beginning_balance: Option<Cents>,
    /// New balance at period end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_balance: Option<Cents>,
    /// New reconciled flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciled: Option<bool>,
    /// Replacement linked-transaction set (whole-set, single clock)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TxnId>>,
}

/// An intended mutation recorded in the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Directive {
    /// Create an account
    CreateAccount {
        #[serde(flatten)]
        account: NewAccount,
        clock: HybridLogicalClock,
    },
    /// Patch account fields
    UpdateAccount {
        id: AcctId,
        #[serde(flatten)]
        patch: AccountPatch,
        clock: HybridLogicalClock,
    },
    /// Tombstone an account
    DeleteAccount {
        id: AcctId,
        clock: HybridLogicalClock,
    },
    /// Create a vendor
    CreateVendor {
        #[serde(flatten)]
        vendor: NewVendor,
        clock: HybridLogicalClock,
    },
    /// Patch vendor fields
    UpdateVendor {
        id: VndrId,
        #[serde(flatten)]
        patch: VendorPatch,
        clock: HybridLogicalClock,
    },
    /// Tombstone a vendor
    DeleteVendor {
        id: VndrId,
        clock: HybridLogicalClock,
    },
    /// Create a transaction with its full entry set
    CreateTransaction {
        #[serde(flatten)]
        transaction: NewTransaction,
        clock: HybridLogicalClock,
    },
    /// Patch transaction fields and/or replace the entry set
    UpdateTransaction {
        id: TxnId,
        #[serde(flatten)]
        patch: TransactionPatch,
        clock: HybridLogicalClock,
    },
    /// Tombstone a transaction
    DeleteTransaction {
        id: TxnId,
        clock: HybridLogicalClock,
    },
    /// Create a statement
    CreateStatement {
        #[serde(flatten)]
        statement: NewStatement,
        clock: HybridLogicalClock,
    },
    /// Patch statement fields and/or replace the linked-transaction set
    UpdateStatement {
        id: StmtId,
        #[serde(flatten)]
        patch: StatementPatch,
        clock: HybridLogicalClock,
    },
    /// Tombstone a statement
    DeleteStatement {
        id: StmtId,
        clock: HybridLogicalClock,
    },
}

impl Directive {
    /// The directive's effective clock
    pub fn clock(&self) -> HybridLogicalClock {
        match self {
            Directive::CreateAccount { clock, .. }
            | Directive::UpdateAccount { clock, .. }
            | Directive::DeleteAccount { clock, .. }
            | Directive::CreateVendor { clock, .. }
            | Directive::UpdateVendor { clock, .. }
            | Directive::DeleteVendor { clock, .. }
            | Directive::CreateTransaction { clock, .. }
            | Directive::UpdateTransaction { clock, .. }
            | Directive::DeleteTransaction { clock, .. }
            | Directive::CreateStatement { clock, .. }
            | Directive::UpdateStatement { clock, .. }
            | Directive::DeleteStatement { clock, .. } => *clock,
        }
    }

    /// Action tag for logging
    pub fn action(&self) -> &'static str {
        match self {
            Directive::CreateAccount { .. } => "create_account",
            Directive::UpdateAccount { .. } => "update_account",
            Directive::DeleteAccount { .. } => "delete_account",
            Directive::CreateVendor { .. } => "create_vendor",
            Directive::UpdateVendor { .. } => "update_vendor",
            Directive::DeleteVendor { .. } => "delete_vendor",
            Directive::CreateTransaction { .. } => "create_transaction",
            Directive::UpdateTransaction { .. } => "update_transaction",
            Directive::DeleteTransaction { .. } => "delete_transaction",
            Directive::CreateStatement { .. } => "create_statement",
            Directive::UpdateStatement { .. } => "update_statement",
            Directive::DeleteStatement { .. } => "delete_statement",
        }
    }

    /// Validate the payload against the entity schema. State-dependent
    /// checks (conflicts, referential integrity) belong to the
    /// projection engine.
    pub fn validate(&self) -> Result<()> {
        match self {
            Directive::CreateAccount { account, .. } => {
                validate_name(&account.name)?;
                if let Some(number) = &account.number {
                    validate_account_number(number)?;
                }
                if let Some(description) = &account.description {
                    validate_description(description)?;
                }
                Ok(())
            }
            Directive::UpdateAccount { patch, .. } => {
                if let Some(name) = &patch.name {
                    validate_name(name)?;
                }
                if let Some(number) = &patch.number {
                    if !number.is_empty() {
                        validate_account_number(number)?;
                    }
                }
                if let Some(description) = &patch.description {
                    if !description.is_empty() {
                        validate_description(description)?;
                    }
                }
                Ok(())
            }
            Directive::CreateVendor { vendor, .. } => {
                validate_name(&vendor.name)?;
                if let Some(description) = &vendor.description {
                    validate_description(description)?;
                }
                if let Some(default_account) = &vendor.default_account {
                    validate_name(default_account)?;
                }
                Ok(())
            }
            Directive::UpdateVendor { patch, .. } => {
                if let Some(name) = &patch.name {
                    validate_name(name)?;
                }
                if let Some(description) = &patch.description {
                    if !description.is_empty() {
                        validate_description(description)?;
                    }
                }
                if let Some(default_account) = &patch.default_account {
                    if !default_account.is_empty() {
                        validate_name(default_account)?;
                    }
                }
                Ok(())
            }
            Directive::CreateTransaction { transaction, .. } => {
                validate_date(transaction.date)?;
                if transaction.vendor.is_none() && transaction.description.is_none() {
                    return Err(Error::Validation(
                        "transaction requires a vendor or a description".to_string(),
                    ));
                }
                if let Some(description) = &transaction.description {
                    validate_description(description)?;
                }
                if let Some(vendor) = &transaction.vendor {
                    validate_name(vendor)?;
                }
                validate_entries(&transaction.entries)
            }
            Directive::UpdateTransaction { patch, .. } => {
                if let Some(date) = patch.date {
                    validate_date(date)?;
                }
                if let Some(description) = &patch.description {
                    if !description.is_empty() {
                        validate_description(description)?;
                    }
                }
                if let Some(vendor) = &patch.vendor {
                    if !vendor.is_empty() {
                        validate_name(vendor)?;
                    }
                }
                if let Some(entries) = &patch.entries {
                    validate_entries(entries)?;
                }
                Ok(())
            }
            Directive::CreateStatement { statement, .. } => {
                validate_name(&statement.account)?;
                if statement.begin_date > statement.end_date {
                    return Err(Error::Validation(format!(
                        "statement period is inverted: {} > {}",
                        statement.begin_date, statement.end_date
                    )));
                }
                Ok(())
            }
            Directive::UpdateStatement { patch, .. } => {
                if let Some(account) = &patch.account {
                    validate_name(account)?;
                }
                if let (Some(begin), Some(end)) = (patch.begin_date, patch.end_date) {
                    if begin > end {
                        return Err(Error::Validation(format!(
                            "statement period is inverted: {} > {}",
                            begin, end
                        )));
                    }
                }
                Ok(())
            }
            Directive::DeleteAccount { .. }
            | Directive::DeleteVendor { .. }
            | Directive::DeleteTransaction { .. }
            | Directive::DeleteStatement { .. } => Ok(()),
        }
    }
}

/// Interpret a patched optional text field: absent leaves the stored
/// value, empty string clears it, anything else sets it.
pub(crate) fn patch_text(value: &Option<String>) -> Option<Option<String>> {
    value
        .as_ref()
        .map(|s| if s.is_empty() { None } else { Some(s.clone()) })
}
