use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use finpay_core::{CustomerId, Money};

use crate::registration::CustomerProfile;

/// Customer block status.
///
/// Accepts the legacy single-letter codes (`"A"`, `"B"`) on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    #[serde(alias = "A")]
    Active,
    #[serde(alias = "B")]
    Blocked,
}

impl BlockStatus {
    /// Single-letter storage code.
    pub fn code(&self) -> &'static str {
        match self {
            BlockStatus::Active => "A",
            BlockStatus::Blocked => "B",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(BlockStatus::Active),
            "B" => Some(BlockStatus::Blocked),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStatus::Active => "active",
            BlockStatus::Blocked => "blocked",
        }
    }
}

/// Taxpayer number: exactly 11 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxId(String);

impl TaxId {
    pub const LEN: usize = 11;

    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        if raw.is_empty() {
            return Err("tax id is required");
        }
        if raw.len() != Self::LEN {
            return Err("tax id must have exactly 11 digits");
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err("tax id must contain only digits");
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TaxId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer: account holder with a credit limit and a block status.
///
/// Invariant: a blocked customer always has a zero credit limit. Every
/// constructor and mutator upholds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: CustomerId,
    name: String,
    tax_id: TaxId,
    birth_date: NaiveDate,
    block_status: BlockStatus,
    credit_limit: Money,
}

impl Customer {
    /// Build a newly registered customer from a normalized profile.
    pub fn register(id: CustomerId, profile: CustomerProfile) -> Self {
        Self {
            id,
            name: profile.name,
            tax_id: profile.tax_id,
            birth_date: profile.birth_date,
            block_status: profile.block_status,
            credit_limit: profile.credit_limit,
        }
    }

    /// Rebuild a customer from persisted fields.
    pub fn restore(
        id: CustomerId,
        name: String,
        tax_id: TaxId,
        birth_date: NaiveDate,
        block_status: BlockStatus,
        credit_limit: Money,
    ) -> Self {
        let credit_limit = match block_status {
            BlockStatus::Blocked => Money::zero(),
            BlockStatus::Active => credit_limit,
        };
        Self {
            id,
            name,
            tax_id,
            birth_date,
            block_status,
            credit_limit,
        }
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tax_id(&self) -> &TaxId {
        &self.tax_id
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn block_status(&self) -> BlockStatus {
        self.block_status
    }

    pub fn credit_limit(&self) -> Money {
        self.credit_limit
    }

    pub fn is_blocked(&self) -> bool {
        self.block_status == BlockStatus::Blocked
    }

    /// Replace every mutable field with a normalized profile (update path).
    pub fn apply_profile(&mut self, profile: CustomerProfile) {
        self.name = profile.name;
        self.tax_id = profile.tax_id;
        self.birth_date = profile.birth_date;
        self.block_status = profile.block_status;
        self.credit_limit = profile.credit_limit;
    }

    /// Block the customer and zero its credit limit.
    ///
    /// Returns `false` (and changes nothing) when already blocked.
    pub fn block(&mut self) -> bool {
        if self.is_blocked() {
            return false;
        }
        self.block_status = BlockStatus::Blocked;
        self.credit_limit = Money::zero();
        true
    }
}
