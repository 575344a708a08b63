//! Registration/update rule.
//!
//! A candidate record (new, or an existing record merged with an edit) is
//! validated field by field and then normalized:
//!
//! - unset block status defaults to `Active`
//! - unset credit limit defaults to `0.00`
//! - a `Blocked` customer always ends up with a `0.00` credit limit
//!
//! Validation never corrects input; every failing field is reported,
//! including values that did not parse as a date, a decimal or a status.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use finpay_core::{DomainError, DomainResult, Money, MoneyError, Submitted, ValidationErrors};

use crate::customer::{BlockStatus, Customer, TaxId};

pub const NAME_MAX_CHARS: usize = 100;

/// Candidate customer fields as received from a caller. Anything may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerDraft {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub birth_date: Option<Submitted<NaiveDate>>,
    pub block_status: Option<Submitted<BlockStatus>>,
    pub credit_limit: Option<Submitted<Decimal>>,
}

impl CustomerDraft {
    /// Fill every field missing from this edit with the stored value.
    pub fn merged_onto(self, existing: &Customer) -> CustomerDraft {
        CustomerDraft {
            name: self.name.or_else(|| Some(existing.name().to_string())),
            tax_id: self
                .tax_id
                .or_else(|| Some(existing.tax_id().as_str().to_string())),
            birth_date: self.birth_date.or(Some(existing.birth_date().into())),
            block_status: self.block_status.or(Some(existing.block_status().into())),
            credit_limit: self
                .credit_limit
                .or(Some(existing.credit_limit().amount().into())),
        }
    }
}

/// Validated, normalized customer fields (everything but the id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerProfile {
    pub(crate) name: String,
    pub(crate) tax_id: TaxId,
    pub(crate) birth_date: NaiveDate,
    pub(crate) block_status: BlockStatus,
    pub(crate) credit_limit: Money,
}

impl CustomerProfile {
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
}

/// Validate a draft and apply the defaulting and credit-limit rules.
///
/// `today` is the reference for the "birth date in the past" check.
pub fn normalize(draft: CustomerDraft, today: NaiveDate) -> DomainResult<CustomerProfile> {
    let mut errors = ValidationErrors::new();

    let name = match draft.name {
        Some(n) if !n.trim().is_empty() => {
            if n.chars().count() > NAME_MAX_CHARS {
                errors.push("name", "name must be at most 100 characters");
            }
            Some(n)
        }
        _ => {
            errors.push("name", "name is required");
            None
        }
    };

    let tax_id = match TaxId::parse(draft.tax_id.as_deref().unwrap_or_default()) {
        Ok(t) => Some(t),
        Err(msg) => {
            errors.push("tax_id", msg);
            None
        }
    };

    let birth_date = match draft.birth_date.map(Submitted::parsed) {
        Some(Some(d)) if d < today => Some(d),
        Some(Some(_)) => {
            errors.push("birth_date", "birth date must be in the past");
            None
        }
        Some(None) => {
            errors.push("birth_date", "birth date must be a date in YYYY-MM-DD format");
            None
        }
        None => {
            errors.push("birth_date", "birth date is required");
            None
        }
    };

    let credit_limit = match draft.credit_limit.map(Submitted::parsed) {
        None => Some(Money::zero()),
        Some(None) => {
            errors.push("credit_limit", "credit limit must be a decimal number");
            None
        }
        Some(Some(raw)) => match Money::from_decimal(raw) {
            Ok(m) if m.is_negative() => {
                errors.push("credit_limit", "credit limit must not be negative");
                None
            }
            Ok(m) => Some(m),
            Err(e) => {
                errors.push("credit_limit", credit_limit_message(e));
                None
            }
        },
    };

    let block_status = match draft.block_status.map(Submitted::parsed) {
        None => Some(BlockStatus::Active),
        Some(Some(s)) => Some(s),
        Some(None) => {
            errors.push("block_status", "block status must be active or blocked (A or B)");
            None
        }
    };

    errors.finish(())?;
    let (Some(name), Some(tax_id), Some(birth_date), Some(credit_limit), Some(block_status)) =
        (name, tax_id, birth_date, credit_limit, block_status)
    else {
        // Every `None` above pushed an error.
        return Err(DomainError::validation("customer", "customer record is incomplete"));
    };

    let credit_limit = match block_status {
        BlockStatus::Blocked => Money::zero(),
        BlockStatus::Active => credit_limit,
    };

    Ok(CustomerProfile {
        name,
        tax_id,
        birth_date,
        block_status,
        credit_limit,
    })
}

fn credit_limit_message(err: MoneyError) -> String {
    format!("credit limit {err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use finpay_core::CustomerId;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn valid_draft() -> CustomerDraft {
        CustomerDraft {
            name: Some("Novo Cliente".to_string()),
            tax_id: Some("99988877766".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1995, 5, 5).map(Into::into),
            block_status: None,
            credit_limit: None,
        }
    }

    fn validation_fields(err: DomainError) -> Vec<String> {
        match err {
            DomainError::Validation(e) => e.into_iter().map(|f| f.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_to_active_with_zero_credit() {
        let profile = normalize(valid_draft(), today()).unwrap();
        assert_eq!(profile.block_status(), BlockStatus::Active);
        assert_eq!(profile.credit_limit().to_string(), "0.00");
    }

    #[test]
    fn blocked_customer_gets_zero_credit_regardless_of_input() {
        let draft = CustomerDraft {
            block_status: Some(BlockStatus::Blocked.into()),
            credit_limit: Some(dec("1000.00").into()),
            ..valid_draft()
        };
        let profile = normalize(draft, today()).unwrap();
        assert_eq!(profile.block_status(), BlockStatus::Blocked);
        assert_eq!(profile.credit_limit().to_string(), "0.00");
    }

    #[test]
    fn active_customer_keeps_supplied_credit() {
        let draft = CustomerDraft {
            block_status: Some(BlockStatus::Active.into()),
            credit_limit: Some(dec("2000").into()),
            ..valid_draft()
        };
        let profile = normalize(draft, today()).unwrap();
        assert_eq!(profile.credit_limit().to_string(), "2000.00");
    }

    #[test]
    fn reports_every_failing_field() {
        let draft = CustomerDraft {
            name: Some("   ".to_string()),
            tax_id: Some("123".to_string()),
            birth_date: None,
            block_status: None,
            credit_limit: Some(dec("-1").into()),
        };
        let fields = validation_fields(normalize(draft, today()).unwrap_err());
        assert_eq!(fields, vec!["name", "tax_id", "birth_date", "credit_limit"]);
    }

    #[test]
    fn name_longer_than_limit_is_rejected() {
        let draft = CustomerDraft {
            name: Some("x".repeat(NAME_MAX_CHARS + 1)),
            ..valid_draft()
        };
        assert_eq!(validation_fields(normalize(draft, today()).unwrap_err()), vec!["name"]);

        let draft = CustomerDraft {
            name: Some("é".repeat(NAME_MAX_CHARS)),
            ..valid_draft()
        };
        assert!(normalize(draft, today()).is_ok());
    }

    #[test]
    fn birth_date_must_be_strictly_past() {
        let draft = CustomerDraft {
            birth_date: Some(today().into()),
            ..valid_draft()
        };
        assert_eq!(
            validation_fields(normalize(draft, today()).unwrap_err()),
            vec!["birth_date"]
        );
    }

    #[test]
    fn credit_limit_with_three_decimals_is_rejected_not_rounded() {
        let draft = CustomerDraft {
            credit_limit: Some(dec("10.005").into()),
            ..valid_draft()
        };
        assert_eq!(
            validation_fields(normalize(draft, today()).unwrap_err()),
            vec!["credit_limit"]
        );
    }

    #[test]
    fn negative_credit_limit_is_rejected_even_when_blocked() {
        let draft = CustomerDraft {
            block_status: Some(BlockStatus::Blocked.into()),
            credit_limit: Some(dec("-5").into()),
            ..valid_draft()
        };
        assert_eq!(
            validation_fields(normalize(draft, today()).unwrap_err()),
            vec!["credit_limit"]
        );
    }

    #[test]
    fn merge_keeps_stored_values_for_missing_fields() {
        let draft = CustomerDraft {
            credit_limit: Some(dec("750").into()),
            block_status: Some(BlockStatus::Active.into()),
            ..valid_draft()
        };
        let existing = Customer::register(CustomerId::new(), normalize(draft, today()).unwrap());

        let edit = CustomerDraft {
            name: Some("Renamed".to_string()),
            ..CustomerDraft::default()
        };
        let merged = edit.merged_onto(&existing);
        assert_eq!(merged.name.as_deref(), Some("Renamed"));
        assert_eq!(merged.tax_id.as_deref(), Some("99988877766"));
        assert_eq!(merged.block_status, Some(Submitted::Parsed(BlockStatus::Active)));
        assert_eq!(merged.credit_limit, Some(Submitted::Parsed(dec("750.00"))));

        let profile = normalize(merged, today()).unwrap();
        assert_eq!(profile.name(), "Renamed");
        assert_eq!(profile.credit_limit().to_string(), "750.00");
    }

    #[test]
    fn blocking_through_update_zeroes_credit() {
        let draft = CustomerDraft {
            credit_limit: Some(dec("750").into()),
            ..valid_draft()
        };
        let mut customer =
            Customer::register(CustomerId::new(), normalize(draft, today()).unwrap());

        let edit = CustomerDraft {
            block_status: Some(BlockStatus::Blocked.into()),
            ..CustomerDraft::default()
        };
        let profile = normalize(edit.merged_onto(&customer), today()).unwrap();
        customer.apply_profile(profile);

        assert!(customer.is_blocked());
        assert!(customer.credit_limit().is_zero());
    }

    #[test]
    fn malformed_values_are_reported_per_field() {
        let draft: CustomerDraft = serde_json::from_value(serde_json::json!({
            "name": "Novo Cliente",
            "tax_id": "99988877766",
            "birth_date": "1995-13-40",
            "block_status": "X",
            "credit_limit": "lots",
        }))
        .unwrap();
        assert_eq!(
            validation_fields(normalize(draft, today()).unwrap_err()),
            vec!["birth_date", "credit_limit", "block_status"]
        );
    }

    #[test]
    fn well_formed_json_parses_into_typed_fields() {
        let draft: CustomerDraft = serde_json::from_value(serde_json::json!({
            "birth_date": "1995-05-05",
            "block_status": "B",
            "credit_limit": 1500.5,
        }))
        .unwrap();
        assert_eq!(
            draft.birth_date,
            NaiveDate::from_ymd_opt(1995, 5, 5).map(Submitted::Parsed)
        );
        assert_eq!(draft.block_status, Some(Submitted::Parsed(BlockStatus::Blocked)));
        assert_eq!(draft.credit_limit, Some(Submitted::Parsed(dec("1500.5"))));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn block_status() -> impl Strategy<Value = Option<Submitted<BlockStatus>>> {
            prop_oneof![
                Just(None),
                Just(Some(Submitted::Parsed(BlockStatus::Active))),
                Just(Some(Submitted::Parsed(BlockStatus::Blocked))),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: whatever the caller sends, a normalized blocked
            /// customer never carries credit.
            #[test]
            fn blocked_implies_zero_credit(
                status in block_status(),
                cents in proptest::option::of(0i64..9_999_999_999i64),
            ) {
                let draft = CustomerDraft {
                    block_status: status,
                    credit_limit: cents.map(|c| Decimal::new(c, 2).into()),
                    ..valid_draft()
                };
                let profile = normalize(draft, today()).unwrap();
                if profile.block_status() == BlockStatus::Blocked {
                    prop_assert!(profile.credit_limit().is_zero());
                } else {
                    let expected = cents.map(|c| Decimal::new(c, 2)).unwrap_or_default();
                    prop_assert_eq!(profile.credit_limit().amount(), expected);
                }
            }
        }
    }
}
