//! Account types and their natural balance side.
//!
//! - Asset/Expense: balance += debit - credit (debit-normal)
//! - Liability/Equity/Revenue: balance += credit - debit (credit-normal)

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Chart-of-accounts classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets.
    #[serde(rename = "ASSET")]
    Asset,
    /// Liabilities.
    #[serde(rename = "LIAB")]
    Liability,
    /// Equity.
    #[serde(rename = "EQUITY")]
    Equity,
    /// Revenue.
    #[serde(rename = "REV")]
    Revenue,
    /// Expenses.
    #[serde(rename = "EXP")]
    Expense,
}

/// Side on which an account increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalSide {
    /// Increases on debit (Asset, Expense).
    Debit,
    /// Increases on credit (Liability, Equity, Revenue).
    Credit,
}

impl AccountType {
    /// Returns the code used in storage and rule trees.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIAB",
            Self::Equity => "EQUITY",
            Self::Revenue => "REV",
            Self::Expense => "EXP",
        }
    }

    /// Parses an account type from its code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "ASSET" => Some(Self::Asset),
            "LIAB" => Some(Self::Liability),
            "EQUITY" => Some(Self::Equity),
            "REV" => Some(Self::Revenue),
            "EXP" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Returns the side on which this account type increases.
    #[must_use]
    pub const fn normal_side(self) -> NormalSide {
        match self {
            Self::Asset | Self::Expense => NormalSide::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalSide::Credit,
        }
    }

    /// Calculates the signed movement for the given totals.
    #[must_use]
    pub fn movement(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self.normal_side() {
            NormalSide::Debit => debit - credit,
            NormalSide::Credit => credit - debit,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(AccountType::Asset, dec!(100), dec!(30), dec!(70))]
    #[case(AccountType::Expense, dec!(100), dec!(30), dec!(70))]
    #[case(AccountType::Liability, dec!(100), dec!(30), dec!(-70))]
    #[case(AccountType::Equity, dec!(0), dec!(50), dec!(50))]
    #[case(AccountType::Revenue, dec!(10), dec!(25), dec!(15))]
    fn test_movement_by_normal_side(
        #[case] account_type: AccountType,
        #[case] debit: Decimal,
        #[case] credit: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(account_type.movement(debit, credit), expected);
    }

    #[test]
    fn test_codes_round_trip() {
        for t in [
            AccountType::Asset,
            AccountType::Liability,
            AccountType::Equity,
            AccountType::Revenue,
            AccountType::Expense,
        ] {
            assert_eq!(AccountType::from_code(t.code()), Some(t));
            assert_eq!(
                serde_json::to_value(t).unwrap(),
                serde_json::json!(t.code())
            );
        }
        assert_eq!(AccountType::from_code("bogus"), None);
        assert_eq!(AccountType::from_code(" liab "), Some(AccountType::Liability));
    }
}
