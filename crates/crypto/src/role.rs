//! Role groups a key can be authorized for

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of role slots in a role-based keyring
pub const ROLE_GROUP_COUNT: usize = 3;

/// Maximum number of keys a single role slot may hold
pub const MAX_KEYS_PER_ROLE: usize = 10;

/// One of the three fixed role slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleGroup {
    /// Signs ordinary transactions
    Transaction = 0,
    /// Signs account key updates
    AccountUpdate = 1,
    /// Signs as fee payer of a fee-delegated transaction
    FeePayer = 2,
}

impl RoleGroup {
    /// All roles in slot order.
    pub const ALL: [RoleGroup; ROLE_GROUP_COUNT] = [
        RoleGroup::Transaction,
        RoleGroup::AccountUpdate,
        RoleGroup::FeePayer,
    ];

    /// Slot index of this role.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Role for a slot index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for RoleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleGroup::Transaction => write!(f, "transaction"),
            RoleGroup::AccountUpdate => write!(f, "account_update"),
            RoleGroup::FeePayer => write!(f, "fee_payer"),
        }
    }
}

impl FromStr for RoleGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "transaction" | "tx" | "0" => Ok(RoleGroup::Transaction),
            "account_update" | "accountupdate" | "1" => Ok(RoleGroup::AccountUpdate),
            "fee_payer" | "feepayer" | "2" => Ok(RoleGroup::FeePayer),
            _ => Err(format!(
                "invalid role group: {}. Valid options: transaction, account_update, fee_payer",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_indices() {
        assert_eq!(RoleGroup::Transaction.index(), 0);
        assert_eq!(RoleGroup::AccountUpdate.index(), 1);
        assert_eq!(RoleGroup::FeePayer.index(), 2);
        assert_eq!(RoleGroup::from_index(2), Some(RoleGroup::FeePayer));
        assert_eq!(RoleGroup::from_index(3), None);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("transaction".parse::<RoleGroup>().unwrap(), RoleGroup::Transaction);
        assert_eq!("Account-Update".parse::<RoleGroup>().unwrap(), RoleGroup::AccountUpdate);
        assert_eq!("2".parse::<RoleGroup>().unwrap(), RoleGroup::FeePayer);
        assert!("admin".parse::<RoleGroup>().is_err());
    }

    #[test]
    fn test_role_display_round_trip() {
        for role in RoleGroup::ALL {
            assert_eq!(role.to_string().parse::<RoleGroup>().unwrap(), role);
        }
    }
}
