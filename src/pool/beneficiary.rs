//! Operator commission beneficiaries

use crate::base::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Operators may redirect their commission to another account. Operators
/// without an entry are their own beneficiary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryBook {
    beneficiaries: HashMap<Address, Address>,
}

impl BeneficiaryBook {
    pub fn beneficiary_for_operator(&self, operator: Address) -> Address {
        self.beneficiaries
            .get(&operator)
            .copied()
            .unwrap_or(operator)
    }

    /// Returns the previous beneficiary
    pub fn set(&mut self, operator: Address, beneficiary: Address) -> Address {
        let old = self.beneficiary_for_operator(operator);
        self.beneficiaries.insert(operator, beneficiary);
        old
    }
}
