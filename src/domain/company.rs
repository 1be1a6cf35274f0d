//! Company identifiers for the simulated equities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::TradesimError;

/// Closed set of tradeable companies. Ordering follows declaration order,
/// so `CompanyA` is the reference series for date lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Company {
    #[serde(rename = "COMPANY_A")]
    CompanyA,
    #[serde(rename = "COMPANY_B")]
    CompanyB,
}

impl Company {
    pub const ALL: [Company; 2] = [Company::CompanyA, Company::CompanyB];

    pub fn id(&self) -> &'static str {
        match self {
            Company::CompanyA => "COMPANY_A",
            Company::CompanyB => "COMPANY_B",
        }
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Company {
    type Err = TradesimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COMPANY_A" | "A" => Ok(Company::CompanyA),
            "COMPANY_B" | "B" => Ok(Company::CompanyB),
            _ => Err(TradesimError::UnknownCompany(s.to_string())),
        }
    }
}
