//! Scheme-level fund summaries derived from demand/allocation/release records.
//! Grouping is by scheme name; visibility follows the caller's district scope.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::identity::{Identity, Role};

/// Amounts are whole rupees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FundRecord {
    pub scheme: String,
    pub district: String,
    pub demanded: u64,
    pub allocated: u64,
    pub released: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    AllDistricts,
    District(String),
    Nothing,
}

impl Scope {
    pub fn for_identity(identity: &Identity) -> Scope {
        match (&identity.role, identity.district.as_deref()) {
            (Role::StateAdmin, _) => Scope::AllDistricts,
            (r, Some(d)) if r.is_district_scoped() => Scope::District(d.to_string()),
            _ => Scope::Nothing,
        }
    }

    fn admits(&self, record: &FundRecord) -> bool {
        match self {
            Scope::AllDistricts => true,
            Scope::District(d) => record.district.eq_ignore_ascii_case(d),
            Scope::Nothing => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SchemeSummary {
    pub scheme: String,
    pub districts: usize,
    pub demanded: u64,
    pub allocated: u64,
    pub released: u64,
    pub pending: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FundSummary {
    pub rows: Vec<SchemeSummary>,
    pub totals: SchemeSummary,
}

pub fn summarize(records: &[FundRecord], scope: &Scope) -> FundSummary {
    let mut groups: BTreeMap<&str, (BTreeSet<&str>, SchemeSummary)> = BTreeMap::new();
    for r in records.iter().filter(|r| scope.admits(r)) {
        let (districts, acc) = groups.entry(r.scheme.as_str()).or_default();
        districts.insert(r.district.as_str());
        acc.demanded = acc.demanded.saturating_add(r.demanded);
        acc.allocated = acc.allocated.saturating_add(r.allocated);
        acc.released = acc.released.saturating_add(r.released);
    }

    let mut all_districts: BTreeSet<&str> = BTreeSet::new();
    let mut totals = SchemeSummary { scheme: "Total".to_string(), ..Default::default() };
    let mut rows = Vec::with_capacity(groups.len());
    for (scheme, (districts, mut acc)) in groups {
        acc.scheme = scheme.to_string();
        acc.districts = districts.len();
        acc.pending = acc.demanded.saturating_sub(acc.allocated);
        totals.demanded = totals.demanded.saturating_add(acc.demanded);
        totals.allocated = totals.allocated.saturating_add(acc.allocated);
        totals.released = totals.released.saturating_add(acc.released);
        totals.pending = totals.pending.saturating_add(acc.pending);
        all_districts.extend(districts);
        rows.push(acc);
    }
    totals.districts = all_districts.len();
    FundSummary { rows, totals }
}

/// Ledger of fund records consulted by the summary views.
#[derive(Debug, Clone, Default)]
pub struct FundLedger {
    records: Vec<FundRecord>,
}

impl FundLedger {
    pub fn new(records: Vec<FundRecord>) -> Self { Self { records } }

    pub fn records(&self) -> &[FundRecord] { &self.records }

    pub fn summary_for(&self, identity: &Identity) -> FundSummary {
        summarize(&self.records, &Scope::for_identity(identity))
    }

    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::config("ledger_read".to_string(), format!("cannot read ledger {}: {}", path.display(), e))
        })?;
        let records: Vec<FundRecord> = serde_json::from_str(&text)
            .map_err(|e| AppError::config("ledger_parse".to_string(), format!("invalid ledger JSON: {}", e)))?;
        Ok(Self::new(records))
    }

    pub fn sample() -> Self {
        let rec = |scheme: &str, district: &str, demanded: u64, allocated: u64, released: u64| FundRecord {
            scheme: scheme.to_string(),
            district: district.to_string(),
            demanded,
            allocated,
            released,
        };
        Self::new(vec![
            rec("Jal Jeevan Mission", "Pune", 45_000_000, 38_000_000, 30_500_000),
            rec("Jal Jeevan Mission", "Nashik", 32_000_000, 32_000_000, 21_000_000),
            rec("PM Awas Yojana (Gramin)", "Pune", 28_500_000, 25_000_000, 25_000_000),
            rec("PM Awas Yojana (Gramin)", "Satara", 19_000_000, 12_000_000, 9_750_000),
            rec("Rural Roads Maintenance", "Nashik", 15_250_000, 10_000_000, 4_000_000),
            rec("Rural Roads Maintenance", "Pune", 9_800_000, 9_800_000, 9_800_000),
            rec("Swachh Bharat Mission", "Satara", 6_400_000, 5_000_000, 2_500_000),
        ])
    }
}
