//! Plan catalog: the single table mapping store product identifiers to
//! cadence, tier and yen price. Changing a price or adding a plan means
//! editing [`DEFAULT_PLANS`], not the aggregation code.

use std::collections::HashMap;

use bnet_core::types::Scope;
use bnet_core::{AdminError, AdminResult};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Billing frequency of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Monthly,
    Yearly,
}

/// Named plan level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Personal,
    TeamGold,
    TeamPlatina,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Personal, Tier::TeamGold, Tier::TeamPlatina];

    /// Parent collection a subscription of this tier must live under.
    pub fn scope(&self) -> Scope {
        match self {
            Tier::Personal => Scope::Personal,
            Tier::TeamGold | Tier::TeamPlatina => Scope::Team,
        }
    }
}

/// One plan and every product identifier it has been sold under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub product_ids: Vec<String>,
    pub cadence: Cadence,
    pub price_yen: u64,
    pub tier: Tier,
}

impl PlanEntry {
    /// Revenue this plan contributes per month. Yearly plans are spread
    /// evenly over 12 months with no rounding.
    pub fn monthly_equivalent(&self) -> f64 {
        match self.cadence {
            Cadence::Monthly => self.price_yen as f64,
            Cadence::Yearly => self.price_yen as f64 / 12.0,
        }
    }

    /// Revenue over twelve months of this plan.
    pub fn annual_amount(&self) -> u64 {
        match self.cadence {
            Cadence::Monthly => self.price_yen * 12,
            Cadence::Yearly => self.price_yen,
        }
    }
}

struct StaticPlan {
    product_ids: &'static [&'static str],
    cadence: Cadence,
    price_yen: u64,
    tier: Tier,
}

const DEFAULT_PLANS: &[StaticPlan] = &[
    StaticPlan {
        product_ids: &[
            "com.sk.bNet.app.personal1month",
            "com.sk.bnet.app.personal:personal-monthly",
        ],
        cadence: Cadence::Monthly,
        price_yen: 580,
        tier: Tier::Personal,
    },
    StaticPlan {
        product_ids: &[
            "com.sk.bNet.app.personal12month",
            "com.sk.bnet.app.personal:personal-yearly",
        ],
        cadence: Cadence::Yearly,
        price_yen: 6000,
        tier: Tier::Personal,
    },
    StaticPlan {
        product_ids: &["com.sk.bnet.team:gold-monthly", "com.sk.bNet.teamGold.monthly"],
        cadence: Cadence::Monthly,
        price_yen: 1500,
        tier: Tier::TeamGold,
    },
    StaticPlan {
        product_ids: &["com.sk.bnet.team:gold-yearly", "com.sk.bNet.teamGold.yearly"],
        cadence: Cadence::Yearly,
        price_yen: 1800,
        tier: Tier::TeamGold,
    },
    StaticPlan {
        product_ids: &[
            "com.sk.bnet.team:platina-monthly",
            "com.sk.bNet.teamPlatina.monthly",
        ],
        cadence: Cadence::Monthly,
        price_yen: 16000,
        tier: Tier::TeamPlatina,
    },
    StaticPlan {
        product_ids: &[
            "com.sk.bnet.team:platina-yearly",
            "com.sk.bNet.teamPlatina.yearly",
        ],
        cadence: Cadence::Yearly,
        price_yen: 19400,
        tier: Tier::TeamPlatina,
    },
];

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Lookup table from product identifier to plan.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    entries: Vec<PlanEntry>,
    by_product: HashMap<String, usize>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        let entries = DEFAULT_PLANS
            .iter()
            .map(|p| PlanEntry {
                product_ids: p.product_ids.iter().map(|id| id.to_string()).collect(),
                cadence: p.cadence,
                price_yen: p.price_yen,
                tier: p.tier,
            })
            .collect();
        // The built-in table has no duplicate aliases (see tests).
        Self::index(entries)
    }
}

impl PlanCatalog {
    /// Build a catalog from custom entries. A product identifier may
    /// belong to at most one entry.
    pub fn new(entries: Vec<PlanEntry>) -> AdminResult<Self> {
        let mut seen = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            for id in &entry.product_ids {
                if let Some(prev) = seen.insert(id.as_str(), i) {
                    return Err(AdminError::Validation(format!(
                        "product id {id} listed in plans {prev} and {i}"
                    )));
                }
            }
        }
        Ok(Self::index(entries))
    }

    fn index(entries: Vec<PlanEntry>) -> Self {
        let by_product = entries
            .iter()
            .enumerate()
            .flat_map(|(i, e)| e.product_ids.iter().map(move |id| (id.clone(), i)))
            .collect();
        Self {
            entries,
            by_product,
        }
    }

    /// Plan sold under `product_id`, if known.
    pub fn resolve(&self, product_id: &str) -> Option<&PlanEntry> {
        self.by_product.get(product_id).map(|&i| &self.entries[i])
    }

    /// List price of the tier at the given cadence, 0 when not offered.
    pub fn price(&self, tier: Tier, cadence: Cadence) -> u64 {
        self.entries
            .iter()
            .find(|e| e.tier == tier && e.cadence == cadence)
            .map(|e| e.price_yen)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
