//! Built-in datasets backing the preset tabs.
//!
//! Preset data is rebuilt from code on every load, so ids here are fixed
//! strings rather than generated ones.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Esg, KpiNode, Scope};
use crate::store::{DEFAULT_REVERSE_LABEL_PREFIX, attach_link_pair};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKey {
    Financial,
    Esg,
    Operations,
}

impl PresetKey {
    pub const ALL: [PresetKey; 3] = [Self::Financial, Self::Esg, Self::Operations];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Esg => "esg",
            Self::Operations => "operations",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(value))
    }

    /// Tab title shown for the preset.
    pub fn title(self) -> &'static str {
        match self {
            Self::Financial => "Financial",
            Self::Esg => "ESG",
            Self::Operations => "Operations",
        }
    }

    pub fn dataset(self) -> Vec<KpiNode> {
        match self {
            Self::Financial => financial(),
            Self::Esg => esg(),
            Self::Operations => operations(),
        }
    }
}

impl fmt::Display for PresetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn link(forest: &mut [KpiNode], from: &str, to: &str, id: &str, label: &str) {
    attach_link_pair(forest, from, to, id, Some(label), DEFAULT_REVERSE_LABEL_PREFIX);
}

fn financial() -> Vec<KpiNode> {
    let mut forest = vec![
        KpiNode::new("root-financial", "Enterprise Value")
            .with_unit("M€")
            .with_child(
                KpiNode::new("revenue", "Revenue")
                    .with_unit("M€")
                    .with_child(KpiNode::new("prod-volume", "Production Volume").with_unit("t"))
                    .with_child(KpiNode::new("rev-price", "Realised Price").with_unit("€/t")),
            )
            .with_child(
                KpiNode::new("cost", "Operating Cost")
                    .with_unit("M€")
                    .with_child(
                        KpiNode::new("cost-energy", "Energy Cost")
                            .with_unit("M€")
                            .with_esg(Esg::E)
                            .with_scope(Scope::Indirect),
                    )
                    .with_child(KpiNode::new("maint-cost", "Maintenance Spend").with_unit("M€")),
            )
            .with_child(
                KpiNode::new("fcf", "Free Cash Flow")
                    .with_unit("M€")
                    .with_child(KpiNode::new("capex", "Capital Expenditure").with_unit("M€")),
            ),
    ];
    link(&mut forest, "cost-energy", "prod-volume", "rel-financial-1", "Drives");
    forest
}

fn esg() -> Vec<KpiNode> {
    vec![
        KpiNode::new("root-esg", "Sustainability")
            .with_child(
                KpiNode::new("esg-emissions", "GHG Emissions")
                    .with_unit("tCO2e")
                    .with_esg(Esg::E)
                    .with_child(
                        KpiNode::new("esg-scope1", "Direct Emissions")
                            .with_unit("tCO2e")
                            .with_esg(Esg::E)
                            .with_scope(Scope::Direct),
                    )
                    .with_child(
                        KpiNode::new("esg-scope2", "Purchased Energy Emissions")
                            .with_unit("tCO2e")
                            .with_esg(Esg::E)
                            .with_scope(Scope::Indirect),
                    )
                    .with_child(
                        KpiNode::new("esg-scope3", "Value Chain Emissions")
                            .with_unit("tCO2e")
                            .with_esg(Esg::E)
                            .with_scope(Scope::ValueChain),
                    ),
            )
            .with_child(
                KpiNode::new("emp-safety", "Lost Time Injury Rate")
                    .with_unit("per 1M h")
                    .with_esg(Esg::S),
            )
            .with_child(
                KpiNode::new("esg-board", "Board Independence")
                    .with_unit("%")
                    .with_esg(Esg::G),
            ),
    ]
}

fn operations() -> Vec<KpiNode> {
    let mut forest = vec![
        KpiNode::new("root-operations", "Operational Performance")
            .with_child(
                KpiNode::new("ops-efficiency", "Operational Efficiency")
                    .with_unit("%")
                    .with_child(
                        KpiNode::new("prod-throughput", "Throughput")
                            .with_unit("t/h")
                            .with_child(KpiNode::new("equip-oee", "Overall Equipment Effectiveness").with_unit("%")),
                    ),
            )
            .with_child(KpiNode::new("maint-planned", "Planned Maintenance Ratio").with_unit("%"))
            .with_child(KpiNode::new("emp-headcount", "Headcount").with_unit("FTE")),
    ];
    link(&mut forest, "maint-planned", "equip-oee", "rel-operations-1", "Improves");
    forest
}
