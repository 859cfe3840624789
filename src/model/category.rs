//! Node categories and the parent/child legality table.
//!
//! A node's category is either set explicitly or inferred from its id and name
//! by walking [`CATEGORY_RULES`] top to bottom. The rule order is a priority
//! list: an id that matches several rules resolves to the first one, so
//! reordering the table reclassifies existing datasets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::node::KpiNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Root,
    Revenue,
    Cost,
    Fcf,
    Capex,
    Financial,
    Operational,
    Maintenance,
    Esg,
    Production,
    Employee,
    Equipment,
    Metric,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 13] = [
        Self::Root,
        Self::Revenue,
        Self::Cost,
        Self::Fcf,
        Self::Capex,
        Self::Financial,
        Self::Operational,
        Self::Maintenance,
        Self::Esg,
        Self::Production,
        Self::Employee,
        Self::Equipment,
        Self::Metric,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Revenue => "revenue",
            Self::Cost => "cost",
            Self::Fcf => "fcf",
            Self::Capex => "capex",
            Self::Financial => "financial",
            Self::Operational => "operational",
            Self::Maintenance => "maintenance",
            Self::Esg => "esg",
            Self::Production => "production",
            Self::Employee => "employee",
            Self::Equipment => "equipment",
            Self::Metric => "metric",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories legal as the parent of `child`. Root nodes can never be reparented.
pub fn valid_parent_categories(child: NodeCategory) -> &'static [NodeCategory] {
    use NodeCategory::*;
    match child {
        Root => &[],
        Revenue => &[Root, Financial],
        Cost => &[Root, Financial, Operational],
        Fcf => &[Root, Financial],
        Capex => &[Root, Fcf, Financial],
        Financial => &[Root],
        Operational => &[Root],
        Maintenance => &[Operational, Cost, Equipment],
        Esg => &[Root, Operational],
        Production => &[Revenue, Operational],
        Employee => &[Operational, Cost, Esg],
        Equipment => &[Operational, Maintenance, Capex, Production],
        Metric => &NodeCategory::ALL,
    }
}

pub fn is_legal_parent(child: NodeCategory, parent: NodeCategory) -> bool {
    valid_parent_categories(child).contains(&parent)
}

/// One inference rule: the node matches when its lower-cased id starts with
/// any of `id_prefixes`, or its id or name contains any of `keywords`.
#[derive(Debug)]
pub struct CategoryRule {
    pub category: NodeCategory,
    pub id_prefixes: &'static [&'static str],
    pub keywords: &'static [&'static str],
}

impl CategoryRule {
    fn matches(&self, id: &str, name: &str) -> bool {
        self.id_prefixes.iter().any(|p| id.starts_with(p))
            || self
                .keywords
                .iter()
                .any(|k| id.contains(k) || name.contains(k))
    }
}

pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: NodeCategory::Root,
        id_prefixes: &["root"],
        keywords: &["ebitda"],
    },
    CategoryRule {
        category: NodeCategory::Fcf,
        id_prefixes: &["fcf"],
        keywords: &["free cash flow", "free-cash-flow"],
    },
    CategoryRule {
        category: NodeCategory::Capex,
        id_prefixes: &["capex"],
        keywords: &["capex", "capital expenditure"],
    },
    CategoryRule {
        category: NodeCategory::Revenue,
        id_prefixes: &["rev-"],
        keywords: &["revenue", "sales", "turnover"],
    },
    CategoryRule {
        category: NodeCategory::Cost,
        id_prefixes: &["cost", "opex"],
        keywords: &["cost", "expense", "opex"],
    },
    CategoryRule {
        category: NodeCategory::Financial,
        id_prefixes: &["fin-"],
        keywords: &["financial", "margin", "profit"],
    },
    CategoryRule {
        category: NodeCategory::Maintenance,
        id_prefixes: &["maint"],
        keywords: &["maintenance", "repair"],
    },
    CategoryRule {
        category: NodeCategory::Esg,
        id_prefixes: &["esg"],
        keywords: &["emission", "carbon", "co2", "ghg"],
    },
    CategoryRule {
        category: NodeCategory::Production,
        id_prefixes: &["prod-"],
        keywords: &["production", "output", "throughput", "volume"],
    },
    CategoryRule {
        category: NodeCategory::Employee,
        id_prefixes: &["emp-", "hr-"],
        keywords: &["employee", "headcount", "staff", "injury"],
    },
    CategoryRule {
        category: NodeCategory::Equipment,
        id_prefixes: &["equip"],
        keywords: &["equipment", "machine", "uptime", "oee"],
    },
    CategoryRule {
        category: NodeCategory::Operational,
        id_prefixes: &["ops"],
        keywords: &["operational", "operations", "efficiency"],
    },
];

/// The node's explicit category, or the first rule in [`CATEGORY_RULES`] that
/// matches its id and name, or `metric`.
pub fn infer_category(node: &KpiNode) -> NodeCategory {
    if let Some(category) = node.category {
        return category;
    }
    let id = node.id.to_lowercase();
    let name = node.name.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.matches(&id, &name))
        .map(|rule| rule.category)
        .unwrap_or(NodeCategory::Metric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(id: &str, name: &str) -> NodeCategory {
        infer_category(&KpiNode::new(id, name))
    }

    #[test]
    fn explicit_category_wins() {
        let mut node = KpiNode::new("revenue", "Revenue");
        node.category = Some(NodeCategory::Metric);
        assert_eq!(infer_category(&node), NodeCategory::Metric);
    }

    #[test]
    fn infers_from_id_prefix_and_name() {
        assert_eq!(infer("root", "Company"), NodeCategory::Root);
        assert_eq!(infer("n1", "Group EBITDA"), NodeCategory::Root);
        assert_eq!(infer("revenue", "Revenue"), NodeCategory::Revenue);
        assert_eq!(infer("prod-volume", "Volume"), NodeCategory::Production);
        assert_eq!(infer("x", "Planned Maintenance"), NodeCategory::Maintenance);
        assert_eq!(infer("esg-board", "Board"), NodeCategory::Esg);
        assert_eq!(infer("equip-oee", "OEE"), NodeCategory::Equipment);
        assert_eq!(infer("ops-efficiency", "Efficiency"), NodeCategory::Operational);
    }

    #[test]
    fn falls_back_to_metric() {
        assert_eq!(infer("n1", "Customer Satisfaction"), NodeCategory::Metric);
    }

    #[test]
    fn rule_order_decides_overlapping_matches() {
        // "ebitda" is checked before "cost".
        assert_eq!(infer("ebitda-cost-bridge", "Bridge"), NodeCategory::Root);
        // "cost" is checked before "production".
        assert_eq!(infer("n1", "Production Cost"), NodeCategory::Cost);
        // "capex" is checked before "maintenance".
        assert_eq!(infer("capex-maintenance", "Sustaining"), NodeCategory::Capex);
    }

    #[test]
    fn root_has_no_legal_parent() {
        for parent in NodeCategory::ALL {
            assert!(!is_legal_parent(NodeCategory::Root, parent));
        }
    }

    #[test]
    fn metric_nests_under_everything() {
        for parent in NodeCategory::ALL {
            assert!(is_legal_parent(NodeCategory::Metric, parent), "{parent}");
        }
    }

    #[test]
    fn production_belongs_under_revenue_not_cost() {
        assert!(is_legal_parent(NodeCategory::Production, NodeCategory::Revenue));
        assert!(!is_legal_parent(NodeCategory::Production, NodeCategory::Cost));
    }

    #[test]
    fn category_parse_round_trips_names() {
        for category in NodeCategory::ALL {
            assert_eq!(NodeCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(NodeCategory::parse("FCF"), Some(NodeCategory::Fcf));
        assert_eq!(NodeCategory::parse("nope"), None);
    }
}
