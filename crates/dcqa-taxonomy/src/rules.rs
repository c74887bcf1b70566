//! Cleaning rules loaded from `rules/validation_rules.toml`.
//!
//! Every section is optional. Absent keys fall back to the defaults below,
//! and absent mapping sections mean the corresponding join does nothing.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use dcqa_map::KeyMatch;
use dcqa_transform::ProrationLayout;

use crate::error::{Result, TaxonomyError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub defaults: Defaults,
    pub temporary_fills: TemporaryFills,
    pub allowed_objectives: Vec<String>,
    pub date_placeholders: DatePlaceholders,
    pub region_check: RegionCheck,
    pub actualisation_backfill: ActualisationBackfill,
    pub brand_mapping: BrandMapping,
    pub campaign_mapping: MappingRules,
    pub channel_rules: ChannelRules,
    pub fx_rules: FxRules,
    pub cbht_rules: CbhtRules,
    pub vendor_rules: VendorRules,
    pub proration: ProrationRules,
}

impl RulesConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| TaxonomyError::io(path, e))?;
        let rules = Self::from_toml(&text).map_err(|source| TaxonomyError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded rules");
        Ok(rules)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Values written into blank plan fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    #[serde(rename = "Plan Status")]
    pub plan_status: String,
    #[serde(rename = "Buying Model")]
    pub buying_model: String,
    #[serde(rename = "Innovation")]
    pub innovation: String,
    #[serde(rename = "Inventory Buy")]
    pub inventory_buy: String,
    #[serde(rename = "Creative Source")]
    pub creative_source: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            plan_status: "Planned".to_string(),
            buying_model: "Fixed Cost".to_string(),
            innovation: "No".to_string(),
            inventory_buy: "No".to_string(),
            creative_source: "Locally Produced Asset".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporaryFills {
    #[serde(rename = "Objective")]
    pub objective: String,
}

impl Default for TemporaryFills {
    fn default() -> Self {
        Self {
            objective: "Awareness".to_string(),
        }
    }
}

/// Date templates; `{FX_Year}` is replaced with the row's fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatePlaceholders {
    pub start_if_missing: Option<String>,
    pub end_if_missing: Option<String>,
}

impl DatePlaceholders {
    pub fn render(template: &str, fx_year: i32) -> String {
        template.replace("{FX_Year}", &fx_year.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionCheck {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActualisationBackfill {
    pub enabled: bool,
    pub age_days_threshold: i64,
    pub local: Option<BackfillScope>,
    pub global: Option<BackfillScope>,
}

impl Default for ActualisationBackfill {
    fn default() -> Self {
        Self {
            enabled: true,
            age_days_threshold: 30,
            local: None,
            global: None,
        }
    }
}

impl ActualisationBackfill {
    pub fn scopes(&self) -> impl Iterator<Item = &BackfillScope> {
        self.local.iter().chain(self.global.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillScope {
    pub actual_col: String,
    pub planned_col: String,
    #[serde(default = "default_qa_flag")]
    pub qa_flag: String,
}

fn default_qa_flag() -> String {
    "missing_actualisation".to_string()
}

/// Ordered key-sets plus `reference column -> record field` outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingRules {
    pub precedence: Vec<Vec<String>>,
    pub outputs: BTreeMap<String, String>,
    /// `exact` (trimmed), `case_insensitive` or `normalized`.
    pub key_match: KeyMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandMapping {
    pub precedence: Vec<Vec<String>>,
    pub outputs: BTreeMap<String, String>,
    pub key_match: KeyMatch,
    pub conflict_hints: ConflictHints,
    pub two_pass: TwoPass,
}

/// `brand -> regex` hints checked against the plan name, in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictHints {
    pub brand_regex: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoPass {
    pub enabled: bool,
}

impl Default for TwoPass {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelRules {
    pub prefer_key: String,
    /// Overrides the `[[prefer_key], [other key]]` order when set.
    pub precedence: Option<Vec<Vec<String>>>,
}

impl Default for ChannelRules {
    fn default() -> Self {
        Self {
            prefer_key: "Sub-Channel".to_string(),
            precedence: None,
        }
    }
}

impl ChannelRules {
    pub fn key_sets(&self) -> Vec<Vec<String>> {
        if let Some(precedence) = &self.precedence {
            return precedence.clone();
        }
        let other = if self.prefer_key == "Channel" {
            "Sub-Channel"
        } else {
            "Channel"
        };
        vec![vec![self.prefer_key.clone()], vec![other.to_string()]]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorRules {
    pub placeholder: String,
}

impl Default for VendorRules {
    fn default() -> Self {
        Self {
            placeholder: "_Placeholder".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxRules {
    /// Target currency (`EUR`, `DKK`) to `[local column, output column]` pairs.
    pub compute_pairs: BTreeMap<String, Vec<(String, String)>>,
    pub audit_global_vs_eur: FxAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxAudit {
    pub enabled: bool,
    pub tolerance_ratio: f64,
    /// `[reported column, computed column]` pairs.
    pub checks: Vec<(String, String)>,
}

impl Default for FxAudit {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance_ratio: 0.02,
            checks: [
                ("Total Cost to Client (Global)", "Planned_Spend_EUR"),
                ("Total Cost to Client Actual (Global)", "Actualised_Spend_EUR"),
                ("Net Media Cost (Global)", "Net_Media_EUR"),
            ]
            .map(|(reported, computed)| (reported.to_string(), computed.to_string()))
            .to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CbhtRules {
    pub join_keys_order: Vec<Vec<String>>,
}

impl Default for CbhtRules {
    fn default() -> Self {
        let keys = |names: &[&str]| names.iter().map(|name| (*name).to_string()).collect();
        Self {
            join_keys_order: vec![
                keys(&["Brand_clean", "Market", "FX_Year"]),
                keys(&["Brand_clean", "Market"]),
                keys(&["Brand_clean"]),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProrationRules {
    pub budgets: ProrationLayout,
    pub plans: ProrationLayout,
}

impl Default for ProrationRules {
    fn default() -> Self {
        Self {
            budgets: ProrationLayout::budgets(),
            plans: ProrationLayout::plans(),
        }
    }
}
