//! Exception events raised by pipeline stages.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ModelError;
use crate::record::Record;

/// Review priority. `P1` blocks reporting, `P3` is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Priority {
    P1,
    P2,
    P3,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            _ => Err(ModelError::UnknownPriority(s.to_string())),
        }
    }
}

/// Team expected to resolve an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Owner {
    Analytics,
    Partnerships,
    Insights,
    OffshoreOps,
}

impl Owner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analytics => "Analytics",
            Self::Partnerships => "Partnerships",
            Self::Insights => "Insights",
            Self::OffshoreOps => "Offshore Ops",
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Owner {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Analytics" => Ok(Self::Analytics),
            "Partnerships" => Ok(Self::Partnerships),
            "Insights" => Ok(Self::Insights),
            "Offshore Ops" => Ok(Self::OffshoreOps),
            _ => Err(ModelError::UnknownOwner(s.to_string())),
        }
    }
}

impl Serialize for Owner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Issue codes written to the `Issue_Type` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssueType {
    StatusDefaulted,
    RowDroppedCancelled,
    RowDroppedEmpty,
    DatePlaceholderApplied,
    /// `<field>_defaulted`, holding the snake-cased field name.
    Defaulted(String),
    ObjectiveNormalised,
    RegionMismatch,
    MarketUnknown,
    BrandUnmapped,
    BrandConflict,
    BrandConflictWithPlanName,
    BrandInferredFromTitle,
    BrandOkNoTitleSignal,
    VendorUnmapped,
    ChannelUnmapped,
    CampaignUnmapped,
    /// Configured flag name, e.g. the actualisation backfill flag.
    Flagged(String),
    FxMissing,
    EurMismatch,
    CbhtMissing,
    ProrationDatesMissing,
    ProrationRangeInverted,
}

impl IssueType {
    pub fn defaulted(field: &str) -> Self {
        Self::Defaulted(field.replace(' ', "_").to_lowercase())
    }

    pub fn code(&self) -> Cow<'_, str> {
        let code = match self {
            Self::StatusDefaulted => "status_defaulted",
            Self::RowDroppedCancelled => "row_dropped_cancelled",
            Self::RowDroppedEmpty => "row_dropped_empty",
            Self::DatePlaceholderApplied => "date_placeholder_applied",
            Self::Defaulted(field) => return Cow::Owned(format!("{field}_defaulted")),
            Self::ObjectiveNormalised => "objective_normalised",
            Self::RegionMismatch => "region_mismatch",
            Self::MarketUnknown => "market_unknown",
            Self::BrandUnmapped => "brand_unmapped",
            Self::BrandConflict => "brand_conflict",
            Self::BrandConflictWithPlanName => "brand_conflict_with_plan_name",
            Self::BrandInferredFromTitle => "brand_inferred_from_title",
            Self::BrandOkNoTitleSignal => "brand_ok_no_title_signal",
            Self::VendorUnmapped => "vendor_unmapped",
            Self::ChannelUnmapped => "channel_unmapped",
            Self::CampaignUnmapped => "campaign_unmapped",
            Self::Flagged(flag) => return Cow::Borrowed(flag.as_str()),
            Self::FxMissing => "fx_missing",
            Self::EurMismatch => "eur_mismatch",
            Self::CbhtMissing => "cbht_missing",
            Self::ProrationDatesMissing => "proration_dates_missing",
            Self::ProrationRangeInverted => "proration_range_inverted",
        };
        Cow::Borrowed(code)
    }

    pub fn default_priority(&self) -> Priority {
        match self {
            Self::BrandUnmapped | Self::FxMissing => Priority::P1,
            Self::BrandConflict
            | Self::BrandConflictWithPlanName
            | Self::BrandInferredFromTitle
            | Self::VendorUnmapped
            | Self::Flagged(_)
            | Self::CbhtMissing
            | Self::ProrationDatesMissing => Priority::P2,
            _ => Priority::P3,
        }
    }

    pub fn default_owner(&self) -> Owner {
        match self {
            Self::StatusDefaulted => Owner::OffshoreOps,
            Self::VendorUnmapped => Owner::Partnerships,
            Self::CbhtMissing => Owner::Insights,
            _ => Owner::Analytics,
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for IssueType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        let issue = match code {
            "status_defaulted" => Self::StatusDefaulted,
            "row_dropped_cancelled" => Self::RowDroppedCancelled,
            "row_dropped_empty" => Self::RowDroppedEmpty,
            "date_placeholder_applied" => Self::DatePlaceholderApplied,
            "objective_normalised" => Self::ObjectiveNormalised,
            "region_mismatch" => Self::RegionMismatch,
            "market_unknown" => Self::MarketUnknown,
            "brand_unmapped" => Self::BrandUnmapped,
            "brand_conflict" => Self::BrandConflict,
            "brand_conflict_with_plan_name" => Self::BrandConflictWithPlanName,
            "brand_inferred_from_title" => Self::BrandInferredFromTitle,
            "brand_ok_no_title_signal" => Self::BrandOkNoTitleSignal,
            "vendor_unmapped" => Self::VendorUnmapped,
            "channel_unmapped" => Self::ChannelUnmapped,
            "campaign_unmapped" => Self::CampaignUnmapped,
            "fx_missing" => Self::FxMissing,
            "eur_mismatch" => Self::EurMismatch,
            "cbht_missing" => Self::CbhtMissing,
            "proration_dates_missing" => Self::ProrationDatesMissing,
            "proration_range_inverted" => Self::ProrationRangeInverted,
            "" => return Err(ModelError::Message("empty issue type".to_string())),
            other => match other.strip_suffix("_defaulted") {
                Some(field) => Self::Defaulted(field.to_string()),
                None => Self::Flagged(other.to_string()),
            },
        };
        Ok(issue)
    }
}

impl Serialize for IssueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

/// Column order of the exception artifact.
pub const EXCEPTION_COLUMNS: [&str; 12] = [
    "Market",
    "Region",
    "FX_Year",
    "Plan_ID",
    "Plan_Name",
    "Field",
    "Issue_Type",
    "Current_Value",
    "Suggested_Value",
    "Priority",
    "Owner",
    "Notes",
];

/// One detected anomaly or correction. Immutable once appended to a ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionEvent {
    #[serde(rename = "Market")]
    pub market: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "FX_Year")]
    pub fx_year: String,
    #[serde(rename = "Plan_ID")]
    pub plan_id: String,
    #[serde(rename = "Plan_Name")]
    pub plan_name: String,
    #[serde(rename = "Field")]
    pub field: String,
    #[serde(rename = "Issue_Type")]
    pub issue_type: IssueType,
    #[serde(rename = "Current_Value")]
    pub current_value: String,
    #[serde(rename = "Suggested_Value")]
    pub suggested_value: String,
    #[serde(rename = "Priority")]
    pub priority: Priority,
    #[serde(rename = "Owner")]
    pub owner: Owner,
    #[serde(rename = "Notes")]
    pub notes: String,
    /// Additional named columns such as `Days_Since_End`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl ExceptionEvent {
    /// Event with no record context, using the issue's default routing.
    pub fn new(field: impl Into<String>, issue_type: IssueType) -> Self {
        Self {
            market: String::new(),
            region: String::new(),
            fx_year: String::new(),
            plan_id: String::new(),
            plan_name: String::new(),
            field: field.into(),
            priority: issue_type.default_priority(),
            owner: issue_type.default_owner(),
            issue_type,
            current_value: String::new(),
            suggested_value: String::new(),
            notes: String::new(),
            extra: Vec::new(),
        }
    }

    /// Event carrying the market, region, year and plan context of `record`.
    pub fn for_record(record: &Record, field: impl Into<String>, issue_type: IssueType) -> Self {
        Self {
            market: record.text("Market"),
            region: record.text("Region"),
            fx_year: record.text("FX_Year"),
            plan_id: record.text("Plan ID"),
            plan_name: record.text("Plan Name"),
            ..Self::new(field, issue_type)
        }
    }

    #[must_use]
    pub fn with_current(mut self, value: impl Into<String>) -> Self {
        self.current_value = value.into();
        self
    }

    #[must_use]
    pub fn with_suggested(mut self, value: impl Into<String>) -> Self {
        self.suggested_value = value.into();
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    #[must_use]
    pub fn with_extra(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((column.into(), value.into()));
        self
    }

    /// Value of a named column, including extra columns.
    pub fn column(&self, name: &str) -> Cow<'_, str> {
        match name {
            "Market" => Cow::Borrowed(&self.market),
            "Region" => Cow::Borrowed(&self.region),
            "FX_Year" => Cow::Borrowed(&self.fx_year),
            "Plan_ID" => Cow::Borrowed(&self.plan_id),
            "Plan_Name" => Cow::Borrowed(&self.plan_name),
            "Field" => Cow::Borrowed(&self.field),
            "Issue_Type" => self.issue_type.code(),
            "Current_Value" => Cow::Borrowed(&self.current_value),
            "Suggested_Value" => Cow::Borrowed(&self.suggested_value),
            "Priority" => Cow::Borrowed(self.priority.as_str()),
            "Owner" => Cow::Borrowed(self.owner.as_str()),
            "Notes" => Cow::Borrowed(&self.notes),
            other => self
                .extra
                .iter()
                .find(|(column, _)| column == other)
                .map_or(Cow::Borrowed(""), |(_, value)| Cow::Borrowed(value.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_codes_round_trip_through_from_str() {
        for issue in [
            IssueType::BrandConflict,
            IssueType::defaulted("Buying Model"),
            IssueType::Flagged("missing_actualisation".to_string()),
            IssueType::FxMissing,
        ] {
            let parsed: IssueType = issue.code().parse().unwrap();
            assert_eq!(parsed, issue);
        }
        assert_eq!(
            IssueType::defaulted("Buying Model").code(),
            "buying_model_defaulted"
        );
    }

    #[test]
    fn default_routing() {
        let event = ExceptionEvent::new("Vendor", IssueType::VendorUnmapped);
        assert_eq!(event.priority, Priority::P2);
        assert_eq!(event.owner, Owner::Partnerships);
        let event = ExceptionEvent::new("FX", IssueType::FxMissing);
        assert_eq!(event.priority, Priority::P1);
    }

    #[test]
    fn for_record_copies_context() {
        let record = Record::new(0)
            .with("Market", "DK")
            .with("Plan ID", "P-1")
            .with("FX_Year", 2024.0);
        let event = ExceptionEvent::for_record(&record, "Brand", IssueType::BrandUnmapped)
            .with_current("acme")
            .with_extra("Days_Since_End", "40");
        assert_eq!(event.market, "DK");
        assert_eq!(event.plan_id, "P-1");
        assert_eq!(event.fx_year, "2024");
        assert_eq!(event.column("Days_Since_End"), "40");
        assert_eq!(event.column("Issue_Type"), "brand_unmapped");
    }

    #[test]
    fn serializes_with_artifact_column_names() {
        let event = ExceptionEvent::new("FX", IssueType::FxMissing).with_current("DK/DKK/2024");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["Issue_Type"], "fx_missing");
        assert_eq!(json["Owner"], "Analytics");
        assert_eq!(json["Current_Value"], "DK/DKK/2024");
        assert!(json.get("extra").is_none());
    }
}
