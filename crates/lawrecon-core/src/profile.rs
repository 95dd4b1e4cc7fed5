//! Legislation-type field profiles.
//!
//! Each legislation type (bylaw, law, instruction, agreement) names its
//! columns differently in the two sources. A [`LegislationTypeProfile`] maps
//! every canonical field to the native column name on each side, and the
//! [`FieldMapper`] selects a profile by type key.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::record::Side;

/// Type key of the profile used when a requested type is unknown.
pub const DEFAULT_TYPE: &str = "bylaw";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("unknown legislation type: {0}")]
    UnknownType(String),

    #[error("profile '{profile}' has no {side} column for required field '{field}'")]
    MissingRequired {
        profile: String,
        field: CanonicalField,
        side: Side,
    },
}

// ── Canonical fields ──

/// Fields compared across both sources, independent of native column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Name,
    Number,
    Year,
    ReplacedFor,
    MagazineDate,
    ActiveDate,
    Status,
    CanceledBy,
    EndDate,
    ReplacedBy,
}

/// Fields shown for every pair, in display order.
pub const ALWAYS_SHOWN: &[CanonicalField] = &[
    CanonicalField::Name,
    CanonicalField::Number,
    CanonicalField::Year,
    CanonicalField::ReplacedFor,
    CanonicalField::MagazineDate,
    CanonicalField::ActiveDate,
    CanonicalField::Status,
];

/// Fields shown only when source A's status is inactive, in display order.
pub const CONDITIONAL: &[CanonicalField] = &[
    CanonicalField::CanceledBy,
    CanonicalField::EndDate,
    CanonicalField::ReplacedBy,
];

/// Fields every profile must map on both sides.
pub const REQUIRED: &[CanonicalField] = &[
    CanonicalField::Name,
    CanonicalField::Number,
    CanonicalField::Status,
];

impl CanonicalField {
    /// Reviewer-facing label.
    pub fn label(self) -> &'static str {
        match self {
            CanonicalField::Name => "اسم التشريع",
            CanonicalField::Number => "رقم التشريع",
            CanonicalField::Year => "السنة",
            CanonicalField::ReplacedFor => "يحل محل",
            CanonicalField::MagazineDate => "تاريخ الجريدة",
            CanonicalField::ActiveDate => "تاريخ السريان",
            CanonicalField::Status => "الحالة",
            CanonicalField::CanceledBy => "ألغي بواسطة",
            CanonicalField::EndDate => "تاريخ الانتهاء",
            CanonicalField::ReplacedBy => "تم استبداله بواسطة",
        }
    }

    /// Inverse of [`key`](Self::key).
    pub fn from_key(key: &str) -> Option<Self> {
        ALWAYS_SHOWN
            .iter()
            .chain(CONDITIONAL)
            .copied()
            .find(|f| f.key() == key)
    }

    pub fn key(self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Number => "number",
            CanonicalField::Year => "year",
            CanonicalField::ReplacedFor => "replacedFor",
            CanonicalField::MagazineDate => "magazineDate",
            CanonicalField::ActiveDate => "activeDate",
            CanonicalField::Status => "status",
            CanonicalField::CanceledBy => "canceledBy",
            CanonicalField::EndDate => "endDate",
            CanonicalField::ReplacedBy => "replacedBy",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ── Profiles ──

/// Native column names of one canonical field on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<String>,
}

impl ColumnPair {
    pub fn new(a: &str, b: &str) -> Self {
        Self {
            a: Some(a.to_string()),
            b: Some(b.to_string()),
        }
    }

    pub fn side(&self, side: Side) -> Option<&str> {
        match side {
            Side::A => self.a.as_deref(),
            Side::B => self.b.as_deref(),
        }
    }
}

/// Column mapping for one legislation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegislationTypeProfile {
    /// Type key, e.g. `"law"`.
    pub key: String,
    /// Alternative keys accepted by [`FieldMapper::resolve`].
    #[serde(default)]
    pub aliases: Vec<String>,
    pub columns: IndexMap<CanonicalField, ColumnPair>,
}

impl LegislationTypeProfile {
    /// Native column for `field` on `side`, if mapped.
    pub fn column(&self, field: CanonicalField, side: Side) -> Option<&str> {
        self.columns.get(&field).and_then(|pair| pair.side(side))
    }

    /// Check that every required field is mapped on both sides.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for &field in REQUIRED {
            for side in [Side::A, Side::B] {
                if self.column(field, side).is_none_or(str::is_empty) {
                    return Err(ProfileError::MissingRequired {
                        profile: self.key.clone(),
                        field,
                        side,
                    });
                }
            }
        }
        Ok(())
    }

    /// Required native columns for `side` that are absent from `header`.
    pub fn missing_required_columns<'a>(
        &'a self,
        side: Side,
        header: &[&str],
    ) -> Vec<&'a str> {
        REQUIRED
            .iter()
            .filter_map(|&field| self.column(field, side))
            .filter(|col| !header.contains(col))
            .collect()
    }

    fn matches(&self, key: &str) -> bool {
        self.key == key || self.aliases.iter().any(|a| a == key)
    }

    /// Built-in profile sharing source A's column layout, with source B's
    /// name and number columns specific to the type.
    fn builtin(key: &str, alias: &str, b_name: &str, b_number: &str) -> Self {
        let columns = IndexMap::from([
            (CanonicalField::Name, ColumnPair::new("LegName", b_name)),
            (CanonicalField::Number, ColumnPair::new("LegNumber", b_number)),
            (CanonicalField::Year, ColumnPair::new("Year", "Year")),
            (
                CanonicalField::ReplacedFor,
                ColumnPair::new("Replaced For", "Replaced_For"),
            ),
            (
                CanonicalField::MagazineDate,
                ColumnPair::new("Magazine_Date", "Magazine_Date"),
            ),
            (
                CanonicalField::ActiveDate,
                ColumnPair::new("ActiveDate", "Active_Date"),
            ),
            (CanonicalField::Status, ColumnPair::new("Status", "Status")),
            (
                CanonicalField::CanceledBy,
                ColumnPair::new("Canceled By", "Canceled_By"),
            ),
            (CanonicalField::EndDate, ColumnPair::new("EndDate", "EndDate")),
            (
                CanonicalField::ReplacedBy,
                ColumnPair::new("Replaced By", "Replaced_By"),
            ),
        ]);
        Self {
            key: key.to_string(),
            aliases: vec![alias.to_string()],
            columns,
        }
    }
}

// ── FieldMapper ──

/// Lookup table from legislation type key to profile.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    profiles: Vec<LegislationTypeProfile>,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FieldMapper {
    /// The four legislation types of the reconciled datasets.
    pub fn builtin() -> Self {
        Self {
            profiles: vec![
                LegislationTypeProfile::builtin("bylaw", "نظام", "ByLawName", "ByLawNumber"),
                LegislationTypeProfile::builtin("law", "قانون", "Law_Name", "Law_Number"),
                LegislationTypeProfile::builtin(
                    "instruction",
                    "تعليمات",
                    "Instruction_Name",
                    "Instruction_Number",
                ),
                LegislationTypeProfile::builtin(
                    "agreement",
                    "اتفاقيات",
                    "Agreement_Name",
                    "Agreement_Number",
                ),
            ],
        }
    }

    /// Add a profile, replacing any existing profile with the same key.
    pub fn insert(&mut self, profile: LegislationTypeProfile) -> Result<(), ProfileError> {
        profile.validate()?;
        match self.profiles.iter_mut().find(|p| p.key == profile.key) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        Ok(())
    }

    pub fn resolve(&self, kind: &str) -> Result<&LegislationTypeProfile, ProfileError> {
        let kind = kind.trim();
        self.profiles
            .iter()
            .find(|p| p.matches(kind))
            .ok_or_else(|| ProfileError::UnknownType(kind.to_string()))
    }

    /// Resolve `kind`, falling back to the default profile when unknown.
    pub fn resolve_or_default(&self, kind: &str) -> &LegislationTypeProfile {
        match self.resolve(kind) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, fallback = DEFAULT_TYPE, "using default profile");
                self.default_profile()
            }
        }
    }

    /// The bylaw profile, or the first registered one if it was removed.
    pub fn default_profile(&self) -> &LegislationTypeProfile {
        self.profiles
            .iter()
            .find(|p| p.key == DEFAULT_TYPE)
            .unwrap_or(&self.profiles[0])
    }

    pub fn profiles(&self) -> &[LegislationTypeProfile] {
        &self.profiles
    }
}
