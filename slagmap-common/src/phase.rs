//! Phase-region classification for reduced CaO–SiO₂–Al₂O₃ compositions
//!
//! Classification is a fixed empirical rule table, not a computed phase
//! equilibrium. Rules are evaluated in order and the first match wins. All
//! comparisons are strict: a composition sitting exactly on a threshold
//! (e.g. CaO = 60) falls through to later rules.

use crate::reducer::NormalizedComposition;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Named phase region assigned by [`PHASE_RULES`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseLabel {
    /// Tricalcium silicate (alite)
    C3S,
    /// Dicalcium silicate (belite)
    C2S,
    /// Tricalcium aluminate
    C3A,
    /// Calcium aluminates CA / CA₂
    #[serde(rename = "CA_CA2")]
    CaCa2,
    SilicaRich,
    /// Fallback when no other rule matches
    Mixed,
}

impl PhaseLabel {
    /// Stable code used in serialized data
    pub fn code(&self) -> &'static str {
        match self {
            PhaseLabel::C3S => "C3S",
            PhaseLabel::C2S => "C2S",
            PhaseLabel::C3A => "C3A",
            PhaseLabel::CaCa2 => "CA_CA2",
            PhaseLabel::SilicaRich => "SilicaRich",
            PhaseLabel::Mixed => "Mixed",
        }
    }

    /// Human-readable description of the region
    pub fn description(&self) -> &'static str {
        match self {
            PhaseLabel::C3S => "tricalcium silicate — high early strength",
            PhaseLabel::C2S => "dicalcium silicate — long-term strength",
            PhaseLabel::C3A => "tricalcium aluminate — fast-setting, durability risk",
            PhaseLabel::CaCa2 => "calcium aluminate — refractory, high-temperature stable",
            PhaseLabel::SilicaRich => "high fluidity, reduced hardening",
            PhaseLabel::Mixed => "intermediate / multi-phase",
        }
    }

    /// Parse a phase code (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "c3s" => Some(PhaseLabel::C3S),
            "c2s" => Some(PhaseLabel::C2S),
            "c3a" => Some(PhaseLabel::C3A),
            "ca_ca2" | "ca-ca2" | "caca2" => Some(PhaseLabel::CaCa2),
            "silicarich" | "silica_rich" => Some(PhaseLabel::SilicaRich),
            "mixed" => Some(PhaseLabel::Mixed),
            _ => None,
        }
    }

    /// Condition of the rule assigning this label; `None` for the `Mixed` fallback
    pub fn condition(&self) -> Option<&'static str> {
        PHASE_RULES
            .iter()
            .find(|rule| rule.label == *self)
            .map(|rule| rule.condition)
    }

    pub fn all_variants() -> &'static [PhaseLabel] {
        &[
            PhaseLabel::C3S,
            PhaseLabel::C2S,
            PhaseLabel::C3A,
            PhaseLabel::CaCa2,
            PhaseLabel::SilicaRich,
            PhaseLabel::Mixed,
        ]
    }
}

impl std::fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One entry of the ordered classification table
pub struct PhaseRule {
    pub label: PhaseLabel,
    /// Human-readable form of `predicate`, for diagnostics
    pub condition: &'static str,
    pub predicate: fn(&NormalizedComposition) -> bool,
}

/// Classification rules in evaluation order; the first match wins.
///
/// Order is the tie-break between overlapping regions (a composition with
/// CaO > 60, SiO2 > 30 and Al2O3 < 10 meets both the C3S and C2S conditions
/// and is C3S). `Mixed` is not listed; it is the fallback when nothing matches.
pub static PHASE_RULES: &[PhaseRule] = &[
    PhaseRule {
        label: PhaseLabel::C3S,
        condition: "CaO > 60 and Al2O3 < 10",
        predicate: |n| n.cao > 60.0 && n.al2o3 < 10.0,
    },
    PhaseRule {
        label: PhaseLabel::C2S,
        condition: "CaO > 45 and SiO2 > 30 and Al2O3 < 15",
        predicate: |n| n.cao > 45.0 && n.sio2 > 30.0 && n.al2o3 < 15.0,
    },
    PhaseRule {
        label: PhaseLabel::C3A,
        condition: "Al2O3 > 30 and CaO > 40",
        predicate: |n| n.al2o3 > 30.0 && n.cao > 40.0,
    },
    PhaseRule {
        label: PhaseLabel::CaCa2,
        condition: "Al2O3 > 30 and CaO < 30",
        predicate: |n| n.al2o3 > 30.0 && n.cao < 30.0,
    },
    PhaseRule {
        label: PhaseLabel::SilicaRich,
        condition: "SiO2 > 60",
        predicate: |n| n.sio2 > 60.0,
    },
];

/// Classify a normalized composition against [`PHASE_RULES`]
pub fn classify_phase(norm: &NormalizedComposition) -> PhaseLabel {
    match PHASE_RULES.iter().find(|rule| (rule.predicate)(norm)) {
        Some(rule) => {
            trace!("Phase rule matched: {} ({})", rule.label, rule.condition);
            rule.label
        }
        None => PhaseLabel::Mixed,
    }
}

/// Coarse grouping of the C/S ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CsCategory {
    /// ratio > 2.5
    CalciumSilicateRich,
    /// 1.5 ≤ ratio ≤ 2.5
    Balanced,
    /// ratio < 1.5
    SilicaRich,
}

impl CsCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            CsCategory::CalciumSilicateRich => "calcium-silicate rich",
            CsCategory::Balanced => "balanced",
            CsCategory::SilicaRich => "silica rich",
        }
    }
}

impl std::fmt::Display for CsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Categorize a defined C/S ratio
///
/// An undefined ratio has no category; see
/// [`DerivedMetrics::cs_category`](crate::reducer::DerivedMetrics::cs_category).
pub fn cs_category(ratio: f64) -> CsCategory {
    if ratio > 2.5 {
        CsCategory::CalciumSilicateRich
    } else if ratio < 1.5 {
        CsCategory::SilicaRich
    } else {
        CsCategory::Balanced
    }
}
