//! Composition reducer
//!
//! Rescales the principal oxides of a [`RawComposition`] to percentages,
//! derives the C/S ratio and assigns a phase region. Every function here is
//! pure; [`reduce`] is the entry point collaborators should call.

use crate::composition::{Oxide, RawComposition};
use crate::phase::{classify_phase, cs_category, CsCategory, PhaseLabel};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// CaO / SiO2 / Al2O3 as percentages summing to 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedComposition {
    #[serde(rename = "CaO")]
    pub cao: f64,
    #[serde(rename = "SiO2")]
    pub sio2: f64,
    #[serde(rename = "Al2O3")]
    pub al2o3: f64,
}

impl NormalizedComposition {
    /// Percentage for a principal oxide; `None` for minor oxides
    pub fn get(&self, oxide: Oxide) -> Option<f64> {
        match oxide {
            Oxide::CaO => Some(self.cao),
            Oxide::SiO2 => Some(self.sio2),
            Oxide::Al2O3 => Some(self.al2o3),
            _ => None,
        }
    }

    pub fn total(&self) -> f64 {
        self.cao + self.sio2 + self.al2o3
    }
}

impl std::fmt::Display for NormalizedComposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CaO {:.1}% · SiO₂ {:.1}% · Al₂O₃ {:.1}%",
            self.cao, self.sio2, self.al2o3
        )
    }
}

/// Values derived from a normalized composition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// CaO / SiO2 on normalized values; `None` when SiO2 is 0
    pub cs_ratio: Option<f64>,
    pub phase: PhaseLabel,
}

impl DerivedMetrics {
    /// Compute the metrics for an already-normalized composition
    pub fn from_normalized(norm: &NormalizedComposition) -> Self {
        Self {
            cs_ratio: cs_ratio(norm),
            phase: classify_phase(norm),
        }
    }

    /// Category of the C/S ratio; `None` when the ratio is undefined
    pub fn cs_category(&self) -> Option<CsCategory> {
        self.cs_ratio.map(cs_category)
    }
}

/// Result of [`reduce`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reduction {
    pub normalized: NormalizedComposition,
    pub metrics: DerivedMetrics,
}

/// Rescale CaO, SiO2 and Al2O3 so they sum to 100
///
/// Amounts are first divided by the largest principal amount, so the sum
/// stays finite and precise for any finite input, from subnormal to
/// `f64::MAX`.
///
/// # Errors
/// [`Error::ZeroTotal`] when the three principal oxides sum to 0.
pub fn normalize(raw: &RawComposition) -> Result<NormalizedComposition> {
    let [cao, sio2, al2o3] = Oxide::PRINCIPAL.map(|oxide| raw.get(oxide));
    let largest = cao.max(sio2).max(al2o3);
    if largest <= 0.0 {
        return Err(Error::ZeroTotal);
    }

    // each scaled amount is in [0, 1], so the total is in [1, 3]
    let [cao, sio2, al2o3] = [cao, sio2, al2o3].map(|amount| amount / largest);
    let total = cao + sio2 + al2o3;

    Ok(NormalizedComposition {
        cao: cao / total * 100.0,
        sio2: sio2 / total * 100.0,
        al2o3: al2o3 / total * 100.0,
    })
}

/// CaO / SiO2 ratio, `None` when SiO2 is 0
pub fn cs_ratio(norm: &NormalizedComposition) -> Option<f64> {
    if norm.sio2 == 0.0 {
        None
    } else {
        Some(norm.cao / norm.sio2)
    }
}

/// Normalize, derive metrics and classify in one step
pub fn reduce(raw: &RawComposition) -> Result<Reduction> {
    let normalized = normalize(raw)?;
    let metrics = DerivedMetrics::from_normalized(&normalized);

    debug!(
        "Reduced composition to {} (C/S {:?}, phase {})",
        normalized, metrics.cs_ratio, metrics.phase
    );

    Ok(Reduction {
        normalized,
        metrics,
    })
}
