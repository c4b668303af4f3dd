//! Raw oxide compositions
//!
//! A raw composition records amounts of each oxide in arbitrary units (parts,
//! not necessarily wt%). Only the principal oxides (CaO, SiO₂, Al₂O₃) take part
//! in reduction; MgO, Fe₂O₃ and TiO₂ are carried along untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Oxides a slag composition can record
///
/// Variant names double as the serialized symbols (`"CaO"`, `"SiO2"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Oxide {
    CaO,
    SiO2,
    Al2O3,
    MgO,
    Fe2O3,
    TiO2,
}

impl Oxide {
    /// The three oxides that participate in normalization, in canonical order
    pub const PRINCIPAL: [Oxide; 3] = [Oxide::CaO, Oxide::SiO2, Oxide::Al2O3];

    /// Plain ASCII symbol, as used in storage and on the command line
    pub fn symbol(&self) -> &'static str {
        match self {
            Oxide::CaO => "CaO",
            Oxide::SiO2 => "SiO2",
            Oxide::Al2O3 => "Al2O3",
            Oxide::MgO => "MgO",
            Oxide::Fe2O3 => "Fe2O3",
            Oxide::TiO2 => "TiO2",
        }
    }

    /// Chemical notation with subscripts, for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Oxide::CaO => "CaO",
            Oxide::SiO2 => "SiO₂",
            Oxide::Al2O3 => "Al₂O₃",
            Oxide::MgO => "MgO",
            Oxide::Fe2O3 => "Fe₂O₃",
            Oxide::TiO2 => "TiO₂",
        }
    }

    pub fn is_principal(&self) -> bool {
        matches!(self, Oxide::CaO | Oxide::SiO2 | Oxide::Al2O3)
    }

    /// Parse an oxide symbol (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cao" => Some(Oxide::CaO),
            "sio2" => Some(Oxide::SiO2),
            "al2o3" => Some(Oxide::Al2O3),
            "mgo" => Some(Oxide::MgO),
            "fe2o3" => Some(Oxide::Fe2O3),
            "tio2" => Some(Oxide::TiO2),
            _ => None,
        }
    }

    /// All oxides in canonical order (principal oxides first)
    pub fn all_variants() -> &'static [Oxide] {
        &[
            Oxide::CaO,
            Oxide::SiO2,
            Oxide::Al2O3,
            Oxide::MgO,
            Oxide::Fe2O3,
            Oxide::TiO2,
        ]
    }
}

impl std::fmt::Display for Oxide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Coerce an amount to a usable non-negative value
///
/// Non-finite and negative amounts become 0. This is the only place the
/// coercion happens; every path into [`RawComposition`] goes through it.
fn coerce_amount(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

/// Oxide amounts as entered by the user
///
/// Absent oxides read as 0. Serialized as a map keyed by oxide symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Oxide, f64>", into = "BTreeMap<Oxide, f64>")]
pub struct RawComposition {
    amounts: BTreeMap<Oxide, f64>,
}

impl RawComposition {
    /// Empty composition (every oxide reads as 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Composition with only the three principal oxides set
    pub fn principal(cao: f64, sio2: f64, al2o3: f64) -> Self {
        Self::new()
            .with(Oxide::CaO, cao)
            .with(Oxide::SiO2, sio2)
            .with(Oxide::Al2O3, al2o3)
    }

    /// Default sample shown when nothing has been entered yet
    pub fn reference_sample() -> Self {
        Self::principal(42.0, 32.0, 10.0)
            .with(Oxide::MgO, 8.0)
            .with(Oxide::Fe2O3, 5.0)
            .with(Oxide::TiO2, 3.0)
    }

    /// Builder-style setter
    pub fn with(mut self, oxide: Oxide, amount: f64) -> Self {
        self.set(oxide, amount);
        self
    }

    pub fn set(&mut self, oxide: Oxide, amount: f64) {
        self.amounts.insert(oxide, coerce_amount(amount));
    }

    /// Amount recorded for `oxide`, 0 when absent
    pub fn get(&self, oxide: Oxide) -> f64 {
        self.amounts.get(&oxide).copied().unwrap_or(0.0)
    }

    /// Whether an amount was recorded for `oxide` (even if it is 0)
    pub fn contains(&self, oxide: Oxide) -> bool {
        self.amounts.contains_key(&oxide)
    }

    /// Sum of CaO, SiO2 and Al2O3
    pub fn principal_total(&self) -> f64 {
        Oxide::PRINCIPAL.iter().map(|o| self.get(*o)).sum()
    }

    /// Recorded amounts in canonical oxide order
    pub fn iter(&self) -> impl Iterator<Item = (Oxide, f64)> + '_ {
        self.amounts.iter().map(|(oxide, amount)| (*oxide, *amount))
    }
}

impl From<BTreeMap<Oxide, f64>> for RawComposition {
    fn from(map: BTreeMap<Oxide, f64>) -> Self {
        map.into_iter()
            .fold(Self::new(), |raw, (oxide, amount)| raw.with(oxide, amount))
    }
}

impl From<RawComposition> for BTreeMap<Oxide, f64> {
    fn from(raw: RawComposition) -> Self {
        raw.amounts
    }
}

impl FromIterator<(Oxide, f64)> for RawComposition {
    fn from_iter<I: IntoIterator<Item = (Oxide, f64)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |raw, (oxide, amount)| raw.with(oxide, amount))
    }
}
