//! Form-field parsing
//!
//! Oxide amounts arrive as raw strings. Empty or unparsable fields become 0;
//! negative and non-finite values are left for `RawComposition` to coerce.

use clap::Args;
use slagmap_common::{Oxide, RawComposition};
use tracing::debug;

/// Parse one amount field; invalid or empty input reads as 0
pub fn parse_amount(field: &str) -> f64 {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            debug!("Unparsable amount '{}', using 0", field);
            0.0
        }
    }
}

/// Oxide amount fields, one flag per oxide
#[derive(Args, Debug, Clone, Default)]
pub struct OxideFields {
    /// CaO amount (parts)
    #[arg(long = "cao", value_name = "AMOUNT")]
    pub cao: Option<String>,

    /// SiO2 amount (parts)
    #[arg(long = "sio2", value_name = "AMOUNT")]
    pub sio2: Option<String>,

    /// Al2O3 amount (parts)
    #[arg(long = "al2o3", value_name = "AMOUNT")]
    pub al2o3: Option<String>,

    /// MgO amount (stored, not used for classification)
    #[arg(long = "mgo", value_name = "AMOUNT")]
    pub mgo: Option<String>,

    /// Fe2O3 amount (stored, not used for classification)
    #[arg(long = "fe2o3", value_name = "AMOUNT")]
    pub fe2o3: Option<String>,

    /// TiO2 amount (stored, not used for classification)
    #[arg(long = "tio2", value_name = "AMOUNT")]
    pub tio2: Option<String>,
}

impl OxideFields {
    fn fields(&self) -> [(Oxide, Option<&str>); 6] {
        [
            (Oxide::CaO, self.cao.as_deref()),
            (Oxide::SiO2, self.sio2.as_deref()),
            (Oxide::Al2O3, self.al2o3.as_deref()),
            (Oxide::MgO, self.mgo.as_deref()),
            (Oxide::Fe2O3, self.fe2o3.as_deref()),
            (Oxide::TiO2, self.tio2.as_deref()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, field)| field.is_none())
    }

    /// Parsed composition; principal oxides are always present (0 if omitted)
    pub fn to_composition(&self) -> RawComposition {
        self.fields()
            .into_iter()
            .filter(|(oxide, field)| oxide.is_principal() || field.is_some())
            .map(|(oxide, field)| (oxide, field.map(parse_amount).unwrap_or(0.0)))
            .collect()
    }
}
