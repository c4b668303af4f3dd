//! Ternary plot data for external renderers
//!
//! The catalog never renders. It exposes visible records, which this module
//! turns into ternary points and a Plotly `scatterternary` figure.
//!
//! Axis convention (fixed, renderers must honor it):
//! - `a` = SiO₂
//! - `b` = CaO
//! - `c` = Al₂O₃

use crate::catalog::SlagRecord;
use crate::composition::Oxide;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Marker size used for every point
const MARKER_SIZE: u32 = 14;

/// Plot width and height in pixels
const FIGURE_SIZE: u32 = 500;

/// One point on the CaO–SiO₂–Al₂O₃ simplex; `a + b + c == 100`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TernaryPoint {
    pub label: String,
    /// SiO₂ percentage
    pub a: f64,
    /// CaO percentage
    pub b: f64,
    /// Al₂O₃ percentage
    pub c: f64,
}

impl TernaryPoint {
    pub fn from_record(record: &SlagRecord) -> Self {
        let normalized = record.normalized();
        Self {
            label: record.name().to_string(),
            a: normalized.sio2,
            b: normalized.cao,
            c: normalized.al2o3,
        }
    }
}

/// Oxides mapped to the `a`, `b` and `c` axes, in that order
pub const AXIS_OXIDES: [Oxide; 3] = [Oxide::SiO2, Oxide::CaO, Oxide::Al2O3];

/// Lazily map records to ternary points
pub fn plot_points<'a, I>(records: I) -> impl Iterator<Item = TernaryPoint> + 'a
where
    I: IntoIterator<Item = &'a SlagRecord>,
    I::IntoIter: 'a,
{
    records.into_iter().map(TernaryPoint::from_record)
}

/// Plotly-compatible figure (`data` + `layout`) for a set of points
#[derive(Debug, Clone, PartialEq)]
pub struct TernaryFigure {
    points: Vec<TernaryPoint>,
}

impl TernaryFigure {
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = TernaryPoint>,
    {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn points(&self) -> &[TernaryPoint] {
        &self.points
    }

    /// Figure document: one `scatterternary` trace and a ternary layout
    pub fn to_value(&self) -> Value {
        let a: Vec<f64> = self.points.iter().map(|p| p.a).collect();
        let b: Vec<f64> = self.points.iter().map(|p| p.b).collect();
        let c: Vec<f64> = self.points.iter().map(|p| p.c).collect();
        let text: Vec<&str> = self.points.iter().map(|p| p.label.as_str()).collect();

        json!({
            "data": [{
                "type": "scatterternary",
                "mode": "markers+text",
                "a": a,
                "b": b,
                "c": c,
                "text": text,
                "textposition": "top center",
                "marker": { "size": MARKER_SIZE },
                "name": "Normalized composition",
            }],
            "layout": {
                "ternary": {
                    "sum": 100,
                    "aaxis": axis(AXIS_OXIDES[0]),
                    "baxis": axis(AXIS_OXIDES[1]),
                    "caxis": axis(AXIS_OXIDES[2]),
                },
                "width": FIGURE_SIZE,
                "height": FIGURE_SIZE,
                "margin": { "t": 0 },
                "showlegend": true,
            },
        })
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }
}

fn axis(oxide: Oxide) -> Value {
    json!({
        "title": oxide.display_name(),
        "min": 0,
        "ticksuffix": "%",
    })
}
