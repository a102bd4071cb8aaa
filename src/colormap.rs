//! Linear color scales, per-district polygon styles, and the legend.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::attribute::{domain_values, CoercionPolicy, ResourceAttribute};
use crate::district::DistrictFeature;

pub const FALLBACK_FILL: &str = "gray";
pub const CAMP_BORDER: &str = "black";
pub const PLAIN_BORDER: &str = "gray";
const LEGEND_TICKS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Two-color gradient over the observed domain of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub attribute: ResourceAttribute,
    pub min: f64,
    pub max: f64,
    pub low: Rgb,
    pub high: Rgb,
}

impl ColorScale {
    /// Build the scale for `attribute` from the districts' current values.
    /// `None` when no district has a usable value.
    pub fn for_attribute(
        attribute: ResourceAttribute,
        districts: &[DistrictFeature],
        policy: CoercionPolicy,
    ) -> Option<ColorScale> {
        let values = domain_values(districts, attribute, policy);
        let (min, max) = values.iter().fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;
        let descriptor = attribute.descriptor();
        Some(ColorScale {
            attribute,
            min,
            max,
            low: descriptor.low,
            high: descriptor.high,
        })
    }

    pub fn color_at(&self, value: f64) -> Rgb {
        let span = self.max - self.min;
        if span <= 0.0 {
            return self.low;
        }
        self.low.lerp(self.high, (value - self.min) / span)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub color: String,
    pub weight: u8,
}

/// Fill comes from the scale when the district has a usable value, gray
/// otherwise. The border depends only on whether the district has a camp.
pub fn style_for(
    district: &DistrictFeature,
    attribute: ResourceAttribute,
    scale: Option<&ColorScale>,
    fill_opacity: f64,
) -> PolygonStyle {
    let fill_color = match (attribute.value_of(district), scale) {
        (Some(value), Some(scale)) => scale.color_at(value).to_string(),
        _ => FALLBACK_FILL.to_string(),
    };
    let (color, weight) = if district.camp_exists {
        (CAMP_BORDER, 2)
    } else {
        (PLAIN_BORDER, 1)
    };
    PolygonStyle {
        fill_color,
        fill_opacity,
        color: color.to_string(),
        weight,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendTick {
    pub value: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub caption: String,
    pub min: f64,
    pub max: f64,
    pub low: Rgb,
    pub high: Rgb,
    pub ticks: Vec<LegendTick>,
}

impl Legend {
    pub fn from_scale(scale: &ColorScale) -> Legend {
        let steps = LEGEND_TICKS - 1;
        let ticks = (0..=steps)
            .map(|i| {
                let value = scale.min + (scale.max - scale.min) * i as f64 / steps as f64;
                LegendTick {
                    value,
                    color: scale.color_at(value),
                }
            })
            .collect();
        Legend {
            caption: scale.attribute.descriptor().label.to_string(),
            min: scale.min,
            max: scale.max,
            low: scale.low,
            high: scale.high,
            ticks,
        }
    }
}
