//! The selectable resource attributes and how their values are coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::colormap::Rgb;
use crate::district::DistrictFeature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAttribute {
    Water,
    Temp,
    Ammo,
    Medkits,
    FoodRations,
}

/// Everything the color stage needs to know about one attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDescriptor {
    pub attribute: ResourceAttribute,
    pub key: &'static str,
    pub label: &'static str,
    pub low: Rgb,
    pub high: Rgb,
}

const LIGHT_GREEN: Rgb = Rgb::new(0x90, 0xee, 0x90);
const DARK_GREEN: Rgb = Rgb::new(0x00, 0x64, 0x00);

/// Selection order; the first entry is the default.
pub static ATTRIBUTE_TABLE: [AttributeDescriptor; 5] = [
    AttributeDescriptor {
        attribute: ResourceAttribute::Water,
        key: "water",
        label: "Water",
        low: Rgb::new(0xad, 0xd8, 0xe6),
        high: Rgb::new(0x00, 0x00, 0x8b),
    },
    AttributeDescriptor {
        attribute: ResourceAttribute::Temp,
        key: "temp",
        label: "Temperature",
        low: Rgb::new(0xf0, 0x80, 0x80),
        high: Rgb::new(0x8b, 0x00, 0x00),
    },
    AttributeDescriptor {
        attribute: ResourceAttribute::Ammo,
        key: "ammo",
        label: "Ammo",
        low: Rgb::new(0xd7, 0xc7, 0xe3),
        high: Rgb::new(0x5a, 0x2c, 0x6c),
    },
    AttributeDescriptor {
        attribute: ResourceAttribute::Medkits,
        key: "medkits",
        label: "Medkits",
        low: LIGHT_GREEN,
        high: DARK_GREEN,
    },
    AttributeDescriptor {
        attribute: ResourceAttribute::FoodRations,
        key: "food_rations",
        label: "Food rations",
        low: LIGHT_GREEN,
        high: DARK_GREEN,
    },
];

impl ResourceAttribute {
    pub fn all() -> impl Iterator<Item = ResourceAttribute> {
        ATTRIBUTE_TABLE.iter().map(|descriptor| descriptor.attribute)
    }

    pub fn descriptor(self) -> &'static AttributeDescriptor {
        ATTRIBUTE_TABLE
            .iter()
            .find(|descriptor| descriptor.attribute == self)
            .unwrap_or(&ATTRIBUTE_TABLE[0])
    }

    pub fn key(self) -> &'static str {
        self.descriptor().key
    }

    /// Numeric value of this attribute on a district, if it coerces.
    pub fn value_of(self, district: &DistrictFeature) -> Option<f64> {
        district.property(self.key()).and_then(coerce)
    }
}

impl Default for ResourceAttribute {
    fn default() -> Self {
        ATTRIBUTE_TABLE[0].attribute
    }
}

impl fmt::Display for ResourceAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttribute(pub String);

impl fmt::Display for UnknownAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = ATTRIBUTE_TABLE.iter().map(|d| d.key).collect();
        write!(f, "unknown attribute '{}', expected one of {}", self.0, known.join(", "))
    }
}

impl std::error::Error for UnknownAttribute {}

impl FromStr for ResourceAttribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ATTRIBUTE_TABLE
            .iter()
            .find(|descriptor| descriptor.key.eq_ignore_ascii_case(wanted))
            .map(|descriptor| descriptor.attribute)
            .ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}

/// Numbers and numeric strings coerce; null, booleans, and anything
/// non-numeric do not.
pub fn coerce(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Which rows contribute to an attribute's color domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionPolicy {
    /// A row failing any attribute is left out of every domain.
    #[default]
    WholeRow,
    /// A row is left out only of the domain of the attribute that failed.
    PerAttribute,
}

/// Values of `attribute` that feed its color domain under `policy`.
pub fn domain_values(
    districts: &[DistrictFeature],
    attribute: ResourceAttribute,
    policy: CoercionPolicy,
) -> Vec<f64> {
    districts
        .iter()
        .filter(|district| match policy {
            CoercionPolicy::PerAttribute => true,
            CoercionPolicy::WholeRow => {
                ResourceAttribute::all().all(|other| other.value_of(district).is_some())
            }
        })
        .filter_map(|district| attribute.value_of(district))
        .collect()
}
