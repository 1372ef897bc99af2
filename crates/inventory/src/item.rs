use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use greengrocer_core::validation::{self, FieldValue, TextMessages};
use greengrocer_core::{FieldErrors, ValueObject};

const FIELDS: [&str; 3] = ["name", "color", "price"];

const NAME: TextMessages = TextMessages {
    base: "name should be a type of text",
    empty: "name cannot be empty",
    required: "name is required",
};

pub const INVALID_COLOR: &str = "should be a hexa decimal color value";
pub const INVALID_PRICE: &str = "price should be a type of number";

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9A-Fa-f]{3}){1,2}$").expect("hex color pattern is valid"));

/// `#rgb` or `#rrggbb`, case preserved as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl ValueObject for HexColor {}

impl HexColor {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        HEX_COLOR.is_match(raw).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for HexColor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored vegetable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vegetable {
    pub name: String,
    pub color: HexColor,
    pub price: f64,
}

impl Vegetable {
    /// Two items are the same stock entry when name, color and price all match.
    pub fn is_duplicate_of(&self, other: &Vegetable) -> bool {
        self.name == other.name && self.color == other.color && self.price == other.price
    }
}

/// Validate a create/update payload.
///
/// `price` may be a JSON number or a numeric string; either way it must be
/// finite.
pub fn validate_vegetable(candidate: &Value) -> Result<Vegetable, FieldErrors> {
    let obj = validation::as_object(candidate)?;
    let mut errors = FieldErrors::new();

    let name = validation::required_text(obj, "name", &NAME, &mut errors);
    let color = check_color(obj, &mut errors);
    let price = check_price(obj, &mut errors);
    validation::reject_unknown_keys(obj, &FIELDS, &mut errors);

    match (name, color, price) {
        (Some(name), Some(color), Some(price)) if errors.is_empty() => Ok(Vegetable { name, color, price }),
        _ => Err(errors),
    }
}

fn check_color(obj: &Map<String, Value>, errors: &mut FieldErrors) -> Option<HexColor> {
    match validation::field(obj, "color") {
        FieldValue::Missing => {
            errors.push("color", "color is required");
            None
        }
        FieldValue::Other(_) => {
            errors.push("color", "color should be a type of text");
            None
        }
        FieldValue::Text(s) if s.trim().is_empty() => {
            errors.push("color", "color cannot be empty");
            None
        }
        FieldValue::Text(s) => {
            let color = HexColor::parse(s);
            if color.is_none() {
                errors.push("color", INVALID_COLOR);
            }
            color
        }
    }
}

fn check_price(obj: &Map<String, Value>, errors: &mut FieldErrors) -> Option<f64> {
    let price = match obj.get("price") {
        None => {
            errors.push("price", "price is required");
            return None;
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match price {
        Some(p) if p.is_finite() => Some(p),
        _ => {
            errors.push("price", INVALID_PRICE);
            None
        }
    }
}
