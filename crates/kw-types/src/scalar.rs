use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A three-component coordinate, the one structured value a store entry may
/// hold besides plain primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Coord {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A primitive value as held by a single store entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Coord(Coord),
}

impl Scalar {
    /// Size in bytes of this scalar's JSON encoding.
    ///
    /// Stores measure entries with this to enforce their per-entry ceiling.
    /// Non-finite floats have no JSON encoding and are rejected.
    pub fn encoded_len(&self) -> Result<usize, TypeError> {
        // serde_json writes NaN and infinities as `null`, which would not
        // read back as a float.
        if let Self::Float(f) = self {
            if !f.is_finite() {
                return Err(TypeError::Serialization(format!("non-finite float {f}")));
            }
        }
        serde_json::to_vec(self)
            .map(|bytes| bytes.len())
            .map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// The text payload, if this is a `Text` scalar.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int` scalar.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Coord(_) => "coord",
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Coord> for Scalar {
    fn from(v: Coord) -> Self {
        Self::Coord(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_len_counts_json_bytes() {
        let s = Scalar::Text("abc".into());
        let expected = serde_json::to_vec(&s).unwrap().len();
        assert_eq!(s.encoded_len().unwrap(), expected);
    }

    #[test]
    fn longer_text_encodes_longer() {
        let short = Scalar::from("a").encoded_len().unwrap();
        let long = Scalar::from("a".repeat(100)).encoded_len().unwrap();
        assert_eq!(long - short, 99);
    }

    #[test]
    fn non_finite_float_fails_to_encode() {
        assert!(Scalar::Float(f64::NAN).encoded_len().is_err());
        assert!(Scalar::Float(f64::INFINITY).encoded_len().is_err());
        assert!(Scalar::Float(f64::NEG_INFINITY).encoded_len().is_err());
        assert!(Scalar::Float(1.5).encoded_len().is_ok());
    }

    #[test]
    fn accessors() {
        assert_eq!(Scalar::from("x").as_text(), Some("x"));
        assert_eq!(Scalar::from(3i64).as_int(), Some(3));
        assert_eq!(Scalar::from(true).as_int(), None);
        assert_eq!(Scalar::from(Coord::new(1, 2, 3)).type_name(), "coord");
    }

    #[test]
    fn serde_roundtrip() {
        let s = Scalar::Coord(Coord::new(4, -5, 6));
        let json = serde_json::to_string(&s).unwrap();
        let back: Scalar = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn coord_display() {
        assert_eq!(format!("{}", Coord::new(1, 2, 3)), "(1, 2, 3)");
    }
}
