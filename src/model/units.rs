//! Unit normalization for quantity samples.
//!
//! Every quantity type in the catalog has one canonical unit. Samples are
//! converted into that unit before they are written to a profile, so a
//! profile never mixes units within one type section.
//!
//! Conversion is linear through a per-dimension base unit:
//! `base = value * factor + offset`.

use thiserror::Error;

/// Physical dimension of a unit. Conversions are only defined within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass,
    Length,
    Energy,
    Count,
    Frequency,
    Pressure,
    Temperature,
    Time,
    Percent,
    Volume,
    Concentration,
}

/// Errors raised while converting between units.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit: {0}")]
    Unknown(String),

    #[error("Cannot convert {from} to {to}")]
    Incompatible { from: String, to: String },
}

struct UnitDef {
    symbol: &'static str,
    dimension: Dimension,
    factor: f64,
    offset: f64,
}

const fn unit(symbol: &'static str, dimension: Dimension, factor: f64) -> UnitDef {
    UnitDef {
        symbol,
        dimension,
        factor,
        offset: 0.0,
    }
}

// Base units: g, m, kcal, count, count/min, mmHg, degC, s, %, L, mg/dL
const UNITS: &[UnitDef] = &[
    unit("g", Dimension::Mass, 1.0),
    unit("kg", Dimension::Mass, 1000.0),
    unit("mg", Dimension::Mass, 0.001),
    unit("lb", Dimension::Mass, 453.592_37),
    unit("oz", Dimension::Mass, 28.349_523_125),
    unit("m", Dimension::Length, 1.0),
    unit("cm", Dimension::Length, 0.01),
    unit("mm", Dimension::Length, 0.001),
    unit("km", Dimension::Length, 1000.0),
    unit("ft", Dimension::Length, 0.3048),
    unit("in", Dimension::Length, 0.0254),
    unit("mi", Dimension::Length, 1609.344),
    unit("kcal", Dimension::Energy, 1.0),
    unit("Cal", Dimension::Energy, 1.0),
    unit("kJ", Dimension::Energy, 0.239_005_736),
    unit("J", Dimension::Energy, 0.000_239_005_736),
    unit("count", Dimension::Count, 1.0),
    unit("count/min", Dimension::Frequency, 1.0),
    unit("count/s", Dimension::Frequency, 60.0),
    unit("mmHg", Dimension::Pressure, 1.0),
    unit("kPa", Dimension::Pressure, 7.500_616_827),
    unit("degC", Dimension::Temperature, 1.0),
    UnitDef {
        symbol: "degF",
        dimension: Dimension::Temperature,
        factor: 5.0 / 9.0,
        offset: -32.0 * 5.0 / 9.0,
    },
    UnitDef {
        symbol: "K",
        dimension: Dimension::Temperature,
        factor: 1.0,
        offset: -273.15,
    },
    unit("s", Dimension::Time, 1.0),
    unit("ms", Dimension::Time, 0.001),
    unit("min", Dimension::Time, 60.0),
    unit("hr", Dimension::Time, 3600.0),
    unit("d", Dimension::Time, 86_400.0),
    unit("%", Dimension::Percent, 1.0),
    unit("L", Dimension::Volume, 1.0),
    unit("mL", Dimension::Volume, 0.001),
    unit("mg/dL", Dimension::Concentration, 1.0),
];

fn lookup(symbol: &str) -> Result<&'static UnitDef, UnitError> {
    UNITS
        .iter()
        .find(|u| u.symbol == symbol)
        .ok_or_else(|| UnitError::Unknown(symbol.to_string()))
}

/// Dimension of a unit symbol.
///
/// # Errors
///
/// Returns `UnitError::Unknown` for symbols outside the unit table.
pub fn dimension_of(symbol: &str) -> Result<Dimension, UnitError> {
    lookup(symbol).map(|u| u.dimension)
}

/// Whether `symbol` is a known unit.
#[must_use]
pub fn is_known(symbol: &str) -> bool {
    lookup(symbol).is_ok()
}

/// Convert `value` from one unit into another.
///
/// Identical units return the value untouched so no rounding is introduced
/// for samples already stored in the canonical unit.
///
/// # Errors
///
/// Returns an error if either unit is unknown or the dimensions differ.
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    if from == to {
        lookup(from)?;
        return Ok(value);
    }

    let src = lookup(from)?;
    let dst = lookup(to)?;

    if src.dimension != dst.dimension {
        return Err(UnitError::Incompatible {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    let base = value.mul_add(src.factor, src.offset);
    Ok((base - dst.offset) / dst.factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_same_unit_is_identity() {
        assert_eq!(convert(70.0, "kg", "kg").unwrap(), 70.0);
    }

    #[test]
    fn test_km_to_m() {
        assert_eq!(convert(4.5, "km", "m").unwrap(), 4500.0);
    }

    #[test]
    fn test_lb_to_kg() {
        assert!(close(convert(1.0, "lb", "kg").unwrap(), 0.453_592_37));
    }

    #[test]
    fn test_temperature_offsets() {
        assert!(close(convert(212.0, "degF", "degC").unwrap(), 100.0));
        assert!(close(convert(0.0, "degC", "K").unwrap(), 273.15));
        assert!(close(convert(37.0, "degC", "degF").unwrap(), 98.6));
    }

    #[test]
    fn test_incompatible_dimensions() {
        let err = convert(1.0, "kg", "m").unwrap_err();
        assert!(matches!(err, UnitError::Incompatible { .. }));
    }

    #[test]
    fn test_unknown_unit() {
        assert_eq!(
            convert(1.0, "furlong", "m").unwrap_err(),
            UnitError::Unknown("furlong".to_string())
        );
        assert!(!is_known("furlong"));
        assert!(is_known("mmHg"));
    }

    #[test]
    fn test_dimension_of() {
        assert_eq!(dimension_of("count/min").unwrap(), Dimension::Frequency);
    }
}
