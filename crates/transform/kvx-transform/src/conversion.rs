//! Representation conversions used by the cast step.

use kvx_error::{Result, TransformError};
use kvx_types::{Data, PrimitiveType, PrimitiveValue};

fn unsupported(from: impl ToString, to: PrimitiveType) -> TransformError {
    TransformError::UnsupportedConversion {
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn invalid(to: PrimitiveType, reason: impl Into<String>) -> TransformError {
    TransformError::InvalidValue {
        to: to.to_string(),
        reason: reason.into(),
    }
}

/// Converts `data` to a primitive of type `target`.
///
/// Returns `Ok(None)` when `data` is already a primitive of that type.
///
/// # Errors
///
/// - [`TransformError::UnsupportedConversion`] when no conversion exists
///   between the two representations
/// - [`TransformError::InvalidValue`] when the conversion exists but this
///   particular value cannot be converted
pub fn convert(data: &Data, target: PrimitiveType) -> Result<Option<Data>> {
    match data {
        Data::Primitive(value) if value.primitive_type() == target => Ok(None),
        Data::Primitive(value) => Ok(Some(Data::primitive(convert_primitive(value, target)?))),
        Data::Record(record) => match target {
            PrimitiveType::String => Ok(Some(Data::string(record.to_string()))),
            PrimitiveType::Bytes => Ok(Some(Data::primitive(PrimitiveValue::Bytes(
                record.to_string().into_bytes(),
            )))),
            _ => Err(unsupported(data.schema(), target).into()),
        },
        Data::Opaque(_) => Err(unsupported(data.schema(), target).into()),
    }
}

/// Converts one primitive into another primitive type.
pub fn convert_primitive(
    value: &PrimitiveValue,
    target: PrimitiveType,
) -> std::result::Result<PrimitiveValue, TransformError> {
    use PrimitiveValue as P;

    if value.primitive_type() == target {
        return Ok(value.clone());
    }

    let converted = match target {
        PrimitiveType::String => P::String(to_text(value)?),
        PrimitiveType::Bytes => P::Bytes(to_bytes(value)),
        PrimitiveType::Boolean => match value {
            P::String(s) => P::Boolean(parse_bool(s).ok_or_else(|| invalid(target, format!("'{s}' is not a boolean")))?),
            P::Bytes(b) => P::Boolean(fixed::<1>(b, target)?[0] != 0),
            other => return Err(unsupported(other.primitive_type(), target)),
        },
        PrimitiveType::Int32 => match value {
            P::Int64(n) => P::Int32(
                i32::try_from(*n).map_err(|_| invalid(target, format!("{n} is out of range")))?,
            ),
            P::Float(n) => P::Int32(float_to_i32(f64::from(*n), target)?),
            P::Double(n) => P::Int32(float_to_i32(*n, target)?),
            P::String(s) => P::Int32(parse(s, target)?),
            P::Bytes(b) => P::Int32(i32::from_be_bytes(fixed::<4>(b, target)?)),
            other => return Err(unsupported(other.primitive_type(), target)),
        },
        PrimitiveType::Int64 => match value {
            P::Int32(n) => P::Int64(i64::from(*n)),
            P::Float(n) => P::Int64(float_to_i64(f64::from(*n), target)?),
            P::Double(n) => P::Int64(float_to_i64(*n, target)?),
            P::String(s) => P::Int64(parse(s, target)?),
            P::Bytes(b) => P::Int64(i64::from_be_bytes(fixed::<8>(b, target)?)),
            other => return Err(unsupported(other.primitive_type(), target)),
        },
        PrimitiveType::Float => match value {
            P::Int32(n) => P::Float(*n as f32),
            P::Int64(n) => P::Float(*n as f32),
            P::Double(n) => P::Float(*n as f32),
            P::String(s) => P::Float(parse(s, target)?),
            P::Bytes(b) => P::Float(f32::from_be_bytes(fixed::<4>(b, target)?)),
            other => return Err(unsupported(other.primitive_type(), target)),
        },
        PrimitiveType::Double => match value {
            P::Int32(n) => P::Double(f64::from(*n)),
            P::Int64(n) => P::Double(*n as f64),
            P::Float(n) => P::Double(f64::from(*n)),
            P::String(s) => P::Double(parse(s, target)?),
            P::Bytes(b) => P::Double(f64::from_be_bytes(fixed::<8>(b, target)?)),
            other => return Err(unsupported(other.primitive_type(), target)),
        },
    };

    Ok(converted)
}

/// Truncates toward zero, rejecting NaN and infinities.
fn truncate(n: f64, target: PrimitiveType) -> std::result::Result<f64, TransformError> {
    if n.is_finite() {
        Ok(n.trunc())
    } else {
        Err(invalid(target, format!("{n} is not a finite number")))
    }
}

fn float_to_i32(n: f64, target: PrimitiveType) -> std::result::Result<i32, TransformError> {
    let t = truncate(n, target)?;
    if t < f64::from(i32::MIN) || t > f64::from(i32::MAX) {
        return Err(invalid(target, format!("{n} is out of range")));
    }
    Ok(t as i32)
}

fn float_to_i64(n: f64, target: PrimitiveType) -> std::result::Result<i64, TransformError> {
    let t = truncate(n, target)?;
    // i64::MIN is exactly -2^63; i64::MAX rounds up to 2^63 as f64.
    let min = i64::MIN as f64;
    if t < min || t >= -min {
        return Err(invalid(target, format!("{n} is out of range")));
    }
    Ok(t as i64)
}

fn to_text(value: &PrimitiveValue) -> std::result::Result<String, TransformError> {
    Ok(match value {
        PrimitiveValue::Boolean(b) => b.to_string(),
        PrimitiveValue::Int32(n) => n.to_string(),
        PrimitiveValue::Int64(n) => n.to_string(),
        PrimitiveValue::Float(n) => format!("{n:?}"),
        PrimitiveValue::Double(n) => format!("{n:?}"),
        PrimitiveValue::String(s) => s.clone(),
        PrimitiveValue::Bytes(b) => String::from_utf8(b.clone())
            .map_err(|e| invalid(PrimitiveType::String, format!("bytes are not UTF-8: {e}")))?,
    })
}

/// Big-endian fixed-width encodings for numbers, UTF-8 for strings.
fn to_bytes(value: &PrimitiveValue) -> Vec<u8> {
    match value {
        PrimitiveValue::Boolean(b) => vec![u8::from(*b)],
        PrimitiveValue::Int32(n) => n.to_be_bytes().to_vec(),
        PrimitiveValue::Int64(n) => n.to_be_bytes().to_vec(),
        PrimitiveValue::Float(n) => n.to_be_bytes().to_vec(),
        PrimitiveValue::Double(n) => n.to_be_bytes().to_vec(),
        PrimitiveValue::String(s) => s.as_bytes().to_vec(),
        PrimitiveValue::Bytes(b) => b.clone(),
    }
}

fn fixed<const N: usize>(
    bytes: &[u8],
    target: PrimitiveType,
) -> std::result::Result<[u8; N], TransformError> {
    bytes
        .try_into()
        .map_err(|_| invalid(target, format!("expected {N} bytes, got {}", bytes.len())))
}

fn parse<T: std::str::FromStr>(
    s: &str,
    target: PrimitiveType,
) -> std::result::Result<T, TransformError> {
    s.trim()
        .parse()
        .map_err(|_| invalid(target, format!("'{s}' is not a valid {target}")))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
