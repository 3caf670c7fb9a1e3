use crate::engine::errors::CodecError;

/// Parses a plain decimal string into an unscaled integer with `scale`
/// fractional digits. More fractional digits than `scale` is an error.
pub fn parse_decimal(value: &str, scale: u32) -> Result<i64, CodecError> {
    let invalid = || CodecError::InvalidDecimal {
        value: value.to_string(),
        scale,
    };

    let trimmed = value.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if frac_part.len() > scale as usize
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let factor = 10i64.checked_pow(scale).ok_or_else(invalid)?;
    let int_value: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| invalid())?
    };
    let mut frac_value: i64 = if frac_part.is_empty() {
        0
    } else {
        frac_part.parse().map_err(|_| invalid())?
    };
    for _ in frac_part.len()..scale as usize {
        frac_value *= 10;
    }

    let unscaled = int_value
        .checked_mul(factor)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(invalid)?;
    Ok(if negative { -unscaled } else { unscaled })
}

pub fn format_decimal(unscaled: i64, scale: u32) -> String {
    if scale == 0 {
        return unscaled.to_string();
    }
    let factor = 10u64.pow(scale);
    let abs = unscaled.unsigned_abs();
    let sign = if unscaled < 0 { "-" } else { "" };
    format!(
        "{sign}{}.{:0width$}",
        abs / factor,
        abs % factor,
        width = scale as usize
    )
}
