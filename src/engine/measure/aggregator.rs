use crate::engine::codec::decimal::parse_decimal;
use crate::engine::errors::{CodecError, MeasureError};
use crate::engine::measure::hll::HllCounter;
use crate::engine::schema::MeasureFunction;
use crate::shared::byte_cursor::{ByteCursor, SIZE_U64};
use crate::shared::hash::stable_hash64;

/// Mergeable accumulator of one measure. Decimal states hold unscaled values;
/// the scale lives on the measure descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MeasureState {
    Sum(i64),
    Min(i64),
    Max(i64),
    Count(i64),
    Distinct(HllCounter),
}

impl MeasureState {
    /// Accumulator for a single input row.
    pub fn from_input(function: &MeasureFunction, raw: Option<&str>) -> Result<Self, CodecError> {
        match function {
            MeasureFunction::Count => Ok(MeasureState::Count(1)),
            MeasureFunction::Sum { scale } => Ok(MeasureState::Sum(parse_input(raw, *scale)?)),
            MeasureFunction::Min { scale } => Ok(MeasureState::Min(parse_input(raw, *scale)?)),
            MeasureFunction::Max { scale } => Ok(MeasureState::Max(parse_input(raw, *scale)?)),
            MeasureFunction::CountDistinct { precision } => {
                let mut hll = HllCounter::new(*precision);
                hll.add_hash(stable_hash64(raw.unwrap_or_default()));
                Ok(MeasureState::Distinct(hll))
            }
        }
    }

    /// Folds `other` into this state. Sums and counts fail on overflow and
    /// leave the state unchanged.
    pub fn merge(&mut self, other: &MeasureState) -> Result<(), MeasureError> {
        match (self, other) {
            (MeasureState::Sum(a), MeasureState::Sum(b)) => {
                *a = a.checked_add(*b).ok_or(MeasureError::Overflow("sum"))?;
            }
            (MeasureState::Min(a), MeasureState::Min(b)) => {
                if *b < *a {
                    *a = *b;
                }
            }
            (MeasureState::Max(a), MeasureState::Max(b)) => {
                if *b > *a {
                    *a = *b;
                }
            }
            (MeasureState::Count(a), MeasureState::Count(b)) => {
                *a = a.checked_add(*b).ok_or(MeasureError::Overflow("count"))?;
            }
            (MeasureState::Distinct(a), MeasureState::Distinct(b)) => a.merge(b),
            (a, b) => debug_assert!(false, "merging mismatched measures {a:?} and {b:?}"),
        }
        Ok(())
    }

    /// Value of a numeric state; `None` for sketches.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MeasureState::Sum(v)
            | MeasureState::Min(v)
            | MeasureState::Max(v)
            | MeasureState::Count(v) => Some(*v),
            MeasureState::Distinct(_) => None,
        }
    }

    /// Rough heap + inline footprint, used for the build memory budget.
    pub fn estimated_bytes(&self) -> usize {
        match self {
            MeasureState::Distinct(hll) => 32 + hll.serialized_len(),
            _ => 16,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            MeasureState::Sum(v)
            | MeasureState::Min(v)
            | MeasureState::Max(v)
            | MeasureState::Count(v) => out.extend_from_slice(&v.to_le_bytes()),
            MeasureState::Distinct(hll) => hll.write_registers(out),
        }
    }

    pub fn decode(function: &MeasureFunction, cursor: &mut ByteCursor<'_>) -> Result<Self, CodecError> {
        let read = |cursor: &mut ByteCursor<'_>| {
            cursor
                .read_i64_le()
                .ok_or(CodecError::Truncated("measure value"))
        };
        Ok(match function {
            MeasureFunction::Sum { .. } => MeasureState::Sum(read(cursor)?),
            MeasureFunction::Min { .. } => MeasureState::Min(read(cursor)?),
            MeasureFunction::Max { .. } => MeasureState::Max(read(cursor)?),
            MeasureFunction::Count => MeasureState::Count(read(cursor)?),
            MeasureFunction::CountDistinct { .. } => {
                MeasureState::Distinct(HllCounter::read_registers(cursor)?)
            }
        })
    }
}

/// Encoded width of a measure column; sketches report their register footprint.
pub fn measure_space_estimate(function: &MeasureFunction) -> usize {
    match function {
        MeasureFunction::CountDistinct { precision } => 1 + (1usize << *precision),
        _ => SIZE_U64,
    }
}

fn parse_input(raw: Option<&str>, scale: u32) -> Result<i64, CodecError> {
    match raw {
        Some(value) => parse_decimal(value, scale),
        None => Err(CodecError::InvalidDecimal {
            value: String::new(),
            scale,
        }),
    }
}
