use crate::engine::errors::CodecError;

/// Maps column values to dense integer codes. Codes must preserve the value
/// order so that row-key ranges map to value ranges.
pub trait Dictionary: Send + Sync {
    fn id_of(&self, value: &str) -> Option<u32>;
    fn value_of(&self, id: u32) -> Option<&str>;
    fn cardinality(&self) -> usize;
    /// Fixed byte width of every encoded code.
    fn size_of_id(&self) -> usize;
}

/// Dictionary over the sorted distinct values of a column.
#[derive(Clone, Debug)]
pub struct SortedDictionary {
    values: Vec<String>,
}

impl SortedDictionary {
    pub fn from_values<I, S>(dimension: &str, values: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        values.sort_unstable();
        values.dedup();
        if values.len() as u64 > u32::MAX as u64 {
            return Err(CodecError::DictionaryOverflow(dimension.to_string()));
        }
        Ok(Self { values })
    }
}

impl Dictionary for SortedDictionary {
    fn id_of(&self, value: &str) -> Option<u32> {
        self.values
            .binary_search_by(|v| v.as_str().cmp(value))
            .ok()
            .map(|i| i as u32)
    }

    fn value_of(&self, id: u32) -> Option<&str> {
        self.values.get(id as usize).map(String::as_str)
    }

    fn cardinality(&self) -> usize {
        self.values.len()
    }

    fn size_of_id(&self) -> usize {
        let max_id = self.values.len().saturating_sub(1) as u64;
        match max_id {
            0..=0xff => 1,
            0x100..=0xffff => 2,
            0x1_0000..=0xff_ffff => 3,
            _ => 4,
        }
    }
}
