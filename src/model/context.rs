//! Context model: entity + period + dimensions.

use chrono::NaiveDate;

use super::element::ConceptId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Period {
    Instant(NaiveDate),
    Duration { start: NaiveDate, end: NaiveDate },
}

impl Period {
    pub fn end_date(&self) -> NaiveDate {
        match self {
            Period::Instant(d) => *d,
            Period::Duration { end, .. } => *end,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        match self {
            Period::Instant(_) => None,
            Period::Duration { start, .. } => Some(*start),
        }
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, Period::Instant(_))
    }

    pub fn duration_days(&self) -> Option<i64> {
        match self {
            Period::Instant(_) => None,
            Period::Duration { start, end } => Some((*end - *start).num_days()),
        }
    }

    /// The `instant_<yyyy-mm-dd>` / `duration_<start>_<end>` identifier used
    /// as the column key when attaching facts to line items.
    pub fn key(&self) -> String {
        match self {
            Period::Instant(d) => format!("instant_{d}"),
            Period::Duration { start, end } => format!("duration_{start}_{end}"),
        }
    }
}

/// One (axis, member) pair in a context's segment. Segment dimensions are
/// an ordered set of (axis concept, member concept) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DimensionMember {
    pub axis: ConceptId,
    pub member: ConceptId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    pub id: String,
    pub entity_identifier: String,
    pub period: Period,
    pub dimensions: Vec<DimensionMember>,
}

impl Context {
    pub fn has_dimensions(&self) -> bool {
        !self.dimensions.is_empty()
    }

    pub fn member_for_axis(&self, axis: &ConceptId) -> Option<&ConceptId> {
        self.dimensions
            .iter()
            .find(|dm| &dm.axis == axis)
            .map(|dm| &dm.member)
    }
}
