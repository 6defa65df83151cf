//! Field-number dispatch cost model
//!
//! Decides whether a message's field-number dispatch uses a dense table
//! (indexed by `number - low`) or a sorted lookup (binary search). The model
//! weighs space plus three times the time cost, the same trade-off a compiler
//! makes between a jump table and a compare tree for a `switch`.
//!
//! ```text
//! table  = (4 + (high - low + 1)) + 3 * 3
//! lookup = (3 + 2 * count)        + 3 * count
//! use table when table <= lookup
//! ```
//!
//! Every dispatcher in the workspace (interpreted, compiled plan, derived code)
//! goes through [`DispatchShape::select`] so they agree on the shape.

/// Fixed space overhead of a dense table, in words
pub const TABLE_BASE_SPACE: u64 = 4;

/// Comparisons needed by a dense table lookup
pub const TABLE_TIME: u64 = 3;

/// Fixed space overhead of a sorted lookup, in words
pub const LOOKUP_BASE_SPACE: u64 = 3;

/// Weight of time relative to space
pub const TIME_WEIGHT: u64 = 3;

/// Layout chosen for field-number dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchShape {
    /// Dense array indexed by `number - low`
    Table,
    /// Sorted `(number, position)` array searched by binary search
    Lookup,
}

impl DispatchShape {
    /// Select the dispatch shape for a field-number range
    ///
    /// # Arguments
    /// * `low` - Lowest field number
    /// * `high` - Highest field number
    /// * `count` - Number of fields
    ///
    /// An empty message (`count == 0`) always uses [`DispatchShape::Lookup`].
    pub const fn select(low: u32, high: u32, count: usize) -> Self {
        if count == 0 || high < low {
            return DispatchShape::Lookup;
        }
        if prefer_table(low, high, count) {
            DispatchShape::Table
        } else {
            DispatchShape::Lookup
        }
    }

    /// Human-readable name of the shape
    pub const fn name(self) -> &'static str {
        match self {
            DispatchShape::Table => "table",
            DispatchShape::Lookup => "lookup",
        }
    }
}

/// Space cost of a dense table covering `low..=high`
pub const fn table_space_cost(low: u32, high: u32) -> u64 {
    TABLE_BASE_SPACE + (high as u64 - low as u64 + 1)
}

/// Space cost of a sorted lookup with `count` entries
pub const fn lookup_space_cost(count: usize) -> u64 {
    LOOKUP_BASE_SPACE + 2 * count as u64
}

/// Time cost of a sorted lookup with `count` entries
pub const fn lookup_time_cost(count: usize) -> u64 {
    count as u64
}

/// Whether the dense table wins the space + 3×time comparison
///
/// Callers must pass `low <= high`.
pub const fn prefer_table(low: u32, high: u32, count: usize) -> bool {
    let table = table_space_cost(low, high) + TIME_WEIGHT * TABLE_TIME;
    let lookup = lookup_space_cost(count) + TIME_WEIGHT * lookup_time_cost(count);
    table <= lookup
}
