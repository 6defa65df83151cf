//! Field number to table position index
//!
//! ```text
//! numbers {3, 4, 6}        -> Table  { low: 3, positions: [0, 1, -, 2] }
//! numbers {1, 2, 100}      -> Lookup { entries: [(1,0), (2,1), (100,2)] }
//! ```
//!
//! The shape is picked by [`DispatchShape::select`], the same cost model the
//! compiled plan and the derive macro use.

use protoschema_sdk::DispatchShape;

const ABSENT: u32 = u32::MAX;

/// Maps a field number to its position in the field table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMap {
    /// Dense array indexed by `number - low`
    Table { low: u32, positions: Box<[u32]> },
    /// `(number, position)` pairs sorted by number
    Lookup { entries: Box<[(u32, u32)]> },
}

impl FieldMap {
    /// Build the index for field numbers in table order
    ///
    /// `numbers` must be strictly increasing (descriptors are validated
    /// before this is called).
    pub fn new(numbers: &[u32]) -> Self {
        let (low, high) = match (numbers.first(), numbers.last()) {
            (Some(&low), Some(&high)) => (low, high),
            _ => {
                return FieldMap::Lookup {
                    entries: Box::new([]),
                }
            }
        };

        match DispatchShape::select(low, high, numbers.len()) {
            DispatchShape::Table => {
                let mut positions = vec![ABSENT; (high - low) as usize + 1];
                for (position, &number) in numbers.iter().enumerate() {
                    positions[(number - low) as usize] = position as u32;
                }
                FieldMap::Table {
                    low,
                    positions: positions.into_boxed_slice(),
                }
            }
            DispatchShape::Lookup => FieldMap::Lookup {
                entries: numbers
                    .iter()
                    .enumerate()
                    .map(|(position, &number)| (number, position as u32))
                    .collect(),
            },
        }
    }

    /// Table position of a field number, if declared
    #[inline]
    pub fn position_of(&self, number: u32) -> Option<usize> {
        match self {
            FieldMap::Table { low, positions } => {
                let index = number.checked_sub(*low)? as usize;
                match positions.get(index) {
                    Some(&position) if position != ABSENT => Some(position as usize),
                    _ => None,
                }
            }
            FieldMap::Lookup { entries } => entries
                .binary_search_by_key(&number, |&(n, _)| n)
                .ok()
                .map(|index| entries[index].1 as usize),
        }
    }

    /// Shape of this index
    pub fn shape(&self) -> DispatchShape {
        match self {
            FieldMap::Table { .. } => DispatchShape::Table,
            FieldMap::Lookup { .. } => DispatchShape::Lookup,
        }
    }

    /// Number of indexed fields
    pub fn len(&self) -> usize {
        match self {
            FieldMap::Table { positions, .. } => {
                positions.iter().filter(|&&p| p != ABSENT).count()
            }
            FieldMap::Lookup { entries } => entries.len(),
        }
    }

    /// Whether no field is indexed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_numbers_use_lookup() {
        let map = FieldMap::new(&[1, 2, 100]);
        assert_eq!(map.shape(), DispatchShape::Lookup);
        assert_eq!(map.position_of(1), Some(0));
        assert_eq!(map.position_of(2), Some(1));
        assert_eq!(map.position_of(100), Some(2));
        assert_eq!(map.position_of(3), None);
        assert_eq!(map.position_of(0), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_dense_numbers_use_table() {
        let numbers: Vec<u32> = (1..=50).collect();
        let map = FieldMap::new(&numbers);
        assert_eq!(map.shape(), DispatchShape::Table);
        for (position, number) in numbers.iter().enumerate() {
            assert_eq!(map.position_of(*number), Some(position));
        }
        assert_eq!(map.position_of(51), None);
        assert_eq!(map.position_of(0), None);
    }

    #[test]
    fn test_table_gaps() {
        let map = FieldMap::new(&[3, 4, 6]);
        assert_eq!(map.shape(), DispatchShape::Table);
        assert_eq!(map.position_of(5), None);
        assert_eq!(map.position_of(6), Some(2));
        assert_eq!(map.position_of(2), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_empty_map() {
        let map = FieldMap::new(&[]);
        assert_eq!(map.shape(), DispatchShape::Lookup);
        assert!(map.is_empty());
        assert_eq!(map.position_of(1), None);
    }

    #[test]
    fn test_high_numbers() {
        let map = FieldMap::new(&[536_870_000, 536_870_911]);
        assert_eq!(map.shape(), DispatchShape::Lookup);
        assert_eq!(map.position_of(536_870_911), Some(1));
    }
}
