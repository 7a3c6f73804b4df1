#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fetched {
    Value(f64),
    Null,
    OutOfPartition,
}

impl Fetched {
    pub fn value(self) -> Option<f64> {
        match self {
            Fetched::Value(v) => Some(v),
            Fetched::Null | Fetched::OutOfPartition => None,
        }
    }
}

/// origin a relative offset is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Head,
    Current,
}

/// read-only view of one partition's value column
pub trait PartitionAccess {
    fn row_count(&self) -> usize;

    /// `pos` is always `< row_count()`
    fn value_at(&self, pos: usize) -> Option<f64>;

    /// value at `offset` rows from `seek`. `current` is the row being evaluated
    fn fetch(&self, current: usize, offset: i64, seek: SeekFrom) -> Fetched {
        let row_count = self.row_count() as i64;
        let origin = match seek {
            SeekFrom::Head => 0,
            SeekFrom::Current => current as i64,
        };

        match origin.checked_add(offset) {
            Some(pos) if pos >= 0 && pos < row_count => self
                .value_at(pos as usize)
                .map(Fetched::Value)
                .unwrap_or(Fetched::Null),
            _ => Fetched::OutOfPartition,
        }
    }
}

impl PartitionAccess for [Option<f64>] {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn value_at(&self, pos: usize) -> Option<f64> {
        self[pos]
    }
}
