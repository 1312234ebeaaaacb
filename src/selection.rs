use indexmap::IndexSet;

/// Ordered set of cell indexes, never duplicated. Order is the order each
/// index was first added; toggling an index off and on again keeps its place.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    indexes: IndexSet<usize>,
    // every index added since the last clear, in first-addition order
    seen: IndexSet<usize>
}

impl Selection {
    pub fn new () -> Self {
        Selection { indexes: IndexSet::new(), seen: IndexSet::new() }
    }

    pub fn from_indexes<I: IntoIterator<Item=usize>> (indexes: I) -> Self {
        let indexes: IndexSet<usize> = indexes.into_iter().collect();
        Selection { seen: indexes.clone(), indexes }
    }

    /// Adds the index if absent, removes it if present. Returns true when now selected.
    pub fn toggle (&mut self, index: usize) -> bool {
        // shift_remove keeps the order of the remaining entries
        if self.indexes.shift_remove(&index) {
            return false
        }

        let (rank, first_time) = self.seen.insert_full(index);
        self.indexes.insert(index);
        if !first_time {
            let seen = &self.seen;
            let rank_of = |value: &usize| seen.get_full(value).map_or(rank, |(rank, _)| rank);
            self.indexes.sort_by(|a, b| rank_of(a).cmp(&rank_of(b)));
        }
        true
    }

    pub fn contains (&self, index: usize) -> bool {
        self.indexes.contains(&index)
    }

    pub fn first (&self) -> Option<usize> {
        self.indexes.get_index(0).cloned()
    }

    pub fn clear (&mut self) -> bool {
        let had_any = !self.indexes.is_empty();
        self.indexes.clear();
        self.seen.clear();
        had_any
    }

    pub fn len (&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty (&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn iter (&self) -> impl Iterator<Item=usize> + '_ {
        self.indexes.iter().cloned()
    }

    pub fn to_vec (&self) -> Vec<usize> {
        self.iter().collect()
    }
}

impl PartialEq for Selection {
    fn eq (&self, other: &Selection) -> bool {
        self.indexes.iter().eq(other.indexes.iter())
    }
}
