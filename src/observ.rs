//! Versioned values and derivations recomputed only when a source changed.
//!
//! Sources bump their version on every effective change. A `Computed`
//! remembers the source versions it was last built from, so any number of
//! changes inside one event collapse into a single recompute at flush time.

pub type Version = u64;

#[derive(Debug, Clone)]
pub struct Observ<T> {
    value: T,
    version: Version
}

impl<T: PartialEq> Observ<T> {
    pub fn new (value: T) -> Self {
        Observ { value, version: 0 }
    }

    pub fn get (&self) -> &T {
        &self.value
    }

    pub fn version (&self) -> Version {
        self.version
    }

    /// Setting an identical value is a no-op.
    pub fn set (&mut self, value: T) -> bool {
        if self.value == value {
            false
        } else {
            self.value = value;
            self.version += 1;
            true
        }
    }

    /// Mutate in place. The closure reports whether anything changed.
    pub fn update<F> (&mut self, f: F) -> bool
    where F: FnOnce(&mut T) -> bool {
        let changed = f(&mut self.value);
        if changed {
            self.version += 1;
        }
        changed
    }
}

#[derive(Debug)]
pub struct Computed<T> {
    value: Option<T>,
    seen: Vec<Version>,
    version: Version
}

impl<T> Computed<T> {
    pub fn new () -> Self {
        Computed { value: None, seen: Vec::new(), version: 0 }
    }

    pub fn get (&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn version (&self) -> Version {
        self.version
    }

    pub fn is_stale (&self, sources: &[Version]) -> bool {
        self.value.is_none() || self.seen.as_slice() != sources
    }

    /// Rebuild when any source moved since the last build. Returns true if rebuilt.
    pub fn refresh<F> (&mut self, sources: &[Version], compute: F) -> bool
    where F: FnOnce() -> T {
        if self.is_stale(sources) {
            self.value = Some(compute());
            self.seen = sources.to_vec();
            self.version += 1;
            true
        } else {
            false
        }
    }

    /// The up-to-date value, rebuilding first if a source moved.
    pub fn current<F> (&mut self, sources: &[Version], compute: F) -> &T
    where F: FnOnce() -> T {
        if self.is_stale(sources) {
            self.value = None;
            self.seen = sources.to_vec();
            self.version += 1;
        }
        self.value.get_or_insert_with(compute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_set_keeps_version () {
        let mut value = Observ::new(2);
        assert!(!value.set(2));
        assert_eq!(value.version(), 0);
        assert!(value.set(4));
        assert_eq!(value.version(), 1);
    }

    #[test]
    fn batches_changes_into_one_recompute () {
        let mut a = Observ::new(1);
        let mut b = Observ::new(10);
        let mut sum = Computed::new();
        let mut runs = 0;

        sum.refresh(&[a.version(), b.version()], || { runs += 1; a.get() + b.get() });
        a.set(2);
        b.set(20);
        a.set(3);
        sum.refresh(&[a.version(), b.version()], || { runs += 1; a.get() + b.get() });
        sum.refresh(&[a.version(), b.version()], || { runs += 1; a.get() + b.get() });

        assert_eq!(runs, 2);
        assert_eq!(sum.get(), Some(&23));
    }
}
