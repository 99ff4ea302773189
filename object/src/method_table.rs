use crate::{ClosureRef, ObjectError, Symbol};

const FIB_HASH: u32 = 0x9E37_79B9;

/// Fixed-capacity open-addressed map from selector to closure.
///
/// Keys are compared by symbol identity. The bucket array is sized once
/// at construction from the declared capacity and never grows; adding a
/// new selector past that capacity is an error.
#[derive(Clone)]
pub struct MethodTable {
    buckets: Box<[Option<(Symbol, ClosureRef)>]>,
    capacity: usize,
    len: usize,
}

impl MethodTable {
    pub fn with_capacity(capacity: usize) -> Self {
        let size = (capacity * 2).next_power_of_two().max(1);
        Self {
            buckets: vec![None; size].into_boxed_slice(),
            capacity,
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn home(&self, selector: Symbol) -> usize {
        let mask = self.buckets.len() - 1;
        (selector.id().wrapping_mul(FIB_HASH) as usize) & mask
    }

    /// Bucket index holding `selector`, or the first empty bucket on its
    /// collision path.
    fn find_bucket(&self, selector: Symbol) -> usize {
        let mask = self.buckets.len() - 1;
        let mut idx = self.home(selector);
        for _ in 0..self.buckets.len() {
            match &self.buckets[idx] {
                Some((key, _)) if *key != selector => idx = (idx + 1) & mask,
                _ => return idx,
            }
        }
        idx
    }

    pub fn get(&self, selector: Symbol) -> Option<ClosureRef> {
        match &self.buckets[self.find_bucket(selector)] {
            Some((key, closure)) if *key == selector => Some(closure.clone()),
            _ => None,
        }
    }

    /// Insert or replace. Replacing never counts against the capacity.
    pub fn insert(&mut self, selector: Symbol, closure: ClosureRef) -> Result<(), ObjectError> {
        let idx = self.find_bucket(selector);
        if let Some((key, existing)) = &mut self.buckets[idx]
            && *key == selector
        {
            *existing = closure;
            return Ok(());
        }
        if self.len >= self.capacity {
            return Err(ObjectError::MethodTableFull {
                capacity: self.capacity,
                selector,
            });
        }
        self.buckets[idx] = Some((selector, closure));
        self.len += 1;
        Ok(())
    }

    pub fn selectors(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.buckets.iter().flatten().map(|(key, _)| *key)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::Closure;

    fn prim(index: usize) -> ClosureRef {
        Rc::new(Closure::internal(index, 0, "test"))
    }

    #[test]
    fn insert_and_get() {
        let mut table = MethodTable::with_capacity(3);
        let a = Symbol::intern("alpha");
        let b = Symbol::intern("beta");
        table.insert(a, prim(1)).unwrap();
        table.insert(b, prim(2)).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.get(a).is_some());
        assert!(table.get(Symbol::intern("gamma")).is_none());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut table = MethodTable::with_capacity(1);
        let a = Symbol::intern("only");
        table.insert(a, prim(1)).unwrap();
        let err = table.insert(Symbol::intern("extra"), prim(2)).unwrap_err();
        assert!(matches!(err, ObjectError::MethodTableFull { capacity: 1, .. }));
        // replacing an existing key still works at capacity
        table.insert(a, prim(3)).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let mut table = MethodTable::with_capacity(0);
        assert!(table.get(Symbol::intern("x")).is_none());
        assert!(table.insert(Symbol::intern("x"), prim(0)).is_err());
    }

    #[test]
    fn many_selectors_resolve_correctly() {
        let names: Vec<String> = (0..40).map(|i| format!("sel{i}:")).collect();
        let mut table = MethodTable::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            table.insert(Symbol::intern(name), prim(i)).unwrap();
        }
        for (i, name) in names.iter().enumerate() {
            let closure = table.get(Symbol::intern(name)).unwrap();
            assert!(matches!(&*closure, Closure::Internal(p) if p.primitive == i));
        }
        assert_eq!(table.selectors().count(), 40);
    }
}
