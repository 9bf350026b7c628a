use std::any::Any;

/// Anything `'static + Send + Sync` can be attached to an entity.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// Type-erased view of one component type's storage.
pub(crate) trait ComponentStorage: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove(&mut self, index: u32) -> bool;
}

/// Sparse-set storage: entity index -> slot in a packed value array.
pub(crate) struct SparseSet<T> {
    sparse: Vec<Option<usize>>,
    dense: Vec<(u32, T)>,
}

impl<T: Component> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
        }
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, index: u32, value: T) -> Option<T> {
        let idx = index as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }
        match self.sparse[idx] {
            Some(slot) => Some(std::mem::replace(&mut self.dense[slot].1, value)),
            None => {
                self.sparse[idx] = Some(self.dense.len());
                self.dense.push((index, value));
                None
            }
        }
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        let slot = (*self.sparse.get(index as usize)?)?;
        Some(&self.dense[slot].1)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        let slot = (*self.sparse.get(index as usize)?)?;
        Some(&mut self.dense[slot].1)
    }

    /// Entity indices holding a value, in storage order.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.dense.iter().map(|(index, _)| *index)
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }
}

impl<T: Component> ComponentStorage for SparseSet<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove(&mut self, index: u32) -> bool {
        let Some(slot) = self.sparse.get_mut(index as usize).and_then(Option::take) else {
            return false;
        };
        self.dense.swap_remove(slot);
        if let Some(&(moved, _)) = self.dense.get(slot) {
            self.sparse[moved as usize] = Some(slot);
        }
        true
    }
}
