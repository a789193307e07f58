use crate::handles::Handle;

/// Append-only arena. Slots are never freed, so every handle stays valid
/// for the arena's lifetime and the generation is always 0.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena { items: Vec::new() }
    }

    pub fn alloc(&mut self, v: T) -> Handle {
        self.items.push(v);
        Handle::new((self.items.len() - 1) as u32, 0)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.items.get(handle.index() as usize)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.items.get_mut(handle.index() as usize)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (Handle::new(i as u32, 0), v))
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
