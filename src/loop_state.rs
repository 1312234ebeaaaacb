/// Applied transforms in order, with undo/redo.
#[derive(Debug, Clone)]
pub struct TransformHistory<T> {
    undos: Vec<T>,
    redos: Vec<T>
}

impl<T> TransformHistory<T> {
    pub fn new () -> Self {
        TransformHistory {
            undos: Vec::new(),
            redos: Vec::new()
        }
    }

    pub fn len (&self) -> usize {
        self.undos.len()
    }

    pub fn is_empty (&self) -> bool {
        self.undos.is_empty()
    }

    pub fn iter (&self) -> impl Iterator<Item=&T> {
        self.undos.iter()
    }

    /// A new transform invalidates anything that was undone.
    pub fn push (&mut self, value: T) {
        self.undos.push(value);
        self.redos.clear();
    }

    pub fn undo (&mut self) -> bool {
        match self.undos.pop() {
            Some(value) => {
                self.redos.push(value);
                true
            },
            None => false
        }
    }

    pub fn redo (&mut self) -> bool {
        match self.redos.pop() {
            Some(value) => {
                self.undos.push(value);
                true
            },
            None => false
        }
    }

    /// Rewrites every transform in place, undone ones included.
    pub fn for_each_mut<F: FnMut(&mut T)> (&mut self, mut f: F) {
        for value in self.undos.iter_mut().chain(self.redos.iter_mut()) {
            f(value);
        }
    }

    /// Removes every applied transform, oldest first. Redo history is discarded.
    pub fn take_all (&mut self) -> Vec<T> {
        self.redos.clear();
        std::mem::replace(&mut self.undos, Vec::new())
    }
}
