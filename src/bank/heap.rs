//! Binary max-heap over a dense array.

/// Max-heap ordered by `T: Ord`. The greatest element is extracted first.
///
/// Any tie-break between equal amounts must be encoded in the `Ord` impl of `T`.
#[derive(Debug, Clone)]
pub struct PriorityHeap<T> {
    items: Vec<T>,
}

impl<T> Default for PriorityHeap<T> {
    fn default() -> Self {
        PriorityHeap { items: Vec::new() }
    }
}

impl<T: Ord> PriorityHeap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    /// Removes and returns the greatest element, or `None` if the heap is empty.
    pub fn extract_max(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let max = self.items.pop();
        self.sift_down(0);
        max
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.items[index] <= self.items[parent] {
                break;
            }
            self.items.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut largest = index;
            if left < len && self.items[left] > self.items[largest] {
                largest = left;
            }
            if right < len && self.items[right] > self.items[largest] {
                largest = right;
            }
            if largest == index {
                break;
            }
            self.items.swap(index, largest);
            index = largest;
        }
    }
}
