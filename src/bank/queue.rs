//! Singly linked first-in-first-out queue.
//!
//! Nodes live in a slab of slots linked by index, so both ends are reachable in O(1)
//! without shared ownership. Slots freed by `dequeue` are reused by later `enqueue`s.

#[derive(Debug, Clone)]
struct Node<T> {
    item: T,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct FifoQueue<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        FifoQueue {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }
}

impl<T> FifoQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `item` at the tail.
    pub fn enqueue(&mut self, item: T) {
        let node = Some(Node { item, next: None });
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = node;
                index
            }
            None => {
                self.slots.push(node);
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(node) = self.slots[tail].as_mut() {
                    node.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    /// Removes and returns the head, or `None` if the queue is empty.
    pub fn dequeue(&mut self) -> Option<T> {
        let index = self.head?;
        let node = self.slots[index].take()?;
        self.free.push(index);
        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        Some(node.item)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Iterates from head to tail without consuming anything.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            cursor: self.head,
        }
    }
}

impl<T> FromIterator<T> for FifoQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut queue = FifoQueue::new();
        for item in iter {
            queue.enqueue(item);
        }
        queue
    }
}

pub struct Iter<'a, T> {
    queue: &'a FifoQueue<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.slots[self.cursor?].as_ref()?;
        self.cursor = node.next;
        Some(&node.item)
    }
}
