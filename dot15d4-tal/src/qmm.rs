//! Queue management.
//!
//! A singly linked list of items, kept in a fixed node pool. Items are
//! appended at the tail and removed from the head or at the first item
//! matching a search predicate. The queue stores handles only; it never
//! allocates or frees the buffers they refer to.

use heapless::Vec;

struct Node<T> {
    item: Option<T>,
    next: Option<usize>,
}

pub struct Queue<T, const N: usize> {
    nodes: Vec<Node<T>, N>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Head of the list of unused nodes.
    free: Option<usize>,
    size: usize,
    capacity: usize,
}

impl<T, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Queue<T, N> {
    /// Create an empty queue bounded by its static capacity `N`.
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            head: None,
            tail: None,
            free: None,
            size: 0,
            capacity: N,
        }
    }

    /// Create an empty queue holding at most `capacity` items. The bound is
    /// clamped to the static capacity `N`.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut queue = Self::new();
        queue.capacity = capacity.min(N);
        queue
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an item at the tail. A full queue hands the item back.
    pub fn append(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }

        let index = match self.free {
            Some(index) => {
                self.free = self.nodes[index].next;
                self.nodes[index] = Node {
                    item: Some(item),
                    next: None,
                };
                index
            }
            None => {
                if self.nodes.is_full() {
                    return Err(item);
                }
                let index = self.nodes.len();
                let _ = self.nodes.push(Node {
                    item: Some(item),
                    next: None,
                });
                index
            }
        };

        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.size += 1;

        Ok(())
    }

    /// Remove the item at the head.
    pub fn remove(&mut self) -> Option<T> {
        self.remove_matching(|_| true)
    }

    /// Remove the first item for which `search` returns `true`.
    pub fn remove_matching(&mut self, mut search: impl FnMut(&T) -> bool) -> Option<T> {
        let mut previous: Option<usize> = None;
        let mut current = self.head;

        while let Some(index) = current {
            let next = self.nodes[index].next;
            let matches = self.nodes[index].item.as_ref().is_some_and(&mut search);

            if matches {
                match previous {
                    Some(previous) => self.nodes[previous].next = next,
                    None => self.head = next,
                }
                if self.tail == Some(index) {
                    self.tail = previous;
                }

                let item = self.nodes[index].item.take();
                self.nodes[index].next = self.free;
                self.free = Some(index);
                self.size -= 1;
                return item;
            }

            previous = current;
            current = next;
        }

        None
    }

    /// Return the item at the head without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.head.and_then(|index| self.nodes[index].item.as_ref())
    }

    /// Return the first item for which `search` returns `true`, without
    /// removing it.
    pub fn read(&self, mut search: impl FnMut(&T) -> bool) -> Option<&T> {
        self.iter().find(|item| search(item))
    }

    /// Iterate from head to tail.
    pub fn iter(&self) -> Iter<'_, T, N> {
        Iter {
            queue: self,
            current: self.head,
        }
    }

    /// Remove every item, handing each one to `f` in queue order.
    pub fn flush(&mut self, mut f: impl FnMut(T)) {
        while let Some(item) = self.remove() {
            f(item);
        }
    }
}

pub struct Iter<'q, T, const N: usize> {
    queue: &'q Queue<T, N>,
    current: Option<usize>,
}

impl<'q, T, const N: usize> Iterator for Iter<'q, T, N> {
    type Item = &'q T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let node = &self.queue.nodes[index];
        self.current = node.next;
        node.item.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn fifo_order() {
        let mut queue = Queue::<u8, 4>::new();
        assert_eq!(queue.remove(), None);

        for i in 0..4 {
            queue.append(i).unwrap();
        }
        assert_eq!(queue.append(4), Err(4));
        assert_eq!(queue.peek(), Some(&0));

        assert_eq!(queue.remove(), Some(0));
        queue.append(5).unwrap();
        let items: std::vec::Vec<u8> = queue.iter().copied().collect();
        assert_eq!(items, [1, 2, 3, 5]);
    }

    #[test]
    fn search() {
        let mut queue = Queue::<u8, 8>::new();
        for i in [10, 11, 12, 13] {
            queue.append(i).unwrap();
        }

        assert_eq!(queue.read(|i| *i == 12), Some(&12));
        assert_eq!(queue.len(), 4);

        assert_eq!(queue.remove_matching(|i| *i == 13), Some(13));
        assert_eq!(queue.remove_matching(|i| *i == 13), None);
        // The tail moved back.
        queue.append(14).unwrap();
        let items: std::vec::Vec<u8> = queue.iter().copied().collect();
        assert_eq!(items, [10, 11, 12, 14]);

        assert_eq!(queue.remove_matching(|i| *i == 10), Some(10));
        assert_eq!(queue.peek(), Some(&11));
    }

    #[test]
    fn runtime_bound() {
        let mut queue = Queue::<u8, 8>::with_capacity(2);
        queue.append(1).unwrap();
        queue.append(2).unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.append(3), Err(3));

        let queue = Queue::<u8, 4>::with_capacity(100);
        assert_eq!(queue.capacity(), 4);
    }

    #[test]
    fn flush() {
        let mut queue = Queue::<u8, 4>::new();
        queue.append(1).unwrap();
        queue.append(2).unwrap();
        let mut flushed = std::vec::Vec::new();
        queue.flush(|i| flushed.push(i));
        assert_eq!(flushed, [1, 2]);
        assert!(queue.is_empty());
        assert_eq!(queue.remove(), None);
    }

    #[test]
    fn size_matches_reachable_items() {
        let mut rng = StdRng::seed_from_u64(0x802154);
        let mut queue = Queue::<u16, 16>::new();
        let mut model = std::collections::VecDeque::new();

        for step in 0..2_000u16 {
            match rng.gen_range(0..3) {
                0 | 1 => {
                    if queue.append(step).is_ok() {
                        model.push_back(step);
                    } else {
                        assert_eq!(model.len(), 16);
                    }
                }
                _ => {
                    if rng.gen_bool(0.5) {
                        assert_eq!(queue.remove(), model.pop_front());
                    } else {
                        let wanted = model.get(rng.gen_range(0..model.len().max(1))).copied();
                        if let Some(wanted) = wanted {
                            assert_eq!(queue.remove_matching(|i| *i == wanted), Some(wanted));
                            model.retain(|i| *i != wanted);
                        } else {
                            assert_eq!(queue.remove_matching(|_| true), None);
                        }
                    }
                }
            }

            assert_eq!(queue.len(), queue.iter().count());
            assert!(queue.iter().copied().eq(model.iter().copied()));
        }
    }
}
