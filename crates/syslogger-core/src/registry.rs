//! Registry of known producer pipes
//!
//! Entries live in an index arena and are linked in insertion order, so
//! removal from any position is O(1) and keeps the order of the rest.
//! Handles carry a generation: a handle to a removed entry never resolves
//! to whatever later reuses its slot.
//!
//! The registry is never empty. When the last named entry goes away a
//! placeholder entry with an empty name takes its place, and the next
//! `insert` fills the placeholder instead of appending.

use tokio::task::Id as WorkerId;

/// Stable reference to one registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    index: u32,
    generation: u32,
}

/// One tracked pipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeEntry {
    name: String,
    active: bool,
    worker: Option<WorkerId>,
}

impl PipeEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            worker: None,
        }
    }

    fn placeholder() -> Self {
        Self::new("")
    }

    /// File name of the pipe, unique within the registry
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the entry was confirmed by the current sweep (or is new)
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Task draining this pipe, once spawned
    pub fn worker(&self) -> Option<WorkerId> {
        self.worker
    }

    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug)]
struct Node {
    entry: PipeEntry,
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Insertion-ordered set of pipe entries
#[derive(Debug)]
pub struct PipeRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
}

impl PipeRegistry {
    /// New registry holding only the placeholder entry
    pub fn create() -> Self {
        let mut registry = Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
        };
        registry.ensure_placeholder();
        registry
    }

    /// Add `name`, reusing the placeholder if it is still unused.
    ///
    /// The returned entry is a member and active.
    pub fn insert(&mut self, name: &str) -> EntryHandle {
        debug_assert!(!name.is_empty(), "pipe names are never empty");

        if let Some(head) = self.head
            && let Some(node) = self.node_mut(head)
            && node.entry.is_placeholder()
        {
            node.entry = PipeEntry::new(name);
            return self.handle_of(head);
        }

        let index = self.push_back(PipeEntry::new(name));
        self.handle_of(index)
    }

    /// Mark `name` active if it is known. Returns whether it was known.
    pub fn mark_seen(&mut self, name: &str) -> bool {
        match self.find(name) {
            Some(index) => {
                if let Some(node) = self.node_mut(index) {
                    node.entry.active = true;
                }
                true
            }
            None => false,
        }
    }

    /// Start of a sweep: every entry must be confirmed again to survive.
    pub fn clear_all_active(&mut self) {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let Some(node) = self.node_mut(index) else {
                break;
            };
            node.entry.active = false;
            cursor = node.next;
        }
    }

    /// Drop every inactive named entry. Returns the removed entries.
    pub fn reap_inactive(&mut self) -> Vec<PipeEntry> {
        let mut reaped = Vec::new();
        let mut cursor = self.head;

        while let Some(index) = cursor {
            let Some(node) = self.node(index) else {
                break;
            };
            cursor = node.next;
            if !node.entry.active
                && !node.entry.is_placeholder()
                && let Some(entry) = self.unlink(index)
            {
                reaped.push(entry);
            }
        }

        self.ensure_placeholder();
        reaped
    }

    /// Remove the entry named `name`, if present.
    pub fn remove(&mut self, name: &str) -> Option<PipeEntry> {
        if name.is_empty() {
            return None;
        }
        let index = self.find(name)?;
        let entry = self.unlink(index);
        self.ensure_placeholder();
        entry
    }

    /// Release every entry. Returns how many named entries were dropped.
    pub fn destroy_all(&mut self) -> usize {
        let mut released = 0;
        // Unlink rather than clear so every slot's generation moves on
        while let Some(head) = self.head {
            match self.unlink(head) {
                Some(entry) if !entry.is_placeholder() => released += 1,
                Some(_) => {}
                None => break,
            }
        }
        self.ensure_placeholder();
        released
    }

    /// Record the worker spawned for an entry. Returns false if the handle
    /// no longer refers to a live entry.
    pub fn set_worker(&mut self, handle: EntryHandle, worker: WorkerId) -> bool {
        match self.resolve_mut(handle) {
            Some(entry) => {
                entry.worker = Some(worker);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, handle: EntryHandle) -> Option<&PipeEntry> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_ref().map(|n| &n.entry)
    }

    /// First entry in traversal order; the placeholder when nothing else is
    /// registered.
    pub fn head(&self) -> EntryHandle {
        // ensure_placeholder runs after every removal, so head is always set
        let index = self.head.unwrap_or_default();
        self.handle_of(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        !name.is_empty() && self.find(name).is_some()
    }

    /// Number of named entries (the placeholder is not counted)
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Named entries in insertion order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            registry: self,
            cursor: self.head,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(PipeEntry::name).collect()
    }

    fn find(&self, name: &str) -> Option<u32> {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = self.node(index)?;
            if node.entry.name == name {
                return Some(index);
            }
            cursor = node.next;
        }
        None
    }

    fn ensure_placeholder(&mut self) {
        if self.head.is_none() {
            self.push_back(PipeEntry::placeholder());
        }
    }

    fn push_back(&mut self, entry: PipeEntry) -> u32 {
        let node = Node {
            entry,
            prev: self.tail,
            next: None,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].node = Some(node);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                (self.slots.len() - 1) as u32
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.node_mut(tail) {
                    tail_node.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        index
    }

    fn unlink(&mut self, index: u32) -> Option<PipeEntry> {
        let slot = self.slots.get_mut(index as usize)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.node_mut(prev) {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.node_mut(next) {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        Some(node.entry)
    }

    fn handle_of(&self, index: u32) -> EntryHandle {
        let generation = self
            .slots
            .get(index as usize)
            .map(|s| s.generation)
            .unwrap_or_default();
        EntryHandle { index, generation }
    }

    fn resolve_mut(&mut self, handle: EntryHandle) -> Option<&mut PipeEntry> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_mut().map(|n| &mut n.entry)
    }

    fn node(&self, index: u32) -> Option<&Node> {
        self.slots.get(index as usize)?.node.as_ref()
    }

    fn node_mut(&mut self, index: u32) -> Option<&mut Node> {
        self.slots.get_mut(index as usize)?.node.as_mut()
    }
}

impl Default for PipeRegistry {
    fn default() -> Self {
        Self::create()
    }
}

/// Iterator over named entries in insertion order
pub struct Iter<'a> {
    registry: &'a PipeRegistry,
    cursor: Option<u32>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a PipeEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.registry.node(self.cursor?)?;
            self.cursor = node.next;
            if !node.entry.is_placeholder() {
                return Some(&node.entry);
            }
        }
    }
}
