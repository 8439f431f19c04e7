//! Lexical frames: identifier bindings chained by a parent pointer.
//!
//! Frames are shared by closures and form a DAG, never a cycle:
//! [`Frame::add_root_frame`] copies the caller chain instead of re-parenting
//! into a closure's capture, so reference counting is enough to reclaim them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::eval::value::Value;

pub struct Frame {
    bindings: RefCell<BTreeMap<String, Value>>,
    parent: Option<Rc<Frame>>,
}

// A closure bound inside the frame it captures makes the chain
// self-referential, so debug output only shows binding names.
impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("bindings", &self.bindings.borrow().keys().collect::<Vec<_>>())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl Frame {
    pub fn new(parent: Option<Rc<Frame>>) -> Rc<Frame> {
        Rc::new(Frame {
            bindings: RefCell::new(BTreeMap::new()),
            parent,
        })
    }

    /// Looks `name` up in this frame, then outward through the parents.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    pub fn insert(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Clones this chain link by link and grafts `root` below its bottom,
    /// so the capture stays visible without mutating the caller's frames.
    pub fn add_root_frame(self: &Rc<Self>, root: Option<Rc<Frame>>) -> Rc<Frame> {
        let parent = match &self.parent {
            Some(parent) => Some(parent.add_root_frame(root)),
            None => root,
        };
        Rc::new(Frame {
            bindings: RefCell::new(self.bindings.borrow().clone()),
            parent,
        })
    }
}
