//! Context stack for scope tracking during construction
//!
//! The stack holds the chain of currently open elements. Nodes created while
//! a scope is open are attached as children of the top element; with an empty
//! stack they stay parentless.
//!
//! # Sharing
//!
//! [`ContextStack`] is a cheap handle: clones share the same underlying stack.
//! Factories keep a clone so that they attach into the stack they were
//! resolved against. A stack must be driven by one construction flow at a
//! time; independent documents should each use their own stack (see
//! [`ContextStack::new`]). [`ContextStack::shared`] is a per-thread default for
//! strictly sequential top-level builds.
//!
//! # Scoped acquisition
//!
//! [`ContextStack::enter`] returns a [`ScopeGuard`] that pops the pushed
//! element when dropped, so early returns and `?` cannot leave a scope open.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config;
use crate::error::{BuildError, Result};
use crate::tree::{Element, Node};

thread_local! {
    static SHARED: ContextStack = ContextStack::new();
}

/// Stack of open scopes.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    /// Open elements (last is the current parent)
    stack: Rc<RefCell<Vec<Element>>>,
}

impl ContextStack {
    /// Create a new, empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default stack of the current thread.
    ///
    /// Only safe for sequential, non-nested top-level builds.
    pub fn shared() -> Self {
        SHARED.with(Clone::clone)
    }

    /// Attach `node` as the last child of the top element.
    ///
    /// Does nothing when the stack is empty. A node that contains the top
    /// element is not attached, since that would create a cycle.
    pub fn add(&self, node: &Node) {
        let stack = self.stack.borrow();
        let Some(top) = stack.last() else {
            return;
        };

        if let Node::Element(element) = node {
            if element.contains(top) {
                tracing::warn!(
                    tag = %element.tag(),
                    parent = %top.tag(),
                    "Refusing to attach an element to its own descendant"
                );
                return;
            }
        }
        top.push_child(node.clone());
    }

    /// Push an element as the new top.
    ///
    /// # Errors
    /// `ScopeDepthExceeded` past [`config::MAX_SCOPE_DEPTH`] open scopes.
    pub fn push(&self, element: Element) -> Result<()> {
        let mut stack = self.stack.borrow_mut();
        if stack.len() >= config::MAX_SCOPE_DEPTH {
            tracing::warn!(
                max = config::MAX_SCOPE_DEPTH,
                tag = %element.tag(),
                "Maximum scope depth exceeded"
            );
            return Err(BuildError::ScopeDepthExceeded {
                max: config::MAX_SCOPE_DEPTH,
            });
        }
        tracing::trace!(tag = %element.tag(), depth = stack.len() + 1, "Enter scope");
        stack.push(element);
        Ok(())
    }

    /// Remove the top element.
    ///
    /// # Errors
    /// `EmptyScope` when no scope is open.
    pub fn pop(&self) -> Result<Element> {
        let mut stack = self.stack.borrow_mut();
        let element = stack.pop().ok_or(BuildError::EmptyScope)?;
        tracing::trace!(tag = %element.tag(), depth = stack.len(), "Exit scope");
        Ok(element)
    }

    /// Push `element` and return a guard that pops it again.
    pub fn enter(&self, element: Element) -> Result<ScopeGuard> {
        self.push(element.clone())?;
        Ok(ScopeGuard {
            context: self.clone(),
            element,
            active: true,
        })
    }

    /// The current parent, if any scope is open.
    pub fn top(&self) -> Option<Element> {
        self.stack.borrow().last().cloned()
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Whether no scope is open.
    pub fn is_empty(&self) -> bool {
        self.stack.borrow().is_empty()
    }

    /// Whether both handles share one stack.
    pub fn ptr_eq(&self, other: &ContextStack) -> bool {
        Rc::ptr_eq(&self.stack, &other.stack)
    }

    /// Drop open scopes above `depth`, returning how many were dropped.
    pub(crate) fn truncate(&self, depth: usize) -> usize {
        let mut stack = self.stack.borrow_mut();
        let dropped = stack.len().saturating_sub(depth);
        stack.truncate(depth);
        dropped
    }
}

/// An open scope. Pops its element from the stack when dropped.
#[must_use = "the scope closes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScopeGuard {
    context: ContextStack,
    element: Element,
    active: bool,
}

impl ScopeGuard {
    /// The element this scope attaches children to.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Close the scope explicitly.
    ///
    /// # Errors
    /// `EmptyScope` if the stack was emptied while the scope was open.
    pub fn exit(mut self) -> Result<()> {
        self.active = false;
        self.release()
    }

    fn release(&self) -> Result<()> {
        let popped = self.context.pop()?;
        if !popped.ptr_eq(&self.element) {
            tracing::warn!(
                expected = %self.element.tag(),
                popped = %popped.tag(),
                "Scope closed out of order"
            );
        }
        Ok(())
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            if let Err(err) = self.release() {
                tracing::warn!(error = %err, tag = %self.element.tag(), "Scope guard release failed");
            }
        }
    }
}
