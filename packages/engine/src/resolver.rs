//! Namespace resolver: identifiers to factories
//!
//! Construction logic asks a [`Namespace`] for factories by name instead of
//! relying on ambient lookups. Resolution follows a fixed order:
//!
//! 1. **Registrations** - pre-registered identifiers (`Comment`, aliases added
//!    with [`Namespace::register_element`]) resolve regardless of policy
//! 2. **Reserved prefix** - identifiers starting with `__` always fail
//! 3. **Allow-list** - when non-empty, only listed identifiers resolve
//! 4. **Deny-list** - otherwise everything resolves except listed identifiers
//! 5. **Name check** - the identifier must be a valid XML name
//!
//! A namespace also carries the session's named bindings. By convention the
//! outermost node is bound as `root`.

use std::collections::{HashMap, HashSet};

use crate::config::{self, COMMENT_IDENTIFIER, ROOT_BINDING};
use crate::context::ContextStack;
use crate::error::{BuildError, Result};
use crate::factory::{CommentFactory, ElementFactory, Factory};
use crate::tree::Node;

/// Allow/deny rules deciding which identifiers become element factories.
///
/// A non-empty allow-list makes the policy closed-world and the deny-list is
/// ignored. The default policy is open-world with an empty deny-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPolicy {
    allow: HashSet<String>,
    deny: HashSet<String>,
}

impl ResolutionPolicy {
    /// Open-world policy without a deny-list.
    pub fn open() -> Self {
        Self::default()
    }

    /// Closed-world policy: only `identifiers` resolve.
    pub fn allow_only(identifiers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::default().with_allow(identifiers)
    }

    /// Open-world policy that blocks `identifiers`.
    pub fn denying(identifiers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::default().with_deny(identifiers)
    }

    /// Add identifiers to the allow-list.
    pub fn with_allow(mut self, identifiers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allow.extend(identifiers.into_iter().map(Into::into));
        self
    }

    /// Add identifiers to the deny-list.
    pub fn with_deny(mut self, identifiers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.deny.extend(identifiers.into_iter().map(Into::into));
        self
    }

    /// Whether the allow-list is in effect.
    pub fn is_closed(&self) -> bool {
        !self.allow.is_empty()
    }

    /// Check an identifier against the reserved prefix and the lists.
    pub fn check(&self, identifier: &str) -> Result<()> {
        if config::is_reserved(identifier) {
            return Err(BuildError::ReservedName(identifier.to_string()));
        }
        if self.is_closed() {
            if self.allow.contains(identifier) {
                Ok(())
            } else {
                Err(BuildError::UnresolvedName(identifier.to_string()))
            }
        } else if self.deny.contains(identifier) {
            Err(BuildError::BlockedName(identifier.to_string()))
        } else {
            Ok(())
        }
    }
}

/// What a registered identifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Registration {
    Comment,
    Element(String),
}

/// Resolver and binding table for one build session.
#[derive(Debug)]
pub struct Namespace {
    context: ContextStack,
    policy: ResolutionPolicy,
    registrations: HashMap<String, Registration>,
    bindings: HashMap<String, Node>,
}

impl Namespace {
    /// Create a namespace resolving into `context` under `policy`.
    ///
    /// `Comment` is pre-registered.
    pub fn new(context: ContextStack, policy: ResolutionPolicy) -> Self {
        let mut registrations = HashMap::new();
        registrations.insert(COMMENT_IDENTIFIER.to_string(), Registration::Comment);
        Self {
            context,
            policy,
            registrations,
            bindings: HashMap::new(),
        }
    }

    /// The stack factories from this namespace attach into.
    pub fn context(&self) -> &ContextStack {
        &self.context
    }

    /// The active resolution policy.
    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Resolve an identifier to a factory.
    ///
    /// # Errors
    /// `ReservedName`, `UnresolvedName`, `BlockedName` or `InvalidName`, in
    /// the order described in the module documentation.
    pub fn resolve(&self, identifier: &str) -> Result<Factory> {
        if let Some(registration) = self.registrations.get(identifier) {
            tracing::trace!(identifier, "Resolved registered identifier");
            return Ok(match registration {
                Registration::Comment => Factory::Comment(CommentFactory::new(self.context.clone())),
                Registration::Element(tag) => {
                    Factory::Element(ElementFactory::new(tag.clone(), self.context.clone()))
                }
            });
        }

        if let Err(err) = self.policy.check(identifier) {
            tracing::debug!(identifier, error = %err, "Identifier rejected by policy");
            return Err(err);
        }
        config::validate_name(identifier)?;

        tracing::trace!(identifier, "Resolved element factory");
        Ok(Factory::Element(ElementFactory::new(
            identifier,
            self.context.clone(),
        )))
    }

    /// Resolve an identifier that must name an element.
    pub fn element(&self, identifier: &str) -> Result<ElementFactory> {
        self.resolve(identifier)?.into_element()
    }

    /// The comment factory.
    pub fn comment(&self) -> Result<CommentFactory> {
        self.resolve(COMMENT_IDENTIFIER)?.into_comment()
    }

    /// Register `identifier` as an alias for `tag`.
    ///
    /// Registered identifiers bypass the policy, which makes this the way to
    /// reach tags that are reserved or blocked. The tag itself must be a
    /// valid XML name.
    pub fn register_element(
        &mut self,
        identifier: impl Into<String>,
        tag: impl Into<String>,
    ) -> Result<()> {
        let tag = tag.into();
        config::validate_name(&tag)?;
        self.registrations
            .insert(identifier.into(), Registration::Element(tag));
        Ok(())
    }

    /// Remove a registration. Returns whether one existed.
    pub fn unregister(&mut self, identifier: &str) -> bool {
        self.registrations.remove(identifier).is_some()
    }

    /// Whether `identifier` is registered.
    pub fn is_registered(&self, identifier: &str) -> bool {
        self.registrations.contains_key(identifier)
    }

    /// All registered identifiers.
    pub fn registered(&self) -> HashSet<&str> {
        self.registrations.keys().map(String::as_str).collect()
    }

    /// Bind a node under `name`, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, node: impl Into<Node>) {
        self.bindings.insert(name.into(), node.into());
    }

    /// Bind the document's outermost node.
    pub fn bind_root(&mut self, node: impl Into<Node>) {
        self.bind(ROOT_BINDING, node);
    }

    /// Look up a binding.
    pub fn binding(&self, name: &str) -> Option<&Node> {
        self.bindings.get(name)
    }

    pub(crate) fn into_bindings(self) -> HashMap<String, Node> {
        self.bindings
    }
}
