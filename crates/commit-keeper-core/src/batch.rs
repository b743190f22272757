//! # Batch Scopes
//!
//! Entities link to each other through local reference ids (`$repo`,
//! `$commit`) that the knowledge store resolves in submission order. This
//! module makes that resolution explicit:
//!
//! - A [`BatchScope`] is opened once per inbound event and mints
//!   [`LocalRef`]s tagged with its [`ScopeId`].
//! - An [`EntityBatch`] is started from a scope and only accepts an entity
//!   when every reference it makes was declared earlier in the batch, or in
//!   a batch of the same scope that was already committed.
//! - After the sink accepts a batch, [`BatchScope::commit`] records its
//!   declarations so later batches in the window may reference them.
//!
//! References from another scope are rejected, which keeps concurrent
//! invocations isolated even though they use the same symbolic names.

use crate::entities::Entity;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Identity of one batch window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(Uuid);

impl ScopeId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbolic entity reference, valid only inside the scope that minted it.
///
/// Serializes as `$<name>`, the form the knowledge store expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalRef {
    scope: ScopeId,
    name: String,
}

impl LocalRef {
    /// Symbolic name without the `$` prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scope this reference belongs to
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Wire form, e.g. `$commit`
    pub fn as_symbol(&self) -> String {
        format!("${}", self.name)
    }
}

impl fmt::Display for LocalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.name)
    }
}

impl Serialize for LocalRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.as_symbol())
    }
}

// ============================================================================
// Scope
// ============================================================================

/// Batch window for one inbound event
#[derive(Debug, Clone)]
pub struct BatchScope {
    id: ScopeId,
    committed: BTreeSet<String>,
}

impl BatchScope {
    /// Open a fresh scope with no committed declarations
    pub fn new() -> Self {
        Self {
            id: ScopeId::new(),
            committed: BTreeSet::new(),
        }
    }

    /// Identity of this scope
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Mint a reference in this scope.
    ///
    /// Minting does not declare anything; the reference becomes resolvable
    /// once an entity declaring it is pushed to a batch.
    pub fn local_ref(&self, name: &str) -> LocalRef {
        LocalRef {
            scope: self.id,
            name: name.trim_start_matches('$').to_string(),
        }
    }

    /// Whether a committed batch of this scope declared `reference`
    pub fn is_committed(&self, reference: &LocalRef) -> bool {
        reference.scope == self.id && self.committed.contains(&reference.name)
    }

    /// Start a batch that can reference everything committed so far
    pub fn begin(&self) -> EntityBatch {
        EntityBatch {
            scope: self.id,
            entities: Vec::new(),
            resolvable: self.committed.clone(),
        }
    }

    /// Record the declarations of a batch the sink has accepted
    ///
    /// # Errors
    ///
    /// Returns `BatchError::ScopeMismatch` if the batch was started from a
    /// different scope.
    pub fn commit(&mut self, batch: &EntityBatch) -> Result<(), BatchError> {
        if batch.scope != self.id {
            return Err(BatchError::ScopeMismatch {
                batch: batch.scope,
                scope: self.id,
            });
        }

        for declared in batch.declared() {
            self.committed.insert(declared.name.clone());
        }

        Ok(())
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Ordered, reference-checked sequence of entities submitted in one call
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBatch {
    scope: ScopeId,
    entities: Vec<Entity>,
    resolvable: BTreeSet<String>,
}

impl EntityBatch {
    /// Append an entity after checking its references
    ///
    /// # Errors
    ///
    /// - `ForeignReference` - a reference was minted by another scope
    /// - `UnresolvedReference` - a referenced id is not declared earlier
    /// - `DuplicateDeclaration` - the entity re-declares a resolvable id
    pub fn push(&mut self, entity: impl Into<Entity>) -> Result<&mut Self, BatchError> {
        let entity = entity.into();

        for reference in entity.references() {
            self.check_scope(reference)?;
            if !self.resolvable.contains(&reference.name) {
                return Err(BatchError::UnresolvedReference {
                    reference: reference.as_symbol(),
                });
            }
        }

        if let Some(declared) = entity.declares() {
            self.check_scope(declared)?;
            if !self.resolvable.insert(declared.name.clone()) {
                return Err(BatchError::DuplicateDeclaration {
                    reference: declared.as_symbol(),
                });
            }
        }

        self.entities.push(entity);
        Ok(self)
    }

    fn check_scope(&self, reference: &LocalRef) -> Result<(), BatchError> {
        if reference.scope != self.scope {
            return Err(BatchError::ForeignReference {
                reference: reference.as_symbol(),
            });
        }
        Ok(())
    }

    /// Entities in submission order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// References declared by entities of this batch, in order
    pub fn declared(&self) -> impl Iterator<Item = &LocalRef> {
        self.entities.iter().filter_map(Entity::declares)
    }

    /// Scope the batch was started from
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the batch has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Serialize for EntityBatch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.entities.serialize(serializer)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Violations of the local-reference ordering rules
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("Reference {reference} belongs to a different batch scope")]
    ForeignReference { reference: String },

    #[error("Reference {reference} is not declared earlier in this batch window")]
    UnresolvedReference { reference: String },

    #[error("Reference {reference} is already declared in this batch window")]
    DuplicateDeclaration { reference: String },

    #[error("Batch from scope {batch} cannot be committed to scope {scope}")]
    ScopeMismatch { batch: ScopeId, scope: ScopeId },
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
