//! Keyed storage for players and board entities

use crate::error::RefKind;
use crate::{BattleLogError, Result};
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;

/// Base trait for everything the mirror tracks by server id
pub trait GameEntity {
    type Id: Copy + Eq + Hash + fmt::Debug + Into<i64>;

    /// Reported in invalid-reference errors
    const KIND: RefKind;

    fn id(&self) -> Self::Id;
    fn name(&self) -> &str;
}

/// Id-keyed storage for one kind of entity
///
/// Lookups of ids the server never introduced fail with
/// [`BattleLogError::InvalidReference`] instead of producing a placeholder.
#[derive(Debug, Clone)]
pub struct EntityStore<T: GameEntity> {
    entities: FxHashMap<T::Id, T>,
}

impl<T: GameEntity> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
        }
    }

    /// Insert or replace an entity under its own id
    pub fn insert(&mut self, entity: T) -> Option<T> {
        self.entities.insert(entity.id(), entity)
    }

    /// Get an entity, naming `action` in the error if it is unknown
    pub fn get(&self, id: T::Id, action: &str) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or_else(|| invalid_reference::<T>(id, action))
    }

    pub fn get_mut(&mut self, id: T::Id, action: &str) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or_else(|| invalid_reference::<T>(id, action))
    }

    /// Remove an entity that must exist
    pub fn take(&mut self, id: T::Id, action: &str) -> Result<T> {
        self.entities
            .remove(&id)
            .ok_or_else(|| invalid_reference::<T>(id, action))
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T: GameEntity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_reference<T: GameEntity>(id: T::Id, action: &str) -> BattleLogError {
    BattleLogError::InvalidReference {
        action: action.to_string(),
        kind: T::KIND,
        id: id.into(),
    }
}
