//! Session Type Registry
//!
//! Process-wide table of the types that may be persisted inside a session.
//! A type is stored together with its tag so that a value written as one
//! type is never read back as another.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::error::AppError;

#[derive(Default)]
struct Registry {
    by_type: HashMap<TypeId, &'static str>,
    by_tag: HashMap<&'static str, TypeId>,
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::default()));

/// Register `T` under `tag`.
///
/// Registering the same type under the same tag again is a no-op, so this
/// may run on every startup within one process.
///
/// # Errors
///
/// Returns `AppError::RegistrationConflict` if `T` already has a different
/// tag, or if `tag` is already taken by another type.
pub fn register<T: 'static>(tag: &'static str) -> Result<(), AppError> {
    let type_id = TypeId::of::<T>();
    let mut registry = REGISTRY.write();

    match (registry.by_type.get(&type_id), registry.by_tag.get(tag)) {
        (Some(existing), _) if *existing == tag => return Ok(()),
        (Some(existing), _) => {
            return Err(AppError::RegistrationConflict(format!(
                "{} is already registered as {:?}",
                type_name::<T>(),
                existing
            )));
        }
        (None, Some(_)) => {
            return Err(AppError::RegistrationConflict(format!(
                "tag {:?} is already used by another type",
                tag
            )));
        }
        (None, None) => {}
    }

    registry.by_type.insert(type_id, tag);
    registry.by_tag.insert(tag, type_id);
    tracing::debug!(tag, type_name = type_name::<T>(), "Registered session type");

    Ok(())
}

/// Tag registered for `T`, if any.
pub fn tag_of<T: 'static>() -> Option<&'static str> {
    REGISTRY.read().by_type.get(&TypeId::of::<T>()).copied()
}
