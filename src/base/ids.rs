//! Arena handles for model elements.
//!
//! The model store hands out small copyable ids instead of references so
//! that grammars, packages, and resources can point at each other without
//! borrow-checker gymnastics. An id is only meaningful together with the
//! store (or resource set) that created it.

/// Identifies a grammar in a [`ModelStore`](crate::model::ModelStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrammarId(u32);

/// Identifies a metamodel package in a [`ModelStore`](crate::model::ModelStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(u32);

/// Identifies a resource in a [`ResourceSet`](crate::loader::ResourceSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u32);

macro_rules! impl_arena_id {
    ($name:ident) => {
        impl $name {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }

            /// Raw numeric value, stable for the lifetime of the owning store.
            pub fn to_raw(self) -> u32 {
                self.0
            }
        }
    };
}

impl_arena_id!(GrammarId);
impl_arena_id!(PackageId);
impl_arena_id!(ResourceId);
