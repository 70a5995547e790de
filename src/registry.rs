// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Named-icon overrides registered by the host application.
//!
//! Values are URLs or inline SVG data URLs; the resolver consults the
//! registry before falling back to the asset path convention. Clones share
//! the same underlying map so a single registry can be handed to every
//! resolver in the process.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;

/// Shared name → URL map.
#[derive(Debug, Clone, Default,)]
pub struct IconRegistry
{
    icons: Arc<RwLock<HashMap<String, String,>,>,>,
}

impl IconRegistry
{
    /// Creates an empty registry.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Registers every `(name, url)` pair, replacing earlier entries.
    ///
    /// # Example
    ///
    /// ```
    /// use pine_icons::IconRegistry;
    ///
    /// let registry = IconRegistry::new();
    /// registry.add_icons([("logo", "/brand/logo.svg",)],);
    /// assert_eq!(registry.get("logo",).as_deref(), Some("/brand/logo.svg"));
    /// ```
    pub fn add_icons<I, K, V,>(&self, icons: I,)
    where
        I: IntoIterator<Item = (K, V,),>,
        K: Into<String,>,
        V: Into<String,>,
    {
        let mut map = self.icons.write().unwrap_or_else(PoisonError::into_inner,);
        for (name, url,) in icons {
            let name = name.into();
            debug!("Registering icon override '{}'", name);
            map.insert(name, url.into(),);
        }
    }

    /// Looks up the override registered for `name`.
    pub fn get(&self, name: &str,) -> Option<String,>
    {
        self.icons.read().unwrap_or_else(PoisonError::into_inner,).get(name,).cloned()
    }

    /// Number of registered overrides.
    pub fn len(&self,) -> usize
    {
        self.icons.read().unwrap_or_else(PoisonError::into_inner,).len()
    }

    /// Returns `true` when nothing has been registered.
    pub fn is_empty(&self,) -> bool
    {
        self.len() == 0
    }

    /// Removes every override.
    pub fn clear(&self,)
    {
        self.icons.write().unwrap_or_else(PoisonError::into_inner,).clear();
    }
}
