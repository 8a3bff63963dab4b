//! Maps requested stack names to catalog ids.

use std::collections::BTreeMap;

use crate::errors::AppError;
use crate::models::{RequestedStack, ResolvedStack, Stack};

/// Distinct stack names requested, each with its main/secondary flag.
#[derive(Debug, Clone, Default)]
pub struct StackSelection {
    by_name: BTreeMap<String, bool>,
}

impl StackSelection {
    /// Fails with `DuplicateTag` if a name is requested twice.
    pub fn from_requested(requested: &[RequestedStack]) -> Result<Self, AppError> {
        let mut by_name = BTreeMap::new();
        for stack in requested {
            if by_name.insert(stack.name.clone(), stack.is_main).is_some() {
                return Err(AppError::DuplicateTag(stack.name.clone()));
            }
        }
        Ok(Self { by_name })
    }

    /// Names to look up in one batch query.
    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Pair the catalog rows found for `names()` with the requested flags.
    ///
    /// The catalog must return exactly one row per distinct name.
    pub fn resolve(&self, catalog: &[Stack]) -> Result<Vec<ResolvedStack>, AppError> {
        let unknown = || AppError::UnknownTag {
            requested: self.by_name.len(),
            resolved: catalog.len(),
        };

        if catalog.len() != self.by_name.len() {
            return Err(unknown());
        }

        let mut resolved = catalog
            .iter()
            .map(|stack| {
                self.by_name
                    .get(&stack.name)
                    .map(|is_main| ResolvedStack {
                        id: stack.id,
                        is_main: *is_main,
                    })
                    .ok_or_else(unknown)
            })
            .collect::<Result<Vec<_>, _>>()?;
        resolved.sort();
        Ok(resolved)
    }
}
