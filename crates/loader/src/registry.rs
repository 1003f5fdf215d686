use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, info};

use crate::id::ModuleId;
use crate::module::{FeatureModule, ModuleError};

/// Builds a panel singleton. Run at most once per module per process.
pub type ModuleFactory = Box<dyn Fn() -> Result<Box<dyn FeatureModule>, ModuleError>>;

/// A constructed panel singleton plus its lifecycle bookkeeping.
/// 已建構的面板單例與其生命週期紀錄。
pub struct LoadedModule {
    pub module: Box<dyn FeatureModule>,
    /// Set by the driver after a successful initialize; cleared when a
    /// retry becomes necessary.
    pub initialized: bool,
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("module", &self.module.id())
            .field("initialized", &self.initialized)
            .finish()
    }
}

/// Typed registry replacing the original's string-keyed global namespace.
/// Attachment is idempotent: a second `ensure_loaded` for the same module
/// resolves immediately without re-running the factory.
/// 型別化登錄表，取代原本以字串為鍵的全域命名空間。掛載具冪等性：同一模組
/// 的第二次 `ensure_loaded` 會立即回傳，不會重新執行工廠函式。
#[derive(Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<ModuleId, ModuleFactory>,
    loaded: BTreeMap<ModuleId, LoadedModule>,
    attached: BTreeSet<&'static str>,
    factory_runs: BTreeMap<ModuleId, u32>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the factory for a module. Each module gets exactly one.
    pub fn register(
        &mut self,
        id: ModuleId,
        factory: ModuleFactory,
    ) -> Result<(), LoaderError> {
        if self.factories.contains_key(&id) {
            return Err(LoaderError::AlreadyRegistered(id));
        }
        self.factories.insert(id, factory);
        Ok(())
    }

    /// Ensures the module's singleton exists, constructing it on first use.
    /// A factory failure leaves no load record, so a manual retry runs the
    /// factory again; the loader itself never retries.
    pub fn ensure_loaded(&mut self, id: ModuleId) -> Result<&mut LoadedModule, LoaderError> {
        if self.attached.contains(id.key()) {
            debug!(module = %id, "module already attached");
            return Ok(self
                .loaded
                .get_mut(&id)
                .expect("attached module must be loaded"));
        }

        let factory = self
            .factories
            .get(&id)
            .ok_or(LoaderError::NotRegistered(id))?;
        *self.factory_runs.entry(id).or_insert(0) += 1;
        let module = factory().map_err(|source| LoaderError::Factory { id, source })?;
        info!(module = %id, "module singleton constructed");

        self.attached.insert(id.key());
        self.loaded.insert(
            id,
            LoadedModule {
                module,
                initialized: false,
            },
        );
        Ok(self.loaded.get_mut(&id).expect("just inserted"))
    }

    /// Whether a load record exists for the module.
    pub fn is_attached(&self, id: ModuleId) -> bool {
        self.attached.contains(id.key())
    }

    /// How many times the module's factory has run (for tests and
    /// diagnostics; 1 after any number of successful loads).
    pub fn factory_runs(&self, id: ModuleId) -> u32 {
        self.factory_runs.get(&id).copied().unwrap_or(0)
    }

    pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut LoadedModule> {
        self.loaded.get_mut(&id)
    }

    pub fn attached_modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.loaded.keys().copied()
    }
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("module {0} already has a registered factory")]
    AlreadyRegistered(ModuleId),
    #[error("no factory registered for module {0}")]
    NotRegistered(ModuleId),
    #[error("factory for module {id} failed")]
    Factory {
        id: ModuleId,
        #[source]
        source: ModuleError,
    },
}
