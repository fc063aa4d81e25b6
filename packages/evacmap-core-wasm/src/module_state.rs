use lazy_static::lazy_static;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;

use crate::config::EvacConfig;
use crate::error::Result;
use crate::site_store::SiteStore;

// Module state to keep the decoded evacuation sites and settings.
// The user's position is not kept here; every query carries it.
pub struct ModuleState {
    pub config: EvacConfig,
    pub store: SiteStore,
}

// Create a global static instance of the module state
lazy_static! {
    static ref MODULE_STATE: ReentrantMutex<RefCell<ModuleState>> =
        ReentrantMutex::new(RefCell::new(ModuleState::new(EvacConfig::default())));
}

impl ModuleState {
    pub fn new(config: EvacConfig) -> Self {
        let store = SiteStore::new(config.max_cached_tiles);
        ModuleState { config, store }
    }

    pub fn with_mut<F, R>(f: F) -> R
    where
        F: FnOnce(&mut ModuleState) -> R,
    {
        let guard = MODULE_STATE.lock();
        let mut borrow = guard.borrow_mut();
        f(&mut borrow)
    }

    pub fn with<F, R>(f: F) -> R
    where
        F: FnOnce(&ModuleState) -> R,
    {
        let guard = MODULE_STATE.lock();
        let borrow = guard.borrow();
        f(&borrow)
    }

    /// Replace the configuration, resizing the store to the new limit.
    pub fn apply_config(&mut self, config: EvacConfig) -> Result<()> {
        config.validate()?;
        if !config.same_source(&self.config) {
            // Cached sites came from another source
            self.store.clear();
        }
        self.store.set_max_tiles(config.max_cached_tiles);
        self.config = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvacError;
    use crate::tiles::TileKey;

    #[test]
    fn config_change_resizes_store() {
        let mut state = ModuleState::new(EvacConfig::default());
        for x in 0..5 {
            state.store.store_tile(TileKey::new(6, x, 0), Vec::new());
        }
        let smaller = EvacConfig { max_cached_tiles: 3, ..EvacConfig::default() };
        state.apply_config(smaller).unwrap();
        assert_eq!(state.store.stats().tiles_count, 3);
        assert_eq!(state.store.stats().max_tiles, 3);
    }

    #[test]
    fn new_source_drops_cached_sites() {
        let mut state = ModuleState::new(EvacConfig::default());
        state.store.store_tile(TileKey::new(6, 0, 0), Vec::new());
        let other = EvacConfig {
            tile_url_template: "https://tiles.example/{z}/{x}/{y}.pbf".to_string(),
            ..EvacConfig::default()
        };
        state.apply_config(other).unwrap();
        assert_eq!(state.store.stats().tiles_count, 0);
    }

    #[test]
    fn invalid_config_leaves_state_untouched() {
        let mut state = ModuleState::new(EvacConfig::default());
        let broken = EvacConfig { max_cached_tiles: 0, ..EvacConfig::default() };
        assert!(matches!(state.apply_config(broken), Err(EvacError::InvalidInput(_))));
        assert_eq!(state.config, EvacConfig::default());
    }

    #[test]
    fn global_state_is_reachable() {
        let layer = ModuleState::with(|state| state.config.source_layer.clone());
        assert!(!layer.is_empty());
    }
}
