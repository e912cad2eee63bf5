pub mod entity_cache;

pub use entity_cache::EntityCacheService;
