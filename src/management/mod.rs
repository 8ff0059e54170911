mod auth;
mod track_cache;

pub use auth::TokenManager;
pub use track_cache::CacheError;
pub use track_cache::TrackCacheManager;
