//! Shared defaults.

/// Settings file used when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

/// Redis server used when the settings file has no `[redis]` section.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";

/// Page size for `keys` when `--limit` is not given.
pub const DEFAULT_KEYS_PAGE_SIZE: usize = 100;

/// Longest accepted `kvs.expiry`, ten years in seconds.
///
/// Redis rejects `PX` values that overflow when added to the current time.
pub const MAX_EXPIRY_SECS: u64 = 10 * 365 * 24 * 3600;
