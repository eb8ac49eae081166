//! Startup checks.
//!
//! The entry point runs an explicit, ordered list of checks after settings
//! are loaded and before anything touches the store. Each check either
//! succeeds, possibly binding resources into the [`StartupContext`], or
//! returns a [`StartupError`] that stops startup.
//!
//! ```ignore
//! let settings = Settings::load_from("settings.toml")?;
//! let ctx = StartupChecks::default_checks().run(&settings, StartupContext::new())?;
//! let kvs = ctx.into_kvs()?.create();
//! ```

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::constants::MAX_EXPIRY_SECS;
use crate::kvs::{self, BackendKind, KvsFactory, MemoryTable, RedisPool};

/// Fatal configuration problems found at startup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StartupError {
    /// No `[kvs]` section in the settings.
    #[error(
        "No KVS configured. Please set kvs.type in the settings file.\n\
         Supported types: {valid}"
    )]
    MissingKvs { valid: String },

    /// `kvs.type` names no known backend.
    #[error("Unknown KVS type: {found}\nSupported types: {valid}")]
    UnknownKvsType { found: String, valid: String },

    /// `redis_ephemeral` without a usable expiry.
    #[error("kvs.type = \"redis_ephemeral\" requires kvs.expiry (a positive number of seconds)")]
    MissingExpiry,

    /// `kvs.expiry` is longer than Redis can accept.
    #[error("kvs.expiry of {secs}s is too long (at most {max_secs}s)")]
    ExpiryTooLong { secs: u64, max_secs: u64 },

    /// The Redis URL could not be parsed.
    #[error("Invalid redis.url '{url}': {source}")]
    InvalidRedisUrl {
        url: String,
        #[source]
        source: kvs::Error,
    },

    /// The checks ran but none selected a KVS backend.
    #[error("No startup check selected a KVS backend")]
    KvsNotBound,
}

/// A failed check, with the name of the check that failed.
#[derive(Debug, thiserror::Error)]
#[error("startup check '{check}' failed: {error}")]
pub struct StartupFailure {
    pub check: &'static str,
    #[source]
    pub error: StartupError,
}

/// Resources produced by the startup checks.
///
/// The in-memory table is created up front so every backend bound from
/// this context, including by a re-run of the checks, shares it. Redis
/// pools are reused for as long as the URL does not change.
#[derive(Debug, Default)]
pub struct StartupContext {
    memory: MemoryTable,
    redis: Option<(String, RedisPool)>,
    kvs: Option<KvsFactory>,
}

impl StartupContext {
    /// Creates a context with a fresh in-memory table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context around an existing in-memory table.
    pub fn with_memory_table(memory: MemoryTable) -> Self {
        Self {
            memory,
            ..Self::default()
        }
    }

    /// The table in-memory backends are bound to.
    pub fn memory_table(&self) -> &MemoryTable {
        &self.memory
    }

    /// The selected KVS backend, once bound.
    pub fn kvs(&self) -> Option<&KvsFactory> {
        self.kvs.as_ref()
    }

    /// Consumes the context, returning the selected KVS backend.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::KvsNotBound`] if no check selected one.
    pub fn into_kvs(self) -> Result<KvsFactory, StartupError> {
        self.kvs.ok_or(StartupError::KvsNotBound)
    }

    /// Returns the pool for `url`, creating it if the URL changed.
    fn redis_pool(&mut self, url: &str) -> Result<RedisPool, StartupError> {
        if let Some((current, pool)) = &self.redis
            && current == url
        {
            return Ok(pool.clone());
        }

        let pool = RedisPool::open(url).map_err(|source| StartupError::InvalidRedisUrl {
            url: url.to_string(),
            source,
        })?;
        self.redis = Some((url.to_string(), pool.clone()));
        Ok(pool)
    }
}

/// A single initialization check.
pub trait StartupCheck: Send + Sync {
    /// Name shown when the check fails.
    fn name(&self) -> &'static str;

    /// Runs the check. Must be safe to run more than once.
    ///
    /// # Errors
    ///
    /// Returns a [`StartupError`] describing the configuration problem.
    fn run(&self, settings: &Settings, ctx: &mut StartupContext) -> Result<(), StartupError>;
}

/// Logs non-fatal settings warnings. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct SettingsCheck;

impl StartupCheck for SettingsCheck {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn run(&self, settings: &Settings, _ctx: &mut StartupContext) -> Result<(), StartupError> {
        for warning in settings.validate().warnings {
            warn!("{warning}");
        }
        Ok(())
    }
}

/// Selects the KVS backend from `kvs.type`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KvsCheck;

impl StartupCheck for KvsCheck {
    fn name(&self) -> &'static str {
        "kvs"
    }

    fn run(&self, settings: &Settings, ctx: &mut StartupContext) -> Result<(), StartupError> {
        let Some(kvs) = &settings.kvs else {
            return Err(StartupError::MissingKvs {
                valid: BackendKind::valid_names(),
            });
        };

        let kind = kvs
            .kind
            .parse::<BackendKind>()
            .map_err(|err| StartupError::UnknownKvsType {
                found: err.0,
                valid: BackendKind::valid_names(),
            })?;

        let factory = match kind {
            BackendKind::Stub => KvsFactory::memory(ctx.memory.clone()),
            BackendKind::RedisEphemeral => {
                let expiry = kvs
                    .expiry_duration()
                    .filter(|expiry| !expiry.is_zero())
                    .ok_or(StartupError::MissingExpiry)?;
                if expiry.as_secs() > MAX_EXPIRY_SECS {
                    return Err(StartupError::ExpiryTooLong {
                        secs: expiry.as_secs(),
                        max_secs: MAX_EXPIRY_SECS,
                    });
                }
                let pool = ctx.redis_pool(&settings.redis_or_default().url)?;
                KvsFactory::redis_ephemeral(pool, expiry)
            },
            BackendKind::Redis => {
                let pool = ctx.redis_pool(&settings.redis_or_default().url)?;
                KvsFactory::redis(pool)
            },
        };

        info!(kvs = %kind, expiry_secs = ?factory.expiry().map(|e| e.as_secs()), "KVS backend selected");
        ctx.kvs = Some(factory);
        Ok(())
    }
}

/// Ordered list of startup checks.
pub struct StartupChecks {
    checks: Vec<Box<dyn StartupCheck>>,
}

impl StartupChecks {
    /// An empty list.
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// The checks the binary runs: settings warnings, then KVS selection.
    pub fn default_checks() -> Self {
        Self::new().with(SettingsCheck).with(KvsCheck)
    }

    /// Appends a check to the end of the list.
    #[must_use]
    pub fn with(mut self, check: impl StartupCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Names of the checks, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.name()).collect()
    }

    /// Runs every check in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first failing check and its error.
    pub fn run(
        &self,
        settings: &Settings,
        mut ctx: StartupContext,
    ) -> Result<StartupContext, StartupFailure> {
        for check in &self.checks {
            debug!(check = check.name(), "Running startup check");
            check
                .run(settings, &mut ctx)
                .map_err(|error| StartupFailure {
                    check: check.name(),
                    error,
                })?;
        }
        Ok(ctx)
    }
}

impl Default for StartupChecks {
    fn default() -> Self {
        Self::default_checks()
    }
}

/// Runs the default checks against `settings` and returns the selected
/// backend.
///
/// # Errors
///
/// Returns the first failing check.
pub fn init(settings: &Settings) -> Result<KvsFactory, StartupFailure> {
    let ctx = StartupChecks::default_checks().run(settings, StartupContext::new())?;
    ctx.into_kvs().map_err(|error| StartupFailure {
        check: KvsCheck.name(),
        error,
    })
}
