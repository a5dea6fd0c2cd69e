use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::Limiter;
use crate::error::ConfigError;

/// An opaque string naming a rate-limit scope: a user, an IP, an API key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier(s.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds a fresh limiter for a key on first sight.
///
/// The factory is infallible by construction: a registry whose limiters
/// could fail to build would have to either silently retry or drop the
/// error on the lazy path, so such registries cannot be expressed at all.
/// Factories that don't care about the key just ignore it.
pub type LimiterFactory = Box<dyn Fn(&Identifier) -> Box<dyn Limiter> + Send + Sync>;

/// Dispatches admission decisions to one limiter per key.
///
/// Limiters are created lazily on first sight via the factory and live for
/// the life of the registry; there is no eviction. At most one limiter
/// ever exists per key, and the factory runs at most once per key.
///
/// # Example
///
/// ```rust
/// use gate_limit::{Limiter, Registry, TokenBucket};
///
/// let registry = Registry::new(Box::new(|_key| {
///     Box::new(TokenBucket::new(100, 10)) as Box<dyn Limiter>
/// }))
/// .expect("factory is infallible");
///
/// assert!(registry.allow("alice"));
/// assert!(registry.allow("bob"));
/// ```
pub struct Registry {
    limiters: Mutex<HashMap<Identifier, Box<dyn Limiter>>>,
    factory: LimiterFactory,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("limiters", &self.limiters)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an empty registry.
    ///
    /// # Errors
    ///
    /// Currently cannot fail; the `Result` keeps the construction error
    /// channel stable for factories gaining validation of their own.
    pub fn new(factory: LimiterFactory) -> Result<Self, ConfigError> {
        Ok(Self {
            limiters: Mutex::new(HashMap::new()),
            factory,
        })
    }

    /// Creates a registry with the given keys eagerly instantiated.
    ///
    /// # Errors
    ///
    /// Currently cannot fail; see [`Registry::new`].
    pub fn with_keys<I>(factory: LimiterFactory, keys: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        let mut limiters = HashMap::new();
        for key in keys {
            let key = key.into();
            let limiter = (factory)(&key);
            limiters.insert(key, limiter);
        }

        Ok(Self {
            limiters: Mutex::new(limiters),
            factory,
        })
    }

    /// Reports whether a request under `key` is allowed, creating the
    /// key's limiter on first sight.
    ///
    /// The registry lock is held across the inner `allow` call, so a
    /// key's limiter observes its requests in a single total order.
    pub fn allow(&self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        let mut limiters = self.limiters.lock();

        if let Some(limiter) = limiters.get(key) {
            return limiter.allow();
        }

        let key = Identifier::from(key);
        let limiter = (self.factory)(&key);
        let admitted = limiter.allow();
        limiters.insert(key, limiter);

        admitted
    }

    /// Number of keys with a live limiter.
    pub fn len(&self) -> usize {
        self.limiters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.lock().is_empty()
    }
}
