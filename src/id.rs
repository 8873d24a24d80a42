// Record id generation

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Source of "now" for id generation
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch
    fn now_secs(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// What to do when a freshly generated id is already taken in the collection
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdPolicy {
    /// Bump the numeric part until the id is free
    #[default]
    Bump,
    /// Keep the colliding id; the new record replaces the old one
    Overwrite,
}

/// Builds ids of the form `<prefix><unix seconds>`, e.g. `tk1718000000`.
///
/// Two calls within the same second return the same id. Collision handling
/// is up to the caller, see [`IdGenerator::assign`].
#[derive(Clone)]
pub struct IdGenerator {
    clock: Arc<dyn Clock>,
}

impl IdGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn generate(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.clock.now_secs())
    }

    /// Generate an id and resolve it against `is_taken` according to `policy`
    pub fn assign(&self, prefix: &str, policy: IdPolicy, is_taken: impl Fn(&str) -> bool) -> String {
        let mut id = self.generate(prefix);
        if policy == IdPolicy::Overwrite {
            return id;
        }

        let mut n = self.clock.now_secs();
        while is_taken(&id) {
            n += 1;
            id = format!("{}{}", prefix, n);
        }
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock that only moves when told to
    #[derive(Debug)]
    pub(crate) struct FixedClock(pub AtomicI64);

    impl FixedClock {
        pub(crate) fn at(secs: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(secs)))
        }

        pub(crate) fn advance(&self, secs: i64) {
            self.0.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for FixedClock {
        fn now_secs(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_generate_format() {
        let ids = IdGenerator::new(FixedClock::at(1_718_000_000));
        assert_eq!(ids.generate("tk"), "tk1718000000");
        assert_eq!(ids.generate("cont"), "cont1718000000");
    }

    #[test]
    fn test_system_clock_is_plausible() {
        // After 2020
        assert!(SystemClock.now_secs() > 1_600_000_000);
    }

    #[test]
    fn test_same_second_collides() {
        let ids = IdGenerator::new(FixedClock::at(42));
        assert_eq!(ids.generate("tk"), ids.generate("tk"));
    }

    #[test]
    fn test_one_second_apart_is_distinct() {
        let clock = FixedClock::at(42);
        let ids = IdGenerator::new(clock.clone());
        let first = ids.generate("tk");
        clock.advance(1);
        assert_ne!(first, ids.generate("tk"));
    }

    #[test]
    fn test_assign_bump_skips_taken() {
        let ids = IdGenerator::new(FixedClock::at(100));
        let taken: HashSet<&str> = ["tk100", "tk101"].into_iter().collect();

        let id = ids.assign("tk", IdPolicy::Bump, |id| taken.contains(id));
        assert_eq!(id, "tk102");
    }

    #[test]
    fn test_assign_overwrite_keeps_collision() {
        let ids = IdGenerator::new(FixedClock::at(100));
        let id = ids.assign("tk", IdPolicy::Overwrite, |_| true);
        assert_eq!(id, "tk100");
    }

    #[test]
    fn test_id_policy_serialization() {
        assert_eq!(serde_json::to_string(&IdPolicy::Bump).unwrap(), "\"bump\"");
        let policy: IdPolicy = serde_yaml::from_str("overwrite").unwrap();
        assert_eq!(policy, IdPolicy::Overwrite);
    }
}
