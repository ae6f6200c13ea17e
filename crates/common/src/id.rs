use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Issues strictly increasing raw identities.
///
/// Values start at 0 and are never handed out twice by the same allocator,
/// even after the thing they named has been destroyed. Whoever owns the
/// allocator (normally the `World`) defines the identity space.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identity, converted into a typed id.
    pub fn allocate<I: From<u64>>(&mut self) -> I {
        let raw = self.next;
        self.next += 1;
        I::from(raw)
    }

    /// Number of identities issued so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

typed_id!(
    /// Identity of an entity in a `World`.
    EntityId
);
typed_id!(
    /// Identity of a component; used as the GPU cache key for meshes.
    ComponentId
);
typed_id!(
    /// Identity of an immutable material; used as the GPU texture cache key.
    MaterialId
);
typed_id!(
    /// Identity of a scene; used as the GPU cache key for per-scene uniforms.
    SceneId
);
typed_id!(
    /// Identity of a `World`, unique within the process. The ids a world
    /// allocates are only meaningful together with its `WorldId`.
    WorldId
);

impl WorldId {
    /// Next process-wide world identity. Never repeats within a run.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_strictly_increasing() {
        let mut ids = IdAllocator::new();
        let issued: Vec<EntityId> = (0..100).map(|_| ids.allocate()).collect();
        for pair in issued.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(issued[0], EntityId(0));
        assert_eq!(ids.issued(), 100);
    }

    #[test]
    fn separate_allocators_are_independent() {
        let mut a = IdAllocator::new();
        let mut b = IdAllocator::new();
        let _: ComponentId = a.allocate();
        let _: ComponentId = a.allocate();
        let first_b: MaterialId = b.allocate();
        assert_eq!(first_b, MaterialId(0));
    }

    #[test]
    fn world_ids_never_repeat() {
        let first = WorldId::next();
        let second = WorldId::next();
        let third = WorldId::next();
        assert!(first < second && second < third);
    }

    #[test]
    fn display_names_the_kind() {
        assert_eq!(SceneId(7).to_string(), "SceneId(7)");
    }
}
