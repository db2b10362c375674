//! Hash map aliases used across Colgraph.

/// Fast hasher state.
pub type FxBuildHasher = ahash::RandomState;

/// Hash map using the fast hasher.
pub type FxHashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Hash set using the fast hasher.
pub type FxHashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;
