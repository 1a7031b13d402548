//! Open-addressing hash map with Robin Hood displacement.
//!
//! Buckets live in a single power-of-two sized array. Every filled bucket
//! records its probe distance, i.e. how far it sits from the bucket its hash
//! maps to. During insertion an incoming entry takes the place of any resident
//! that is closer to home than the incoming entry is, and probing continues
//! with the evicted resident. This keeps probe sequences short and lets
//! lookups stop early.
//!
//! The map is insert-only: there is no removal and `add` refuses duplicate
//! keys instead of overwriting them. Use [`RobinHoodMap::get_mut`] to replace
//! a value in place.

use rustc_hash::FxHasher;
use std::borrow::Borrow;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use std::mem;
use thiserror::Error;

/// Capacity used by [`RobinHoodMap::new`].
pub const INITIAL_CAPACITY: usize = 128;

/// Smallest backing array ever allocated.
const MIN_CAPACITY: usize = 8;

/// Maximum fill ratio, in percent, before the backing array doubles.
const LOAD_FACTOR_PERCENT: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("key is already present in the map")]
    DuplicateKey,
}

#[derive(Debug, Clone)]
struct Bucket<K, V> {
    key: K,
    value: V,
    distance: u32,
}

/// Insert-only associative container using Robin Hood probing.
#[derive(Clone)]
pub struct RobinHoodMap<K, V, S = BuildHasherDefault<FxHasher>> {
    buckets: Vec<Option<Bucket<K, V>>>,
    len: usize,
    mask: usize,
    resize_threshold: usize,
    hasher: S,
}

impl<K, V> RobinHoodMap<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Create a map with room for `capacity` buckets, rounded up to a power
    /// of two.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S> RobinHoodMap<K, V, S> {
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        Self {
            buckets: empty_buckets(capacity),
            len: 0,
            mask: capacity - 1,
            resize_threshold: threshold_for(capacity),
            hasher,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets in the backing array.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Largest probe distance of any stored entry.
    pub fn max_probe_distance(&self) -> u32 {
        self.buckets
            .iter()
            .flatten()
            .map(|bucket| bucket.distance)
            .max()
            .unwrap_or(0)
    }

    /// Iterate all entries in bucket order (unrelated to insertion order).
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets
            .iter()
            .flatten()
            .map(|bucket| (&bucket.key, &bucket.value))
    }
}

impl<K, V, S> RobinHoodMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Insert a new key. Fails without touching the map if `key` is present.
    ///
    /// When the insert would push the map past its load factor, the backing
    /// array doubles first and every live entry is re-hashed into it.
    pub fn add(&mut self, key: K, value: V) -> Result<(), MapError> {
        if self.find_index(&key).is_some() {
            return Err(MapError::DuplicateKey);
        }

        if self.len + 1 > self.resize_threshold {
            self.grow();
        }

        self.insert_unique(key, value);
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        self.buckets[index].as_ref().map(|bucket| &bucket.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        self.buckets[index].as_mut().map(|bucket| &mut bucket.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    #[inline]
    fn ideal_index<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        (self.hasher.hash_one(key) as usize) & self.mask
    }

    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.len == 0 {
            return None;
        }

        let mut index = self.ideal_index(key);
        let mut distance = 0u32;
        loop {
            match &self.buckets[index] {
                None => return None,
                Some(bucket) => {
                    // The key would have displaced this resident on insert.
                    if bucket.distance < distance {
                        return None;
                    }
                    if bucket.key.borrow() == key {
                        return Some(index);
                    }
                }
            }
            index = (index + 1) & self.mask;
            distance += 1;
        }
    }

    /// Place an entry whose key is known to be absent. Capacity must already
    /// be sufficient.
    fn insert_unique(&mut self, key: K, value: V) {
        let mut incoming = Bucket {
            key,
            value,
            distance: 0,
        };
        let mut index = self.ideal_index(&incoming.key);

        loop {
            let slot = &mut self.buckets[index];
            match slot {
                None => {
                    *slot = Some(incoming);
                    self.len += 1;
                    return;
                }
                Some(resident) => {
                    if resident.distance < incoming.distance {
                        mem::swap(resident, &mut incoming);
                    }
                }
            }
            index = (index + 1) & self.mask;
            incoming.distance += 1;
        }
    }

    fn grow(&mut self) {
        let new_capacity = self.buckets.len() * 2;
        let old = mem::replace(&mut self.buckets, empty_buckets(new_capacity));
        self.mask = new_capacity - 1;
        self.resize_threshold = threshold_for(new_capacity);
        self.len = 0;

        for bucket in old.into_iter().flatten() {
            self.insert_unique(bucket.key, bucket.value);
        }
    }
}

impl<K, V> Default for RobinHoodMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> std::fmt::Debug for RobinHoodMap<K, V, S>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

fn empty_buckets<K, V>(capacity: usize) -> Vec<Option<Bucket<K, V>>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, || None);
    buckets
}

#[inline]
fn threshold_for(capacity: usize) -> usize {
    capacity * LOAD_FACTOR_PERCENT / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Hashes every key to zero so probe behaviour is fully predictable.
    #[derive(Default, Clone)]
    struct ZeroHasher;

    impl std::hash::Hasher for ZeroHasher {
        fn finish(&self) -> u64 {
            0
        }
        fn write(&mut self, _bytes: &[u8]) {}
    }

    /// Recompute every entry's distance from scratch and compare with the
    /// stored one.
    fn assert_distances_consistent<K: Hash + Eq, V, S: BuildHasher>(map: &RobinHoodMap<K, V, S>) {
        for (index, slot) in map.buckets.iter().enumerate() {
            if let Some(bucket) = slot {
                let ideal = map.ideal_index(&bucket.key);
                let expected = (index + map.capacity() - ideal) & map.mask;
                assert_eq!(bucket.distance as usize, expected, "bucket {index}");
            }
        }
    }

    #[test]
    fn test_add_and_get() {
        let mut map = RobinHoodMap::new();
        map.add("cube.obj".to_string(), 1u32).unwrap();
        map.add("player.bmp".to_string(), 2u32).unwrap();

        assert_eq!(map.get("cube.obj"), Some(&1));
        assert_eq!(map.get("player.bmp"), Some(&2));
        assert_eq!(map.get("missing.ent"), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut map = RobinHoodMap::new();
        map.add(7u32, "first").unwrap();

        assert_eq!(map.add(7u32, "second"), Err(MapError::DuplicateKey));
        assert_eq!(map.get(&7), Some(&"first"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_get_mut_replaces_in_place() {
        let mut map = RobinHoodMap::new();
        map.add(3u32, 30u32).unwrap();

        *map.get_mut(&3).unwrap() = 31;
        assert_eq!(map.get(&3), Some(&31));
        assert!(map.get_mut(&4).is_none());
    }

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        let map: RobinHoodMap<u32, u32> = RobinHoodMap::with_capacity(100);
        assert_eq!(map.capacity(), 128);

        let tiny: RobinHoodMap<u32, u32> = RobinHoodMap::with_capacity(0);
        assert_eq!(tiny.capacity(), MIN_CAPACITY);
    }

    #[test]
    fn test_grows_before_exceeding_load_factor() {
        let mut map = RobinHoodMap::with_capacity(16);
        // threshold for 16 buckets is 11
        for key in 0..11u32 {
            map.add(key, key).unwrap();
        }
        assert_eq!(map.capacity(), 16);

        map.add(11, 11).unwrap();
        assert_eq!(map.capacity(), 32);
    }

    #[test]
    fn test_resize_preserves_findability() {
        let mut map = RobinHoodMap::with_capacity(8);
        let keys: Vec<String> = (0..500).map(|i| format!("asset_{i}.bmp")).collect();

        for (i, key) in keys.iter().enumerate() {
            map.add(key.clone(), i).unwrap();
        }

        // 500 entries at 70% load need 1024 buckets: seven doublings from 8
        assert_eq!(map.capacity(), 1024);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(map.get(key.as_str()), Some(&i), "lost {key} after resize");
        }
        assert_distances_consistent(&map);
    }

    #[test]
    fn test_every_added_key_maps_to_its_value() {
        let mut rng = StdRng::seed_from_u64(0x1EA5);
        let mut map = RobinHoodMap::new();
        let mut expected = Vec::new();

        while expected.len() < 2_000 {
            let key: u64 = rng.gen();
            let value: u32 = rng.gen();
            if map.add(key, value).is_ok() {
                expected.push((key, value));
            }
        }

        assert_eq!(map.len(), expected.len());
        for (key, value) in expected {
            assert_eq!(map.get(&key), Some(&value));
        }
    }

    #[test]
    fn test_probe_distance_stays_bounded() {
        for seed in [1u64, 42, 0xDEADBEEF, 0x5EED_5EED] {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut map = RobinHoodMap::with_capacity(1 << 14);
            let count = map.capacity() * LOAD_FACTOR_PERCENT / 100;

            while map.len() < count {
                let key: u64 = rng.gen();
                let _ = map.add(key, ());
            }

            assert_eq!(map.capacity(), 1 << 14, "seed {seed} should not resize");
            let max = map.max_probe_distance();
            assert!(max <= 24, "seed {seed}: max probe distance {max}");
            assert_distances_consistent(&map);
        }
    }

    #[test]
    fn test_displacement_keeps_distances_exact() {
        // Every key collides, so each insert walks the full cluster.
        let mut map: RobinHoodMap<u32, u32, BuildHasherDefault<ZeroHasher>> =
            RobinHoodMap::with_capacity_and_hasher(16, Default::default());

        for key in 0..10u32 {
            map.add(key, key * 10).unwrap();
        }

        assert_eq!(map.max_probe_distance(), 9);
        for key in 0..10u32 {
            assert_eq!(map.get(&key), Some(&(key * 10)));
        }
        assert_eq!(map.get(&99), None);
        assert_distances_consistent(&map);
    }

    #[test]
    fn test_lookup_stops_at_closer_resident() {
        let mut map = RobinHoodMap::with_capacity(64);
        for key in 0..40u32 {
            map.add(key, ()).unwrap();
        }
        for key in 40..400u32 {
            assert!(!map.contains_key(&key));
        }
    }

    #[test]
    fn test_iter_visits_every_entry() {
        let mut map = RobinHoodMap::new();
        for key in 0..50u32 {
            map.add(key, key + 1).unwrap();
        }

        let mut seen: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).map(|k| (k, k + 1)).collect::<Vec<_>>());
    }
}
