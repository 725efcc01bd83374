#![forbid(unsafe_code)]

//! Screen point → slot identity lookup.
//!
//! The rendering layer registers a bounding region for every slot it draws
//! and unregisters it when the container closes. The core only reads the
//! registry: [`resolve_at`](SlotRegistry::resolve_at) on release and
//! [`is_occupied`](SlotRegistry::is_occupied) when validating a source.
//!
//! # Index
//!
//! Regions are bucketed into a uniform grid (`bucket_size` pixels per edge).
//! Buckets are updated incrementally on register/unregister and rebuilt
//! wholesale after a layout shift ([`translate`](SlotRegistry::translate),
//! [`set_bucket_size`](SlotRegistry::set_bucket_size)). Lookups touch one
//! bucket, so a release never scans every open container.
//!
//! # Invariants
//!
//! 1. A tag is registered at most once; re-registering replaces the region
//!    and moves the slot to the top of the stacking order.
//! 2. When regions overlap, the most recently registered one wins.
//! 3. Tags that fail to parse stay registered (they still occlude what is
//!    underneath) but resolve to `None`.
//! 4. Occupancy is only tracked for registered, parseable slots, and starts
//!    out unknown until the item table reports it. Unknown and unregistered
//!    slots are neither occupied nor known-empty.
//! 5. Parseable tags are stored in canonical form, so `("equipment", "Head")`
//!    and [`SlotAddress`] `equipment/head` name the same entry.
//! 6. Regions with non-finite edges, or spanning more than
//!    `MAX_BUCKETS_PER_REGION` buckets, stay registered but are not indexed.

use ahash::AHashMap;
use tracing::{debug, trace};

use crate::geometry::{Point, Rect};
use crate::slot::{SlotAddress, SlotParseError};

/// Default bucket edge in pixels; roughly one slot tile.
pub const DEFAULT_BUCKET_SIZE: f32 = 64.0;

/// Smallest accepted bucket edge in pixels.
pub const MIN_BUCKET_SIZE: f32 = 4.0;

const MAX_BUCKETS_PER_REGION: f64 = 65_536.0;

/// The raw marker a rendered slot carries, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawSlotTag {
    pub container: String,
    pub index: String,
    pub parent_id: Option<u64>,
}

impl RawSlotTag {
    #[must_use]
    pub fn new(container: impl Into<String>, index: impl Into<String>, parent_id: Option<u64>) -> Self {
        Self {
            container: container.into(),
            index: index.into(),
            parent_id,
        }
    }

    /// Validate against the container taxonomy.
    pub fn parse(&self) -> Result<SlotAddress, SlotParseError> {
        SlotAddress::parse(&self.container, &self.index, self.parent_id)
    }

    /// Parse, and rewrite a parseable tag into its canonical spelling.
    fn canonicalize(self) -> (Self, Result<SlotAddress, SlotParseError>) {
        match self.parse() {
            Ok(address) => (Self::from(&address), Ok(address)),
            Err(err) => (self, Err(err)),
        }
    }
}

impl From<&SlotAddress> for RawSlotTag {
    fn from(address: &SlotAddress) -> Self {
        Self {
            container: address.container.as_str().to_string(),
            index: address.index.to_string(),
            parent_id: address.parent_id,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    tag: RawSlotTag,
    address: Option<SlotAddress>,
    region: Rect,
    occupied: Option<bool>,
    order: u64,
}

type BucketKey = (i32, i32);

/// Position-indexed slot registry.
#[derive(Debug, Clone)]
pub struct SlotRegistry {
    bucket_size: f32,
    entries: Vec<Option<Entry>>,
    free: Vec<usize>,
    by_tag: AHashMap<RawSlotTag, usize>,
    by_address: AHashMap<SlotAddress, usize>,
    buckets: AHashMap<BucketKey, Vec<usize>>,
    next_order: u64,
    generation: u64,
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_bucket_size(DEFAULT_BUCKET_SIZE)
    }

    /// Create a registry with a custom bucket edge. Non-positive or
    /// non-finite sizes fall back to [`DEFAULT_BUCKET_SIZE`]; sizes below
    /// [`MIN_BUCKET_SIZE`] are raised to it.
    #[must_use]
    pub fn with_bucket_size(bucket_size: f32) -> Self {
        Self {
            bucket_size: sanitize_bucket_size(bucket_size),
            entries: Vec::new(),
            free: Vec::new(),
            by_tag: AHashMap::new(),
            by_address: AHashMap::new(),
            buckets: AHashMap::new(),
            next_order: 0,
            generation: 0,
        }
    }

    /// Register a validated slot.
    pub fn register(&mut self, address: &SlotAddress, region: Rect) {
        self.register_raw(RawSlotTag::from(address), region);
    }

    /// Register a slot by its raw marker.
    pub fn register_raw(&mut self, tag: RawSlotTag, region: Rect) {
        let (tag, parsed) = tag.canonicalize();
        let address = match parsed {
            Ok(address) => Some(address),
            Err(err) => {
                debug!(container = %tag.container, index = %tag.index, %err, "slot marker does not parse");
                None
            }
        };

        let occupied = self
            .by_tag
            .get(&tag)
            .and_then(|&idx| self.entries[idx].as_ref())
            .and_then(|e| e.occupied);
        self.remove_tag(&tag);

        if !region.is_empty() && self.bucket_span(region).is_none() {
            debug!(container = %tag.container, index = %tag.index, ?region, "slot region not indexable");
        }

        let order = self.next_order;
        self.next_order += 1;
        let entry = Entry {
            tag: tag.clone(),
            address: address.clone(),
            region,
            occupied,
            order,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.entries[idx] = Some(entry);
                idx
            }
            None => {
                self.entries.push(Some(entry));
                self.entries.len() - 1
            }
        };

        self.by_tag.insert(tag, idx);
        if let Some(address) = address {
            self.by_address.insert(address, idx);
        }
        self.insert_buckets(idx, region);
        self.generation += 1;
    }

    /// Unregister a validated slot. Returns whether it was registered.
    pub fn unregister(&mut self, address: &SlotAddress) -> bool {
        self.unregister_raw(&RawSlotTag::from(address))
    }

    /// Unregister a slot by its raw marker.
    pub fn unregister_raw(&mut self, tag: &RawSlotTag) -> bool {
        let (tag, _) = tag.clone().canonicalize();
        let removed = self.remove_tag(&tag);
        if removed {
            self.generation += 1;
        }
        removed
    }

    /// Unregister every slot of one container instance (container closed).
    ///
    /// Returns the number of slots removed.
    pub fn unregister_container(&mut self, container: &str, parent_id: Option<u64>) -> usize {
        let doomed: Vec<RawSlotTag> = self
            .by_tag
            .keys()
            .filter(|t| t.container == container && t.parent_id == parent_id)
            .cloned()
            .collect();
        for tag in &doomed {
            self.remove_tag(tag);
        }
        if !doomed.is_empty() {
            self.generation += 1;
        }
        doomed.len()
    }

    /// The validated slot under `point`, if any.
    ///
    /// A point over a slot whose marker failed to parse resolves to `None`,
    /// the same as empty space.
    #[must_use]
    pub fn resolve_at(&self, point: Point) -> Option<SlotAddress> {
        let key = self.bucket_of(point)?;
        let candidates = self.buckets.get(&key)?;
        let top = candidates
            .iter()
            .filter_map(|&idx| self.entries[idx].as_ref())
            .filter(|e| e.region.contains(point))
            .max_by_key(|e| e.order)?;
        if top.address.is_none() {
            trace!(container = %top.tag.container, index = %top.tag.index, "point over unparseable slot");
        }
        top.address.clone()
    }

    /// Whether the slot currently holds an item.
    #[must_use]
    pub fn is_occupied(&self, address: &SlotAddress) -> bool {
        self.occupancy(address) == Some(true)
    }

    /// Whether the item table has reported this slot as empty.
    #[must_use]
    pub fn is_known_empty(&self, address: &SlotAddress) -> bool {
        self.occupancy(address) == Some(false)
    }

    fn occupancy(&self, address: &SlotAddress) -> Option<bool> {
        self.by_address
            .get(address)
            .and_then(|&idx| self.entries[idx].as_ref())
            .and_then(|e| e.occupied)
    }

    /// Whether the slot is registered at all.
    #[must_use]
    pub fn is_registered(&self, address: &SlotAddress) -> bool {
        self.by_address.contains_key(address)
    }

    /// Mark one slot occupied or empty. Returns `false` if not registered.
    pub fn set_occupied(&mut self, address: &SlotAddress, occupied: bool) -> bool {
        match self
            .by_address
            .get(address)
            .and_then(|&idx| self.entries[idx].as_mut())
        {
            Some(entry) => {
                entry.occupied = Some(occupied);
                true
            }
            None => false,
        }
    }

    /// Replace all occupancy flags from the authoritative item-location set.
    pub fn sync_occupancy<'a>(&mut self, occupied: impl IntoIterator<Item = &'a SlotAddress>) {
        for entry in self.entries.iter_mut().flatten() {
            entry.occupied = Some(false);
        }
        for address in occupied {
            self.set_occupied(address, true);
        }
    }

    /// Shift every region of one container instance (scrolling panel) and
    /// rebuild the index.
    pub fn translate(&mut self, container: &str, parent_id: Option<u64>, dx: f32, dy: f32) {
        let mut moved = false;
        for entry in self.entries.iter_mut().flatten() {
            if entry.tag.container == container && entry.tag.parent_id == parent_id {
                entry.region = entry.region.offset(dx, dy);
                moved = true;
            }
        }
        if moved {
            self.rebuild();
        }
    }

    /// Change the bucket edge and rebuild the index.
    pub fn set_bucket_size(&mut self, bucket_size: f32) {
        self.bucket_size = sanitize_bucket_size(bucket_size);
        self.rebuild();
    }

    /// Recompute every bucket from the current regions.
    pub fn rebuild(&mut self) {
        self.buckets.clear();
        let regions: Vec<(usize, Rect)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(idx, e)| e.as_ref().map(|e| (idx, e.region)))
            .collect();
        for (idx, region) in regions {
            self.insert_buckets(idx, region);
        }
        self.generation += 1;
    }

    /// Remove everything (viewport torn down).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
        self.by_tag.clear();
        self.by_address.clear();
        self.buckets.clear();
        self.generation += 1;
    }

    /// Number of registered slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Bumps on every structural change; lets overlays skip recomputation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn bucket_size(&self) -> f32 {
        self.bucket_size
    }

    fn remove_tag(&mut self, tag: &RawSlotTag) -> bool {
        let Some(idx) = self.by_tag.remove(tag) else {
            return false;
        };
        if let Some(entry) = self.entries[idx].take() {
            if let Some(address) = &entry.address {
                self.by_address.remove(address);
            }
            self.remove_buckets(idx, entry.region);
        }
        self.free.push(idx);
        true
    }

    fn bucket_of(&self, point: Point) -> Option<BucketKey> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        Some((
            (point.x / self.bucket_size).floor() as i32,
            (point.y / self.bucket_size).floor() as i32,
        ))
    }

    fn bucket_span(&self, region: Rect) -> Option<(BucketKey, BucketKey)> {
        let edges = [region.x, region.y, region.right(), region.bottom()];
        if region.is_empty() || edges.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let size = f64::from(self.bucket_size);
        let x0 = (f64::from(region.x) / size).floor();
        let y0 = (f64::from(region.y) / size).floor();
        // Right/bottom edges are exclusive.
        let x1 = ((f64::from(region.right()) / size).ceil() - 1.0).max(x0);
        let y1 = ((f64::from(region.bottom()) / size).ceil() - 1.0).max(y0);

        let cells = (x1 - x0 + 1.0) * (y1 - y0 + 1.0);
        let limit = f64::from(i32::MAX);
        if cells > MAX_BUCKETS_PER_REGION || [x0, y0, x1, y1].iter().any(|v| v.abs() > limit) {
            return None;
        }
        Some(((x0 as i32, y0 as i32), (x1 as i32, y1 as i32)))
    }

    fn insert_buckets(&mut self, idx: usize, region: Rect) {
        let Some(((x0, y0), (x1, y1))) = self.bucket_span(region) else {
            return;
        };
        for by in y0..=y1 {
            for bx in x0..=x1 {
                self.buckets.entry((bx, by)).or_default().push(idx);
            }
        }
    }

    fn remove_buckets(&mut self, idx: usize, region: Rect) {
        let Some(((x0, y0), (x1, y1))) = self.bucket_span(region) else {
            return;
        };
        for by in y0..=y1 {
            for bx in x0..=x1 {
                if let Some(list) = self.buckets.get_mut(&(bx, by)) {
                    list.retain(|&i| i != idx);
                    if list.is_empty() {
                        self.buckets.remove(&(bx, by));
                    }
                }
            }
        }
    }
}

fn sanitize_bucket_size(size: f32) -> f32 {
    if size.is_finite() && size > 0.0 {
        size.max(MIN_BUCKET_SIZE)
    } else {
        DEFAULT_BUCKET_SIZE
    }
}
