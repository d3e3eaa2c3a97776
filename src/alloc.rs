//! Data-memory allocation and accumulator custody.
//!
//! Storage is modeled as an arena of place records addressed by copyable
//! [`Place`] handles. A place either lives at a data-memory [`Designator`],
//! or is a temporary whose value (if any) currently sits in the accumulator.
//! The [`Allocator`] owns a pool of free addresses per scope; child scopes
//! snapshot the parent's pool, so sibling scopes reuse the same addresses
//! while a scope can never free into its parent. Accumulator custody is
//! program-wide, not per scope, and lives on the compilation context.

use tracing::trace;

use crate::pic18::instructions::Designator;
use crate::CompileError;

/// Handle to a place record. Copyable; the record itself lives in the
/// compilation context's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Place(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) struct PlaceData {
    /// Current storage, if any. Temporaries holding a value report the
    /// accumulator here.
    pub address: Option<Designator>,
    /// Temporaries live in the accumulator until evicted; non-temporaries
    /// always have an address.
    pub is_temp: bool,
    /// Pinned places survive use as an operand.
    pub is_pinned: bool,
    /// Whether the place currently holds a meaningful value.
    pub has_value: bool,
    /// Freed places must never be touched again.
    pub freed: bool,
}

/// Arena of place records.
#[derive(Debug, Default)]
pub(crate) struct Places {
    data: Vec<PlaceData>,
}

impl Places {
    pub fn addressed(&mut self, address: Designator, pinned: bool) -> Place {
        self.data.push(PlaceData {
            address: Some(address),
            is_temp: false,
            is_pinned: pinned,
            has_value: true,
            freed: false,
        });
        Place(self.data.len() - 1)
    }

    pub fn temp(&mut self) -> Place {
        self.data.push(PlaceData {
            address: None,
            is_temp: true,
            is_pinned: false,
            has_value: false,
            freed: false,
        });
        Place(self.data.len() - 1)
    }

    pub fn get(&self, p: Place) -> &PlaceData {
        let data = &self.data[p.0];
        debug_assert!(!data.freed, "place used after free");
        data
    }

    pub fn get_mut(&mut self, p: Place) -> &mut PlaceData {
        let data = &mut self.data[p.0];
        debug_assert!(!data.freed, "place used after free");
        data
    }
}

/// Size of the per-program data-memory pool, in bytes.
pub const POOL_SIZE: u8 = 0x40;

/// Free-address pool for one scope.
#[derive(Debug)]
pub(crate) struct Allocator {
    available: Vec<Designator>,
    used: Vec<Designator>,
}

impl Allocator {
    /// Root allocator over the full banked pool. Addresses are handed out
    /// from the top of the pool down.
    pub fn root() -> Self {
        Allocator {
            available: (0..POOL_SIZE).map(Designator::banked).collect(),
            used: Vec::new(),
        }
    }

    /// Child scope: snapshot of the current free pool, nothing allocated.
    /// The parent pool is untouched, so siblings see identical pools.
    pub fn child(&self) -> Self {
        Allocator {
            available: self.available.clone(),
            used: Vec::new(),
        }
    }

    pub fn alloc(&mut self) -> Result<Designator, CompileError> {
        let d = self.available.pop().ok_or(CompileError::PoolExhausted)?;
        trace!(%d, "alloc");
        self.used.push(d);
        Ok(d)
    }

    pub fn free(&mut self, d: Designator) {
        let idx = self
            .used
            .iter()
            .position(|&u| u == d)
            .unwrap_or_else(|| panic!("free of unallocated address {}", d));
        trace!(%d, "free");
        self.used.swap_remove(idx);
        self.available.push(d);
    }

    /// Verify this scope leaks nothing before it is dropped.
    pub fn close(&self) {
        assert!(
            self.used.is_empty(),
            "scope closed with {} address(es) still allocated",
            self.used.len()
        );
    }

    pub fn available_len(&self) -> usize {
        self.available.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_from_the_top_down() {
        let mut a = Allocator::root();
        assert_eq!(a.alloc().unwrap(), Designator::banked(0x3f));
        assert_eq!(a.alloc().unwrap(), Designator::banked(0x3e));
    }

    #[test]
    fn freed_addresses_are_reused() {
        let mut a = Allocator::root();
        let d = a.alloc().unwrap();
        a.free(d);
        assert_eq!(a.alloc().unwrap(), d);
    }

    #[test]
    fn pool_exhaustion_is_an_error() {
        let mut a = Allocator::root();
        for _ in 0..POOL_SIZE {
            a.alloc().unwrap();
        }
        assert_eq!(a.alloc(), Err(CompileError::PoolExhausted));
    }

    #[test]
    fn child_snapshots_do_not_touch_the_parent() {
        let mut parent = Allocator::root();
        let before = parent.available_len();
        let mut child = parent.child();
        let d = child.alloc().unwrap();
        assert_eq!(parent.available_len(), before);
        // a second sibling sees the same address again
        assert_eq!(parent.child().alloc().unwrap(), d);
        child.free(d);
        child.close();
    }

    #[test]
    #[should_panic(expected = "free of unallocated")]
    fn freeing_an_unallocated_address_panics() {
        let mut a = Allocator::root();
        a.free(Designator::banked(0x10));
    }

    #[test]
    #[should_panic(expected = "still allocated")]
    fn closing_a_leaky_scope_panics() {
        let mut a = Allocator::root();
        a.alloc().unwrap();
        a.close();
    }
}
