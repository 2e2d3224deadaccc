//! Region allocator backing on-demand offscreen buffers.
//!
//! One or more disjoint byte regions are assigned once at startup; blocks
//! are then carved out with a first-fit, offset-ordered free list that
//! coalesces on free. Blocks are addressed by [`BlockRef`] handles (region
//! index + byte offset) rather than raw pointers, so a stale handle can be
//! rejected instead of dangling.
//!
//! The allocator carries no lock of its own: it lives inside the GUI core,
//! and every public entry point that can reach it already holds the single
//! tree/allocator critical section (see [`crate::gui`]).

use alloc::vec;
use alloc::vec::Vec;

use log::{trace, warn};

use crate::error::Error;

/// Block alignment in bytes. All sizes round up to this.
const ALIGN: usize = 4;

/// Handle to an allocated block. Treat as opaque; the only failure signal
/// from the allocating calls is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    region: u8,
    offset: u32,
}

/// A contiguous byte span inside one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    offset: u32,
    len: u32,
}

impl Span {
    fn end(&self) -> u32 {
        self.offset + self.len
    }
}

#[derive(Debug)]
struct Region {
    bytes: Vec<u8>,
    /// Free spans, sorted by offset, never adjacent (adjacent spans merge).
    free: Vec<Span>,
    /// Live allocations, sorted by offset.
    blocks: Vec<Span>,
}

/// Fixed-region heap with alloc/calloc/realloc/free, coalescing and
/// free/total/min-free statistics.
#[derive(Debug, Default)]
pub struct RegionHeap {
    regions: Vec<Region>,
    total: usize,
    free: usize,
    min_free: usize,
    /// Set once the first allocation succeeds; `assign` fails afterwards.
    touched: bool,
}

impl RegionHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the backing regions. Must happen before the first
    /// allocation and at most once.
    pub fn assign(&mut self, capacities: &[usize]) -> Result<(), Error> {
        if self.touched || !self.regions.is_empty() {
            return Err(Error::RegionsLocked);
        }
        if capacities.is_empty() || capacities.len() > u8::MAX as usize {
            return Err(Error::InvalidArgument);
        }
        for &cap in capacities {
            let cap = cap & !(ALIGN - 1);
            if cap == 0 {
                return Err(Error::InvalidArgument);
            }
            self.regions.push(Region {
                bytes: vec![0; cap],
                free: vec![Span {
                    offset: 0,
                    len: cap as u32,
                }],
                blocks: Vec::new(),
            });
            self.total += cap;
        }
        self.free = self.total;
        self.min_free = self.total;
        Ok(())
    }

    /// Allocate `size` bytes. `None` is the sole failure signal.
    pub fn alloc(&mut self, size: usize) -> Option<BlockRef> {
        if size == 0 {
            return None;
        }
        let size = align_up(size) as u32;

        for (ri, region) in self.regions.iter_mut().enumerate() {
            // First fit in offset order keeps fragmentation predictable.
            let Some(si) = region.free.iter().position(|s| s.len >= size) else {
                continue;
            };
            let span = region.free[si];
            if span.len == size {
                region.free.remove(si);
            } else {
                region.free[si] = Span {
                    offset: span.offset + size,
                    len: span.len - size,
                };
            }
            let block = Span {
                offset: span.offset,
                len: size,
            };
            let at = region
                .blocks
                .binary_search_by_key(&block.offset, |b| b.offset)
                .unwrap_err();
            region.blocks.insert(at, block);

            self.free -= size as usize;
            if self.free < self.min_free {
                self.min_free = self.free;
            }
            self.touched = true;
            return Some(BlockRef {
                region: ri as u8,
                offset: block.offset,
            });
        }
        warn!("region heap exhausted: {} bytes requested", size);
        None
    }

    /// Allocate `n * size` bytes, zero-filled.
    pub fn calloc(&mut self, n: usize, size: usize) -> Option<BlockRef> {
        let total = n.checked_mul(size)?;
        let block = self.alloc(total)?;
        if let Some(bytes) = self.bytes_mut(block) {
            bytes.fill(0);
        }
        Some(block)
    }

    /// Resize a block with C `realloc` semantics: `None` in means plain
    /// alloc, zero size means free, otherwise allocate-copy-free.
    pub fn realloc(&mut self, block: Option<BlockRef>, size: usize) -> Option<BlockRef> {
        let Some(old) = block else {
            return self.alloc(size);
        };
        if size == 0 {
            self.free(Some(old));
            return None;
        }
        let old_len = self.block_len(old)? as usize;
        let new = self.alloc(size)?;
        let copy = old_len.min(align_up(size));
        // New and old blocks are distinct live allocations, so the pair
        // borrow always succeeds here.
        if let Some((src, dst)) = self.bytes_pair_mut(old, new) {
            dst[..copy].copy_from_slice(&src[..copy]);
        }
        self.free(Some(old));
        Some(new)
    }

    /// Return a block to its region, coalescing with adjacent free spans.
    /// Freeing `None` or an unknown handle is a no-op.
    pub fn free(&mut self, block: Option<BlockRef>) {
        let Some(block) = block else { return };
        let Some(region) = self.regions.get_mut(block.region as usize) else {
            return;
        };
        let Ok(bi) = region.blocks.binary_search_by_key(&block.offset, |b| b.offset) else {
            trace!("free of unknown block at offset {}", block.offset);
            return;
        };
        let span = region.blocks.remove(bi);
        self.free += span.len as usize;

        let at = region
            .free
            .binary_search_by_key(&span.offset, |s| s.offset)
            .unwrap_err();
        region.free.insert(at, span);
        // Merge with the next span first so the index stays valid for the
        // previous-neighbour merge.
        if at + 1 < region.free.len() && region.free[at].end() == region.free[at + 1].offset {
            region.free[at].len += region.free[at + 1].len;
            region.free.remove(at + 1);
        }
        if at > 0 && region.free[at - 1].end() == region.free[at].offset {
            region.free[at - 1].len += region.free[at].len;
            region.free.remove(at);
        }
    }

    /// Current free bytes across all regions.
    pub fn free_bytes(&self) -> usize {
        self.free
    }

    /// Total usable bytes across all regions.
    pub fn total_bytes(&self) -> usize {
        self.total
    }

    /// Historical minimum of [`Self::free_bytes`]; non-increasing until
    /// explicitly reset.
    pub fn min_free_bytes(&self) -> usize {
        self.min_free
    }

    /// Restart the min-free watermark from the current free level.
    pub fn reset_min_free(&mut self) {
        self.min_free = self.free;
    }

    fn block_len(&self, block: BlockRef) -> Option<u32> {
        let region = self.regions.get(block.region as usize)?;
        let bi = region
            .blocks
            .binary_search_by_key(&block.offset, |b| b.offset)
            .ok()?;
        Some(region.blocks[bi].len)
    }

    /// Shared view of a live block's bytes.
    pub fn bytes(&self, block: BlockRef) -> Option<&[u8]> {
        let len = self.block_len(block)? as usize;
        let region = self.regions.get(block.region as usize)?;
        let start = block.offset as usize;
        region.bytes.get(start..start + len)
    }

    /// Mutable view of a live block's bytes.
    pub fn bytes_mut(&mut self, block: BlockRef) -> Option<&mut [u8]> {
        let len = self.block_len(block)? as usize;
        let region = self.regions.get_mut(block.region as usize)?;
        let start = block.offset as usize;
        region.bytes.get_mut(start..start + len)
    }

    /// Mutable views of two distinct live blocks at once, via split
    /// borrows. The compositor needs this to read a child buffer while
    /// writing its parent's. Returns `None` if either handle is stale or
    /// the handles are identical.
    pub fn bytes_pair_mut(
        &mut self,
        a: BlockRef,
        b: BlockRef,
    ) -> Option<(&mut [u8], &mut [u8])> {
        if a == b {
            return None;
        }
        let a_len = self.block_len(a)? as usize;
        let b_len = self.block_len(b)? as usize;
        if a.region == b.region {
            let region = self.regions.get_mut(a.region as usize)?;
            let (lo, lo_len, hi, hi_len, swapped) = if a.offset < b.offset {
                (a.offset as usize, a_len, b.offset as usize, b_len, false)
            } else {
                (b.offset as usize, b_len, a.offset as usize, a_len, true)
            };
            let (head, tail) = region.bytes.split_at_mut(hi);
            let lo_bytes = head.get_mut(lo..lo + lo_len)?;
            let hi_bytes = tail.get_mut(..hi_len)?;
            if swapped {
                Some((hi_bytes, lo_bytes))
            } else {
                Some((lo_bytes, hi_bytes))
            }
        } else {
            let (ra, rb) = (a.region as usize, b.region as usize);
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            let (head, tail) = self.regions.split_at_mut(hi);
            let lo_region = &mut head[lo];
            let hi_region = &mut tail[0];
            let (lo_block, lo_len, hi_block, hi_len) = if ra < rb {
                (a, a_len, b, b_len)
            } else {
                (b, b_len, a, a_len)
            };
            let lo_start = lo_block.offset as usize;
            let hi_start = hi_block.offset as usize;
            let lo_bytes = lo_region.bytes.get_mut(lo_start..lo_start + lo_len)?;
            let hi_bytes = hi_region.bytes.get_mut(hi_start..hi_start + hi_len)?;
            if ra < rb {
                Some((lo_bytes, hi_bytes))
            } else {
                Some((hi_bytes, lo_bytes))
            }
        }
    }
}

fn align_up(size: usize) -> usize {
    (size + ALIGN - 1) & !(ALIGN - 1)
}
