//! Slab arena for the coefficient buffers of live quality cells.
//!
//! A search uses exactly two buffer sizes: determinant coefficients and
//! gradient coefficient matrices. Each size class lives in one contiguous
//! `Vec<f64>` cut into fixed-size blocks, with a free list of released
//! slots. Cells hold [`BufferId`]s instead of owning allocations, so
//! splitting a cell recycles its parent's blocks for the next children.
//!
//! A pool belongs to one [`BoundContext`](super::context::BoundContext) and
//! is never shared between threads.

use crate::debug_invariants::DebugInvariants;
use crate::quality_error::QualityError;

/// Size class of a pooled buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Determinant,
    Gradient,
}

/// Handle to one pooled block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId {
    kind: BufferKind,
    slot: u32,
}

impl BufferId {
    pub fn kind(&self) -> BufferKind {
        self.kind
    }
}

/// Occupancy snapshot of a [`CoeffPool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub determinant_block: usize,
    pub gradient_block: usize,
    pub live_determinant: usize,
    pub live_gradient: usize,
    pub peak_determinant: usize,
    pub peak_gradient: usize,
}

#[derive(Debug, Default)]
struct Arena {
    block: usize,
    data: Vec<f64>,
    free: Vec<u32>,
    in_use: Vec<bool>,
    peak: usize,
}

impl Arena {
    fn live(&self) -> usize {
        self.in_use.len() - self.free.len()
    }

    fn set_block(&mut self, block: usize, kind: BufferKind) -> Result<(), QualityError> {
        if block == self.block {
            return Ok(());
        }
        if self.live() > 0 {
            return Err(QualityError::InvariantViolation(format!(
                "cannot resize {kind:?} blocks from {} to {block} with {} live buffers",
                self.block,
                self.live()
            )));
        }
        self.block = block;
        self.data.clear();
        self.free.clear();
        self.in_use.clear();
        Ok(())
    }

    fn acquire(&mut self) -> u32 {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                let slot = self.in_use.len() as u32;
                self.in_use.push(false);
                self.data.resize(self.data.len() + self.block, 0.0);
                slot
            }
        };
        self.in_use[slot as usize] = true;
        self.peak = self.peak.max(self.live());
        slot
    }

    fn release(&mut self, slot: u32, kind: BufferKind) -> Result<(), QualityError> {
        match self.in_use.get_mut(slot as usize) {
            Some(used) if *used => {
                *used = false;
                self.free.push(slot);
                Ok(())
            }
            _ => Err(QualityError::InvariantViolation(format!(
                "release of {kind:?} slot {slot} that is not in use"
            ))),
        }
    }

    fn range(&self, slot: u32) -> std::ops::Range<usize> {
        let start = slot as usize * self.block;
        start..start + self.block
    }
}

/// Two-size-class buffer arena.
#[derive(Debug, Default)]
pub struct CoeffPool {
    det: Arena,
    grad: Arena,
}

impl CoeffPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the block sizes of both classes for the next search.
    ///
    /// Changing a size while buffers of that class are still live is an error.
    pub fn use_sizes(&mut self, det_len: usize, grad_len: usize) -> Result<(), QualityError> {
        self.det.set_block(det_len, BufferKind::Determinant)?;
        self.grad.set_block(grad_len, BufferKind::Gradient)
    }

    fn arena(&self, kind: BufferKind) -> &Arena {
        match kind {
            BufferKind::Determinant => &self.det,
            BufferKind::Gradient => &self.grad,
        }
    }

    fn arena_mut(&mut self, kind: BufferKind) -> &mut Arena {
        match kind {
            BufferKind::Determinant => &mut self.det,
            BufferKind::Gradient => &mut self.grad,
        }
    }

    pub fn block_len(&self, kind: BufferKind) -> usize {
        self.arena(kind).block
    }

    /// Hands out a block of the given class; its contents are unspecified.
    pub fn acquire(&mut self, kind: BufferKind) -> BufferId {
        let slot = self.arena_mut(kind).acquire();
        BufferId { kind, slot }
    }

    /// Acquires a block and fills it from `src`.
    pub fn acquire_from(&mut self, kind: BufferKind, src: &[f64]) -> Result<BufferId, QualityError> {
        let expected = self.block_len(kind);
        if src.len() != expected {
            return Err(QualityError::SizeMismatch {
                context: "pooled buffer",
                expected,
                found: src.len(),
            });
        }
        let id = self.acquire(kind);
        self.get_mut(id).copy_from_slice(src);
        Ok(id)
    }

    pub fn release(&mut self, id: BufferId) -> Result<(), QualityError> {
        self.arena_mut(id.kind).release(id.slot, id.kind)
    }

    pub fn get(&self, id: BufferId) -> &[f64] {
        let arena = self.arena(id.kind);
        &arena.data[arena.range(id.slot)]
    }

    pub fn get_mut(&mut self, id: BufferId) -> &mut [f64] {
        let arena = self.arena_mut(id.kind);
        let range = arena.range(id.slot);
        &mut arena.data[range]
    }

    /// Borrows `src` for reading and `dst` for writing at the same time.
    pub(crate) fn source_and_target(
        &mut self,
        src: BufferId,
        dst: BufferId,
    ) -> Result<(&[f64], &mut [f64]), QualityError> {
        if src.kind != dst.kind || src.slot == dst.slot {
            return Err(QualityError::InvariantViolation(format!(
                "cannot alias {src:?} and {dst:?}"
            )));
        }
        let arena = self.arena_mut(src.kind);
        let (rs, rd) = (arena.range(src.slot), arena.range(dst.slot));
        if rs.start < rd.start {
            let (lo, hi) = arena.data.split_at_mut(rd.start);
            Ok((&lo[rs], &mut hi[..rd.end - rd.start]))
        } else {
            let (lo, hi) = arena.data.split_at_mut(rs.start);
            Ok((&hi[..rs.end - rs.start], &mut lo[rd]))
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            determinant_block: self.det.block,
            gradient_block: self.grad.block,
            live_determinant: self.det.live(),
            live_gradient: self.grad.live(),
            peak_determinant: self.det.peak,
            peak_gradient: self.grad.peak,
        }
    }

    /// Number of buffers currently handed out.
    pub fn live(&self) -> usize {
        self.det.live() + self.grad.live()
    }
}

impl DebugInvariants for CoeffPool {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "CoeffPool");
    }

    fn validate_invariants(&self) -> Result<(), QualityError> {
        for (kind, arena) in [
            (BufferKind::Determinant, &self.det),
            (BufferKind::Gradient, &self.grad),
        ] {
            if arena.data.len() != arena.block * arena.in_use.len() {
                return Err(QualityError::InvariantViolation(format!(
                    "{kind:?} arena holds {} values for {} blocks of {}",
                    arena.data.len(),
                    arena.in_use.len(),
                    arena.block
                )));
            }
            if let Some(&slot) = arena.free.iter().find(|&&s| arena.in_use[s as usize]) {
                return Err(QualityError::InvariantViolation(format!(
                    "{kind:?} slot {slot} is both free and in use"
                )));
            }
        }
        Ok(())
    }
}
