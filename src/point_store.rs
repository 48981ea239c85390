//! Fixed-capacity trajectory storage.
//!
//! A [`PointStore`] wraps a [`PointBuffer`] (host memory for the software
//! device, a storage buffer for the GPU device) and tracks how many entries
//! form the current trajectory. The buffer is allocated once and never
//! reallocated; kernels borrow it for the length of a dispatch.
//!
//! ```text
//!  index:  0      1      2          valid-1  valid          capacity
//!          [seed][ P1 ][ P2 ] ... [ Pn   ][ stale ... stale ]
//! ```

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::CapacityExhausted;

/// Device layout of one trajectory point.
///
/// WGSL gives `array<vec3<f32>>` a 16 byte stride, so the host mirror
/// carries an explicit pad word.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPoint {
    pub position: [f32; 3],
    pub _pad: f32,
}

impl From<Vec3> for GpuPoint {
    fn from(v: Vec3) -> Self {
        Self {
            position: v.to_array(),
            _pad: 0.0,
        }
    }
}

impl From<GpuPoint> for Vec3 {
    fn from(p: GpuPoint) -> Self {
        Vec3::from_array(p.position)
    }
}

/// Storage that can hold a run of points at fixed indices.
pub trait PointBuffer {
    /// Number of points the buffer can hold.
    fn capacity(&self) -> u32;

    /// Overwrite the point at `index`. `index` is always below `capacity()`.
    fn write(&mut self, index: u32, point: Vec3);
}

/// Host-resident point arena.
#[derive(Debug, Clone)]
pub struct HostPoints {
    points: Vec<GpuPoint>,
}

impl HostPoints {
    /// Allocate room for `capacity` points, all zeroed.
    pub fn new(capacity: u32) -> Self {
        Self {
            points: vec![GpuPoint::zeroed(); capacity as usize],
        }
    }

    /// Read the point at `index`, if it is inside the arena.
    pub fn read(&self, index: u32) -> Option<Vec3> {
        self.points.get(index as usize).map(|p| Vec3::from(*p))
    }

    /// The raw arena, including stale entries.
    pub fn as_slice(&self) -> &[GpuPoint] {
        &self.points
    }
}

impl PointBuffer for HostPoints {
    fn capacity(&self) -> u32 {
        self.points.len() as u32
    }

    fn write(&mut self, index: u32, point: Vec3) {
        self.points[index as usize] = point.into();
    }
}

/// A trajectory of points in a fixed-capacity buffer.
///
/// `0 < valid_count <= capacity` always holds, and index 0 is the seed of
/// the current trajectory.
#[derive(Debug)]
pub struct PointStore<B: PointBuffer> {
    buffer: B,
    valid_count: u32,
    seed: Vec3,
}

impl<B: PointBuffer> PointStore<B> {
    /// Wrap `buffer` and start a trajectory at `seed`.
    ///
    /// Fails if the buffer has no room for the seed.
    pub fn new(buffer: B, seed: Vec3) -> Result<Self, CapacityExhausted> {
        if buffer.capacity() == 0 {
            return Err(CapacityExhausted { capacity: 0 });
        }
        let mut store = Self {
            buffer,
            valid_count: 1,
            seed,
        };
        store.seed(seed);
        Ok(store)
    }

    /// Restart the trajectory at `point`.
    pub fn seed(&mut self, point: Vec3) {
        self.buffer.write(0, point);
        self.seed = point;
        self.valid_count = 1;
    }

    /// Write `point` after the last valid entry.
    ///
    /// This is the single-step host path. The frame loop batches a frame's
    /// steps through [`reserve`](Self::reserve) and [`commit`](Self::commit)
    /// instead. A full store is left untouched.
    pub fn append(&mut self, point: Vec3) -> Result<u32, CapacityExhausted> {
        if self.is_full() {
            return Err(CapacityExhausted {
                capacity: self.capacity(),
            });
        }
        let index = self.valid_count;
        self.buffer.write(index, point);
        self.valid_count += 1;
        Ok(index)
    }

    /// Indices the next `requested` solver iterations may fill, truncated at
    /// capacity.
    pub fn reserve(&self, requested: u32) -> Range<u32> {
        let start = self.valid_count;
        let end = start.saturating_add(requested).min(self.capacity());
        start..end
    }

    /// Mark a reserved range as written by the solver.
    pub fn commit(&mut self, written: Range<u32>) {
        debug_assert_eq!(written.start, self.valid_count, "commit must continue the trajectory");
        debug_assert!(written.end <= self.capacity());
        self.valid_count = written.end.min(self.capacity()).max(self.valid_count);
    }

    /// Read-only view of the valid prefix.
    pub fn snapshot(&self) -> PointsView<'_, B> {
        PointsView {
            buffer: &self.buffer,
            count: self.valid_count,
        }
    }

    /// Number of points in the current trajectory.
    #[inline]
    pub fn valid_count(&self) -> u32 {
        self.valid_count
    }

    /// Fixed capacity of the underlying buffer.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.buffer.capacity()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.valid_count >= self.capacity()
    }

    /// Seed of the current trajectory.
    #[inline]
    pub fn seed_point(&self) -> Vec3 {
        self.seed
    }

    /// Lend the buffer to a solver dispatch.
    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }
}

impl PointStore<HostPoints> {
    /// Read a valid point. Stale indices return `None`.
    pub fn get(&self, index: u32) -> Option<Vec3> {
        if index < self.valid_count {
            self.buffer.read(index)
        } else {
            None
        }
    }

    /// Last point of the trajectory.
    pub fn last(&self) -> Vec3 {
        self.get(self.valid_count - 1).unwrap_or(self.seed)
    }
}

/// Borrowed prefix `[0, count)` of a point buffer.
pub struct PointsView<'a, B> {
    pub buffer: &'a B,
    pub count: u32,
}

impl<B> Clone for PointsView<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for PointsView<'_, B> {}

impl PointsView<'_, HostPoints> {
    /// The valid points only.
    pub fn points(&self) -> &[GpuPoint] {
        &self.buffer.as_slice()[..self.count as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(capacity: u32) -> PointStore<HostPoints> {
        PointStore::new(HostPoints::new(capacity), Vec3::new(1.0, 1.5, 1.25)).unwrap()
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let result = PointStore::new(HostPoints::new(0), Vec3::ONE);
        assert_eq!(result.err(), Some(CapacityExhausted { capacity: 0 }));
    }

    #[test]
    fn test_new_store_holds_seed() {
        let s = store(8);
        assert_eq!(s.valid_count(), 1);
        assert_eq!(s.get(0), Some(Vec3::new(1.0, 1.5, 1.25)));
        assert_eq!(s.get(1), None);
    }

    #[test]
    fn test_append_until_full() {
        let mut s = store(3);
        assert_eq!(s.append(Vec3::X), Ok(1));
        assert_eq!(s.append(Vec3::Y), Ok(2));
        assert!(s.is_full());
        assert_eq!(s.append(Vec3::Z), Err(CapacityExhausted { capacity: 3 }));
        assert_eq!(s.valid_count(), 3);
        assert_eq!(s.last(), Vec3::Y);
    }

    #[test]
    fn test_seed_resets_count() {
        let mut s = store(4);
        s.append(Vec3::ONE).unwrap();
        s.append(Vec3::ONE).unwrap();
        s.seed(Vec3::splat(2.0));
        assert_eq!(s.valid_count(), 1);
        assert_eq!(s.get(0), Some(Vec3::splat(2.0)));
        assert_eq!(s.seed_point(), Vec3::splat(2.0));
    }

    #[test]
    fn test_reserve_truncates_at_capacity() {
        let mut s = store(8);
        for _ in 0..6 {
            s.append(Vec3::ZERO).unwrap();
        }
        assert_eq!(s.valid_count(), 7);
        let range = s.reserve(5);
        assert_eq!(range, 7..8);
        s.commit(range);
        assert_eq!(s.valid_count(), 8);
        assert!(s.reserve(5).is_empty());
    }

    #[test]
    fn test_snapshot_excludes_stale_entries() {
        let mut s = store(8);
        s.append(Vec3::X).unwrap();
        s.seed(Vec3::Z);
        // index 1 still holds X in the arena but is no longer valid
        assert_eq!(s.buffer().read(1), Some(Vec3::X));
        assert_eq!(s.snapshot().points().len(), 1);
    }

    #[test]
    fn test_gpu_point_stride() {
        assert_eq!(std::mem::size_of::<GpuPoint>(), 16);
    }
}
