//! Transient Texture Pool
//!
//! Provides render targets for short-lived, per-frame use by compositor nodes.
//! A node acquires textures in `render` and holds the returned
//! [`PooledTexture`] handles until its `clear`; dropping a handle returns the
//! texture to the free list so a later node in the same frame can reuse it.
//!
//! # Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              TransientTexturePool                   │
//! │                                                     │
//! │  acquire(desc) → PooledTexture   (node render)      │
//! │  drop(PooledTexture)             (node clear)       │
//! │  free: FxHashMap<Key, Vec<FreeTexture>>             │
//! │  trim(max_idle)                  (frame boundary)   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Memory Strategy
//!
//! - Textures are never destroyed during normal rendering; released ones stay
//!   in the free pool for reuse.
//! - The pool grows on demand when no compatible free texture exists.
//! - Call [`TransientTexturePool::trim`] once per frame (or after a resolution
//!   change) to destroy textures that have sat unused for several frames.
//!
//! Because release is tied to the compositor's last-use tracking, peak memory
//! is bounded by the nodes alive at the same time rather than the node count.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::renderer::core::gpu::{GpuDevice, PixelFormat, TextureDesc, TextureId, TextureUsage};

// ─── Internal Types ───────────────────────────────────────────────────────────

/// Key for texture recycling. Usage is part of the key: handing out a texture
/// with the wrong usage flags would fail validation in the device layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct PoolKey {
    width: u32,
    height: u32,
    format: PixelFormat,
    usage: TextureUsage,
    samples: u32,
}

impl PoolKey {
    fn from_desc(desc: &TextureDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
            samples: desc.samples,
        }
    }
}

struct FreeTexture {
    id: TextureId,
    /// Number of trims this texture survived without being reused.
    idle_frames: u32,
}

#[derive(Default)]
struct PoolState {
    free: FxHashMap<PoolKey, Vec<FreeTexture>>,
    active: usize,
}

// ─── Public Types ─────────────────────────────────────────────────────────────

/// Exclusive handle to a pooled texture.
///
/// The texture goes back to the pool when the handle is dropped. Downstream
/// nodes may read the texture through its [`TextureId`] while the owning node
/// keeps the handle alive.
pub struct PooledTexture {
    id: TextureId,
    key: PoolKey,
    pool: Weak<RefCell<PoolState>>,
}

impl PooledTexture {
    #[inline]
    #[must_use]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.key.width, self.key.height)
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.key.format
    }
}

impl std::fmt::Debug for PooledTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledTexture")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish()
    }
}

impl Drop for PooledTexture {
    fn drop(&mut self) {
        // A dropped pool leaves the texture to the device's own teardown.
        let Some(state) = self.pool.upgrade() else {
            return;
        };
        let mut state = state.borrow_mut();
        state.active = state.active.saturating_sub(1);
        state.free.entry(self.key).or_default().push(FreeTexture {
            id: self.id,
            idle_frames: 0,
        });
    }
}

// ─── Pool Implementation ──────────────────────────────────────────────────────

/// Texture pool shared by all nodes of the compositors on the frame thread.
///
/// Cloning the pool yields another handle to the same storage.
///
/// # Thread Safety
///
/// The pool is `!Send`: acquisition, release and trimming all happen on the
/// thread driving the frame.
#[derive(Clone, Default)]
pub struct TransientTexturePool {
    state: Rc<RefCell<PoolState>>,
}

impl TransientTexturePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a texture matching `desc`, reusing a free one when possible.
    ///
    /// Device allocation failures propagate unchanged.
    pub fn acquire(&self, device: &mut dyn GpuDevice, desc: &TextureDesc) -> Result<PooledTexture> {
        let key = PoolKey::from_desc(desc);

        let reused = self
            .state
            .borrow_mut()
            .free
            .get_mut(&key)
            .and_then(Vec::pop)
            .map(|t| t.id);

        let id = match reused {
            Some(id) => id,
            None => device.create_texture(desc)?,
        };

        self.state.borrow_mut().active += 1;

        Ok(PooledTexture {
            id,
            key,
            pool: Rc::downgrade(&self.state),
        })
    }

    /// Destroys free textures that have been idle for more than
    /// `max_idle_frames` trims.
    pub fn trim(&self, device: &mut dyn GpuDevice, max_idle_frames: u32) {
        let mut state = self.state.borrow_mut();
        for bucket in state.free.values_mut() {
            for t in bucket.iter_mut() {
                t.idle_frames += 1;
            }
            bucket.retain(|t| {
                let keep = t.idle_frames <= max_idle_frames;
                if !keep {
                    device.destroy_texture(t.id);
                }
                keep
            });
        }
        state.free.retain(|_, bucket| !bucket.is_empty());
    }

    /// Destroys every free texture. Outstanding handles are unaffected.
    pub fn release_free(&self, device: &mut dyn GpuDevice) {
        let mut state = self.state.borrow_mut();
        for (_, bucket) in state.free.drain() {
            for t in bucket {
                device.destroy_texture(t.id);
            }
        }
    }

    /// Number of textures currently held by nodes.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.state.borrow().active
    }

    /// Number of textures waiting for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.state.borrow().free.values().map(Vec::len).sum()
    }

    /// Total number of textures owned by the pool (active and free).
    #[must_use]
    pub fn total_texture_count(&self) -> usize {
        self.active_count() + self.free_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::headless::HeadlessDevice;

    fn desc() -> TextureDesc {
        TextureDesc::color("test", PixelFormat::Rgba8, 64, 64, 1)
    }

    #[test]
    fn dropped_texture_is_reused() {
        let mut device = HeadlessDevice::new();
        let pool = TransientTexturePool::new();

        let first = pool.acquire(&mut device, &desc()).map(|t| t.id());
        let second = pool.acquire(&mut device, &desc()).map(|t| t.id());

        assert_eq!(first, second);
        assert_eq!(device.live_textures(), 1);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn held_textures_are_distinct() -> Result<()> {
        let mut device = HeadlessDevice::new();
        let pool = TransientTexturePool::new();

        let a = pool.acquire(&mut device, &desc())?;
        let b = pool.acquire(&mut device, &desc())?;
        assert_ne!(a.id(), b.id());
        assert_eq!(pool.active_count(), 2);

        drop(a);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.total_texture_count(), 2);
        drop(b);
        Ok(())
    }

    #[test]
    fn different_format_is_not_reused() -> Result<()> {
        let mut device = HeadlessDevice::new();
        let pool = TransientTexturePool::new();

        drop(pool.acquire(&mut device, &desc())?);
        let depth = pool.acquire(&mut device, &TextureDesc::depth("depth", 64, 64, 1))?;
        assert_eq!(device.live_textures(), 2);
        assert!(depth.format().is_depth());
        Ok(())
    }

    #[test]
    fn trim_destroys_idle_textures() -> Result<()> {
        let mut device = HeadlessDevice::new();
        let pool = TransientTexturePool::new();

        drop(pool.acquire(&mut device, &desc())?);
        pool.trim(&mut device, 1);
        assert_eq!(pool.free_count(), 1);
        pool.trim(&mut device, 1);
        assert_eq!(pool.free_count(), 0);
        assert_eq!(device.live_textures(), 0);
        Ok(())
    }

    #[test]
    fn release_free_keeps_held_textures() -> Result<()> {
        let mut device = HeadlessDevice::new();
        let pool = TransientTexturePool::new();

        let held = pool.acquire(&mut device, &desc())?;
        drop(pool.acquire(&mut device, &desc())?);
        assert_eq!(pool.free_count(), 1);

        pool.release_free(&mut device);
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(device.live_textures(), 1);
        drop(held);
        Ok(())
    }

    #[test]
    fn allocation_failure_propagates() {
        let mut device = HeadlessDevice::with_texture_budget(0);
        let pool = TransientTexturePool::new();
        assert!(pool.acquire(&mut device, &desc()).is_err());
        assert_eq!(pool.active_count(), 0);
    }
}
