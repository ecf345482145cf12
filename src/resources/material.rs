use std::borrow::Cow;
use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;
use smallvec::{SmallVec, smallvec};

static NEXT_MATERIAL_ID: AtomicU32 = AtomicU32::new(1);

bitflags! {
    /// Shader-level flags that decide which queue a material lands in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ShaderFlags: u32 {
        const TRANSPARENT   = 1 << 0;
        const CAST_SHADOWS  = 1 << 1;
        const FORWARD       = 1 << 2;
        const ALPHA_TO_MASK = 1 << 3;
    }
}

/// One technique of a material: an ordered list of passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Technique {
    pub name: Cow<'static, str>,
    pub pass_count: u32,
}

impl Technique {
    pub fn new(name: impl Into<Cow<'static, str>>, pass_count: u32) -> Self {
        Self {
            name: name.into(),
            pass_count,
        }
    }
}

/// Material as seen by the queueing layer.
///
/// Parameter binding is owned by the device layer; here a material is the
/// identity used for batching and sorting plus the flags and techniques that
/// decide how its elements are queued.
#[derive(Debug)]
pub struct Material {
    id: u32,
    pub name: Cow<'static, str>,
    pub shader_flags: ShaderFlags,
    pub techniques: SmallVec<[Technique; 2]>,
}

impl Material {
    /// Creates a single-technique, single-pass material.
    pub fn new(name: impl Into<Cow<'static, str>>, shader_flags: ShaderFlags) -> Self {
        Self {
            id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            shader_flags,
            techniques: smallvec![Technique::new("Default", 1)],
        }
    }

    #[must_use]
    pub fn with_techniques(mut self, techniques: impl IntoIterator<Item = Technique>) -> Self {
        self.techniques = techniques.into_iter().collect();
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.shader_flags.contains(ShaderFlags::TRANSPARENT)
    }

    /// Number of passes of `technique`, zero when the index is out of range.
    #[must_use]
    pub fn pass_count(&self, technique: u32) -> u32 {
        self.techniques
            .get(technique as usize)
            .map_or(0, |t| t.pass_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materials_get_distinct_ids() {
        let a = Material::new("a", ShaderFlags::empty());
        let b = Material::new("a", ShaderFlags::empty());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn pass_count_out_of_range_is_zero() {
        let m = Material::new("m", ShaderFlags::FORWARD)
            .with_techniques([Technique::new("Forward", 2)]);
        assert_eq!(m.pass_count(0), 2);
        assert_eq!(m.pass_count(3), 0);
    }
}
