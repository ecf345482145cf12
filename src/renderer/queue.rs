//! Render Queues
//!
//! A [`RenderQueue`] collects the render elements one view draws in one
//! frame, expands them into one entry per material pass and sorts them
//! according to its [`StateReduction`] policy.
//!
//! | Policy     | Opaque order                                | Transparent order |
//! |------------|---------------------------------------------|-------------------|
//! | `None`     | submission                                  | submission        |
//! | `Material` | material, technique, pass, near-to-far      | (forced Distance) |
//! | `Distance` | near-to-far                                 | far-to-near       |
//!
//! After sorting, [`RenderQueueElement::apply_pass`] is set on every entry
//! whose pass differs from its predecessor so the forward pass only switches
//! pipeline state when it has to.

use std::cmp::Ordering;

use crate::renderer::settings::StateReduction;
use crate::resources::Material;

/// What a queue entry draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    /// Element `element` of scene renderable `renderable`.
    Scene { renderable: usize, element: usize },
    /// Instanced element of the owning view, by index.
    Instanced(usize),
}

/// One sorted draw entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderQueueElement {
    pub element: ElementRef,
    pub material_id: u32,
    /// Distance from the view origin to the element's bounds.
    pub distance: f32,
    pub technique: u32,
    pub pass: u32,
    /// Whether pass state must be applied before this entry.
    pub apply_pass: bool,
}

impl RenderQueueElement {
    #[inline]
    fn same_pass(&self, other: &Self) -> bool {
        self.material_id == other.material_id
            && self.technique == other.technique
            && self.pass == other.pass
    }
}

#[derive(Debug, Clone)]
pub struct RenderQueue {
    mode: StateReduction,
    back_to_front: bool,
    entries: Vec<RenderQueueElement>,
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new(StateReduction::default())
    }
}

impl RenderQueue {
    #[must_use]
    pub fn new(mode: StateReduction) -> Self {
        Self {
            mode,
            back_to_front: false,
            entries: Vec::with_capacity(256),
        }
    }

    /// Queue for transparent elements. `Material` reduction is replaced by
    /// `Distance` since blending needs a stable depth order.
    #[must_use]
    pub fn transparent(mode: StateReduction) -> Self {
        let mode = match mode {
            StateReduction::Material => StateReduction::Distance,
            other => other,
        };
        Self {
            mode,
            back_to_front: true,
            entries: Vec::with_capacity(64),
        }
    }

    #[inline]
    #[must_use]
    pub fn state_reduction(&self) -> StateReduction {
        self.mode
    }

    /// Queues every pass of `technique` of `material` for `element`.
    pub fn add(&mut self, element: ElementRef, material: &Material, distance: f32, technique: u32) {
        let pass_count = material.pass_count(technique);
        if pass_count == 0 {
            log::warn!(
                "Material {} has no passes for technique {technique}; element not queued",
                material.id()
            );
            return;
        }
        for pass in 0..pass_count {
            self.entries.push(RenderQueueElement {
                element,
                material_id: material.id(),
                distance,
                technique,
                pass,
                apply_pass: true,
            });
        }
    }

    /// Sorts according to the reduction policy and recomputes `apply_pass`.
    pub fn sort(&mut self) {
        match self.mode {
            StateReduction::None => {}
            StateReduction::Material => self.entries.sort_by(|a, b| {
                a.material_id
                    .cmp(&b.material_id)
                    .then(a.technique.cmp(&b.technique))
                    .then(a.pass.cmp(&b.pass))
                    .then(a.distance.total_cmp(&b.distance))
            }),
            StateReduction::Distance => {
                let back_to_front = self.back_to_front;
                self.entries.sort_by(|a, b| {
                    let order = a.distance.total_cmp(&b.distance);
                    let order = if back_to_front { order.reverse() } else { order };
                    // Keep passes of one element together and in order.
                    if order == Ordering::Equal {
                        a.pass.cmp(&b.pass)
                    } else {
                        order
                    }
                });
            }
        }

        let mut previous: Option<RenderQueueElement> = None;
        for entry in &mut self.entries {
            entry.apply_pass = previous.is_none_or(|prev| !prev.same_pass(entry));
            previous = Some(*entry);
        }
    }

    /// Entries in draw order (after [`sort`](Self::sort)).
    #[inline]
    #[must_use]
    pub fn sorted_elements(&self) -> &[RenderQueueElement] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{ShaderFlags, Technique};

    fn scene(i: usize) -> ElementRef {
        ElementRef::Scene {
            renderable: i,
            element: 0,
        }
    }

    #[test]
    fn material_mode_groups_by_material() {
        let a = Material::new("a", ShaderFlags::FORWARD);
        let b = Material::new("b", ShaderFlags::FORWARD);

        let mut queue = RenderQueue::new(StateReduction::Material);
        queue.add(scene(0), &b, 1.0, 0);
        queue.add(scene(1), &a, 5.0, 0);
        queue.add(scene(2), &b, 0.5, 0);
        queue.add(scene(3), &a, 2.0, 0);
        queue.sort();

        let order: Vec<_> = queue.sorted_elements().iter().map(|e| e.element).collect();
        assert_eq!(order, vec![scene(3), scene(1), scene(2), scene(0)]);

        let applies: Vec<_> = queue.sorted_elements().iter().map(|e| e.apply_pass).collect();
        assert_eq!(applies, vec![true, false, true, false]);
    }

    #[test]
    fn distance_mode_orders_opaque_near_to_far() {
        let m = Material::new("m", ShaderFlags::FORWARD);
        let mut queue = RenderQueue::new(StateReduction::Distance);
        queue.add(scene(0), &m, 9.0, 0);
        queue.add(scene(1), &m, 1.0, 0);
        queue.add(scene(2), &m, 4.0, 0);
        queue.sort();

        let distances: Vec<_> = queue.sorted_elements().iter().map(|e| e.distance).collect();
        assert_eq!(distances, vec![1.0, 4.0, 9.0]);
    }

    #[test]
    fn transparent_queue_forces_distance_back_to_front() {
        let m = Material::new("glass", ShaderFlags::TRANSPARENT);
        let mut queue = RenderQueue::transparent(StateReduction::Material);
        assert_eq!(queue.state_reduction(), StateReduction::Distance);

        queue.add(scene(0), &m, 1.0, 0);
        queue.add(scene(1), &m, 7.0, 0);
        queue.add(scene(2), &m, 3.0, 0);
        queue.sort();

        let distances: Vec<_> = queue.sorted_elements().iter().map(|e| e.distance).collect();
        assert_eq!(distances, vec![7.0, 3.0, 1.0]);
    }

    #[test]
    fn none_mode_keeps_submission_order() {
        let m = Material::new("m", ShaderFlags::FORWARD);
        let mut queue = RenderQueue::new(StateReduction::None);
        queue.add(scene(0), &m, 9.0, 0);
        queue.add(scene(1), &m, 1.0, 0);
        queue.sort();

        let order: Vec<_> = queue.sorted_elements().iter().map(|e| e.element).collect();
        assert_eq!(order, vec![scene(0), scene(1)]);
    }

    #[test]
    fn one_entry_per_pass() {
        let m = Material::new("multi", ShaderFlags::FORWARD)
            .with_techniques([Technique::new("Default", 1), Technique::new("Outline", 2)]);
        let mut queue = RenderQueue::new(StateReduction::Material);
        queue.add(scene(0), &m, 1.0, 1);
        queue.add(scene(1), &m, 2.0, 7);
        queue.sort();

        assert_eq!(queue.len(), 2);
        let passes: Vec<_> = queue.sorted_elements().iter().map(|e| e.pass).collect();
        assert_eq!(passes, vec![0, 1]);
        assert!(queue.sorted_elements().iter().all(|e| e.apply_pass));
    }

    #[test]
    fn technique_without_passes_is_skipped() {
        let m = Material::new("empty", ShaderFlags::FORWARD)
            .with_techniques([Technique::new("Default", 1), Technique::new("Disabled", 0)]);
        let mut queue = RenderQueue::new(StateReduction::Distance);
        queue.add(scene(0), &m, 1.0, 1);
        queue.add(scene(1), &m, 1.0, 5);
        assert!(queue.is_empty());
    }
}
