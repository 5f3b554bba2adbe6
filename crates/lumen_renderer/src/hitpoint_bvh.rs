//! Hitpoints of the progressive photon mapper and the BVH that finds them.
//!
//! A hitpoint is a camera-visible surface sample that gathers photon flux
//! within a shrinking search radius. The tree is built once per forward
//! pass. Radii only ever shrink afterwards, so the build-time boxes stay
//! conservative for the lifetime of the tree.

use crate::bvh::{BvhTree, TreeVisitor};
use crate::{Color, HitRecord};
use lumen_math::{Aabb, Vec3};
use std::f32::consts::PI;
use std::ops::{ControlFlow, Range};

/// A camera-visible sample point accumulating photon energy.
#[derive(Clone, Copy)]
pub struct Hitpoint<'a> {
    /// Shading point found by the eye ray.
    pub hit: HitRecord<'a>,
    pub pixel_x: u32,
    pub pixel_y: u32,
    /// Throughput from the eye through any specular chain, including the
    /// sub-sample weight.
    pub weight: f32,
    pub radius: f32,
    /// Direct illumination, computed once in the forward pass.
    pub direct: Color,
    /// Accumulated photon flux inside the current radius.
    pub flux: Color,
    /// Blended photon count over past iterations.
    pub photon_count: f32,
    /// Photons received during the current iteration.
    pub new_photon_count: u32,
}

impl<'a> Hitpoint<'a> {
    pub fn new(
        hit: HitRecord<'a>,
        pixel_x: u32,
        pixel_y: u32,
        weight: f32,
        radius: f32,
        direct: Color,
    ) -> Self {
        Self {
            hit,
            pixel_x,
            pixel_y,
            weight,
            radius,
            direct,
            flux: Color::ZERO,
            photon_count: 0.0,
            new_photon_count: 0,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.hit.p
    }

    /// Cube of half-width `radius` around the position.
    pub fn bounds(&self) -> Aabb {
        let mut bbox = Aabb::EMPTY;
        for corner in 0..8u32 {
            let sign = Vec3::new(
                if corner & 1 == 0 { -1.0 } else { 1.0 },
                if corner & 2 == 0 { -1.0 } else { 1.0 },
                if corner & 4 == 0 { -1.0 } else { 1.0 },
            );
            bbox.include_point(self.hit.p + sign * self.radius);
        }
        bbox
    }

    /// True if `p` lies inside the search sphere.
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        self.hit.p.distance_squared(p) <= self.radius * self.radius
    }

    /// Fold this iteration's photons into the running estimate, shrinking
    /// the radius by `sqrt((N + kM) / (N + M))`. Hitpoints that received
    /// nothing are left unchanged.
    pub fn progressive_update(&mut self, reduction: f32) {
        if self.new_photon_count == 0 {
            return;
        }

        let new = self.new_photon_count as f32;
        let total = self.photon_count + reduction * new;
        let ratio = total / (self.photon_count + new);

        self.radius *= ratio.sqrt();
        self.flux *= ratio;
        self.photon_count = total;
        self.new_photon_count = 0;
    }

    /// Radiance estimate after `emitted_photons` photons per light.
    pub fn radiance(&self, emitted_photons: f32) -> Color {
        let area = PI * self.radius * self.radius;
        if emitted_photons <= 0.0 || area <= 0.0 {
            return self.direct;
        }
        self.direct + self.flux / (area * emitted_photons)
    }
}

/// BVH over hitpoints answering point-containment queries.
pub struct PointBvh<'a> {
    tree: BvhTree,
    hitpoints: Vec<Hitpoint<'a>>,
}

impl<'a> PointBvh<'a> {
    /// Build the tree. Hitpoints are reordered into leaf order.
    pub fn build(mut hitpoints: Vec<Hitpoint<'a>>) -> Self {
        let tree = BvhTree::build(&mut hitpoints, Hitpoint::bounds);
        Self { tree, hitpoints }
    }

    pub fn len(&self) -> usize {
        self.hitpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hitpoints.is_empty()
    }

    pub fn hitpoints(&self) -> &[Hitpoint<'a>] {
        &self.hitpoints
    }

    pub fn tree(&self) -> &BvhTree {
        &self.tree
    }

    /// Call `f` with the index of every hitpoint whose sphere contains `point`.
    pub fn for_each_near(&self, point: Vec3, f: impl FnMut(usize, &Hitpoint<'a>)) {
        let mut visitor = Near {
            point,
            hitpoints: &self.hitpoints,
            f,
        };
        let _ = self.tree.traverse(&mut visitor);
    }

    /// Indices of every hitpoint whose sphere contains `point`.
    pub fn query_near(&self, point: Vec3) -> Vec<usize> {
        let mut found = Vec::new();
        self.for_each_near(point, |i, _| found.push(i));
        found
    }

    /// Deposit into every hitpoint containing `point`. `weight` returns the
    /// flux to add, or `None` to skip the hitpoint. Returns the number of
    /// hitpoints that received flux.
    pub fn deposit_near(
        &mut self,
        point: Vec3,
        mut weight: impl FnMut(&Hitpoint<'a>) -> Option<Color>,
    ) -> usize {
        let mut visitor = NearMut {
            point,
            hitpoints: &mut self.hitpoints,
            f: |hp: &mut Hitpoint<'a>| match weight(&*hp) {
                Some(flux) => {
                    hp.flux += flux;
                    hp.new_photon_count += 1;
                    true
                }
                None => false,
            },
            deposited: 0,
        };
        let _ = self.tree.traverse(&mut visitor);
        visitor.deposited
    }

    /// Apply the progressive update to every hitpoint. Returns the smallest
    /// and largest radius afterwards.
    pub fn progressive_update(&mut self, reduction: f32) -> (f32, f32) {
        let mut range = (f32::INFINITY, 0.0f32);
        for hp in &mut self.hitpoints {
            hp.progressive_update(reduction);
            range = (range.0.min(hp.radius), range.1.max(hp.radius));
        }
        range
    }
}

struct Near<'h, 'a, F> {
    point: Vec3,
    hitpoints: &'h [Hitpoint<'a>],
    f: F,
}

impl<'a, F: FnMut(usize, &Hitpoint<'a>)> TreeVisitor for Near<'_, 'a, F> {
    fn overlaps(&self, bbox: &Aabb) -> bool {
        bbox.contains_point(self.point)
    }

    fn visit_leaf(&mut self, items: Range<usize>) -> ControlFlow<()> {
        for i in items {
            let hp = &self.hitpoints[i];
            if hp.contains(self.point) {
                (self.f)(i, hp);
            }
        }
        ControlFlow::Continue(())
    }
}

struct NearMut<'h, 'a, F> {
    point: Vec3,
    hitpoints: &'h mut [Hitpoint<'a>],
    f: F,
    deposited: usize,
}

impl<'a, F: FnMut(&mut Hitpoint<'a>) -> bool> TreeVisitor for NearMut<'_, 'a, F> {
    fn overlaps(&self, bbox: &Aabb) -> bool {
        bbox.contains_point(self.point)
    }

    fn visit_leaf(&mut self, items: Range<usize>) -> ControlFlow<()> {
        for hp in &mut self.hitpoints[items] {
            if hp.contains(self.point) && (self.f)(hp) {
                self.deposited += 1;
            }
        }
        ControlFlow::Continue(())
    }
}

/// Flux deposits recorded against a shared, read-only [`PointBvh`].
///
/// Each photon worker fills its own buffer; buffers are merged and applied
/// once the parallel pass is over.
#[derive(Debug, Clone, Default)]
pub struct FluxBuffer {
    entries: Vec<(u32, Color)>,
}

impl FluxBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a deposit into every hitpoint of `bvh` containing `point`.
    /// Same contract as [`PointBvh::deposit_near`].
    pub fn deposit<'a>(
        &mut self,
        bvh: &PointBvh<'a>,
        point: Vec3,
        mut weight: impl FnMut(&Hitpoint<'a>) -> Option<Color>,
    ) -> usize {
        let before = self.entries.len();
        bvh.for_each_near(point, |i, hp| {
            if let Some(flux) = weight(hp) {
                self.entries.push((i as u32, flux));
            }
        });
        self.entries.len() - before
    }

    /// Entries of `other` follow those of `self`.
    pub fn merge(mut self, mut other: FluxBuffer) -> FluxBuffer {
        self.entries.append(&mut other.entries);
        self
    }

    /// Fold every recorded deposit into its hitpoint.
    pub fn apply(self, bvh: &mut PointBvh<'_>) {
        for (index, flux) in self.entries {
            let hp = &mut bvh.hitpoints[index as usize];
            hp.flux += flux;
            hp.new_photon_count += 1;
        }
    }
}
