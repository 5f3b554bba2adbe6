//! Ray queries against a BVH over scene primitives.

use crate::bvh::{BvhTree, TreeVisitor};
use crate::hittable::{HitRecord, Hittable};
use lumen_math::{Aabb, Ray};
use std::ops::{ControlFlow, Range};

/// BVH over boxed primitives answering any-hit and closest-hit queries.
pub struct RayBvh {
    tree: BvhTree,
    objects: Vec<Box<dyn Hittable>>,
}

impl RayBvh {
    /// Build the tree. The objects are reordered into leaf order.
    pub fn build(mut objects: Vec<Box<dyn Hittable>>) -> Self {
        let tree = BvhTree::build(&mut objects, |object| object.bounding_box());
        Self { tree, objects }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// True if any primitive is hit within the ray's range.
    pub fn intersect_any(&self, ray: &Ray) -> bool {
        let mut visitor = AnyHit {
            ray,
            objects: &self.objects,
        };
        self.tree.traverse(&mut visitor).is_break()
    }

    /// Nearest hit within the ray's range.
    pub fn intersect<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        let mut visitor = ClosestHit {
            ray: *ray,
            objects: &self.objects,
            closest: None,
        };
        let _ = self.tree.traverse(&mut visitor);
        visitor.closest
    }
}

impl Hittable for RayBvh {
    fn hit<'a>(&'a self, ray: &Ray) -> Option<HitRecord<'a>> {
        self.intersect(ray)
    }

    fn hit_any(&self, ray: &Ray) -> bool {
        self.intersect_any(ray)
    }

    fn bounding_box(&self) -> Aabb {
        self.tree.bounding_box()
    }
}

struct AnyHit<'r, 'o> {
    ray: &'r Ray,
    objects: &'o [Box<dyn Hittable>],
}

impl TreeVisitor for AnyHit<'_, '_> {
    fn overlaps(&self, bbox: &Aabb) -> bool {
        bbox.hit(self.ray)
    }

    fn visit_leaf(&mut self, items: Range<usize>) -> ControlFlow<()> {
        if self.objects[items].iter().any(|object| object.hit_any(self.ray)) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

struct ClosestHit<'a> {
    /// `max_t` shrinks to the nearest hit found so far.
    ray: Ray,
    objects: &'a [Box<dyn Hittable>],
    closest: Option<HitRecord<'a>>,
}

impl TreeVisitor for ClosestHit<'_> {
    fn overlaps(&self, bbox: &Aabb) -> bool {
        bbox.hit(&self.ray)
    }

    fn visit_leaf(&mut self, items: Range<usize>) -> ControlFlow<()> {
        let objects = self.objects;
        for object in &objects[items] {
            if let Some(rec) = object.hit(&self.ray) {
                self.ray.max_t = rec.t;
                self.closest = Some(rec);
            }
        }
        ControlFlow::Continue(())
    }
}
