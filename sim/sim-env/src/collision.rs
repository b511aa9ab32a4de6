//! Composition of collision queries from pairwise link tests.
//!
//! A query names a target (an object or a single link) and a [`Scope`] to
//! test it against. Both sides are expanded to links, self-pairs are
//! dropped, and every remaining pair is handed to the backend's narrow
//! phase in ascending link-id order:
//!
//! ```text
//!   target ──► side A links ─┐
//!                            ├─► (a, b) pairs ──► Backend::collide
//!   scope  ──► side B links ─┘
//! ```
//!
//! A pair is a self-pair when both entries are the same link, or when both
//! links belong to one object and either side names that object as a
//! whole. A link named on its own is therefore tested against its sibling
//! links, while an object is never tested against any of its own links, in
//! whichever order the two are passed.
//!
//! Boolean queries stop at the first colliding pair. Contact queries visit
//! every pair and keep every contact the backend reports.

use hashbrown::HashMap;
use sim_env_types::{Contact, LinkId, ObjectId};

use crate::backend::{Backend, LinkGeometry};
use crate::entity::{Posed, Target};
use crate::registry::Registry;

/// What a target is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Every link of every other object.
    Anything,
    /// A single object or link.
    Entity(Target),
    /// Every link of the listed objects.
    Objects(&'a [ObjectId]),
    /// The listed links.
    Links(&'a [LinkId]),
}

impl From<Target> for Scope<'_> {
    fn from(target: Target) -> Self {
        Self::Entity(target)
    }
}

impl<'a> From<&'a [ObjectId]> for Scope<'a> {
    fn from(objects: &'a [ObjectId]) -> Self {
        Self::Objects(objects)
    }
}

impl<'a> From<&'a [LinkId]> for Scope<'a> {
    fn from(links: &'a [LinkId]) -> Self {
        Self::Links(links)
    }
}

/// Read-only view of what a query needs from a world.
pub(crate) struct CollisionQuery<'w, B: Backend> {
    pub backend: &'w B,
    pub registry: &'w Registry,
    pub geometry: &'w HashMap<LinkId, B::Geometry>,
}

impl<'w, B: Backend> CollisionQuery<'w, B> {
    /// Run a query. With `contacts`, every pair is evaluated and contacts
    /// are appended; without, the first colliding pair ends the query.
    pub fn run(
        &self,
        target: Target,
        scope: Scope<'_>,
        contacts: Option<&mut Vec<Contact>>,
    ) -> bool {
        let side_a = self.target_links(target);
        if side_a.is_empty() {
            return false;
        }
        let side_b = self.scope_links(target, scope);
        let whole_objects = matches!(target, Target::Object(_)) || Self::names_objects(scope);
        let pairs: Vec<(LinkId, LinkId)> = side_a
            .iter()
            .flat_map(|&a| side_b.iter().map(move |&b| (a, b)))
            .filter(|&(a, b)| !self.is_self_pair(a, b, whole_objects))
            .collect();

        match contacts {
            None => pairs
                .iter()
                .any(|&(a, b)| self.collide_pair(a, b, None).unwrap_or(false)),
            Some(out) => {
                let mut hit = false;
                for &(a, b) in &pairs {
                    hit |= self.collide_pair(a, b, Some(&mut *out)).unwrap_or(false);
                }
                hit
            }
        }
    }

    fn collide_pair(
        &self,
        a: LinkId,
        b: LinkId,
        contacts: Option<&mut Vec<Contact>>,
    ) -> Option<bool> {
        let a = self.link_geometry(a)?;
        let b = self.link_geometry(b)?;
        Some(self.backend.collide(&a, &b, contacts))
    }

    fn link_geometry(&self, id: LinkId) -> Option<LinkGeometry<'w, B::Geometry>> {
        let link = self.registry.link(id)?;
        let geometry = self.geometry.get(&id)?;
        Some(LinkGeometry {
            object: link.object(),
            link: id,
            transform: link.transform(),
            geometry,
        })
    }

    /// Links standing for a target, sorted.
    fn target_links(&self, target: Target) -> Vec<LinkId> {
        match target {
            Target::Object(id) => self.object_links(id),
            Target::Link(id) => self
                .registry
                .link(id)
                .map(|_| vec![id])
                .unwrap_or_default(),
        }
    }

    fn object_links(&self, id: ObjectId) -> Vec<LinkId> {
        let mut links = self
            .registry
            .object(id)
            .map(|o| o.links().to_vec())
            .unwrap_or_default();
        links.sort_unstable();
        links
    }

    /// Links a scope expands to, sorted and deduplicated.
    fn scope_links(&self, target: Target, scope: Scope<'_>) -> Vec<LinkId> {
        let mut links = match scope {
            Scope::Anything => {
                let owner = self.owner(target);
                self.registry
                    .objects()
                    .filter(|o| Some(o.id()) != owner)
                    .flat_map(|o| o.links().iter().copied())
                    .collect()
            }
            Scope::Entity(other) => self.target_links(other),
            Scope::Objects(ids) => ids.iter().flat_map(|&id| self.object_links(id)).collect(),
            Scope::Links(ids) => ids
                .iter()
                .copied()
                .filter(|&id| self.registry.link(id).is_some())
                .collect(),
        };
        links.sort_unstable();
        links.dedup();
        links
    }

    fn owner(&self, target: Target) -> Option<ObjectId> {
        match target {
            Target::Object(id) => Some(id),
            Target::Link(id) => self.registry.link(id).map(crate::link::Link::object),
        }
    }

    /// Whether a scope refers to whole objects rather than single links.
    fn names_objects(scope: Scope<'_>) -> bool {
        matches!(
            scope,
            Scope::Anything | Scope::Objects(_) | Scope::Entity(Target::Object(_))
        )
    }

    fn is_self_pair(&self, a: LinkId, b: LinkId, whole_objects: bool) -> bool {
        if a == b {
            return true;
        }
        whole_objects && self.owner(Target::Link(a)) == self.owner(Target::Link(b))
    }
}
