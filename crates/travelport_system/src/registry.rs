//! # TravelPort Registry
//!
//! The canonical `id -> TravelPort` map. The registry is the only place that
//! allocates ids and changes links, so the symmetric-link invariant holds as
//! long as ports are mutated through it:
//!
//! - a linked port's target exists and targets it back
//! - [`Registry::link`] only pairs two unlinked ports
//! - [`Registry::remove`] unlinks before deleting

use crate::area::Area;
use crate::error::TravelError;
use crate::port::TravelPort;
use crate::store::{PortStore, SkippedLine};
use crate::types::{PortId, Vec3};
use std::collections::HashMap;
use tracing::{info, warn};

/// Result of [`Registry::load`].
#[derive(Debug)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: Vec<SkippedLine>,
}

/// A link that breaks the symmetry invariant, as found by [`Registry::link_problems`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkProblem {
    /// The target id names no port.
    MissingTarget { port: PortId, target: PortId },
    /// The target exists but does not point back.
    OneSided { port: PortId, target: PortId },
}

#[derive(Debug, Default)]
pub struct Registry {
    ports: HashMap<PortId, TravelPort>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn contains(&self, id: PortId) -> bool {
        self.ports.contains_key(&id)
    }

    /// All ports ordered by id.
    pub fn ports(&self) -> Vec<&TravelPort> {
        let mut ports: Vec<&TravelPort> = self.ports.values().collect();
        ports.sort_by_key(|port| port.id());
        ports
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> Vec<PortId> {
        let mut ids: Vec<PortId> = self.ports.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Registers a new manual, unlinked port under the lowest unused id.
    pub fn create(&mut self, name: impl Into<String>, area: Area) -> &mut TravelPort {
        let id = (0..)
            .map(PortId)
            .find(|id| !self.ports.contains_key(id))
            .unwrap_or(PortId(u32::MAX));
        let port = TravelPort::new(id, name, area);
        info!("🆕 Created TravelPort {} '{}'", id, port.name());
        self.ports.entry(id).or_insert(port)
    }

    pub fn get(&self, id: PortId) -> Result<&TravelPort, TravelError> {
        self.ports
            .get(&id)
            .ok_or_else(|| TravelError::NotFound(format!("id {id}")))
    }

    pub fn get_mut(&mut self, id: PortId) -> Result<&mut TravelPort, TravelError> {
        self.ports
            .get_mut(&id)
            .ok_or_else(|| TravelError::NotFound(format!("id {id}")))
    }

    /// Resolves a user-typed token: an integer is an id, anything else must
    /// match exactly one port name (case-insensitive substring).
    pub fn search(&self, token: &str) -> Result<&TravelPort, TravelError> {
        let token = token.trim();
        let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return match token.parse::<u32>() {
                Ok(id) => self.get(PortId(id)),
                Err(_) => Err(TravelError::NotFound(format!("id {token}"))),
            };
        }

        let matches = self.search_all(token);
        match matches.as_slice() {
            [port] => Ok(port),
            [] => Err(TravelError::NotFound(format!("no port matches '{token}'"))),
            many => Err(TravelError::NotFound(format!(
                "'{token}' is ambiguous ({} ports match)",
                many.len()
            ))),
        }
    }

    /// Every port whose name contains `keyword` (case-insensitive), by id.
    pub fn search_all(&self, keyword: &str) -> Vec<&TravelPort> {
        let keyword = keyword.to_lowercase();
        self.ports()
            .into_iter()
            .filter(|port| port.name().to_lowercase().contains(&keyword))
            .collect()
    }

    /// The port a player at `position` in `world` stands in.
    ///
    /// Overlapping areas resolve to the smallest volume, then the lowest id.
    pub fn port_at(&self, world: &str, position: &Vec3) -> Option<&TravelPort> {
        self.ports
            .values()
            .filter(|port| port.area().contains(world, position))
            .min_by_key(|port| (port.area().volume(), port.id()))
    }

    /// The partner a linked port sends players to, if it still exists.
    pub fn linked_port(&self, id: PortId) -> Option<&TravelPort> {
        let target = self.ports.get(&id)?.target()?;
        self.ports.get(&target)
    }

    /// Pairs two unlinked ports with each other.
    pub fn link(&mut self, a: PortId, b: PortId) -> Result<(), TravelError> {
        if a == b {
            return Err(TravelError::InvalidLink(format!(
                "port {a} cannot be linked to itself"
            )));
        }
        for id in [a, b] {
            if let Some(target) = self.get(id)?.target() {
                return Err(TravelError::InvalidLink(format!(
                    "port {id} is already linked to {target}"
                )));
            }
        }

        self.get_mut(a)?.set_target(Some(b));
        self.get_mut(b)?.set_target(Some(a));
        info!("🔗 Linked TravelPorts {} <-> {}", a, b);
        Ok(())
    }

    /// Clears the link on both sides.
    ///
    /// A partner that is missing or no longer points back is logged and left
    /// alone; the port itself is always unlinked.
    pub fn unlink(&mut self, id: PortId) -> Result<(), TravelError> {
        let port = self.get_mut(id)?;
        let Some(target) = port.target() else {
            return Err(TravelError::InvalidLink(format!("port {id} is not linked")));
        };
        port.set_target(None);

        match self.ports.get_mut(&target) {
            Some(partner) if partner.target() == Some(id) => partner.set_target(None),
            Some(_) => warn!("⚠️ TravelPort {} did not link back to {}", target, id),
            None => warn!("⚠️ TravelPort {} was linked to missing port {}", id, target),
        }
        info!("✂️ Unlinked TravelPort {} from {}", id, target);
        Ok(())
    }

    /// Deletes a port, unlinking it first.
    pub fn remove(&mut self, id: PortId) -> Result<TravelPort, TravelError> {
        if self.get(id)?.is_linked() {
            if let Err(e) = self.unlink(id) {
                warn!("⚠️ Unlink before removing TravelPort {} failed: {}", id, e);
            }
        }
        let port = self
            .ports
            .remove(&id)
            .ok_or_else(|| TravelError::NotFound(format!("id {id}")))?;
        info!("🗑️ Removed TravelPort {} '{}'", id, port.name());
        Ok(port)
    }

    /// Links violating the symmetry invariant, ordered by port id.
    pub fn link_problems(&self) -> Vec<LinkProblem> {
        self.ports()
            .into_iter()
            .filter_map(|port| {
                let target = port.target()?;
                match self.ports.get(&target) {
                    None => Some(LinkProblem::MissingTarget {
                        port: port.id(),
                        target,
                    }),
                    Some(partner) if partner.target() != Some(port.id()) => {
                        Some(LinkProblem::OneSided {
                            port: port.id(),
                            target,
                        })
                    }
                    Some(_) => None,
                }
            })
            .collect()
    }

    /// Replaces the registry contents with what `store` holds.
    pub fn load(&mut self, store: &dyn PortStore) -> Result<LoadSummary, TravelError> {
        let report = store.load()?;
        self.ports = report
            .ports
            .into_iter()
            .map(|port| (port.id(), port))
            .collect();

        for problem in self.link_problems() {
            warn!("⚠️ Loaded inconsistent link: {:?}", problem);
        }

        Ok(LoadSummary {
            loaded: self.ports.len(),
            skipped: report.skipped,
        })
    }

    /// Writes every port, ordered by id.
    pub fn save(&self, store: &dyn PortStore) -> Result<(), TravelError> {
        store.save(&self.ports())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::CuboidArea;

    fn area(x: i32) -> Area {
        CuboidArea::new("world", [x, 60, 0], [x + 10, 70, 10]).into()
    }

    fn registry_with(names: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for (i, name) in names.iter().enumerate() {
            registry.create(*name, area(i as i32 * 100));
        }
        registry
    }

    #[test]
    fn test_create_allocates_lowest_free_id() {
        let mut registry = registry_with(&["a", "b", "c"]);
        assert_eq!(registry.ids(), vec![PortId(0), PortId(1), PortId(2)]);

        registry.remove(PortId(1)).unwrap();
        let port = registry.create("d", area(500));
        assert_eq!(port.id(), PortId(1));
        assert_eq!(registry.create("e", area(600)).id(), PortId(3));
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let registry = registry_with(&["a"]);
        assert!(matches!(registry.get(PortId(9)), Err(TravelError::NotFound(_))));
    }

    #[test]
    fn test_search_by_id_or_unique_name() {
        let registry = registry_with(&["a", "b", "c", "d", "e", "f", "g", "Spawn Hub", "Spawn Gate", "Harbour"]);

        // id 7 even though no name contains "7"
        assert_eq!(registry.search("7").unwrap().name(), "Spawn Hub");
        assert!(matches!(registry.search("Spawn"), Err(TravelError::NotFound(_))));
        assert_eq!(registry.search("spawn gate").unwrap().id(), PortId(8));
        assert_eq!(registry.search("HARB").unwrap().id(), PortId(9));
        assert!(matches!(registry.search("Castle"), Err(TravelError::NotFound(_))));
        assert!(matches!(registry.search("42"), Err(TravelError::NotFound(_))));
    }

    #[test]
    fn test_search_integer_tokens_never_match_names() {
        let registry = registry_with(&["Dock -1", "Pier 99999999999", "Quay +3"]);
        assert!(matches!(registry.search("-1"), Err(TravelError::NotFound(_))));
        assert!(matches!(registry.search("99999999999"), Err(TravelError::NotFound(_))));
        assert_eq!(registry.search("+2").unwrap().name(), "Quay +3");
        assert_eq!(registry.search("dock -").unwrap().id(), PortId(0));
    }

    #[test]
    fn test_search_all_never_fails() {
        let registry = registry_with(&["Spawn Hub", "Spawn Gate", "Harbour"]);
        let names: Vec<&str> = registry.search_all("spawn").iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Spawn Hub", "Spawn Gate"]);
        assert!(registry.search_all("castle").is_empty());
        assert_eq!(registry.search_all("").len(), 3);
    }

    #[test]
    fn test_link_is_symmetric() {
        let mut registry = registry_with(&["a", "b", "c"]);
        registry.link(PortId(0), PortId(1)).unwrap();
        assert_eq!(registry.get(PortId(0)).unwrap().target(), Some(PortId(1)));
        assert_eq!(registry.get(PortId(1)).unwrap().target(), Some(PortId(0)));
        assert_eq!(registry.linked_port(PortId(0)).unwrap().id(), PortId(1));
    }

    #[test]
    fn test_link_requires_both_unlinked() {
        let mut registry = registry_with(&["a", "b", "c"]);
        registry.link(PortId(0), PortId(1)).unwrap();
        assert!(matches!(
            registry.link(PortId(0), PortId(2)),
            Err(TravelError::InvalidLink(_))
        ));
        assert!(matches!(
            registry.link(PortId(2), PortId(1)),
            Err(TravelError::InvalidLink(_))
        ));
        assert!(matches!(
            registry.link(PortId(2), PortId(2)),
            Err(TravelError::InvalidLink(_))
        ));
        assert!(matches!(
            registry.link(PortId(2), PortId(9)),
            Err(TravelError::NotFound(_))
        ));
        assert_eq!(registry.get(PortId(2)).unwrap().target(), None);
    }

    #[test]
    fn test_unlink() {
        let mut registry = registry_with(&["a", "b"]);
        assert!(matches!(
            registry.unlink(PortId(0)),
            Err(TravelError::InvalidLink(_))
        ));

        registry.link(PortId(0), PortId(1)).unwrap();
        registry.unlink(PortId(1)).unwrap();
        assert_eq!(registry.get(PortId(0)).unwrap().target(), None);
        assert_eq!(registry.get(PortId(1)).unwrap().target(), None);
    }

    #[test]
    fn test_unlink_one_sided_degrades_gracefully() {
        let mut registry = registry_with(&["a", "b", "c"]);
        registry.get_mut(PortId(0)).unwrap().set_target(Some(PortId(7)));
        registry.unlink(PortId(0)).unwrap();
        assert_eq!(registry.get(PortId(0)).unwrap().target(), None);

        registry.link(PortId(1), PortId(2)).unwrap();
        registry.get_mut(PortId(0)).unwrap().set_target(Some(PortId(1)));
        registry.unlink(PortId(0)).unwrap();
        assert_eq!(registry.get(PortId(1)).unwrap().target(), Some(PortId(2)));
    }

    #[test]
    fn test_remove_linked_port_clears_partner() {
        let mut registry = registry_with(&["a", "b"]);
        registry.link(PortId(0), PortId(1)).unwrap();
        let removed = registry.remove(PortId(0)).unwrap();
        assert_eq!(removed.target(), None);
        assert_eq!(registry.get(PortId(1)).unwrap().target(), None);
        assert!(!registry.contains(PortId(0)));
        assert!(matches!(registry.remove(PortId(0)), Err(TravelError::NotFound(_))));
    }

    #[test]
    fn test_port_at_prefers_smallest_area() {
        let mut registry = Registry::new();
        registry.create("big", CuboidArea::new("world", [0, 0, 0], [100, 100, 100]).into());
        registry.create("small", CuboidArea::new("world", [10, 10, 10], [12, 12, 12]).into());
        registry.create("small twin", CuboidArea::new("world", [11, 11, 11], [13, 13, 13]).into());

        let inside_all = Vec3::new(11.5, 11.5, 11.5);
        assert_eq!(registry.port_at("world", &inside_all).unwrap().name(), "small");
        let only_big = Vec3::new(50.0, 50.0, 50.0);
        assert_eq!(registry.port_at("world", &only_big).unwrap().name(), "big");
        assert!(registry.port_at("world", &Vec3::new(500.0, 0.0, 0.0)).is_none());
        assert!(registry.port_at("other", &only_big).is_none());
    }

    #[test]
    fn test_link_problems() {
        let mut registry = registry_with(&["a", "b", "c", "d"]);
        registry.link(PortId(0), PortId(1)).unwrap();
        registry.get_mut(PortId(2)).unwrap().set_target(Some(PortId(9)));
        registry.get_mut(PortId(3)).unwrap().set_target(Some(PortId(0)));

        assert_eq!(
            registry.link_problems(),
            vec![
                LinkProblem::MissingTarget {
                    port: PortId(2),
                    target: PortId(9)
                },
                LinkProblem::OneSided {
                    port: PortId(3),
                    target: PortId(0)
                },
            ]
        );
    }
}
