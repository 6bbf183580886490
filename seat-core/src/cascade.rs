//! City → Location → Slot dropdown cascade.
//!
//! Option sets for a level are always derived from the parent selection, so
//! nothing stale can be offered after an ancestor changes.

use crate::domain::{Catalog, City, Location, Slot};
use serde::Serialize;
use tracing::debug;

/// At most one selection per level. A deeper level is only ever set while
/// its parent is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub city: Option<String>,
    pub location: Option<String>,
    pub slot: Option<String>,
}

impl SelectionState {
    pub fn is_complete(&self) -> bool {
        self.city.is_some() && self.location.is_some() && self.slot.is_some()
    }
}

fn non_empty(id: &str) -> Option<String> {
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Locations of `city_id`; empty when the id is empty or not in the catalog.
pub fn locations_for<'a>(catalog: &'a Catalog, city_id: &str) -> &'a [Location] {
    catalog
        .city(city_id)
        .map(|c| c.locations.as_slice())
        .unwrap_or(&[])
}

/// Slots of `location_id` within an already-derived location set.
pub fn slots_for<'a>(locations: &'a [Location], location_id: &str) -> &'a [Slot] {
    locations
        .iter()
        .find(|l| l.id == location_id)
        .map(|l| l.slots.as_slice())
        .unwrap_or(&[])
}

#[derive(Debug, Clone, Default)]
pub struct CatalogCascade {
    catalog: Catalog,
    selection: SelectionState,
}

impl CatalogCascade {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            selection: SelectionState::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Swap in a freshly loaded catalog. Any prior selection is dropped.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.selection = SelectionState::default();
    }

    pub fn cities(&self) -> &[City] {
        self.catalog.cities()
    }

    pub fn locations(&self) -> &[Location] {
        match &self.selection.city {
            Some(city_id) => locations_for(&self.catalog, city_id),
            None => &[],
        }
    }

    pub fn slots(&self) -> &[Slot] {
        match &self.selection.location {
            Some(location_id) => slots_for(self.locations(), location_id),
            None => &[],
        }
    }

    /// Select (or with an empty id, deselect) a city. Location and slot are
    /// always cleared.
    pub fn select_city(&mut self, city_id: &str) {
        self.selection.city = non_empty(city_id);
        self.selection.location = None;
        self.selection.slot = None;
        debug!(city = ?self.selection.city, locations = self.locations().len(), "city selection changed");
    }

    /// Select a location under the current city. Ignored while no city is set.
    pub fn select_location(&mut self, location_id: &str) {
        if self.selection.city.is_none() {
            debug!("ignoring location selection without a city");
            return;
        }
        self.selection.location = non_empty(location_id);
        self.selection.slot = None;
        debug!(location = ?self.selection.location, slots = self.slots().len(), "location selection changed");
    }

    /// Select a slot under the current location. Ignored while no location is set.
    pub fn select_slot(&mut self, slot_id: &str) {
        if self.selection.location.is_none() {
            debug!("ignoring slot selection without a location");
            return;
        }
        self.selection.slot = non_empty(slot_id);
    }

    pub fn clear_selection(&mut self) {
        self.selection = SelectionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str) -> Slot {
        Slot { id: id.into(), name: format!("Slot {}", id) }
    }

    fn location(id: &str, slots: &[&str]) -> Location {
        Location {
            id: id.into(),
            name: format!("Location {}", id),
            slots: slots.iter().map(|s| slot(s)).collect(),
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::new(vec![
            City {
                id: "1".into(),
                name: "Mumbai".into(),
                locations: vec![location("10", &["100", "101"]), location("11", &["110"])],
            },
            City {
                id: "2".into(),
                name: "Delhi".into(),
                locations: vec![location("20", &["200"])],
            },
        ])
    }

    #[test]
    fn unknown_city_yields_no_locations() {
        let catalog = sample_catalog();
        for missing in ["3", "", "10", "mumbai"] {
            assert!(locations_for(&catalog, missing).is_empty(), "city {:?}", missing);
        }
    }

    #[test]
    fn empty_catalog_derives_nothing() {
        let mut cascade = CatalogCascade::new(Catalog::default());
        cascade.select_city("1");
        cascade.select_location("10");
        assert!(cascade.cities().is_empty());
        assert!(cascade.locations().is_empty());
        assert!(cascade.slots().is_empty());
    }

    #[test]
    fn selecting_city_derives_its_locations() {
        let mut cascade = CatalogCascade::new(sample_catalog());
        cascade.select_city("1");
        let ids: Vec<&str> = cascade.locations().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "11"]);
        assert!(cascade.slots().is_empty());

        cascade.select_location("10");
        let ids: Vec<&str> = cascade.slots().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["100", "101"]);
    }

    #[test]
    fn changing_city_always_resets_descendants() {
        let mut cascade = CatalogCascade::new(sample_catalog());
        for next_city in ["2", "1", "", "unknown"] {
            cascade.select_city("1");
            cascade.select_location("10");
            cascade.select_slot("101");
            assert!(cascade.selection().is_complete());

            cascade.select_city(next_city);
            assert_eq!(cascade.selection().location, None);
            assert_eq!(cascade.selection().slot, None);
            assert!(cascade.slots().is_empty());
        }
    }

    #[test]
    fn changing_location_resets_slot() {
        let mut cascade = CatalogCascade::new(sample_catalog());
        cascade.select_city("1");
        cascade.select_location("10");
        cascade.select_slot("100");
        cascade.select_location("11");
        assert_eq!(cascade.selection().slot, None);
        assert_eq!(cascade.slots()[0].id, "110");
    }

    #[test]
    fn deselecting_city_collapses_all_levels() {
        let mut cascade = CatalogCascade::new(sample_catalog());
        cascade.select_city("1");
        cascade.select_location("10");
        cascade.select_city("  ");
        assert_eq!(cascade.selection(), &SelectionState::default());
        assert!(cascade.locations().is_empty());
    }

    #[test]
    fn deselecting_location_collapses_slot() {
        let mut cascade = CatalogCascade::new(sample_catalog());
        cascade.select_city("1");
        cascade.select_location("10");
        cascade.select_slot("101");

        cascade.select_location("");
        assert_eq!(cascade.selection().city.as_deref(), Some("1"));
        assert_eq!(cascade.selection().location, None);
        assert_eq!(cascade.selection().slot, None);
        assert!(cascade.slots().is_empty());
        assert_eq!(cascade.locations().len(), 2);

        cascade.select_slot("101");
        assert_eq!(cascade.selection().slot, None);
    }

    #[test]
    fn child_selection_without_parent_is_ignored() {
        let mut cascade = CatalogCascade::new(sample_catalog());
        cascade.select_location("10");
        cascade.select_slot("100");
        assert_eq!(cascade.selection(), &SelectionState::default());
    }

    #[test]
    fn values_outside_option_set_are_not_rejected() {
        let mut cascade = CatalogCascade::new(sample_catalog());
        cascade.select_city("1");
        cascade.select_location("999");
        assert_eq!(cascade.selection().location.as_deref(), Some("999"));
        assert!(cascade.slots().is_empty());
    }

    #[test]
    fn replacing_catalog_drops_selection() {
        let mut cascade = CatalogCascade::new(sample_catalog());
        cascade.select_city("2");
        cascade.replace_catalog(Catalog::default());
        assert_eq!(cascade.selection().city, None);
        assert!(cascade.cities().is_empty());
    }
}
