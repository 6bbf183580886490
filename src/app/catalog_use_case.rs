use crate::apis::{ApiEnvelope, ItemList};
use crate::app::ports::CatalogApiPort;
use crate::config::CatalogSource;
use crate::constants;
use crate::error::{RegistrarError, Result};
use seat_core::dates::format_iso_to_ddmmyyyy;
use seat_core::domain::{Catalog, City, Location};
use std::sync::Arc;
use tracing::{info, instrument, warn};

fn into_items<T>(envelope: ApiEnvelope<ItemList<T>>, what: &str) -> Result<Vec<T>> {
    if !envelope.status {
        return Err(RegistrarError::Api {
            message: format!("{} request failed: {}", what, envelope.message_or(constants::GENERIC_FAILURE)),
        });
    }
    Ok(envelope.data.map(|list| list.items).unwrap_or_default())
}

/// Items of one branch below the city level. A failed branch is logged and
/// left empty so the rest of the tree still loads.
fn branch_items<T>(response: Result<ApiEnvelope<ItemList<T>>>, what: &str) -> Vec<T> {
    match response.and_then(|envelope| into_items(envelope, what)) {
        Ok(items) => items,
        Err(e) => {
            warn!("Leaving {} empty: {}", what, e);
            Vec::new()
        }
    }
}

/// Loads the City → Location → Slot tree that feeds the cascade
pub struct CatalogUseCase {
    api: Arc<dyn CatalogApiPort>,
}

impl CatalogUseCase {
    pub fn new(api: Arc<dyn CatalogApiPort>) -> Self {
        Self { api }
    }

    pub async fn load(&self, source: CatalogSource) -> Result<Catalog> {
        let catalog = match source {
            CatalogSource::Bundled => self.load_bundled().await?,
            CatalogSource::Granular => self.load_granular().await?,
        };
        info!(cities = catalog.cities().len(), ?source, "catalog loaded");
        Ok(catalog)
    }

    #[instrument(skip(self))]
    async fn load_bundled(&self) -> Result<Catalog> {
        let cities = into_items(self.api.fetch_catalog().await?, "catalog")?;
        Ok(Catalog::new(cities))
    }

    /// Walk cities, their locations, each location's dates and each date's
    /// available appointments. Every appointment becomes one slot. Only the
    /// cities request is fatal.
    #[instrument(skip(self))]
    async fn load_granular(&self) -> Result<Catalog> {
        let mut cities = Vec::new();
        for city in into_items(self.api.fetch_cities().await?, "cities")? {
            let mut locations = Vec::new();
            let city_locations = branch_items(self.api.fetch_locations(&city.id).await, "locations");
            for location in city_locations {
                let mut slots = Vec::new();
                let dates = branch_items(
                    self.api.fetch_slot_dates(&city.id, &location.id).await,
                    "slot dates",
                );
                for slot_date in dates {
                    let query_date = format_iso_to_ddmmyyyy(&slot_date.date).unwrap_or_else(|e| {
                        warn!("Passing slot date through unformatted: {}", e);
                        slot_date.date.clone()
                    });
                    let times = branch_items(
                        self.api.fetch_slot_times(&city.id, &location.id, &query_date).await,
                        "slot times",
                    );
                    slots.extend(times.iter().map(|t| t.to_slot()));
                }
                locations.push(Location {
                    id: location.id,
                    name: location.name,
                    slots,
                });
            }
            cities.push(City {
                id: city.id,
                name: city.name,
                locations,
            });
        }
        Ok(Catalog::new(cities))
    }
}
