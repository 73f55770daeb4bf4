// src/indicators/mod.rs

pub mod collision;
pub mod lateral_acceleration;
pub mod parking_precision;

pub use collision::Collision;
pub use lateral_acceleration::LateralAcceleration;
pub use parking_precision::ParkingPrecision;

use crate::indicator::Indicator;
use crate::registry::{IndicatorFactory, IndicatorRegistry, RegistryError};

/// Parking-domain indicators.
pub struct ParkingFactory;

impl IndicatorFactory for ParkingFactory {
    fn name(&self) -> &'static str {
        "parking"
    }

    fn register_all(&self, registry: &mut IndicatorRegistry) -> Vec<RegistryError> {
        registry
            .register(parking_precision::NAME, || {
                Box::new(ParkingPrecision::new()) as Box<dyn Indicator>
            })
            .err()
            .into_iter()
            .collect()
    }
}

/// Indicators that apply to any scenario.
pub struct GeneralFactory;

impl IndicatorFactory for GeneralFactory {
    fn name(&self) -> &'static str {
        "general"
    }

    fn register_all(&self, registry: &mut IndicatorRegistry) -> Vec<RegistryError> {
        [
            registry.register(lateral_acceleration::NAME, || {
                Box::new(LateralAcceleration::new()) as Box<dyn Indicator>
            }),
            registry.register(collision::NAME, || {
                Box::new(Collision::new()) as Box<dyn Indicator>
            }),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect()
    }
}

/// Registry with every built-in indicator.
pub fn default_registry() -> IndicatorRegistry {
    let mut registry = IndicatorRegistry::new();
    registry.register_factory(&ParkingFactory);
    registry.register_factory(&GeneralFactory);
    registry
}
