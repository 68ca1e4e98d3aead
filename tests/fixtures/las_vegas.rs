//! Real Las Vegas / Henderson stops, plus a few far-away places for outlier tests.
//!
//! Coordinates sourced from OpenStreetMap.

use route_planner::model::{Location, OptimizeRequest};

/// A named stop with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Place {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Place {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn location(&self) -> Location {
        Location::new(self.name, self.lat, self.lng)
    }
}

// Depot candidates
pub const DEPOTS: &[Place] = &[
    Place::new("Bellagio", 36.1126, -115.1767),
    Place::new("Wynn Las Vegas", 36.1263781, -115.1658180),
    Place::new("MGM Grand", 36.1023654, -115.1688720),
];

pub const STRIP_STOPS: &[Place] = &[
    Place::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Place::new("Public House", 36.1219193, -115.1689317),
    Place::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Place::new("Gordon Ramsay BurGR", 36.1107195, -115.1720818),
    Place::new("Spago by Wolfgang Puck", 36.1139368, -115.1741462),
    Place::new("Ruth's Chris Steak House", 36.1193113, -115.1722630),
    Place::new("Bacchanal Buffet", 36.1159581, -115.1762929),
    Place::new("Charlie Palmer Steak", 36.0910624, -115.1743364),
];

pub const METRO_STOPS: &[Place] = &[
    Place::new("I Love Sushi Henderson", 35.9916660, -115.1028343),
    Place::new("Islander's Grill", 36.0335058, -114.9856162),
    Place::new("Green Valley Ranch Area", 36.0308, -115.0825),
    Place::new("Rivas Mexican Grill North", 36.1450055, -115.0482587),
    Place::new("Beers and Bets", 36.1428945, -115.1573836),
    Place::new("Bootlegger Bistro", 36.0492047, -115.1715744),
    Place::new("Pei Wei Town Square", 36.0810469, -115.1472694),
    Place::new("Longhorn Casino", 36.1070664, -115.0591256),
];

/// Far enough from Las Vegas to be dropped by any metro-scale threshold.
pub const FAR_AWAY: &[Place] = &[
    Place::new("Los Angeles City Hall", 34.0537, -118.2428),
    Place::new("Reno Arch", 39.5264, -119.8127),
];

/// Request whose first place is the depot.
pub fn request_for(places: &[Place]) -> OptimizeRequest {
    OptimizeRequest::new(places.iter().map(Place::location).collect())
}

/// Depot followed by `count` strip stops.
pub fn strip_route(count: usize) -> Vec<Place> {
    let mut places = vec![DEPOTS[0]];
    places.extend(STRIP_STOPS.iter().copied().take(count));
    places
}

/// Depot, strip and metro stops in one list.
pub fn metro_route() -> Vec<Place> {
    let mut places = vec![DEPOTS[0]];
    places.extend_from_slice(STRIP_STOPS);
    places.extend_from_slice(METRO_STOPS);
    places
}
