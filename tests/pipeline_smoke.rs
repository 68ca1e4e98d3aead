mod fixtures;

use fixtures::*;
use route_planner::config::ServiceConfig;
use route_planner::engine::UnavailableEngine;
use route_planner::model::OptimizeRequest;
use route_planner::{Error, RoutePlanner};

#[test]
fn smoke_json_request_round_trip() {
    let request: OptimizeRequest = serde_json::from_str(
        r#"{
            "locations": [
                {"id": "Depot", "latitude": 36.1126, "longitude": -115.1767},
                {"id": 1, "latitude": 36.1041592, "longitude": -115.1722166},
                {"latitude": 36.1219193, "longitude": -115.1689317}
            ],
            "average_speed_kmh": 45,
            "solver_time_limit_seconds": "5",
            "first_solution_strategy": "SAVINGS"
        }"#,
    )
    .unwrap();

    let config = ServiceConfig::from_lookup(|key| match key {
        "ROUTE_PLANNER_DEFAULT_OUTLIER_THRESHOLD_KM" => Some("none".to_string()),
        _ => None,
    })
    .unwrap();
    let engine = NearestNeighborEngine;
    let response = RoutePlanner::new(&engine, &config).optimize(&request).unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["summary"]["num_locations_optimized"], 3);
    assert_eq!(json["summary"]["depot_id"], "Depot");
    assert_eq!(json["route"][0]["id"], "Depot");
    assert_eq!(json["route"][0]["is_depot"], true);
    assert_eq!(json["route"].as_array().unwrap().len(), 3);
    assert_eq!(json["legs"].as_array().unwrap().len(), 3);
    assert!(json["summary"]["total_duration_seconds"].as_f64().unwrap() > 0.0);

    // The integer id survives as an integer.
    let has_numeric_id = json["route"]
        .as_array()
        .unwrap()
        .iter()
        .any(|point| point["id"] == 1);
    assert!(has_numeric_id);
}

#[test]
fn smoke_full_metro_route() {
    let config = ServiceConfig::default();
    let engine = NearestNeighborEngine;
    let places = metro_route();

    let response = RoutePlanner::new(&engine, &config)
        .optimize(&request_for(&places))
        .unwrap();

    assert_eq!(response.route.len(), places.len());
    assert_eq!(response.legs.len(), places.len());
    assert_eq!(response.summary.num_locations_excluded, 0);
    let leg_total: f64 = response.legs.iter().map(|leg| leg.distance_meters).sum();
    // Nearest neighbour cost is the matrix total, which the legs reproduce.
    assert_eq!(leg_total, response.summary.total_distance_meters);
}

#[test]
fn smoke_unconfigured_engine_reports_unavailable() {
    let config = ServiceConfig::default();
    let planner = RoutePlanner::new(UnavailableEngine, &config);

    let err = planner.optimize(&request_for(&strip_route(3))).unwrap_err();
    assert!(matches!(err, Error::SolverUnavailable { .. }));

    // Degraded outcomes never need the engine.
    assert!(planner.optimize(&OptimizeRequest::default()).is_ok());
    assert!(planner.optimize(&request_for(&DEPOTS[..1])).is_ok());
}
