use omnibus::catalogue::{BusKind, Catalogue};
use omnibus::shared::geo::Coordinate;

fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate {
        latitude,
        longitude,
    }
}

fn stops(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn stop_names_stay_unique_test() {
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("Alpha", coord(55.0, 37.0), &[]);
    catalogue.add_stop("Beta", coord(55.1, 37.1), &[]);
    catalogue.add_stop("Alpha", coord(60.0, 60.0), &[]);

    assert_eq!(catalogue.common_metric().stop_count, 2);
    // The duplicate definition is ignored entirely.
    let info = catalogue.stop_info("Alpha").unwrap();
    assert_eq!(info.coordinate, coord(55.0, 37.0));
}

#[test]
fn bus_names_stay_unique_test() {
    let mut catalogue = Catalogue::new();
    catalogue.add_bus("256", BusKind::Linear, &stops(&["A", "B"]));
    catalogue.add_bus("256", BusKind::Circular, &stops(&["C", "D", "C"]));

    assert_eq!(catalogue.common_metric().bus_count, 1);
    let info = catalogue.bus_info("256").unwrap();
    assert_eq!(info.kind, BusKind::Linear);
    assert_eq!(info.stops.len(), 2);
}

#[test]
fn bus_stop_reciprocity_test() {
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.0, 37.0), &[]);
    catalogue.add_stop("B", coord(55.1, 37.1), &[]);
    catalogue.add_bus("7", BusKind::Linear, &stops(&["A", "B"]));
    catalogue.add_bus("9", BusKind::Linear, &stops(&["B", "A"]));

    for stop_name in ["A", "B"] {
        let info = catalogue.stop_info(stop_name).unwrap();
        assert_eq!(info.buses.len(), 2);
        for bus_name in &info.buses {
            let bus = catalogue.bus_info(bus_name).unwrap();
            assert!(bus.stops.iter().any(|name| name.as_ref() == stop_name));
        }
    }
}

#[test]
fn stop_buses_are_sorted_test() {
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("Hub", coord(55.0, 37.0), &[]);
    for name in ["zeta", "14", "114", "3"] {
        catalogue.add_bus(name, BusKind::Circular, &stops(&["Hub", "Hub"]));
    }
    let info = catalogue.stop_info("Hub").unwrap();
    let names: Vec<&str> = info.buses.iter().map(|name| name.as_ref()).collect();
    assert_eq!(names, vec!["114", "14", "3", "zeta"]);
}

#[test]
fn placeholder_resolution_test() {
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("X", coord(55.0, 37.0), &[("Y".to_string(), 500.0)]);

    // Y exists only as a forward reference: the declared road distance is
    // visible in both directions, the geodesic component is still zero, and
    // stop queries report Y as missing.
    assert_eq!(catalogue.common_metric().stop_count, 2);
    assert_eq!(catalogue.neighbor_distance("X", "Y"), (500.0, 0.0));
    assert_eq!(catalogue.neighbor_distance("Y", "X"), (500.0, 0.0));
    assert!(catalogue.stop_info("Y").is_none());

    catalogue.add_stop("Y", coord(55.01, 37.0), &[]);
    assert_eq!(catalogue.common_metric().stop_count, 2);
    let (road, geodesic) = catalogue.neighbor_distance("X", "Y");
    assert_eq!(road, 500.0);
    assert!(geodesic > 0.0);
    assert!(catalogue.stop_info("Y").is_some());
}

#[test]
fn definition_order_does_not_matter_test() {
    let mut forward = Catalogue::new();
    forward.add_stop("A", coord(55.0, 37.0), &[("B".to_string(), 700.0)]);
    forward.add_stop("B", coord(55.01, 37.0), &[]);
    forward.add_bus("1", BusKind::Linear, &stops(&["A", "B"]));

    let mut backward = Catalogue::new();
    backward.add_bus("1", BusKind::Linear, &stops(&["A", "B"]));
    backward.add_stop("B", coord(55.01, 37.0), &[]);
    backward.add_stop("A", coord(55.0, 37.0), &[("B".to_string(), 700.0)]);

    assert_eq!(forward.bus_stats("1"), backward.bus_stats("1"));
    assert_eq!(
        forward.neighbor_distance("A", "B"),
        backward.neighbor_distance("A", "B")
    );
    let lhs = forward.stop_info("A").unwrap();
    let rhs = backward.stop_info("A").unwrap();
    assert_eq!(lhs.buses, rhs.buses);
    assert_eq!(lhs.coordinate, rhs.coordinate);
}

#[test]
fn distance_fallback_test() {
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.0, 37.0), &[("B".to_string(), 1200.0)]);
    catalogue.add_stop("B", coord(55.01, 37.0), &[]);
    catalogue.add_stop("C", coord(55.02, 37.0), &[("B".to_string(), 800.0)]);

    // Only A->B is declared: it serves both directions.
    assert_eq!(catalogue.neighbor_distance("A", "B").0, 1200.0);
    assert_eq!(catalogue.neighbor_distance("B", "A").0, 1200.0);
    // Only C->B is declared: same fallback the other way around.
    assert_eq!(catalogue.neighbor_distance("B", "C").0, 800.0);
    // Nothing declared between A and C: road equals geodesic.
    let (road, geodesic) = catalogue.neighbor_distance("A", "C");
    assert_eq!(road, geodesic);
    assert!(geodesic > 0.0);
}

#[test]
fn asymmetric_distances_test() {
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.0, 37.0), &[("B".to_string(), 1000.0)]);
    catalogue.add_stop("B", coord(55.01, 37.0), &[("A".to_string(), 1300.0)]);

    assert_eq!(catalogue.neighbor_distance("A", "B").0, 1000.0);
    assert_eq!(catalogue.neighbor_distance("B", "A").0, 1300.0);
}

#[test]
fn linear_bus_stats_test() {
    // Scenario S1: a two-stop linear bus with a single declared distance.
    let mut catalogue = Catalogue::new();
    catalogue.add_stop(
        "A",
        coord(55.611087, 37.208290),
        &[("B".to_string(), 3900.0)],
    );
    catalogue.add_stop("B", coord(55.595884, 37.209755), &[]);
    catalogue.add_bus("256", BusKind::Linear, &stops(&["A", "B"]));

    let stats = catalogue.bus_stats("256").unwrap();
    assert_eq!(stats.stop_count, 3);
    assert_eq!(stats.unique_stop_count, 2);
    assert_eq!(stats.route_length, 7800.0);

    let geodesic = coord(55.611087, 37.208290).distance(&coord(55.595884, 37.209755));
    assert!((stats.curvature - 7800.0 / (2.0 * geodesic)).abs() < 1e-9);
    // Roads never beat the great circle.
    assert!(stats.curvature >= 1.0 - 1e-9);
}

#[test]
fn circular_bus_stats_test() {
    // Scenario S2: a three-stop ring, 600 m per hop.
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.0000, 37.000), &[("B".to_string(), 600.0)]);
    catalogue.add_stop("B", coord(55.0040, 37.002), &[("C".to_string(), 600.0)]);
    catalogue.add_stop("C", coord(55.0020, 37.004), &[("A".to_string(), 600.0)]);
    catalogue.add_bus("ring", BusKind::Circular, &stops(&["A", "B", "C", "A"]));

    let stats = catalogue.bus_stats("ring").unwrap();
    assert_eq!(stats.stop_count, 4);
    assert_eq!(stats.unique_stop_count, 3);
    assert_eq!(stats.route_length, 1800.0);
    assert!(stats.curvature >= 1.0 - 1e-9);
}

#[test]
fn missing_entities_test() {
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.0, 37.0), &[]);

    assert!(catalogue.bus_stats("404").is_none());
    assert!(catalogue.bus_info("404").is_none());
    assert!(catalogue.stop_info("nowhere").is_none());
    assert_eq!(catalogue.neighbor_distance("A", "nowhere"), (0.0, 0.0));
}

#[test]
fn stop_without_buses_test() {
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("Lonely", coord(55.0, 37.0), &[]);
    let info = catalogue.stop_info("Lonely").unwrap();
    assert!(info.buses.is_empty());
}
