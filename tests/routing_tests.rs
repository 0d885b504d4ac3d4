use omnibus::catalogue::{BusKind, Catalogue};
use omnibus::router::{BusRouter, RouteItem, RoutingConfig};
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

fn two_stop_catalogue() -> Catalogue {
    // Scenario S1.
    let mut catalogue = Catalogue::new();
    catalogue.add_stop(
        "A",
        coord(55.611087, 37.208290),
        &[("B".to_string(), 3900.0)],
    );
    catalogue.add_stop("B", coord(55.595884, 37.209755), &[]);
    catalogue.add_bus("256", BusKind::Linear, &stops(&["A", "B"]));
    catalogue
}

#[test]
fn two_stop_route_test() {
    let catalogue = two_stop_catalogue();
    let router = BusRouter::build(
        &catalogue,
        RoutingConfig {
            bus_wait_time: 6.0,
            bus_velocity: 40.0,
        },
    );

    let result = router.route("A", "B").unwrap();
    let ride_time = 3900.0 / (40.0 * 1000.0 / 60.0);
    assert!((result.total_time - (6.0 + ride_time)).abs() < 1e-9);
    assert_eq!(result.items.len(), 2);
    match &result.items[0] {
        RouteItem::Wait { stop, time } => {
            assert_eq!(stop.as_ref(), "A");
            assert_eq!(*time, 6.0);
        }
        other => panic!("expected a wait first, got {other:?}"),
    }
    match &result.items[1] {
        RouteItem::Ride { bus, span, time } => {
            assert_eq!(bus.as_ref(), "256");
            assert_eq!(*span, 1);
            assert!((time - ride_time).abs() < 1e-9);
        }
        other => panic!("expected a ride second, got {other:?}"),
    }
}

#[test]
fn direct_stage_beats_reboarding_test() {
    // One bus over three stops, 1000 m per hop, 60 km/h => 1000 m/min.
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.00, 37.0), &[("B".to_string(), 1000.0)]);
    catalogue.add_stop("B", coord(55.01, 37.0), &[("C".to_string(), 1000.0)]);
    catalogue.add_stop("C", coord(55.02, 37.0), &[]);
    catalogue.add_bus("local", BusKind::Linear, &stops(&["A", "B", "C"]));

    let router = BusRouter::build(
        &catalogue,
        RoutingConfig {
            bus_wait_time: 5.0,
            bus_velocity: 60.0,
        },
    );

    // Staying on the bus costs one wait; getting off at B and reboarding
    // would cost two. The optimum is the span-2 stage.
    let result = router.route("A", "C").unwrap();
    assert!((result.total_time - 7.0).abs() < 1e-9);
    assert_eq!(result.items.len(), 2);
    match &result.items[1] {
        RouteItem::Ride { span, .. } => assert_eq!(*span, 2),
        other => panic!("expected a ride, got {other:?}"),
    }
}

#[test]
fn transfer_alternates_wait_and_ride_test() {
    // Two buses meeting at B force a transfer on the way A -> C.
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.00, 37.0), &[("B".to_string(), 1000.0)]);
    catalogue.add_stop("B", coord(55.01, 37.0), &[("C".to_string(), 2000.0)]);
    catalogue.add_stop("C", coord(55.02, 37.0), &[]);
    catalogue.add_bus("west", BusKind::Linear, &stops(&["A", "B"]));
    catalogue.add_bus("east", BusKind::Linear, &stops(&["B", "C"]));

    let router = BusRouter::build(
        &catalogue,
        RoutingConfig {
            bus_wait_time: 2.0,
            bus_velocity: 60.0,
        },
    );

    let result = router.route("A", "C").unwrap();
    assert_eq!(result.items.len(), 4);
    let mut sum = 0.0;
    for (position, item) in result.items.iter().enumerate() {
        match item {
            RouteItem::Wait { time, .. } => {
                assert_eq!(position % 2, 0, "waits come first in each pair");
                sum += time;
            }
            RouteItem::Ride { time, .. } => {
                assert_eq!(position % 2, 1, "rides follow their wait");
                sum += time;
            }
        }
    }
    assert!((sum - result.total_time).abs() < 1e-9);
    assert!((result.total_time - (2.0 + 1.0 + 2.0 + 2.0)).abs() < 1e-9);
}

#[test]
fn asymmetric_ride_times_test() {
    // The return leg of a linear bus uses the reverse road sum.
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.00, 37.0), &[("B".to_string(), 1000.0)]);
    catalogue.add_stop("B", coord(55.01, 37.0), &[("A".to_string(), 3000.0)]);
    catalogue.add_bus("shuttle", BusKind::Linear, &stops(&["A", "B"]));

    let router = BusRouter::build(
        &catalogue,
        RoutingConfig {
            bus_wait_time: 1.0,
            bus_velocity: 60.0,
        },
    );

    let there = router.route("A", "B").unwrap();
    let back = router.route("B", "A").unwrap();
    assert!((there.total_time - 2.0).abs() < 1e-9);
    assert!((back.total_time - 4.0).abs() < 1e-9);
}

#[test]
fn unroutable_pair_test() {
    // Scenario S4: two disconnected buses.
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.00, 37.0), &[("B".to_string(), 1000.0)]);
    catalogue.add_stop("B", coord(55.01, 37.0), &[]);
    catalogue.add_stop("C", coord(56.00, 38.0), &[("D".to_string(), 1000.0)]);
    catalogue.add_stop("D", coord(56.01, 38.0), &[]);
    catalogue.add_bus("1", BusKind::Linear, &stops(&["A", "B"]));
    catalogue.add_bus("2", BusKind::Linear, &stops(&["C", "D"]));

    let router = BusRouter::build(
        &catalogue,
        RoutingConfig {
            bus_wait_time: 6.0,
            bus_velocity: 40.0,
        },
    );

    assert!(router.route("A", "C").is_none());
    assert!(router.route("A", "missing").is_none());
    assert!(router.route("missing", "A").is_none());
}

#[test]
fn route_to_itself_test() {
    let catalogue = two_stop_catalogue();
    let router = BusRouter::build(
        &catalogue,
        RoutingConfig {
            bus_wait_time: 6.0,
            bus_velocity: 40.0,
        },
    );

    let result = router.route("A", "A").unwrap();
    assert_eq!(result.total_time, 0.0);
    assert!(result.items.is_empty());
}

#[test]
fn circular_bus_has_no_reverse_edges_test() {
    // On a one-way ring the trip B -> A must ride on around the loop.
    let mut catalogue = Catalogue::new();
    catalogue.add_stop("A", coord(55.000, 37.000), &[("B".to_string(), 600.0)]);
    catalogue.add_stop("B", coord(55.004, 37.002), &[("C".to_string(), 600.0)]);
    catalogue.add_stop("C", coord(55.002, 37.004), &[("A".to_string(), 600.0)]);
    catalogue.add_bus("ring", BusKind::Circular, &stops(&["A", "B", "C", "A"]));

    let router = BusRouter::build(
        &catalogue,
        RoutingConfig {
            bus_wait_time: 1.0,
            bus_velocity: 36.0, // 600 m/min
        },
    );

    let forward = router.route("A", "B").unwrap();
    assert!((forward.total_time - 2.0).abs() < 1e-9);

    // Backwards means riding B -> C -> A (or the span-2 stage), never a
    // direct reverse hop.
    let backward = router.route("B", "A").unwrap();
    assert!((backward.total_time - 3.0).abs() < 1e-9);
}
