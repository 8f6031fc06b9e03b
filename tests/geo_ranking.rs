use garagemap_api::geo;

#[test]
fn distance_uses_flat_earth_approximation() {
    // Bengaluru city centre against a point just north-west of it.
    let d = geo::distance_km(13.0, 77.5, 12.9716, 77.5946);

    let expected = (((13.0_f64 - 12.9716) * 111.0).powi(2)
        + ((77.5_f64 - 77.5946) * 111.0).powi(2))
    .sqrt();
    assert!((d - expected).abs() < 1e-12);
    assert!((d - 10.96).abs() < 0.01, "got {d}");
}

#[test]
fn distance_is_symmetric() {
    let a = geo::distance_km(13.0, 77.5, 12.9716, 77.5946);
    let b = geo::distance_km(12.9716, 77.5946, 13.0, 77.5);
    assert_eq!(a, b);
}

#[test]
fn ranking_orders_ascending_and_excludes_missing_coordinates() {
    let items = vec![
        ("far", Some((14.0, 78.5))),
        ("unlocated", None),
        ("near", Some((13.01, 77.51))),
        ("mid", Some((13.2, 77.7))),
    ];

    let ranked = geo::rank_by_distance((13.0, 77.5), items, |item| item.1);
    let names: Vec<&str> = ranked.iter().map(|(item, _)| item.0).collect();

    assert_eq!(names, vec!["near", "mid", "far"]);
    assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));
}

#[test]
fn ranking_is_stable_for_ties_and_reruns() {
    // Same coordinates, so every distance ties; input order must survive.
    let items = vec![
        ("first", Some((12.97, 77.59))),
        ("second", Some((12.97, 77.59))),
        ("third", Some((12.97, 77.59))),
    ];

    let ranked = geo::rank_by_distance((13.0, 77.5), items.clone(), |item| item.1);
    let names: Vec<&str> = ranked.iter().map(|(item, _)| item.0).collect();
    assert_eq!(names, vec!["first", "second", "third"]);

    let again = geo::rank_by_distance((13.0, 77.5), items, |item| item.1);
    let names_again: Vec<&str> = again.iter().map(|(item, _)| item.0).collect();
    assert_eq!(names, names_again);
}

#[test]
fn stored_distance_rounds_to_two_places() {
    let km = geo::distance_km(13.0, 77.5, 12.9716, 77.5946);
    let stored = geo::distance_decimal(km).expect("finite distance");
    assert_eq!(stored.to_string(), "10.96");
}
