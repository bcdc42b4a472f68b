use rawscope::data::overlay::{OverlayEvent, OverlayIndex};

fn index() -> OverlayIndex {
    // Deliberately unsorted source list, 100 Hz.
    OverlayIndex::new(
        vec![
            OverlayEvent::new(500, 2),
            OverlayEvent::new(100, 1),
            OverlayEvent::new(300, 1),
            OverlayEvent::new(300, 3),
            OverlayEvent::new(900, 2),
        ],
        100.0,
    )
}

fn times(idx: &OverlayIndex, events: &[OverlayEvent]) -> Vec<f64> {
    events.iter().map(|e| idx.time_of(e)).collect()
}

#[test]
fn range_is_inclusive_and_ascending() {
    let idx = index();
    let hits = idx.events_in_range(1.0, 5.0);
    assert_eq!(times(&idx, &hits), vec![1.0, 3.0, 3.0, 5.0]);
    // Ties keep source order.
    assert_eq!(hits[1].type_id, 1);
    assert_eq!(hits[2].type_id, 3);
}

#[test]
fn inverted_range_is_empty() {
    let idx = index();
    assert!(idx.events_in_range(5.0, 1.0).is_empty());
    assert!(idx.events_in_range(f64::NAN, 5.0).is_empty());
}

#[test]
fn range_without_events_is_empty() {
    let idx = index();
    assert!(idx.events_in_range(5.01, 8.99).is_empty());
    assert!(idx.events_in_range(20.0, 30.0).is_empty());
}

#[test]
fn times_use_sample_rate_only() {
    let idx = OverlayIndex::new(vec![OverlayEvent::new(2500, 1)], 250.0);
    assert_eq!(idx.time_of(&OverlayEvent::new(2500, 1)), 10.0);
    assert_eq!(idx.events_in_range(10.0, 10.0).len(), 1);
}

#[test]
fn identical_queries_give_identical_results() {
    let idx = index();
    assert_eq!(idx.events_in_range(0.0, 10.0), idx.events_in_range(0.0, 10.0));
    assert_eq!(idx.events_in_range(0.0, 10.0).len(), idx.len());
}

#[test]
fn replace_resorts_new_events() {
    let mut idx = index();
    idx.replace(vec![OverlayEvent::new(50, 4), OverlayEvent::new(10, 5)]);
    let all = idx.events_in_range(0.0, 1.0);
    assert_eq!(all.iter().map(|e| e.type_id).collect::<Vec<_>>(), vec![5, 4]);
}
