use crate::debounce::{DebouncedFilter, Debouncer, FilterChange};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;

const DELAY: Duration = Duration::from_millis(300);

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl FnMut(String) + Send + 'static) {
    let applied = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&applied);
    (applied, move |value| sink.lock().unwrap().push(value))
}

/// **VALUE**: Verifies that a burst of keystrokes applies only the final value.
///
/// **WHY THIS MATTERS**: Each applied value triggers a list request. Without debouncing,
/// typing "tower" fires five requests and the responses can land out of order.
#[tokio::test(start_paused = true)]
async fn given_rapid_changes_when_window_elapses_then_only_last_applied() {
    // GIVEN: A debouncer recording what it applies
    let (applied, apply) = recorder();
    let debouncer = Debouncer::new(DELAY, apply);

    // WHEN: Typing faster than the window
    for value in ["t", "to", "tow", "towe", "tower"] {
        debouncer.push(value.to_string());
        sleep(Duration::from_millis(100)).await;
    }
    sleep(DELAY * 2).await;

    // THEN: Only the last value was applied
    assert_eq!(*applied.lock().unwrap(), vec!["tower"]);
}

#[tokio::test(start_paused = true)]
async fn given_spaced_changes_when_each_waits_out_window_then_each_applied() {
    let (applied, apply) = recorder();
    let debouncer = Debouncer::new(DELAY, apply);

    debouncer.push(String::from("A-101"));
    sleep(DELAY * 2).await;
    debouncer.push(String::from("B-202"));
    sleep(DELAY * 2).await;

    assert_eq!(*applied.lock().unwrap(), vec!["A-101", "B-202"]);
}

#[tokio::test(start_paused = true)]
async fn given_pending_value_when_debouncer_dropped_then_discarded() {
    let (applied, apply) = recorder();
    let debouncer = Debouncer::new(DELAY, apply);

    debouncer.push(String::from("unfinished"));
    sleep(DELAY / 2).await;
    drop(debouncer);
    sleep(DELAY * 2).await;

    assert!(applied.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn given_filter_changes_when_debounced_then_state_reflects_latest() {
    // GIVEN: A list screen filter
    let mut filter = DebouncedFilter::new(DELAY);
    let mut updates = filter.subscribe();

    // WHEN: Typing a search and picking a status in quick succession
    filter.change(FilterChange::Search(String::from("ri")));
    filter.change(FilterChange::Search(String::from("river")));
    filter.change(FilterChange::Field {
        name: String::from("status"),
        value: String::from("UNPAID"),
    });
    sleep(DELAY * 2).await;

    // THEN: Both inputs applied with their latest values
    assert!(updates.has_changed().unwrap());
    let state = updates.borrow_and_update().clone();
    assert_eq!(state.search, "river");
    assert_eq!(state.fields.get("status").map(String::as_str), Some("UNPAID"));
    assert_eq!(
        state.query_pairs(),
        vec![
            (String::from("search"), String::from("river")),
            (String::from("status"), String::from("UNPAID")),
        ]
    );

    // WHEN: Clearing the status
    filter.change(FilterChange::Field {
        name: String::from("status"),
        value: String::new(),
    });
    sleep(DELAY * 2).await;

    // THEN: The field is gone
    assert!(filter.current().fields.is_empty());
}
