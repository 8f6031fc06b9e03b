use garagemap_api::models::RequestStatus;

use RequestStatus::*;

const ALL: [RequestStatus; 5] = [Pending, Accepted, InProgress, Completed, Cancelled];

#[test]
fn transition_graph_is_exactly_the_allowed_edges() {
    let allowed = [
        (Pending, Accepted),
        (Pending, Cancelled),
        (Accepted, InProgress),
        (Accepted, Completed),
        (Accepted, Cancelled),
        (InProgress, Completed),
    ];

    for from in ALL {
        for to in ALL {
            let expected = allowed.contains(&(from, to));
            assert_eq!(
                from.can_transition(to),
                expected,
                "{} -> {}",
                from.as_str(),
                to.as_str()
            );
        }
    }
}

#[test]
fn terminal_states_admit_no_transitions() {
    for terminal in [Completed, Cancelled] {
        assert!(terminal.is_terminal());
        for to in ALL {
            assert!(!terminal.can_transition(to));
        }
    }
    for live in [Pending, Accepted, InProgress] {
        assert!(!live.is_terminal());
    }
}

#[test]
fn status_strings_round_trip() {
    for status in ALL {
        assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(RequestStatus::parse("paused"), None);
}
