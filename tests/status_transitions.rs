use bozor_api::bot::{parse_status_callback, status_callback_data};
use bozor_api::status::{OrderStatus, label_uz, transition_allowed};
use uuid::Uuid;

#[test]
fn legal_transitions_are_accepted() {
    let legal = [
        (OrderStatus::Pending, OrderStatus::Confirmed),
        (OrderStatus::Pending, OrderStatus::Cancelled),
        (OrderStatus::Confirmed, OrderStatus::Processing),
        (OrderStatus::Confirmed, OrderStatus::Cancelled),
        (OrderStatus::Processing, OrderStatus::Shipped),
        (OrderStatus::Shipped, OrderStatus::Delivered),
        (OrderStatus::Delivered, OrderStatus::Completed),
    ];
    for (from, to) in legal {
        assert!(
            from.can_transition(to),
            "expected {} -> {} to be legal",
            from.as_str(),
            to.as_str()
        );
    }
}

#[test]
fn every_other_pair_is_rejected() {
    let legal = [
        (OrderStatus::Pending, OrderStatus::Confirmed),
        (OrderStatus::Pending, OrderStatus::Cancelled),
        (OrderStatus::Confirmed, OrderStatus::Processing),
        (OrderStatus::Confirmed, OrderStatus::Cancelled),
        (OrderStatus::Processing, OrderStatus::Shipped),
        (OrderStatus::Shipped, OrderStatus::Delivered),
        (OrderStatus::Delivered, OrderStatus::Completed),
    ];
    for from in OrderStatus::ALL {
        for to in OrderStatus::ALL {
            let expected = legal.contains(&(from, to));
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
fn terminal_states_have_no_successors() {
    assert!(OrderStatus::Completed.is_terminal());
    assert!(OrderStatus::Cancelled.is_terminal());
    assert!(OrderStatus::Completed.next().is_empty());
    assert!(OrderStatus::Cancelled.next().is_empty());
    assert!(!OrderStatus::Pending.is_terminal());
}

#[test]
fn cancellation_is_only_reachable_before_processing() {
    let can_cancel = |s: OrderStatus| s.can_transition(OrderStatus::Cancelled);
    assert!(can_cancel(OrderStatus::Pending));
    assert!(can_cancel(OrderStatus::Confirmed));
    assert!(!can_cancel(OrderStatus::Processing));
    assert!(!can_cancel(OrderStatus::Shipped));
    assert!(!can_cancel(OrderStatus::Delivered));
    assert!(!can_cancel(OrderStatus::Completed));
}

#[test]
fn status_strings_round_trip() {
    for status in OrderStatus::ALL {
        assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(OrderStatus::parse("paid"), None);
    assert_eq!(OrderStatus::parse(""), None);
    assert_eq!(OrderStatus::parse("Pending"), None);
}

#[test]
fn stored_strings_are_checked_against_the_graph() {
    assert!(transition_allowed("pending", OrderStatus::Confirmed));
    assert!(!transition_allowed("completed", OrderStatus::Pending));
    assert!(!transition_allowed("shipped", OrderStatus::Cancelled));
    // Rows with unknown stored text may be repaired to any known status.
    assert!(transition_allowed("legacy-weird", OrderStatus::Cancelled));
    assert!(transition_allowed("", OrderStatus::Pending));
}

#[test]
fn labels_cover_every_status_and_fall_back() {
    for status in OrderStatus::ALL {
        assert_ne!(label_uz(status.as_str()), "Noma'lum");
    }
    assert_eq!(label_uz("pending"), "⏳ Kutilmoqda");
    assert_eq!(label_uz("cancelled"), "❌ Bekor qilindi");
    assert_eq!(label_uz("whatever"), "Noma'lum");
}

#[test]
fn callback_data_round_trips() {
    let id = Uuid::new_v4();
    for status in OrderStatus::ALL {
        let data = status_callback_data(id, status);
        assert_eq!(parse_status_callback(&data), Some((id, status)));
    }
}

#[test]
fn malformed_callback_data_is_ignored() {
    assert_eq!(parse_status_callback("st:not-a-uuid:confirmed"), None);
    assert_eq!(
        parse_status_callback(&format!("st:{}:paid", Uuid::new_v4())),
        None
    );
    assert_eq!(parse_status_callback("dl_ver:1.0"), None);
    assert_eq!(parse_status_callback(""), None);
}
