#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use crate::edit::AddConflict;
    use crate::error::VariantError;
    use crate::models::{Obs, PlannedStep, SetupType, StepSummary, Variant};
    use crate::test_support::{alloc, at, obs};

    fn chain_variant() -> (Variant, Arc<Obs>) {
        let a = obs("A");
        let mut v = Variant::new("Plan A");
        v.add(alloc(&a, 0, 0, 4)).unwrap();
        v.add(alloc(&a, 60, 5, 9)).unwrap();
        (v, a)
    }

    // ==================== adds and removes ====================

    #[test]
    fn test_add_alloc_builds_and_inserts() {
        let a = obs("A");
        let mut v = Variant::new("Plan A");
        let added = v
            .add_alloc(a.clone(), at(0), 0, 4, SetupType::Full, "first visit")
            .unwrap();
        assert_eq!(v.len(), 1);
        assert!(v.contains(&added));
        assert_eq!(added.comment(), "first visit");
        assert_eq!(v.revision(), 1);
    }

    #[test]
    fn test_add_alloc_rejects_bad_step_range() {
        let mut v = Variant::new("Plan A");
        let err = v
            .add_alloc(obs("A"), at(0), 4, 10, SetupType::Full, "")
            .unwrap_err();
        assert!(matches!(err, VariantError::InvalidStepRange { .. }));
        assert!(v.is_empty());
        assert_eq!(v.revision(), 0);
    }

    #[test]
    fn test_add_rejects_conflicts_without_mutating() {
        let (mut v, a) = chain_variant();
        let before = v.allocs().clone();

        let err = v.add(alloc(&a, 300, 0, 4)).unwrap_err();
        assert!(matches!(err, VariantError::Add(AddConflict::Collision { .. })));

        let b = obs("B");
        let err = v.add(alloc(&b, 300, 3, 4)).unwrap_err();
        assert!(matches!(err, VariantError::Add(AddConflict::MissingPredecessor { .. })));

        assert_eq!(v.allocs(), &before);
        assert_eq!(v.revision(), 2);
    }

    #[test]
    fn test_remove_requires_successor_gone() {
        let (mut v, a) = chain_variant();
        let head = alloc(&a, 0, 0, 4);
        let tail = alloc(&a, 60, 5, 9);

        assert!(matches!(v.remove_alloc(&head), Err(VariantError::Remove(_))));
        v.remove_alloc(&tail).unwrap();
        v.remove_alloc(&head).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn test_remove_unknown_alloc() {
        let (mut v, a) = chain_variant();
        let stranger = alloc(&a, 500, 0, 4);
        assert_eq!(v.remove_alloc(&stranger), Err(VariantError::NotFound(stranger)));
    }

    // ==================== reads ====================

    #[test]
    fn test_neighbours_and_span() {
        let (mut v, a) = chain_variant();
        let b = obs("B");
        let middle = alloc(&b, 45, 0, 0);
        v.add(middle.clone()).unwrap();

        let head = alloc(&a, 0, 0, 4);
        let tail = alloc(&a, 60, 5, 9);
        assert_eq!(v.predecessor(&tail), Some(&head));
        assert_eq!(v.successor(&head), Some(&tail));
        assert_eq!(v.next(&head), Some(&middle));
        assert_eq!(v.previous(&tail), Some(&middle));
        assert_eq!(v.allocs_for_obs(&a.id).count(), 2);

        assert_eq!(v.start(), Some(at(0)));
        assert_eq!(v.end(), Some(tail.end()));
        assert_eq!(v.span(), Some(tail.end() - at(0)));
    }

    #[test]
    fn test_empty_variant_has_no_span() {
        let v = Variant::new("empty");
        assert_eq!(v.start(), None);
        assert_eq!(v.span(), None);
        assert!(v.check_invariants().is_ok());
    }

    // ==================== moves ====================

    #[test]
    fn test_move_within_bounds() {
        let (mut v, a) = chain_variant();
        let tail = alloc(&a, 60, 5, 9);
        let moved = v.move_alloc(&tail, at(40)).unwrap();
        assert_eq!(moved.start(), at(40));
        assert!(!v.contains(&tail));
        assert!(v.contains(&moved));
        assert!(v.check_invariants().is_ok());
    }

    #[test]
    fn test_move_before_predecessor_end_fails() {
        let (mut v, a) = chain_variant();
        let tail = alloc(&a, 60, 5, 9);
        let err = v.move_alloc(&tail, at(39)).unwrap_err();
        assert!(matches!(
            err,
            VariantError::Add(AddConflict::Ordering { earliest_start_time, .. }) if earliest_start_time == at(40)
        ));
        assert!(v.contains(&tail));
    }

    #[test]
    fn test_move_past_successor_start_fails() {
        let (mut v, a) = chain_variant();
        let head = alloc(&a, 0, 0, 4);
        let err = v.move_alloc(&head, at(30)).unwrap_err();
        assert!(matches!(
            err,
            VariantError::SuccessorOrdering { latest_end_time, .. } if latest_end_time == at(60)
        ));
    }

    #[test]
    fn test_shift_all_preserves_invariants() {
        let (mut v, _) = chain_variant();
        let rev = v.revision();
        v.shift_all(Duration::hours(-2));
        assert_eq!(v.start(), Some(at(-120)));
        assert!(v.check_invariants().is_ok());
        assert_eq!(v.revision(), rev + 1);
    }

    #[test]
    fn test_constrain_start_time() {
        let (v, a) = chain_variant();
        let tail = alloc(&a, 60, 5, 9);
        let head = alloc(&a, 0, 0, 4);
        assert_eq!(v.constrain_start_time(&tail, at(10), tail.length()), at(40));
        assert_eq!(v.constrain_start_time(&head, at(50), head.length()), at(20));
        assert_eq!(v.constrain_start_time(&head, at(5), head.length()), at(5));
    }

    // ==================== setup toggling ====================

    #[test]
    fn test_toggle_full_to_none_keeps_science_in_place() {
        let a = obs("A");
        let mut v = Variant::new("Plan A");
        let full = v.add_alloc(a, at(0), 0, 4, SetupType::Full, "").unwrap();

        let bare = v.toggle_setup_time(&full).unwrap();
        assert_eq!(bare.setup_type(), SetupType::None);
        assert_eq!(bare.start(), at(10));
        assert_eq!(bare.end(), full.end());

        let back = v.toggle_setup_time(&bare).unwrap();
        assert_eq!(back, full);
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_toggle_cycles_through_reacquisition() {
        let a = Arc::new(Obs::new(
            "GN-2024B-Q-5-1",
            StepSummary::new(
                Duration::minutes(20),
                Duration::minutes(5),
                vec![PlannedStep::new(Duration::minutes(10)); 3],
            ),
        ));
        let mut v = Variant::new("Plan B");
        let full = v.add_alloc(a, at(0), 0, 2, SetupType::Full, "").unwrap();

        let reacq = v.toggle_setup_time(&full).unwrap();
        assert_eq!(reacq.setup_type(), SetupType::Reacquisition);
        assert_eq!(reacq.start(), at(15));
        assert_eq!(reacq.end(), full.end());

        let bare = v.toggle_setup_time(&reacq).unwrap();
        assert_eq!(bare.setup_type(), SetupType::None);
        assert_eq!(bare.start(), at(20));
        assert_eq!(bare.end(), full.end());
    }

    #[test]
    fn test_toggle_to_full_is_clamped_by_predecessor() {
        let a = obs("A");
        let mut v = Variant::new("Plan A");
        v.add(alloc(&a, 0, 0, 4)).unwrap();
        let tail = v.add_alloc(a, at(45), 5, 9, SetupType::None, "").unwrap();

        let full = v.toggle_setup_time(&tail).unwrap();
        assert_eq!(full.setup_type(), SetupType::Full);
        assert_eq!(full.start(), at(40));
        assert!(v.check_invariants().is_ok());
    }

    // ==================== comments and snapshots ====================

    #[test]
    fn test_set_alloc_comment_replaces_member() {
        let (mut v, a) = chain_variant();
        let head = alloc(&a, 0, 0, 4);
        let commented = v.set_alloc_comment(&head, "seeing < 0.6\"").unwrap();
        assert_eq!(commented.comment(), "seeing < 0.6\"");
        assert!(!v.contains(&head));
        assert_eq!(v.successor(&commented), Some(&alloc(&a, 60, 5, 9)));
    }

    #[test]
    fn test_snapshot_lists_allocs_in_natural_order() {
        let (mut v, _) = chain_variant();
        v.set_comment("clear night");
        let snap = v.snapshot();
        assert_eq!(snap.name, "Plan A");
        assert_eq!(snap.allocs.len(), 2);
        assert_eq!(snap.allocs[0].first_step, 0);
        assert_eq!(snap.allocs[1].first_step, 5);

        let json: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
        assert_eq!(json["comment"], "clear night");
        assert_eq!(json["allocs"][0]["obs"], "A");
        assert_eq!(json["allocs"][0]["setup_type"], "full");
        assert!(json["allocs"][0].get("comment").is_none());
    }
}
