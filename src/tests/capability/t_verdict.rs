use crate::core::capability::{Capability, CapabilityRequirement, Verdict};

#[test]
fn test_all_of_collects_every_suppression() {
    let verdict = Verdict::all_of([
        Verdict::present(),
        Verdict::by_param("T"),
        Verdict::by_concrete("Handle"),
        Verdict::by_param("T"),
    ]);
    assert!(verdict.is_suppressed());
    assert_eq!(verdict.params.iter().collect::<Vec<_>>(), vec!["T"]);
    assert_eq!(verdict.concrete.iter().collect::<Vec<_>>(), vec!["Handle"]);
}

#[test]
fn test_all_of_suppression_outranks_unknown() {
    let verdict = Verdict::all_of([Verdict::unresolved(), Verdict::by_param("U")]);
    assert!(verdict.is_suppressed());

    let verdict = Verdict::all_of([Verdict::present(), Verdict::unresolved()]);
    assert_eq!(verdict.requirement, CapabilityRequirement::Unresolved);

    assert_eq!(Verdict::all_of(Vec::new()), Verdict::present());
}

#[test]
fn test_capability_names() {
    assert_eq!(Capability::from_name("Escapable"), Some(Capability::Escapable));
    assert_eq!(Capability::from_name("Sendable"), None);
    assert_eq!(Capability::Copyable.to_string(), "Copyable");
}
