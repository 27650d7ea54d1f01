include!("decl_test_utils.rs");

fn noncopyable_user(members: Vec<Member>) -> Decl {
    strukt("User", GenericSig::default(), vec![inv("Copyable")], members)
}

#[test]
fn test_alias_parameter_rejects_suppressed_argument() {
    // typealias Pair<T> = Array<T>; struct User { var h: Pair<Handle> }
    let use_site = sp(3, 24, 12);
    let errors = run(vec![
        handle(),
        alias(
            "Pair",
            generics(vec![param("T", vec![])]),
            generic("Array", vec![ty("T")]),
        ),
        strukt(
            "User",
            GenericSig::default(),
            vec![],
            vec![field("h", at(generic("Pair", vec![ty("Handle")]), use_site))],
        ),
    ]);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind(),
        &CEK::SubstitutionViolation {
            ty: "Handle".to_string(),
            param: "T".to_string(),
            owner: "Pair".to_string(),
            owner_kind: "type alias",
            cap: Capability::Copyable,
        }
    );
    assert_eq!(errors[0].span(), use_site);
    assert_eq!(
        errors[0].notes()[0].message,
        "'T' of 'Pair' requires 'Copyable' because it is not marked '~Copyable'"
    );
}

#[test]
fn test_nominal_parameter_rejects_suppressed_argument() {
    let errors = run(vec![
        handle(),
        strukt(
            "Wrapper",
            generics(vec![param("T", vec![])]),
            vec![],
            vec![field("value", ty("T"))],
        ),
        noncopyable_user(vec![field("w", generic("Wrapper", vec![ty("Handle")]))]),
    ]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(matches!(
        errors[0].kind(),
        CEK::SubstitutionViolation { owner_kind: "struct", owner, .. } if owner == "Wrapper"
    ));
}

#[test]
fn test_suppressing_parameter_accepts_suppressed_argument() {
    // struct Cell<T: ~Copyable>: ~Copyable { var value: T }
    let errors = run(vec![
        handle(),
        strukt(
            "Cell",
            generics(vec![param("T", vec![inv("Copyable")])]),
            vec![inv("Copyable")],
            vec![field("value", ty("T"))],
        ),
        noncopyable_user(vec![field("c", generic("Cell", vec![ty("Handle")]))]),
    ]);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn test_array_sugar_requires_copyable_elements() {
    let errors = run(vec![
        handle(),
        noncopyable_user(vec![field("all", array(ty("Handle")))]),
    ]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind(),
        &CEK::SubstitutionViolation {
            ty: "Handle".to_string(),
            param: "Element".to_string(),
            owner: "Array".to_string(),
            owner_kind: "type",
            cap: Capability::Copyable,
        }
    );
    // Library parameters have no declaration to point at.
    assert!(errors[0].notes().is_empty());
}

#[test]
fn test_optional_wraps_suppressed_types() {
    let errors = run(vec![
        handle(),
        noncopyable_user(vec![
            field("a", generic("Optional", vec![ty("Handle")])),
            field("b", optional(ty("Handle"))),
        ]),
    ]);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn test_call_site_type_arguments() {
    // func consume<T>() {}; func main() { consume<Handle>() }
    let call_site = sp(4, 5, 17);
    let errors = run(vec![
        handle(),
        func(
            "consume",
            generics(vec![param("T", vec![])]),
            vec![],
            vec![],
        ),
        func(
            "main",
            GenericSig::default(),
            vec![],
            vec![CallSite {
                span: call_site,
                ..call("consume", vec![ty("Handle")])
            }],
        ),
    ]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(matches!(
        errors[0].kind(),
        CEK::SubstitutionViolation { owner_kind: "function", param, .. } if param == "T"
    ));
    assert_eq!(errors[0].span(), call_site);
}

#[test]
fn test_bare_inverse_outside_constraint() {
    let errors = run(vec![
        strukt(
            "S",
            GenericSig::default(),
            vec![inv("Copyable")],
            vec![field("x", inv("Copyable"))],
        ),
        func(
            "f",
            GenericSig::default(),
            vec![arg("y", spec(inv("Escapable"), TypeSpecifier::Borrowing))],
            vec![],
        ),
    ]);
    assert_eq!(
        kinds(&errors),
        vec![
            &CEK::InverseOutsideConstraint("~Copyable".to_string()),
            &CEK::InverseOutsideConstraint("~Escapable".to_string()),
        ]
    );
}

#[test]
fn test_composition_suppressing_and_requiring() {
    // any Copyable & ~Copyable
    let claim = sp(1, 5, 8);
    let errors = run(vec![func(
        "f",
        GenericSig::default(),
        vec![arg(
            "x",
            spec(
                existential(comp(vec![at(ty("Copyable"), claim), inv("Copyable")])),
                TypeSpecifier::Consuming,
            ),
        )],
        vec![],
    )]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind(),
        &CEK::ConflictingComposition {
            ty: "any Copyable & ~Copyable".to_string(),
            cap: Capability::Copyable,
        }
    );
    assert_eq!(errors[0].notes()[0].span, claim);
    assert_eq!(errors[0].notes()[0].message, "'Copyable' is required here");

    // some P & ~Copyable, where P does not suppress
    let errors = run(vec![
        protocol("P", vec![], vec![]),
        func(
            "g",
            GenericSig::default(),
            vec![arg("x", opaque(comp(vec![ty("P"), inv("Copyable")])))],
            vec![],
        ),
    ]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].notes()[0].message, "'P' requires 'Copyable'");
}

#[test]
fn test_noncopyable_existential_parameter_needs_ownership() {
    let errors = run(vec![func(
        "f",
        GenericSig::default(),
        vec![arg("x", existential(inv("Copyable")))],
        vec![],
    )]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::MissingOwnershipSpecifier {
            param: "x".to_string(),
            ty: "any ~Copyable".to_string(),
        }]
    );
}

#[test]
fn test_ownership_specifiers_on_suppressed_params() {
    // func f<T: ~Copyable>(a: T, b: borrowing T, c: consuming T, d: inout T)
    let errors = run(vec![func(
        "f",
        generics(vec![param("T", vec![inv("Copyable")])]),
        vec![
            arg("a", ty("T")),
            arg("b", spec(ty("T"), TypeSpecifier::Borrowing)),
            arg("c", spec(ty("T"), TypeSpecifier::Consuming)),
            arg("d", spec(ty("T"), TypeSpecifier::InOut)),
        ],
        vec![],
    )]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::MissingOwnershipSpecifier {
            param: "a".to_string(),
            ty: "T".to_string(),
        }]
    );
}
