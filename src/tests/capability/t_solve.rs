include!("decl_test_utils.rs");

fn copyable_param(name: &str) -> GenericParam {
    param(name, vec![inv("Copyable")])
}

#[test]
fn test_same_type_with_suppressed_param_is_one_error() {
    // func f<T: ~Copyable, U>() where T == U
    let clause = sp(1, 30, 6);
    let inverse = sp(1, 11, 9);
    let sig = with_where(
        generics(vec![
            param("T", vec![at(inv("Copyable"), inverse)]),
            param("U", vec![]),
        ]),
        vec![Requirement {
            span: clause,
            ..same(ty("T"), ty("U"))
        }],
    );
    let errors = run(vec![func("f", sig, vec![], vec![])]);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind(),
        &CEK::SameTypeConflict {
            suppressed: "T".to_string(),
            other: "U".to_string(),
            cap: Capability::Copyable,
        }
    );
    assert_eq!(errors[0].span(), clause);
    let notes: Vec<_> = errors[0].notes().iter().map(|n| n.message.as_str()).collect();
    assert_eq!(
        notes,
        vec![
            "'T' is marked '~Copyable' here",
            "'U' requires 'Copyable' through the default for unmarked generic parameters",
        ]
    );
    assert_eq!(errors[0].notes()[0].span, inverse);
}

#[test]
fn test_redundant_same_type_edge_is_not_reported_twice() {
    let sig = with_where(
        generics(vec![copyable_param("T"), param("U", vec![])]),
        vec![same(ty("T"), ty("U")), same(ty("U"), ty("T"))],
    );
    let errors = run(vec![func("f", sig, vec![], vec![])]);
    assert_eq!(errors.len(), 1, "{errors:?}");
}

#[test]
fn test_same_type_chain_reports_each_joining_edge() {
    // T == U, U == V with only T suppressed: both joins pull in a claimer.
    let sig = with_where(
        generics(vec![
            copyable_param("T"),
            param("U", vec![]),
            param("V", vec![]),
        ]),
        vec![same(ty("T"), ty("U")), same(ty("U"), ty("V"))],
    );
    let errors = run(vec![func("f", sig, vec![], vec![])]);
    let others: Vec<_> = kinds(&errors)
        .into_iter()
        .map(|kind| match kind {
            CEK::SameTypeConflict { other, .. } => other.as_str(),
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    assert_eq!(others, vec!["U", "V"]);
}

#[test]
fn test_joining_edge_reports_each_suppressor_of_the_class() {
    // <T: ~Copyable, V: ~Copyable, U> where T == V, T == U
    let clause = sp(1, 52, 6);
    let sig = with_where(
        generics(vec![
            copyable_param("T"),
            copyable_param("V"),
            param("U", vec![]),
        ]),
        vec![
            same(ty("T"), ty("V")),
            Requirement {
                span: clause,
                ..same(ty("T"), ty("U"))
            },
        ],
    );
    let errors = run(vec![func("f", sig, vec![], vec![])]);
    let pairs: Vec<_> = errors
        .iter()
        .map(|error| match error.kind() {
            CEK::SameTypeConflict {
                suppressed, other, ..
            } => {
                assert_eq!(error.span(), clause);
                (suppressed.as_str(), other.as_str())
            }
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    assert_eq!(pairs, vec![("T", "U"), ("V", "U")]);
}

#[test]
fn test_explicit_claim_conflicts_with_inverse() {
    // <T: ~Copyable> where T: Copyable
    let inverse = sp(1, 9, 9);
    let claim = sp(1, 27, 8);
    let sig = with_where(
        generics(vec![param("T", vec![at(inv("Copyable"), inverse)])]),
        vec![conforms(ty("T"), at(ty("Copyable"), claim))],
    );
    let errors = run(vec![func("f", sig, vec![], vec![])]);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind(),
        &CEK::ConflictingRequirement {
            subject: "T".to_string(),
            cap: Capability::Copyable,
            origin: "an explicit requirement".to_string(),
        }
    );
    assert_eq!(errors[0].span(), inverse);
    assert_eq!(errors[0].notes()[0].span, claim);
    assert_eq!(errors[0].notes()[0].message, "'T: Copyable' is required here");
}

#[test]
fn test_protocol_conformance_conflicts_unless_protocol_suppresses() {
    let local = protocol("P", vec![], vec![]);
    let sig = with_where(
        generics(vec![copyable_param("T")]),
        vec![conforms(ty("T"), ty("P"))],
    );
    let errors = run(vec![local.clone(), func("f", sig, vec![], vec![])]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(matches!(
        errors[0].kind(),
        CEK::ConflictingRequirement { origin, .. } if origin == "its conformance to 'P'"
    ));

    let sig = with_where(
        generics(vec![copyable_param("T")]),
        vec![conforms(ty("T"), ty("Sendable"))],
    );
    assert!(run(vec![local, func("f", sig, vec![], vec![])]).is_empty());
}

#[test]
fn test_extension_cannot_suppress_outer_param() {
    // struct Box<T> {}; extension Box where T: ~Copyable
    let errors = run(vec![
        strukt("Box", generics(vec![param("T", vec![])]), vec![], vec![]),
        extension("Box", vec![], vec![conforms(ty("T"), inv("Copyable"))]),
    ]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind(),
        &CEK::ConflictingRequirement {
            subject: "T".to_string(),
            cap: Capability::Copyable,
            origin: "the declaration of 'Box'".to_string(),
        }
    );
}

#[test]
fn test_inverse_in_extension_inheritance_is_rejected() {
    let errors = run(vec![
        strukt("Box", GenericSig::default(), vec![], vec![]),
        extension("Box", vec![inv("Copyable")], vec![]),
    ]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::InverseInExtension {
            name: "Box".to_string(),
            cap: Capability::Copyable,
        }]
    );
}

#[test]
fn test_inverse_on_associated_type_of_param() {
    // protocol Q { associatedtype A }; func f<T: Q>() where T.A: ~Copyable
    let sig = with_where(
        generics(vec![param("T", vec![ty("Q")])]),
        vec![conforms(member("T", &["A"]), inv("Copyable"))],
    );
    let errors = run(vec![
        protocol("Q", vec![], vec![assoc("A", vec![])]),
        func("f", sig, vec![], vec![]),
    ]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::InverseNotOnLocalParam {
            subject: "T.A".to_string(),
            cap: Capability::Copyable,
        }]
    );
}

#[test]
fn test_inverse_on_concrete_type_is_not_local() {
    let sig = with_where(
        generics(vec![param("T", vec![])]),
        vec![conforms(ty("Int"), inv("Copyable"))],
    );
    let errors = run(vec![func("f", sig, vec![], vec![])]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::InverseNotOnLocalParam {
            subject: "Int".to_string(),
            cap: Capability::Copyable,
        }]
    );
}

#[test]
fn test_only_capabilities_are_suppressible() {
    let errors = run(vec![strukt(
        "S",
        GenericSig::default(),
        vec![inv("Hashable")],
        vec![],
    )]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::NotSuppressible("Hashable".to_string())]
    );

    let sig = generics(vec![param("T", vec![inv("Equatable")])]);
    let errors = run(vec![func("f", sig, vec![], vec![])]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::NotSuppressible("Equatable".to_string())]
    );
}

#[test]
fn test_class_cannot_suppress() {
    let errors = run(vec![nominal(
        NominalKind::Class,
        "C",
        GenericSig::default(),
        vec![inv("Copyable")],
        vec![field("h", ty("Int"))],
    )]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::ClassCannotSuppress {
            kind: "class",
            name: "C".to_string(),
            cap: Capability::Copyable,
        }]
    );
}

#[test]
fn test_aggregate_claiming_and_suppressing_itself() {
    let errors = run(vec![strukt(
        "S",
        GenericSig::default(),
        vec![ty("Hashable"), inv("Copyable")],
        vec![],
    )]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::ConflictingRequirement {
            subject: "S".to_string(),
            cap: Capability::Copyable,
            origin: "its conformance to 'Hashable'".to_string(),
        }]
    );
}

#[test]
fn test_associated_type_claim_in_protocol_where_clause() {
    // protocol P { associatedtype A: ~Copyable } where A: Copyable
    let proto = decl(
        "P",
        DeclKind::Protocol(ProtocolDecl {
            inherited: vec![],
            where_clause: vec![conforms(ty("A"), ty("Copyable"))],
            assoc_types: vec![assoc("A", vec![inv("Copyable")])],
        }),
    );
    let errors = run(vec![proto]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::ConflictingRequirement {
            subject: "P.A".to_string(),
            cap: Capability::Copyable,
            origin: "an explicit requirement".to_string(),
        }]
    );
}

#[test]
fn test_same_type_to_suppressed_concrete_type() {
    let clause = sp(2, 20, 11);
    let sig = with_where(
        generics(vec![param("T", vec![])]),
        vec![Requirement {
            span: clause,
            ..same(ty("T"), ty("Handle"))
        }],
    );
    let errors = run(vec![handle(), func("f", sig, vec![], vec![])]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind(),
        &CEK::SameTypeConcreteConflict {
            subject: "T".to_string(),
            ty: "Handle".to_string(),
            cap: Capability::Copyable,
        }
    );
    assert_eq!(errors[0].span(), clause);
}

#[test]
fn test_same_type_to_copyable_concrete_type_restores_capability() {
    // func f<T: ~Copyable>(x: T) where T == Int
    let sig = with_where(
        generics(vec![copyable_param("T")]),
        vec![same(ty("T"), ty("Int"))],
    );
    let errors = run(vec![func("f", sig, vec![arg("x", ty("T"))], vec![])]);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn test_disabled_capability_is_ignored() {
    let boxed = strukt(
        "Box",
        generics(vec![copyable_param("T")]),
        vec![],
        vec![field("value", ty("T"))],
    );
    assert!(run_with(vec![boxed.clone()], &[Capability::Escapable]).is_empty());
    assert_eq!(run(vec![boxed]).len(), 1);
}

#[test]
fn test_errors_are_grouped_by_declaration() {
    // The struct's member error comes from a later phase than the function's
    // signature error but belongs to an earlier declaration.
    let errors = run(vec![
        handle(),
        strukt("User", GenericSig::default(), vec![], vec![field("h", ty("Handle"))]),
        func(
            "f",
            with_where(
                generics(vec![param("T", vec![])]),
                vec![conforms(ty("Int"), inv("Copyable"))],
            ),
            vec![],
            vec![],
        ),
    ]);
    let codes: Vec<_> = kinds(&errors).into_iter().map(|kind| kind.code()).collect();
    assert_eq!(codes, vec!["TF-CAP-MEMBER", "TF-CAP-NONLOCAL-INVERSE"]);
}
