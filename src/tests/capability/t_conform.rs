use crate::core::diag::FixIt;

include!("decl_test_utils.rs");

fn generics_at(params: Vec<GenericParam>, span: Span) -> GenericSig {
    GenericSig {
        params: Some(GenericParamList { params, span }),
        where_clause: Vec::new(),
    }
}

// struct Box<T: ~Copyable>: ~Copyable { ...members }
fn noncopyable_box(members: Vec<Member>) -> Decl {
    strukt(
        "Box",
        generics(vec![param("T", vec![inv("Copyable")])]),
        vec![inv("Copyable")],
        members,
    )
}

// extension Box: Copyable where ...
fn copyable_when(reqs: Vec<Requirement>) -> Decl {
    extension("Box", vec![ty("Copyable")], reqs)
}

#[test]
fn test_implicitly_copyable_struct_with_suppressed_field() {
    // struct Box<T: ~Copyable> { var value: T }
    let list = sp(1, 11, 15);
    let param_span = sp(1, 12, 13);
    let errors = run(vec![strukt(
        "Box",
        generics_at(
            vec![GenericParam {
                span: param_span,
                ..param("T", vec![inv("Copyable")])
            }],
            list,
        ),
        vec![],
        vec![field("value", ty("T"))],
    )]);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind(),
        &CEK::NoncopyableMember {
            member_kind: "stored property",
            member: "value".to_string(),
            aggregate_kind: "struct",
            aggregate: "Box".to_string(),
            ty: "T".to_string(),
            cap: Capability::Copyable,
        }
    );
    assert_eq!(
        errors[0].fixits(),
        &[FixIt::insert(list.end, ": ~Copyable")]
    );
    assert_eq!(errors[0].notes().len(), 1);
    assert_eq!(errors[0].notes()[0].span, param_span);
    assert_eq!(
        errors[0].notes()[0].message,
        "'Box' can only be 'Copyable' when 'T' is; mark it '~Copyable' and add a conditional conformance"
    );
}

#[test]
fn test_fixit_goes_before_first_inherited_type() {
    let sendable = sp(1, 28, 8);
    let errors = run(vec![handle(), strukt(
        "User",
        GenericSig::default(),
        vec![at(ty("Sendable"), sendable)],
        vec![field("h", ty("Handle"))],
    )]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].fixits(),
        &[FixIt::insert(sendable.start, "~Copyable, ")]
    );
    // A concrete cause has no generic parameter to point at.
    assert!(errors[0].notes().is_empty());
}

#[test]
fn test_explicit_conformance_gets_no_fixit() {
    let errors = run(vec![handle(), strukt(
        "User",
        GenericSig::default(),
        vec![ty("Copyable")],
        vec![field("h", ty("Handle"))],
    )]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].fixits().is_empty());
}

#[test]
fn test_conditional_conformance_on_param_is_accepted() {
    let errors = run(vec![
        noncopyable_box(vec![field("value", ty("T"))]),
        copyable_when(vec![conforms(ty("T"), ty("Copyable"))]),
    ]);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn test_concrete_member_not_covered_by_condition() {
    let errors = run(vec![
        handle(),
        noncopyable_box(vec![field("value", ty("T")), field("h", ty("Handle"))]),
        copyable_when(vec![conforms(ty("T"), ty("Copyable"))]),
    ]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::MemberNotCoveredByCondition {
            member_kind: "stored property",
            member: "h".to_string(),
            aggregate: "Box".to_string(),
            cause: "Handle".to_string(),
            cap: Capability::Copyable,
        }]
    );
}

#[test]
fn test_param_outside_condition_is_not_covered() {
    // struct Box<T: ~Copyable, U: ~Copyable>: ~Copyable
    let boxed = strukt(
        "Box",
        generics(vec![
            param("T", vec![inv("Copyable")]),
            param("U", vec![inv("Copyable")]),
        ]),
        vec![inv("Copyable")],
        vec![field("first", ty("T")), field("second", ty("U"))],
    );
    let errors = run(vec![
        boxed,
        copyable_when(vec![conforms(ty("T"), ty("Copyable"))]),
    ]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(matches!(
        errors[0].kind(),
        CEK::MemberNotCoveredByCondition { member, cause, .. } if member == "second" && cause == "U"
    ));
}

#[test]
fn test_condition_must_only_require_capabilities() {
    let hashable = sp(5, 40, 11);
    let errors = run(vec![
        noncopyable_box(vec![field("value", ty("T"))]),
        copyable_when(vec![
            conforms(ty("T"), ty("Copyable")),
            Requirement {
                span: hashable,
                ..conforms(ty("T"), ty("Hashable"))
            },
        ]),
    ]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(
        errors[0].kind(),
        &CEK::ConditionalRequirementNotCapability {
            aggregate: "Box".to_string(),
            requirement: "T: Hashable".to_string(),
            cap: Capability::Copyable,
        }
    );
    assert_eq!(errors[0].span(), hashable);
}

#[test]
fn test_deinit_requires_noncopyable_aggregate() {
    let errors = run(vec![strukt(
        "Resource",
        GenericSig::default(),
        vec![],
        vec![deinit()],
    )]);
    assert_eq!(
        kinds(&errors),
        vec![&CEK::DeinitOnCopyable {
            kind: "struct",
            aggregate: "Resource".to_string(),
        }]
    );

    let errors = run(vec![strukt(
        "Resource",
        GenericSig::default(),
        vec![inv("Copyable")],
        vec![deinit()],
    )]);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn test_enum_payloads_report_once_per_case() {
    // enum Pick<T: ~Copyable> { case one(T); case two(T, T) }
    let errors = run(vec![nominal(
        NominalKind::Enum,
        "Pick",
        generics(vec![param("T", vec![inv("Copyable")])]),
        vec![],
        vec![
            case("one", vec![ty("T")]),
            case("two", vec![ty("T"), ty("T")]),
        ],
    )]);
    let members: Vec<_> = kinds(&errors)
        .into_iter()
        .map(|kind| match kind {
            CEK::NoncopyableMember {
                member_kind,
                member,
                aggregate_kind,
                ..
            } => {
                assert_eq!(*member_kind, "associated value of case");
                assert_eq!(*aggregate_kind, "enum");
                member.as_str()
            }
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    assert_eq!(members, vec!["one", "two"]);
}

#[test]
fn test_class_members_are_not_checked() {
    let errors = run(vec![nominal(
        NominalKind::Class,
        "Node",
        generics(vec![param("T", vec![inv("Copyable")])]),
        vec![],
        vec![field("value", ty("T"))],
    )]);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn test_suppressed_associated_type_member() {
    // protocol Container { associatedtype Element: ~Copyable }
    // struct Holder<C: Container> { var e: C.Element }
    let errors = run(vec![
        protocol(
            "Container",
            vec![],
            vec![assoc("Element", vec![inv("Copyable")])],
        ),
        strukt(
            "Holder",
            generics(vec![param("C", vec![ty("Container")])]),
            vec![],
            vec![field("e", member("C", &["Element"]))],
        ),
    ]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(matches!(
        errors[0].kind(),
        CEK::NoncopyableMember { ty, .. } if ty == "C.Element"
    ));
}

#[test]
fn test_escapable_member_check() {
    // struct View<T: ~Escapable> { var t: T }
    let errors = run(vec![strukt(
        "View",
        generics(vec![param("T", vec![inv("Escapable")])]),
        vec![],
        vec![field("t", ty("T"))],
    )]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(matches!(
        errors[0].kind(),
        CEK::NoncopyableMember {
            cap: Capability::Escapable,
            ..
        }
    ));
    assert_eq!(errors[0].fixits()[0].replacement, ": ~Escapable");
}
