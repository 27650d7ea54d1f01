use crate::core::repr::{
    BuildError, BuildErrorKind, BuilderOptions, DeferredAttrPolicy, NoLegacyBuilder,
    TypeAttrClass, TypeAttrKind, TypeRepr, TypeReprBuilder, TypeReprKind, TypeSpecifier,
    render_type,
};

include!("../tree_test_utils.rs");

fn build_with(
    tree: &SyntaxTree,
    node: NodeId,
    deferred_attrs: DeferredAttrPolicy,
) -> (TypeRepr, Vec<BuildError>) {
    let mut legacy = NoLegacyBuilder;
    let mut builder = TypeReprBuilder::new(tree, &mut legacy, BuilderOptions { deferred_attrs });
    let repr = builder.build(node);
    (repr, builder.into_errors())
}

// `@name` or `@name(arg)` inside the open attribute list.
fn attribute(b: &mut SyntaxTreeBuilder, name: &str, arg: Option<&str>) {
    b.start_node(Slot::Item, SyntaxKind::Attribute);
    b.punct(Slot::AtSign, "@");
    ident(b, Slot::AttributeName, name);
    if let Some(arg) = arg {
        b.start_node(Slot::Arguments, SyntaxKind::AttributeArguments);
        b.punct(Slot::LeftParen, "(");
        b.ident(Slot::Argument, arg);
        b.punct(Slot::RightParen, ")");
        b.finish_node();
    }
    b.finish_node();
    b.space();
}

// `<attrs> <specifier> T`
fn attributed(attrs: &[(&str, Option<&str>)], specifier: Option<&str>) -> (SyntaxTree, NodeId) {
    tree_of(|b| {
        let node = type_node(b, Slot::Root, TypeKind::Attributed);
        if !attrs.is_empty() {
            b.start_node(Slot::Attributes, SyntaxKind::AttributeList);
            for (name, arg) in attrs {
                attribute(b, name, *arg);
            }
            b.finish_node();
        }
        if let Some(specifier) = specifier {
            b.keyword(Slot::Specifier, specifier);
            b.space();
        }
        ident(b, Slot::Base, "T");
        b.finish_node();
        node
    })
}

#[test]
fn test_simple_attributes_are_kept() {
    let (tree, root) = attributed(&[("escaping", None), ("Sendable", None)], None);
    let (repr, errors) = build_with(&tree, root, DeferredAttrPolicy::Diagnose);
    assert!(errors.is_empty());
    let TypeReprKind::Attributed { attrs, base } = &repr.kind else {
        panic!("expected attributed repr, got {repr:?}");
    };
    assert_eq!(
        attrs.iter().map(|attr| attr.kind).collect::<Vec<_>>(),
        vec![TypeAttrKind::Escaping, TypeAttrKind::Sendable]
    );
    assert_eq!(attrs[0].at.start.column, 1);
    assert_eq!(attrs[0].name.start.column, 2);
    assert_eq!(base.simple_name(), Some("T"));
    assert_eq!(render_type(&repr), "@escaping @Sendable T");
}

#[test]
fn test_deferred_attribute_is_diagnosed() {
    let (tree, root) = attributed(&[("escaping", None), ("convention", Some("c"))], None);
    let (repr, errors) = build_with(&tree, root, DeferredAttrPolicy::Diagnose);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].kind(),
        &BuildErrorKind::UnsupportedTypeAttribute("convention".to_string())
    );
    // The whole `@convention(c)` item is the primary location.
    assert_eq!(errors[0].span().start.column, 11);
    assert_eq!(errors[0].span().end.column, 25);
    assert_eq!(render_type(&repr), "@escaping T");
}

#[test]
fn test_deferred_attribute_can_be_skipped() {
    let (tree, root) = attributed(&[("convention", Some("c"))], None);
    let (repr, errors) = build_with(&tree, root, DeferredAttrPolicy::Skip);
    assert!(errors.is_empty());
    // No attribute survived, so no attributed wrapper either.
    assert_eq!(repr.simple_name(), Some("T"));
}

#[test]
fn test_unknown_attribute_is_reported_and_dropped() {
    let (tree, root) = attributed(&[("bogus", None)], None);
    let (repr, errors) = build_with(&tree, root, DeferredAttrPolicy::Diagnose);
    assert_eq!(
        errors[0].kind(),
        &BuildErrorKind::UnknownTypeAttribute("bogus".to_string())
    );
    assert_eq!(repr.simple_name(), Some("T"));
}

#[test]
fn test_specifier_wraps_base() {
    let (tree, root) = attributed(&[], Some("borrowing"));
    let (repr, errors) = build_with(&tree, root, DeferredAttrPolicy::Diagnose);
    assert!(errors.is_empty());
    let TypeReprKind::Specifier {
        specifier,
        specifier_span,
        ..
    } = &repr.kind
    else {
        panic!("expected specifier repr");
    };
    assert_eq!(*specifier, TypeSpecifier::Borrowing);
    assert!(specifier.is_ownership());
    assert_eq!(specifier_span.start.column, 1);
    assert_eq!(render_type(&repr), "borrowing T");
}

#[test]
fn test_specifier_inside_attributes() {
    let (tree, root) = attributed(&[("escaping", None)], Some("inout"));
    let (repr, _) = build_with(&tree, root, DeferredAttrPolicy::Diagnose);
    assert_eq!(render_type(&repr), "@escaping inout T");
}

#[test]
fn test_unknown_specifier_is_an_unexpected_token() {
    let (tree, root) = attributed(&[], Some("sharing"));
    let (repr, errors) = build_with(&tree, root, DeferredAttrPolicy::Diagnose);
    assert_eq!(
        errors[0].kind(),
        &BuildErrorKind::UnexpectedToken("sharing".to_string())
    );
    assert_eq!(repr.simple_name(), Some("T"));
}

#[test]
fn test_attribute_classes() {
    let class = |name: &str| TypeAttrKind::from_name(name).map(TypeAttrKind::class);
    assert_eq!(class("thin"), Some(TypeAttrClass::Sil));
    assert_eq!(class("inout"), Some(TypeAttrClass::Sil));
    assert_eq!(class("escaping"), Some(TypeAttrClass::Simple));
    assert_eq!(class("_local"), Some(TypeAttrClass::Simple));
    assert_eq!(class("differentiable"), Some(TypeAttrClass::Deferred));
    assert_eq!(class("_opaqueReturnTypeOf"), Some(TypeAttrClass::Deferred));
    assert_eq!(class("Escaping"), None);
    assert_eq!(TypeAttrKind::Preconcurrency.name(), "preconcurrency");
}

#[test]
fn test_specifier_keywords() {
    assert_eq!(
        TypeSpecifier::from_keyword("__owned"),
        Some(TypeSpecifier::LegacyOwned)
    );
    assert_eq!(TypeSpecifier::from_keyword("owned"), None);
    assert_eq!(TypeSpecifier::CompileTimeConst.as_str(), "_const");
    assert!(!TypeSpecifier::Isolated.is_ownership());
    assert!(TypeSpecifier::InOut.is_ownership());
}
