//! Syntax tree to `TypeRepr` transducer.
//!
//! Every `build` entry first runs the migration scan; nodes the native
//! builder cannot represent go to the legacy builder unchanged. Dispatch
//! below is exhaustive over `TypeKind`, so an unmigrated kind reaching it is
//! a bug in the scan.

use tracing::{debug, trace};

use crate::core::diag::Span;
use crate::core::repr::attrs::{TypeAttrClass, TypeAttrKind, TypeSpecifier};
use crate::core::repr::errors::{BuildError, BuildErrorKind};
use crate::core::repr::migration::{Migration, check_migration};
use crate::core::repr::model::{
    GenericArgs, IdentRepr, MetatypeKind, TupleElementRepr, TupleRepr, TypeAttr, TypeRepr,
    TypeReprKind,
};
use crate::core::tree::{NodeId, Slot, SyntaxKind, SyntaxTree, TypeKind};

/// Escape hatch for node kinds the native builder does not handle.
pub trait LegacyTypeBuilder {
    fn generate_with_legacy(&mut self, tree: &SyntaxTree, node: NodeId) -> TypeRepr;
}

/// Fallback used when no legacy builder is wired in: yields an error repr.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLegacyBuilder;

impl LegacyTypeBuilder for NoLegacyBuilder {
    fn generate_with_legacy(&mut self, tree: &SyntaxTree, node: NodeId) -> TypeRepr {
        TypeRepr::error(tree.span(node))
    }
}

/// What to do with attributes whose arguments need dedicated handling
/// (`@convention(c)`, `@differentiable(reverse)`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeferredAttrPolicy {
    #[default]
    Diagnose,
    Skip,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderOptions {
    pub deferred_attrs: DeferredAttrPolicy,
}

pub struct TypeReprBuilder<'a> {
    tree: &'a SyntaxTree,
    legacy: &'a mut dyn LegacyTypeBuilder,
    options: BuilderOptions,
    errors: Vec<BuildError>,
}

impl<'a> TypeReprBuilder<'a> {
    pub fn new(
        tree: &'a SyntaxTree,
        legacy: &'a mut dyn LegacyTypeBuilder,
        options: BuilderOptions,
    ) -> Self {
        Self {
            tree,
            legacy,
            options,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[BuildError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<BuildError> {
        self.errors
    }

    pub fn build(&mut self, node: NodeId) -> TypeRepr {
        match check_migration(self.tree, node) {
            Migration::Native => self.build_migrated(node),
            Migration::Legacy(reason) => {
                debug!(%node, ?reason, "type node delegated to legacy builder");
                self.legacy.generate_with_legacy(self.tree, node)
            }
        }
    }

    fn build_migrated(&mut self, node: NodeId) -> TypeRepr {
        let Some(kind) = self.tree.type_kind(node) else {
            unreachable!("type builder invoked on non-type node {node}");
        };
        trace!(%node, ?kind, "building type");
        match kind {
            TypeKind::Identifier => self.build_identifier(node),
            TypeKind::Member => self.build_member(node),
            TypeKind::Array => self.build_array(node),
            TypeKind::Dictionary => self.build_dictionary(node),
            TypeKind::Function => self.build_function(node),
            TypeKind::Tuple => {
                let tuple = self.build_tuple_repr(node);
                TypeRepr::new(TypeReprKind::Tuple(tuple), self.tree.span(node))
            }
            TypeKind::Optional => self.build_optional(node),
            TypeKind::ImplicitlyUnwrappedOptional => self.build_iuo(node),
            TypeKind::Metatype => self.build_metatype(node),
            TypeKind::Composition => self.build_composition(node),
            TypeKind::SomeOrAny => self.build_some_or_any(node),
            TypeKind::Suppressed => self.build_suppressed(node),
            TypeKind::PackElement => self.build_pack_element(node),
            TypeKind::PackExpansion => self.build_pack_expansion(node),
            TypeKind::Attributed => self.build_attributed(node),
            TypeKind::ClassRestriction => TypeRepr::ident("AnyObject", self.tree.span(node)),
            TypeKind::NamedOpaqueReturn | TypeKind::Missing => {
                unreachable!("unmigrated type kind {kind:?} passed the migration scan")
            }
        }
    }

    // -- helpers --

    fn missing(&mut self, node: NodeId, slot: Slot) -> TypeRepr {
        let span = self.tree.span(node);
        self.errors
            .push(BuildErrorKind::MissingChild(self.tree.kind(node), slot).at(span));
        TypeRepr::error(span)
    }

    fn build_child(&mut self, node: NodeId, slot: Slot) -> TypeRepr {
        match self.tree.child_node(node, slot) {
            Some(child) => self.build(child),
            None => self.missing(node, slot),
        }
    }

    fn token_span(&self, node: NodeId, slot: Slot) -> Option<Span> {
        self.tree.child_token(node, slot).map(|tok| tok.span)
    }

    // -- identifiers and member chains --

    fn build_identifier(&mut self, node: NodeId) -> TypeRepr {
        let span = self.tree.span(node);
        let Some(ident) = self.ident_component(node) else {
            return self.missing(node, Slot::Name);
        };
        if ident.name == "Any" && ident.generic_args.is_none() {
            return TypeRepr::any(span);
        }
        TypeRepr::new(TypeReprKind::Ident(ident), span)
    }

    /// Name plus generic arguments of an identifier or member node.
    fn ident_component(&mut self, node: NodeId) -> Option<IdentRepr> {
        let tree = self.tree;
        let name = tree.child_token(node, Slot::Name)?;
        let generic_args = tree
            .child_node(node, Slot::GenericArguments)
            .map(|clause| self.build_generic_args(clause));
        Some(IdentRepr {
            name: name.text.clone(),
            name_span: name.span,
            generic_args,
        })
    }

    fn build_generic_args(&mut self, clause: NodeId) -> GenericArgs {
        let tree = self.tree;
        let clause_span = tree.span(clause);
        let args = tree
            .child_nodes(clause, Slot::Argument)
            .map(|arg| match tree.kind(arg) {
                SyntaxKind::GenericArgument => self.build_child(arg, Slot::Type),
                _ => self.build(arg),
            })
            .collect();
        GenericArgs {
            args,
            l_angle: self
                .token_span(clause, Slot::LeftAngle)
                .unwrap_or(Span::point(clause_span.start)),
            r_angle: self
                .token_span(clause, Slot::RightAngle)
                .unwrap_or(Span::point(clause_span.end)),
        }
    }

    fn build_member(&mut self, node: NodeId) -> TypeRepr {
        let tree = self.tree;
        let span = tree.span(node);

        // The tree nests `A.B.C` as Member(Member(A, B), C); collect the
        // member nodes outermost first, then flip to base-then-path order.
        let mut member_nodes = Vec::new();
        let mut current = node;
        while tree.type_kind(current) == Some(TypeKind::Member) {
            member_nodes.push(current);
            match tree.child_node(current, Slot::Base) {
                Some(base) => current = base,
                None => return self.missing(current, Slot::Base),
            }
        }
        member_nodes.reverse();

        let base = self.build(current);
        let mut components = Vec::with_capacity(member_nodes.len());
        for member in member_nodes {
            match self.ident_component(member) {
                Some(component) => components.push(component),
                None => return self.missing(member, Slot::Name),
            }
        }

        TypeRepr::new(
            TypeReprKind::Member {
                base: Box::new(base),
                components,
            },
            span,
        )
    }

    // -- collections --

    fn build_array(&mut self, node: NodeId) -> TypeRepr {
        let span = self.tree.span(node);
        let elem = self.build_child(node, Slot::Element);
        TypeRepr::new(
            TypeReprKind::Array {
                elem: Box::new(elem),
                l_square: self
                    .token_span(node, Slot::LeftSquare)
                    .unwrap_or(Span::point(span.start)),
                r_square: self
                    .token_span(node, Slot::RightSquare)
                    .unwrap_or(Span::point(span.end)),
            },
            span,
        )
    }

    fn build_dictionary(&mut self, node: NodeId) -> TypeRepr {
        let span = self.tree.span(node);
        let key = self.build_child(node, Slot::Key);
        let value = self.build_child(node, Slot::Value);
        TypeRepr::new(
            TypeReprKind::Dictionary {
                colon: self
                    .token_span(node, Slot::Colon)
                    .unwrap_or(Span::point(key.span.end)),
                key: Box::new(key),
                value: Box::new(value),
                l_square: self
                    .token_span(node, Slot::LeftSquare)
                    .unwrap_or(Span::point(span.start)),
                r_square: self
                    .token_span(node, Slot::RightSquare)
                    .unwrap_or(Span::point(span.end)),
            },
            span,
        )
    }

    // -- tuples and functions --

    /// Builds the parenthesized element list of `node`; shared by tuple
    /// types and function parameter clauses.
    fn build_tuple_repr(&mut self, node: NodeId) -> TupleRepr {
        let tree = self.tree;
        let span = tree.span(node);
        let elements = tree
            .child_nodes(node, Slot::Elements)
            .map(|elem| self.build_tuple_element(elem))
            .collect();
        TupleRepr {
            elements,
            l_paren: self
                .token_span(node, Slot::LeftParen)
                .unwrap_or(Span::point(span.start)),
            r_paren: self
                .token_span(node, Slot::RightParen)
                .unwrap_or(Span::point(span.end)),
        }
    }

    fn build_tuple_element(&mut self, elem: NodeId) -> TupleElementRepr {
        let tree = self.tree;
        let label = |slot| {
            tree.child_token(elem, slot)
                .map(|tok| (tok.text.clone(), tok.span))
        };
        let first_name = label(Slot::FirstName);
        let second_name = label(Slot::SecondName);

        let mut ty = self.build_child(elem, Slot::Type);
        if let Some(ellipsis) = self.token_span(elem, Slot::Ellipsis) {
            let span = ty.span.to(ellipsis);
            ty = TypeRepr::new(
                TypeReprKind::Vararg {
                    elem: Box::new(ty),
                    ellipsis,
                },
                span,
            );
        }

        TupleElementRepr {
            first_name,
            second_name,
            colon: self.token_span(elem, Slot::Colon),
            ty,
            trailing_comma: self.token_span(elem, Slot::TrailingComma),
        }
    }

    fn build_function(&mut self, node: NodeId) -> TypeRepr {
        let tree = self.tree;
        let span = tree.span(node);
        let params = self.build_tuple_repr(node);
        let async_span = self.token_span(node, Slot::AsyncKeyword);

        let (throws_span, thrown) = match tree.child_node(node, Slot::ThrowsClause) {
            Some(clause) => {
                let thrown = tree
                    .child_node(clause, Slot::ThrownType)
                    .map(|ty| Box::new(self.build(ty)));
                (self.token_span(clause, Slot::ThrowsKeyword), thrown)
            }
            None => (None, None),
        };

        let Some(ret_clause) = tree.child_node(node, Slot::ReturnClause) else {
            return self.missing(node, Slot::ReturnClause);
        };
        let result = self.build_child(ret_clause, Slot::ReturnType);
        let arrow = self
            .token_span(ret_clause, Slot::Arrow)
            .unwrap_or(Span::point(result.span.start));

        TypeRepr::new(
            TypeReprKind::Function {
                params,
                async_span,
                throws_span,
                thrown,
                arrow,
                result: Box::new(result),
            },
            span,
        )
    }

    // -- sugar and wrappers --

    fn build_optional(&mut self, node: NodeId) -> TypeRepr {
        let span = self.tree.span(node);
        let base = self.build_child(node, Slot::Base);
        let question = self
            .token_span(node, Slot::QuestionMark)
            .unwrap_or(Span::point(span.end));
        TypeRepr::new(
            TypeReprKind::Optional {
                base: Box::new(base),
                question,
            },
            span,
        )
    }

    fn build_iuo(&mut self, node: NodeId) -> TypeRepr {
        let span = self.tree.span(node);
        let base = self.build_child(node, Slot::Base);
        let exclamation = self
            .token_span(node, Slot::ExclamationMark)
            .unwrap_or(Span::point(span.end));
        TypeRepr::new(
            TypeReprKind::ImplicitlyUnwrapped {
                base: Box::new(base),
                exclamation,
            },
            span,
        )
    }

    fn build_metatype(&mut self, node: NodeId) -> TypeRepr {
        let tree = self.tree;
        let span = tree.span(node);
        let base = self.build_child(node, Slot::Base);
        let Some(keyword) = tree.child_token(node, Slot::MetatypeKeyword) else {
            return self.missing(node, Slot::MetatypeKeyword);
        };
        let meta = match keyword.text.as_str() {
            "Type" => MetatypeKind::Type,
            "Protocol" => MetatypeKind::Protocol,
            other => {
                self.errors
                    .push(BuildErrorKind::UnexpectedToken(other.to_string()).at(keyword.span));
                return base;
            }
        };
        TypeRepr::new(
            TypeReprKind::Metatype {
                base: Box::new(base),
                meta,
                meta_span: keyword.span,
            },
            span,
        )
    }

    fn build_composition(&mut self, node: NodeId) -> TypeRepr {
        let tree = self.tree;
        let members = tree
            .child_nodes(node, Slot::Elements)
            .map(|elem| match tree.kind(elem) {
                SyntaxKind::CompositionElement => self.build_child(elem, Slot::Type),
                _ => self.build(elem),
            })
            .collect();
        TypeRepr::new(TypeReprKind::Composition { members }, tree.span(node))
    }

    fn build_some_or_any(&mut self, node: NodeId) -> TypeRepr {
        let tree = self.tree;
        let span = tree.span(node);
        let Some(keyword) = tree.child_token(node, Slot::SomeOrAnyKeyword) else {
            return self.missing(node, Slot::SomeOrAnyKeyword);
        };
        let constraint = Box::new(self.build_child(node, Slot::Constraint));
        let kind = match keyword.text.as_str() {
            "some" => TypeReprKind::Opaque {
                constraint,
                some_span: keyword.span,
            },
            "any" => TypeReprKind::Existential {
                constraint,
                any_span: keyword.span,
            },
            other => {
                self.errors
                    .push(BuildErrorKind::UnexpectedToken(other.to_string()).at(keyword.span));
                return *constraint;
            }
        };
        TypeRepr::new(kind, span)
    }

    fn build_suppressed(&mut self, node: NodeId) -> TypeRepr {
        let span = self.tree.span(node);
        let constraint = self.build_child(node, Slot::Constraint);
        let tilde = self
            .token_span(node, Slot::Tilde)
            .unwrap_or(Span::point(span.start));
        TypeRepr::new(
            TypeReprKind::Inverse {
                constraint: Box::new(constraint),
                tilde,
            },
            span,
        )
    }

    fn build_pack_element(&mut self, node: NodeId) -> TypeRepr {
        let span = self.tree.span(node);
        let pack = self.build_child(node, Slot::Pack);
        let each_span = self
            .token_span(node, Slot::EachKeyword)
            .unwrap_or(Span::point(span.start));
        TypeRepr::new(
            TypeReprKind::PackElement {
                pack: Box::new(pack),
                each_span,
            },
            span,
        )
    }

    fn build_pack_expansion(&mut self, node: NodeId) -> TypeRepr {
        let span = self.tree.span(node);
        let pattern = self.build_child(node, Slot::Pattern);
        let repeat_span = self
            .token_span(node, Slot::RepeatKeyword)
            .unwrap_or(Span::point(span.start));
        TypeRepr::new(
            TypeReprKind::PackExpansion {
                pattern: Box::new(pattern),
                repeat_span,
            },
            span,
        )
    }

    // -- attributes and specifiers --

    fn build_attributed(&mut self, node: NodeId) -> TypeRepr {
        let tree = self.tree;
        let span = tree.span(node);
        let mut ty = self.build_child(node, Slot::Base);

        if let Some(token) = tree.child_token(node, Slot::Specifier) {
            match TypeSpecifier::from_keyword(&token.text) {
                Some(specifier) => {
                    let wrapped_span = token.span.to(ty.span);
                    ty = TypeRepr::new(
                        TypeReprKind::Specifier {
                            base: Box::new(ty),
                            specifier,
                            specifier_span: token.span,
                        },
                        wrapped_span,
                    );
                }
                None => self
                    .errors
                    .push(BuildErrorKind::UnexpectedToken(token.text.clone()).at(token.span)),
            }
        }

        if let Some(list) = tree.child_node(node, Slot::Attributes) {
            let attrs = self.build_type_attrs(list);
            if !attrs.is_empty() {
                ty = TypeRepr::new(
                    TypeReprKind::Attributed {
                        base: Box::new(ty),
                        attrs,
                    },
                    span,
                );
            }
        }
        ty
    }

    fn build_type_attrs(&mut self, list: NodeId) -> Vec<TypeAttr> {
        let tree = self.tree;
        let mut attrs = Vec::new();
        for item in tree.child_nodes(list, Slot::Item) {
            // `#if` clauses inside attribute lists are not expanded here.
            if tree.kind(item) != SyntaxKind::Attribute {
                continue;
            }
            let Some(name_node) = tree.child_node(item, Slot::AttributeName) else {
                continue;
            };
            // Only plain identifiers name a type attribute.
            if tree.type_kind(name_node) != Some(TypeKind::Identifier)
                || tree.child_node(name_node, Slot::GenericArguments).is_some()
            {
                trace!(node = %item, "skipping attribute with complex name");
                continue;
            }
            let Some(name) = tree.child_token(name_node, Slot::Name) else {
                continue;
            };
            let at = self.token_span(item, Slot::AtSign).unwrap_or(name.span);

            let Some(kind) = TypeAttrKind::from_name(&name.text) else {
                self.errors
                    .push(BuildErrorKind::UnknownTypeAttribute(name.text.clone()).at(name.span));
                continue;
            };
            match kind.class() {
                TypeAttrClass::Sil | TypeAttrClass::Simple => attrs.push(TypeAttr {
                    kind,
                    at,
                    name: name.span,
                }),
                TypeAttrClass::Deferred => match self.options.deferred_attrs {
                    DeferredAttrPolicy::Diagnose => self.errors.push(
                        BuildErrorKind::UnsupportedTypeAttribute(name.text.clone())
                            .at(tree.span(item)),
                    ),
                    DeferredAttrPolicy::Skip => {
                        debug!(attr = %name.text, "skipping deferred type attribute");
                    }
                },
            }
        }
        attrs
    }
}
