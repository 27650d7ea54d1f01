use crate::core::capability::{CEK, Capability, CapabilityError, check};
use crate::core::decl::{
    AssocTypeDecl, CallSite, Decl, DeclKind, ExtensionDecl, FuncDecl, GenericParam,
    GenericParamList, GenericSig, Member, Module, NominalDecl, NominalKind, Param, ProtocolDecl,
    Requirement, RequirementKind, TypeAliasDecl,
};
use crate::core::diag::{Position, Span};
use crate::core::repr::{IdentRepr, TypeRepr, TypeReprKind, TypeSpecifier};

// Spans only matter where a test asserts on them; everything else uses the
// default span.
#[allow(dead_code)]
fn sp(line: usize, column: usize, len: usize) -> Span {
    let pos = |column: usize| Position {
        offset: (line - 1) * 100 + column - 1,
        line,
        column,
    };
    Span::new(pos(column), pos(column + len))
}

#[allow(dead_code)]
fn at(mut ty: TypeRepr, span: Span) -> TypeRepr {
    ty.span = span;
    ty
}

#[allow(dead_code)]
fn ty(name: &str) -> TypeRepr {
    TypeRepr::ident(name, Span::default())
}

#[allow(dead_code)]
fn generic(name: &str, args: Vec<TypeRepr>) -> TypeRepr {
    TypeRepr::generic(name, args, Span::default())
}

#[allow(dead_code)]
fn inv(name: &str) -> TypeRepr {
    TypeRepr::inverse(ty(name), Span::default())
}

// `base.a.b`
#[allow(dead_code)]
fn member(base: &str, path: &[&str]) -> TypeRepr {
    TypeRepr::new(
        TypeReprKind::Member {
            base: Box::new(ty(base)),
            components: path
                .iter()
                .map(|name| IdentRepr {
                    name: name.to_string(),
                    name_span: Span::default(),
                    generic_args: None,
                })
                .collect(),
        },
        Span::default(),
    )
}

#[allow(dead_code)]
fn comp(members: Vec<TypeRepr>) -> TypeRepr {
    TypeRepr::new(TypeReprKind::Composition { members }, Span::default())
}

#[allow(dead_code)]
fn existential(constraint: TypeRepr) -> TypeRepr {
    TypeRepr::new(
        TypeReprKind::Existential {
            constraint: Box::new(constraint),
            any_span: Span::default(),
        },
        Span::default(),
    )
}

#[allow(dead_code)]
fn opaque(constraint: TypeRepr) -> TypeRepr {
    TypeRepr::new(
        TypeReprKind::Opaque {
            constraint: Box::new(constraint),
            some_span: Span::default(),
        },
        Span::default(),
    )
}

#[allow(dead_code)]
fn optional(base: TypeRepr) -> TypeRepr {
    TypeRepr::new(
        TypeReprKind::Optional {
            base: Box::new(base),
            question: Span::default(),
        },
        Span::default(),
    )
}

#[allow(dead_code)]
fn array(elem: TypeRepr) -> TypeRepr {
    TypeRepr::new(
        TypeReprKind::Array {
            elem: Box::new(elem),
            l_square: Span::default(),
            r_square: Span::default(),
        },
        Span::default(),
    )
}

#[allow(dead_code)]
fn spec(base: TypeRepr, specifier: TypeSpecifier) -> TypeRepr {
    TypeRepr::new(
        TypeReprKind::Specifier {
            base: Box::new(base),
            specifier,
            specifier_span: Span::default(),
        },
        Span::default(),
    )
}

#[allow(dead_code)]
fn param(name: &str, inherited: Vec<TypeRepr>) -> GenericParam {
    GenericParam {
        name: name.to_string(),
        inherited,
        span: Span::default(),
    }
}

#[allow(dead_code)]
fn generics(params: Vec<GenericParam>) -> GenericSig {
    GenericSig {
        params: Some(GenericParamList {
            params,
            span: Span::default(),
        }),
        where_clause: Vec::new(),
    }
}

#[allow(dead_code)]
fn with_where(mut sig: GenericSig, reqs: Vec<Requirement>) -> GenericSig {
    sig.where_clause = reqs;
    sig
}

#[allow(dead_code)]
fn conforms(subject: TypeRepr, constraint: TypeRepr) -> Requirement {
    Requirement {
        kind: RequirementKind::Conformance {
            subject,
            constraint,
        },
        span: Span::default(),
    }
}

#[allow(dead_code)]
fn same(first: TypeRepr, second: TypeRepr) -> Requirement {
    Requirement {
        kind: RequirementKind::SameType { first, second },
        span: Span::default(),
    }
}

#[allow(dead_code)]
fn decl(name: &str, kind: DeclKind) -> Decl {
    Decl {
        name: name.to_string(),
        name_span: Span::default(),
        kind,
        span: Span::default(),
    }
}

#[allow(dead_code)]
fn nominal(
    kind: NominalKind,
    name: &str,
    generics: GenericSig,
    inherited: Vec<TypeRepr>,
    members: Vec<Member>,
) -> Decl {
    decl(
        name,
        DeclKind::Nominal(NominalDecl {
            kind,
            generics,
            inherited,
            members,
        }),
    )
}

#[allow(dead_code)]
fn strukt(
    name: &str,
    generics: GenericSig,
    inherited: Vec<TypeRepr>,
    members: Vec<Member>,
) -> Decl {
    nominal(NominalKind::Struct, name, generics, inherited, members)
}

#[allow(dead_code)]
fn field(name: &str, ty: TypeRepr) -> Member {
    Member::StoredProperty {
        name: name.to_string(),
        ty,
        span: Span::default(),
    }
}

#[allow(dead_code)]
fn case(name: &str, payload: Vec<TypeRepr>) -> Member {
    Member::EnumCase {
        name: name.to_string(),
        payload,
        span: Span::default(),
    }
}

#[allow(dead_code)]
fn deinit() -> Member {
    Member::Deinit {
        is_empty: true,
        span: Span::default(),
    }
}

#[allow(dead_code)]
fn extension(extended: &str, inherited: Vec<TypeRepr>, where_clause: Vec<Requirement>) -> Decl {
    decl(
        extended,
        DeclKind::Extension(ExtensionDecl {
            extended: ty(extended),
            inherited,
            where_clause,
        }),
    )
}

#[allow(dead_code)]
fn protocol(name: &str, inherited: Vec<TypeRepr>, assoc_types: Vec<AssocTypeDecl>) -> Decl {
    decl(
        name,
        DeclKind::Protocol(ProtocolDecl {
            inherited,
            where_clause: Vec::new(),
            assoc_types,
        }),
    )
}

#[allow(dead_code)]
fn assoc(name: &str, inherited: Vec<TypeRepr>) -> AssocTypeDecl {
    AssocTypeDecl {
        name: name.to_string(),
        inherited,
        span: Span::default(),
    }
}

#[allow(dead_code)]
fn alias(name: &str, generics: GenericSig, underlying: TypeRepr) -> Decl {
    decl(
        name,
        DeclKind::TypeAlias(TypeAliasDecl {
            generics,
            underlying,
        }),
    )
}

#[allow(dead_code)]
fn func(name: &str, generics: GenericSig, params: Vec<Param>, calls: Vec<CallSite>) -> Decl {
    decl(
        name,
        DeclKind::Func(FuncDecl {
            generics,
            params,
            result: None,
            calls,
        }),
    )
}

#[allow(dead_code)]
fn arg(name: &str, ty: TypeRepr) -> Param {
    Param {
        name: name.to_string(),
        ty,
        span: Span::default(),
    }
}

#[allow(dead_code)]
fn call(callee: &str, type_args: Vec<TypeRepr>) -> CallSite {
    CallSite {
        callee: callee.to_string(),
        type_args,
        span: Span::default(),
    }
}

// `struct Handle: ~Copyable {}`
#[allow(dead_code)]
fn handle() -> Decl {
    strukt("Handle", GenericSig::default(), vec![inv("Copyable")], Vec::new())
}

#[allow(dead_code)]
fn run(decls: Vec<Decl>) -> Vec<CapabilityError> {
    run_with(decls, &Capability::ALL)
}

#[allow(dead_code)]
fn run_with(decls: Vec<Decl>, caps: &[Capability]) -> Vec<CapabilityError> {
    check(&Module::new(decls), caps)
}

#[allow(dead_code)]
fn kinds(errors: &[CapabilityError]) -> Vec<&CEK> {
    errors.iter().map(|error| error.kind()).collect()
}
