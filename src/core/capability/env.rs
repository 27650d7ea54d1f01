//! Declaration lookups over the collected index.

use crate::core::capability::builtins;
use crate::core::capability::constraint::{
    ConstraintItem, classify, claims, inverse_span, subject_key,
};
use crate::core::capability::engine::CkEnv;
use crate::core::capability::model::Capability;
use crate::core::decl::{
    Decl, DeclKind, FuncDecl, GenericSig, NominalDecl, ProtocolDecl, RequirementKind,
    TypeAliasDecl,
};

impl<'m> CkEnv<'m> {
    pub(crate) fn nominal(&self, name: &str) -> Option<(usize, &'m Decl, &'m NominalDecl)> {
        let idx = *self.nominals.get(name)?;
        let decl = self.decl(idx);
        match &decl.kind {
            DeclKind::Nominal(nominal) => Some((idx, decl, nominal)),
            _ => None,
        }
    }

    pub(crate) fn protocol(&self, name: &str) -> Option<&'m ProtocolDecl> {
        let idx = *self.protocols.get(name)?;
        match &self.decl(idx).kind {
            DeclKind::Protocol(proto) => Some(proto),
            _ => None,
        }
    }

    pub(crate) fn alias(&self, name: &str) -> Option<(usize, &'m Decl, &'m TypeAliasDecl)> {
        let idx = *self.aliases.get(name)?;
        let decl = self.decl(idx);
        match &decl.kind {
            DeclKind::TypeAlias(alias) => Some((idx, decl, alias)),
            _ => None,
        }
    }

    pub(crate) fn func(&self, name: &str) -> Option<(usize, &'m Decl, &'m FuncDecl)> {
        let idx = *self.funcs.get(name)?;
        let decl = self.decl(idx);
        match &decl.kind {
            DeclKind::Func(func) => Some((idx, decl, func)),
            _ => None,
        }
    }

    /// Whether conforming to `name` implies `cap`, following protocol
    /// inheritance. Protocols outside the module use the builtin table.
    pub(crate) fn protocol_requires(&self, name: &str, cap: Capability) -> bool {
        self.protocol_requires_inner(name, cap, &mut Vec::new())
    }

    fn protocol_requires_inner(
        &self,
        name: &str,
        cap: Capability,
        visiting: &mut Vec<String>,
    ) -> bool {
        let Some(proto) = self.protocol(name) else {
            return builtins::external_protocol_requires(name, cap);
        };
        if visiting.iter().any(|seen| seen == name) {
            return false;
        }
        visiting.push(name.to_string());

        let items = protocol_self_items(proto);
        let result = if inverse_span(&items, cap).is_none() {
            true
        } else {
            items.iter().any(|item| match item {
                ConstraintItem::Claim(c, _) => *c == cap,
                ConstraintItem::Protocol(parent, _) => {
                    self.protocol_requires_inner(parent, cap, visiting)
                }
                _ => false,
            })
        };

        visiting.pop();
        result
    }

    /// `Some(true)` when associated type `assoc` of `proto` (or of a
    /// protocol it inherits) suppresses `cap`, `None` when no such
    /// associated type is known.
    pub(crate) fn assoc_suppresses(&self, proto: &str, assoc: &str, cap: Capability) -> Option<bool> {
        self.assoc_suppresses_inner(proto, assoc, cap, &mut Vec::new())
    }

    fn assoc_suppresses_inner(
        &self,
        proto_name: &str,
        assoc: &str,
        cap: Capability,
        visiting: &mut Vec<String>,
    ) -> Option<bool> {
        let proto = self.protocol(proto_name)?;
        if visiting.iter().any(|seen| seen == proto_name) {
            return None;
        }
        visiting.push(proto_name.to_string());

        let result = match proto.assoc_types.iter().find(|a| a.name == assoc) {
            Some(decl) => {
                let qualified = format!("Self.{assoc}");
                let mut items: Vec<ConstraintItem<'_>> =
                    decl.inherited.iter().flat_map(classify).collect();
                for req in &proto.where_clause {
                    if let RequirementKind::Conformance {
                        subject,
                        constraint,
                    } = &req.kind
                        && subject_key(subject)
                            .is_some_and(|key| key == assoc || key == qualified)
                    {
                        items.extend(classify(constraint));
                    }
                }
                Some(inverse_span(&items, cap).is_some() && !claims(&items, cap))
            }
            None => protocol_self_items(proto).iter().find_map(|item| match item {
                ConstraintItem::Protocol(parent, _) => {
                    self.assoc_suppresses_inner(parent, assoc, cap, visiting)
                }
                _ => None,
            }),
        };

        visiting.pop();
        result
    }
}

/// Constraints on a protocol's `Self`: its inheritance clause plus
/// `where Self: ...` requirements.
pub(crate) fn protocol_self_items(proto: &ProtocolDecl) -> Vec<ConstraintItem<'_>> {
    let mut items: Vec<ConstraintItem<'_>> = proto.inherited.iter().flat_map(classify).collect();
    for req in &proto.where_clause {
        if let RequirementKind::Conformance {
            subject,
            constraint,
        } = &req.kind
            && subject.simple_name() == Some("Self")
        {
            items.extend(classify(constraint));
        }
    }
    items
}

/// Constraints a signature places directly on its parameter `param`.
pub(crate) fn param_items<'a>(sig: &'a GenericSig, param: &str) -> Vec<ConstraintItem<'a>> {
    let mut items = Vec::new();
    if let Some(decl) = sig.params().iter().find(|p| p.name == param) {
        items.extend(decl.inherited.iter().flat_map(classify));
    }
    for req in &sig.where_clause {
        if let RequirementKind::Conformance {
            subject,
            constraint,
        } = &req.kind
            && subject.simple_name() == Some(param)
        {
            items.extend(classify(constraint));
        }
    }
    items
}
