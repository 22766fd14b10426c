//! Generic instantiation.
//!
//! Generic parameters appear in signatures and bodies as `Named` types with
//! the parameter's identifier. Instantiation replaces every such occurrence
//! with the concrete argument, walking into slice, array, map, function and
//! tuple positions, and rebuilds the canonical kinds on the way out.

use crate::ast::{
    ast::GenericParam,
    types::{Type, TypeCategory, TypeTag},
};

fn is_param(ty: &Type, id: &str) -> bool {
    ty.category == TypeCategory::Named && ty.generics.is_empty() && ty.ident == id
}

/// Substitutes `args` for `params` inside `ty`.
///
/// Substituted occurrences keep their pointer and reference sigils and
/// remember the parameter they replaced in `original`.
///
/// # Arguments
/// * `ty` - Type that may mention generic parameters
/// * `params` - Generic parameters of the declaration
/// * `args` - Concrete types, positionally matched to `params`
pub fn instantiate(ty: &Type, params: &[GenericParam], args: &[Type]) -> Type {
    if let Some(position) = params.iter().position(|param| is_param(ty, &param.id)) {
        if let Some(arg) = args.get(position) {
            let mut out = arg.clone();
            if !ty.prefix.is_empty() {
                out = out.with_prefix(&ty.prefix);
            }
            let mut original = ty.clone();
            original.original = None;
            out.original = Some(Box::new(original));
            return out;
        }
    }

    let mut out = ty.clone();
    out.generics = ty
        .generics
        .iter()
        .map(|generic| instantiate(generic, params, args))
        .collect();
    out.component = ty
        .component
        .as_ref()
        .map(|component| Box::new(instantiate(component, params, args)));
    out.multi = ty.multi.as_ref().map(|types| {
        types
            .iter()
            .map(|inner| instantiate(inner, params, args))
            .collect()
    });
    out.tag = match &ty.tag {
        TypeTag::Map(key, value) => TypeTag::Map(
            Box::new(instantiate(key, params, args)),
            Box::new(instantiate(value, params, args)),
        ),
        TypeTag::Fn(sig) => {
            let mut sig = sig.clone();
            for param in sig.params.iter_mut() {
                param.ty = param.ty.as_ref().map(|ty| instantiate(ty, params, args));
            }
            sig.ret = instantiate(&sig.ret, params, args);
            TypeTag::Fn(sig)
        }
        other => other.clone(),
    };
    out.refresh_kind();
    out
}

/// Binds generic parameters by matching a parameter type against an argument type.
///
/// Bindings already made are kept; the first argument that mentions a
/// parameter decides it.
pub fn infer(param: &Type, arg: &Type, params: &[GenericParam], bindings: &mut [Option<Type>]) {
    if let Some(position) = params.iter().position(|g| is_param(param, &g.id)) {
        if bindings[position].is_none() {
            let mut bound = arg.clone();
            if !param.prefix.is_empty() && arg.prefix.starts_with(&param.prefix) {
                for _ in 0..param.prefix.len() {
                    bound = bound.elem();
                }
            }
            bindings[position] = Some(bound);
        }
        return;
    }

    if let (Some(p), Some(a)) = (&param.component, &arg.component) {
        infer(p, a, params, bindings);
    }
    if let (TypeTag::Map(pk, pv), TypeTag::Map(ak, av)) = (&param.tag, &arg.tag) {
        infer(pk, ak, params, bindings);
        infer(pv, av, params, bindings);
    }
    for (p, a) in param.generics.iter().zip(arg.generics.iter()) {
        infer(p, a, params, bindings);
    }
}
