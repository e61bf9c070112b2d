use crate::MUTATYPE_ATTRIBUTE_NAME;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{meta::ParseNestedMeta, spanned::Spanned, *};

/// Determines how a field takes part in its container's description.
#[derive(Clone, Debug)]
pub enum FieldBehavior {
    /// Describe and mutate this field, with the given constraints (the default
    /// behavior).
    Reflect(Vec<TokenStream>),

    /// This field holds the parent composite: its fields come first, and the
    /// container extends its type.
    Parent,

    /// Leave this field out of the description; it is filled in with
    /// `Default::default()`.
    Ignore,
}

impl FieldBehavior {
    pub fn for_field(field: &Field) -> Result<FieldBehavior> {
        let mut constraints = vec![];
        let mut parent = false;
        let mut ignore = false;

        for attr in &field.attrs {
            if !attr.path().is_ident(MUTATYPE_ATTRIBUTE_NAME) {
                continue;
            }
            if !matches!(attr.meta, Meta::List(_)) {
                let msg = format!("#[{MUTATYPE_ATTRIBUTE_NAME}] must contain a group");
                return Err(syn::Error::new(attr.span(), msg));
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("ignore") {
                    ignore = true;
                    Ok(())
                } else if meta.path.is_ident("parent") {
                    parent = true;
                    Ok(())
                } else if let Some(c) = parse_constraint(&meta)? {
                    constraints.push(c);
                    Ok(())
                } else {
                    let path = &meta.path;
                    let msg = format!(
                        "Unknown option for #[{MUTATYPE_ATTRIBUTE_NAME}]: `{}`",
                        quote!(#path)
                    );
                    Err(meta.error(msg))
                }
            })?;
        }

        match (ignore, parent, constraints.is_empty()) {
            (false, false, _) => Ok(FieldBehavior::Reflect(constraints)),
            (true, false, true) => Ok(FieldBehavior::Ignore),
            (false, true, true) => Ok(FieldBehavior::Parent),
            _ => {
                let msg = format!(
                    "#[{MUTATYPE_ATTRIBUTE_NAME}(ignore)] and #[{MUTATYPE_ATTRIBUTE_NAME}(parent)] \
                     cannot be combined with each other or with constraints"
                );
                Err(syn::Error::new(field.span(), msg))
            }
        }
    }
}

/// Parse one of the constraint options, returning the expression that builds
/// it, or `None` if `meta` is not a constraint.
///
/// ```ignore
/// #[mutatype(not_null)]
/// #[mutatype(not_null(recursive))]
/// #[mutatype(in_range(min = -1, max = 10))]
/// #[mutatype(with_length(min = 1, max = 4, recursive))]
/// ```
pub fn parse_constraint(meta: &ParseNestedMeta<'_>) -> Result<Option<TokenStream>> {
    let (name, bounded) = if meta.path.is_ident("not_null") {
        ("not_null", false)
    } else if meta.path.is_ident("in_range") {
        ("in_range", true)
    } else if meta.path.is_ident("with_length") {
        ("with_length", true)
    } else {
        return Ok(None);
    };

    let mut min: Option<Expr> = None;
    let mut max: Option<Expr> = None;
    let mut recursive = false;

    if meta.input.peek(token::Paren) {
        meta.parse_nested_meta(|inner| {
            if inner.path.is_ident("recursive") {
                recursive = true;
                Ok(())
            } else if bounded && inner.path.is_ident("min") {
                min = Some(inner.value()?.parse()?);
                Ok(())
            } else if bounded && inner.path.is_ident("max") {
                max = Some(inner.value()?.parse()?);
                Ok(())
            } else {
                Err(inner.error(format!("unknown option for `{name}`")))
            }
        })?;
    }

    let ctor = Ident::new(name, meta.path.span());
    let constraint = if bounded {
        match (min, max) {
            (Some(min), Some(max)) => quote! { mutatype::Constraint::#ctor(#min, #max) },
            _ => return Err(meta.error(format!("`{name}` needs both `min` and `max`"))),
        }
    } else {
        quote! { mutatype::Constraint::#ctor() }
    };

    Ok(Some(if recursive {
        quote! { #constraint.recursive() }
    } else {
        constraint
    }))
}
