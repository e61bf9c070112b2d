extern crate proc_macro;

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{spanned::Spanned, *};

mod container_attributes;
mod field_attributes;
use container_attributes::ContainerAttributes;
use field_attributes::FieldBehavior;

static MUTATYPE_ATTRIBUTE_NAME: &str = "mutatype";

#[proc_macro_derive(Reflect, attributes(mutatype))]
pub fn derive_reflect(tokens: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(tokens as DeriveInput);
    expand_derive_reflect(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_derive_reflect(input: DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "cannot `derive(Reflect)` on a generic type",
        ));
    }

    let container_attrs = ContainerAttributes::from_derive_input(&input)?;
    let type_name = container_attrs
        .name
        .as_ref()
        .map(LitStr::value)
        .unwrap_or_else(|| input.ident.to_string());

    match &input.data {
        Data::Struct(data) => {
            let fields = ReflectField::all(&data.fields)?;
            gen_struct_impls(&input, &type_name, &container_attrs, &data.fields, &fields)
        }
        Data::Enum(data) => gen_enum_impls(&input, &type_name, &container_attrs, data),
        Data::Union(_) => Err(Error::new_spanned(
            input,
            "cannot `derive(Reflect)` on a union",
        )),
    }
}

struct ReflectField {
    /// The field's name in the description: its identifier, or its index for
    /// tuple fields.
    name: String,
    /// How to refer to the field on `self` (`name` or `0`).
    member: Member,
    /// A local variable to hold the field while rebuilding the value.
    local: Ident,
    /// The behavior for this field.
    behavior: FieldBehavior,
    /// The field's type.
    ty: Type,
}

impl ReflectField {
    fn all(fields: &Fields) -> Result<Vec<ReflectField>> {
        let fields = fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let (name, member) = match &f.ident {
                    Some(ident) => (ident.to_string(), Member::Named(ident.clone())),
                    None => (i.to_string(), Member::Unnamed(Index::from(i))),
                };
                Ok(ReflectField {
                    name,
                    member,
                    local: Ident::new(&format!("field{i}"), Span::call_site()),
                    behavior: FieldBehavior::for_field(f)?,
                    ty: f.ty.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut parents = fields
            .iter()
            .filter(|f| matches!(f.behavior, FieldBehavior::Parent));
        if let (Some(_), Some(second)) = (parents.next(), parents.next()) {
            return Err(Error::new_spanned(
                &second.ty,
                format!("only one field can be a #[{MUTATYPE_ATTRIBUTE_NAME}(parent)]"),
            ));
        }

        Ok(fields)
    }

    fn parent(fields: &[ReflectField]) -> Option<&ReflectField> {
        fields
            .iter()
            .find(|f| matches!(f.behavior, FieldBehavior::Parent))
    }
}

/// `desc = desc.field(...)` for each reflected field, in declaration order.
fn gen_describe_fields(fields: &[ReflectField]) -> Vec<TokenStream> {
    fields
        .iter()
        .filter_map(|f| match &f.behavior {
            FieldBehavior::Reflect(constraints) => {
                let name = &f.name;
                let ty = &f.ty;
                Some(quote! {
                    let desc = desc.field(
                        #name,
                        <#ty as mutatype::Reflect>::describe(registry)?
                            #( .with(#constraints) )*,
                    );
                })
            }
            FieldBehavior::Parent | FieldBehavior::Ignore => None,
        })
        .collect()
}

/// Rebuild each field into its local variable, taking values from `fields`:
/// the parent first, then the reflected fields in order.
fn gen_take_fields(fields: &[ReflectField]) -> Vec<TokenStream> {
    let parent = ReflectField::parent(fields).map(|f| {
        let local = &f.local;
        let ty = &f.ty;
        quote! {
            let #local = <#ty as mutatype::ReflectComposite>::from_fields(fields)?;
        }
    });

    let rest = fields.iter().map(|f| {
        let local = &f.local;
        let ty = &f.ty;
        match f.behavior {
            FieldBehavior::Reflect(_) => quote! {
                let #local = <#ty as mutatype::Reflect>::from_value(
                    mutatype::reflect::next_field(fields)?,
                )?;
            },
            FieldBehavior::Ignore => quote! {
                let #local: #ty = Default::default();
            },
            FieldBehavior::Parent => quote! {},
        }
    });

    parent.into_iter().chain(rest).collect()
}

/// Push each field's value onto `out`, the parent's fields first. `access`
/// maps a field to an expression for a reference to it.
fn gen_push_fields(
    fields: &[ReflectField],
    access: impl Fn(&ReflectField) -> TokenStream,
) -> Vec<TokenStream> {
    let parent = ReflectField::parent(fields).map(|f| {
        let field = access(f);
        quote! {
            mutatype::ReflectComposite::to_fields(#field, out);
        }
    });

    let rest = fields.iter().filter_map(|f| match f.behavior {
        FieldBehavior::Reflect(_) => {
            let field = access(f);
            Some(quote! {
                out.push(mutatype::Reflect::to_value(#field));
            })
        }
        FieldBehavior::Parent | FieldBehavior::Ignore => None,
    });

    parent.into_iter().chain(rest).collect()
}

/// An expression building `path` from the field locals.
fn gen_construct(path: TokenStream, shape: &Fields, fields: &[ReflectField]) -> TokenStream {
    let locals = fields.iter().map(|f| &f.local);
    match shape {
        Fields::Named(_) => {
            let members = fields.iter().map(|f| &f.member);
            quote! { #path { #( #members: #locals ),* } }
        }
        Fields::Unnamed(_) => quote! { #path ( #( #locals ),* ) },
        Fields::Unit => quote! { #path },
    }
}

fn gen_struct_impls(
    input: &DeriveInput,
    type_name: &str,
    container_attrs: &ContainerAttributes,
    shape: &Fields,
    fields: &[ReflectField],
) -> Result<TokenStream> {
    let ty_name = &input.ident;
    let constraints = &container_attrs.constraints;
    let describe_fields = gen_describe_fields(fields);
    let take_fields = gen_take_fields(fields);
    let push_fields = gen_push_fields(fields, |f| {
        let member = &f.member;
        quote! { &self.#member }
    });
    let construct = gen_construct(quote! { Self }, shape, fields);

    let extends = ReflectField::parent(fields).map(|f| {
        let ty = &f.ty;
        quote! {
            let desc = desc.extends_type(
                <#ty as mutatype::Reflect>::describe(registry)?,
            )?;
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl mutatype::Reflect for #ty_name {
            fn describe(
                registry: &mut mutatype::TypeRegistry,
            ) -> mutatype::Result<mutatype::AnnotatedType> {
                registry.define::<Self>(#type_name, |registry| {
                    let desc = mutatype::CompositeDesc::new(#type_name);
                    #extends
                    #( #describe_fields )*
                    #( let desc = desc.constraint(#constraints); )*
                    Ok(mutatype::TypeDef::from(desc))
                })
            }

            fn to_value(&self) -> mutatype::Value {
                let mut fields = vec![];
                mutatype::ReflectComposite::to_fields(self, &mut fields);
                mutatype::Value::composite(#type_name, fields)
            }

            fn from_value(value: &mutatype::Value) -> mutatype::Result<Self> {
                let composite = value.as_composite()?;
                mutatype::reflect::expect_type(composite.type_name(), #type_name)?;
                let mut fields = composite.fields().iter();
                let this = <Self as mutatype::ReflectComposite>::from_fields(&mut fields)?;
                mutatype::reflect::expect_exhausted(fields)?;
                Ok(this)
            }
        }

        #[automatically_derived]
        impl mutatype::ReflectComposite for #ty_name {
            #[allow(unused_variables)]
            fn to_fields(&self, out: &mut Vec<mutatype::Value>) {
                #( #push_fields )*
            }

            #[allow(unused_variables)]
            fn from_fields(
                fields: &mut std::slice::Iter<'_, mutatype::Value>,
            ) -> mutatype::Result<Self> {
                #( #take_fields )*
                Ok(#construct)
            }
        }
    })
}

fn gen_enum_impls(
    input: &DeriveInput,
    type_name: &str,
    container_attrs: &ContainerAttributes,
    data: &DataEnum,
) -> Result<TokenStream> {
    let ty_name = &input.ident;
    let constraints = &container_attrs.constraints;

    let mut describe_variants = vec![];
    let mut to_value_arms = vec![];
    let mut from_value_arms = vec![];

    for (index, variant) in data.variants.iter().enumerate() {
        let index = u32::try_from(index)
            .map_err(|_| Error::new_spanned(variant, "too many variants"))?;
        let ident = &variant.ident;
        let variant_name = format!("{type_name}::{ident}");
        let fields = ReflectField::all(&variant.fields)?;
        if let Some(parent) = ReflectField::parent(&fields) {
            return Err(Error::new(
                parent.ty.span(),
                format!("enum variants cannot have a #[{MUTATYPE_ATTRIBUTE_NAME}(parent)] field"),
            ));
        }

        let describe_fields = gen_describe_fields(&fields);
        describe_variants.push(quote! {
            let variant = {
                let desc = mutatype::CompositeDesc::new(#variant_name);
                #( #describe_fields )*
                registry.insert(desc)?
            };
            let desc = desc.alternative(variant);
        });

        let locals = fields.iter().map(|f| &f.local).collect::<Vec<_>>();
        let pattern = match &variant.fields {
            Fields::Named(_) => {
                let members = fields.iter().map(|f| &f.member);
                quote! { Self::#ident { #( #members: #locals ),* } }
            }
            Fields::Unnamed(_) => quote! { Self::#ident ( #( #locals ),* ) },
            Fields::Unit => quote! { Self::#ident },
        };
        let push_fields = gen_push_fields(&fields, |f| {
            let local = &f.local;
            quote! { #local }
        });
        // Ignored fields are bound by the pattern but never read.
        to_value_arms.push(quote! {
            #[allow(unused_variables)]
            #pattern => {
                let mut fields = vec![];
                let out = &mut fields;
                #( #push_fields )*
                mutatype::Value::variant(
                    #type_name,
                    #index,
                    mutatype::Value::composite(#variant_name, fields),
                )
            }
        });

        let take_fields = gen_take_fields(&fields);
        let construct = gen_construct(quote! { Self::#ident }, &variant.fields, &fields);
        from_value_arms.push(quote! {
            #[allow(unused_variables)]
            #index => {
                let composite = variant.value().as_composite()?;
                mutatype::reflect::expect_type(composite.type_name(), #variant_name)?;
                let mut iter = composite.fields().iter();
                let fields = &mut iter;
                #( #take_fields )*
                mutatype::reflect::expect_exhausted(iter)?;
                Ok(#construct)
            }
        });
    }

    let scrutinee = if data.variants.is_empty() {
        quote! { *self }
    } else {
        quote! { self }
    };

    Ok(quote! {
        #[automatically_derived]
        impl mutatype::Reflect for #ty_name {
            fn describe(
                registry: &mut mutatype::TypeRegistry,
            ) -> mutatype::Result<mutatype::AnnotatedType> {
                registry.define::<Self>(#type_name, |registry| {
                    let desc = mutatype::SumDesc::new(#type_name);
                    #( #describe_variants )*
                    #( let desc = desc.constraint(#constraints); )*
                    Ok(mutatype::TypeDef::from(desc))
                })
            }

            fn to_value(&self) -> mutatype::Value {
                match #scrutinee {
                    #( #to_value_arms )*
                }
            }

            fn from_value(value: &mutatype::Value) -> mutatype::Result<Self> {
                let variant = value.as_variant()?;
                mutatype::reflect::expect_type(variant.type_name(), #type_name)?;
                match variant.index() {
                    #( #from_value_arms )*
                    index => Err(mutatype::Error::mismatch(format!(
                        "`{}` has no alternative {index}",
                        #type_name
                    ))),
                }
            }
        }
    })
}
