use crate::field_attributes::parse_constraint;
use crate::MUTATYPE_ATTRIBUTE_NAME;
use proc_macro2::TokenStream;
use syn::*;

pub struct ContainerAttributes {
    /// An override of the registered type name, which defaults to the Rust
    /// type's name.
    ///
    /// ```ignore
    /// #[mutatype(name = "my.package.Config")]
    /// ```
    pub name: Option<LitStr>,

    /// Constraints declared on the type itself, which apply wherever it is
    /// used.
    ///
    /// ```ignore
    /// #[mutatype(not_null(recursive))]
    /// ```
    pub constraints: Vec<TokenStream>,
}

impl ContainerAttributes {
    pub fn from_derive_input(derive_input: &DeriveInput) -> Result<Self> {
        let mut name = None;
        let mut constraints = vec![];

        for attr in &derive_input.attrs {
            if !attr.path().is_ident(MUTATYPE_ATTRIBUTE_NAME) {
                continue;
            }

            if !matches!(attr.meta, Meta::List(_)) {
                return Err(Error::new_spanned(
                    attr,
                    format!("invalid `{MUTATYPE_ATTRIBUTE_NAME}` attribute. expected list"),
                ));
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    if name.is_some() {
                        return Err(meta.error(format!(
                            "invalid `{MUTATYPE_ATTRIBUTE_NAME}` attribute: duplicate `name`"
                        )));
                    }
                    name = Some(meta.value()?.parse::<LitStr>()?);
                    Ok(())
                } else if let Some(c) = parse_constraint(&meta)? {
                    constraints.push(c);
                    Ok(())
                } else {
                    Err(meta.error(format!("invalid `{MUTATYPE_ATTRIBUTE_NAME}` attribute")))
                }
            })?;
        }

        Ok(Self { name, constraints })
    }
}
