use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(FormSchema, attributes(form))]
pub fn derive_form_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormSchema derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new_spanned(
                    &model_ident,
                    "FormSchema derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(
                &model_ident,
                "FormSchema derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let formstate = formstate_path();
    let mut entries = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let options = match FieldOptions::parse(&field.attrs) {
            Ok(options) => options,
            Err(error) => return error.to_compile_error().into(),
        };
        let field_name = options
            .rename
            .unwrap_or_else(|| field_ident.to_string().trim_start_matches("r#").to_string());

        let node = if options.nested {
            quote! {
                #formstate::form::FormSchema::schema(&self.#field_ident)
            }
        } else {
            quote! {
                #formstate::form::Schema::Field(#formstate::form::FieldSchema {
                    value: #formstate::__private::serde_json::to_value(&self.#field_ident).ok(),
                    ..::core::default::Default::default()
                })
            }
        };
        entries.push(quote! {
            let schema = schema.with(#field_name, #node);
        });
    }

    quote! {
        impl #formstate::form::FormSchema for #model_ident {
            fn schema(&self) -> #formstate::form::Schema {
                let schema = #formstate::form::Schema::group();
                #(#entries)*
                schema
            }
        }
    }
    .into()
}

#[derive(Default)]
struct FieldOptions {
    nested: bool,
    rename: Option<String>,
}

impl FieldOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("form")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("nested") {
                    options.nested = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    options.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported form attribute, expected `nested` or `rename`"))
                }
            })?;
        }
        Ok(options)
    }
}

fn formstate_path() -> TokenStream2 {
    match crate_name("formstate") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::formstate),
    }
}
