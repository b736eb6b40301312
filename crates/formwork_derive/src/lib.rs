use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

#[proc_macro_derive(FormModel)]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let formwork = formwork_path();
    let mut fields_methods = Vec::new();
    let mut field_keys = Vec::new();
    let mut to_values = Vec::new();
    let mut from_values = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_name = field_ident.to_string();
        let field_name = field_name.strip_prefix("r#").unwrap_or(&field_name);

        fields_methods.push(quote! {
            pub fn #field_ident(&self) -> #formwork::form::FieldKey {
                #formwork::form::FieldKey::new(#field_name)
            }
        });
        field_keys.push(quote! {
            #formwork::form::FieldKey::new(#field_name)
        });
        to_values.push(quote! {
            values.insert(
                #field_name,
                #formwork::form::IntoFieldValue::into_field_value(
                    ::core::clone::Clone::clone(&self.#field_ident),
                ),
            );
        });
        from_values.push(quote! {
            #field_ident: values.decode_field(#field_name)?,
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #formwork::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_keys() -> ::std::vec::Vec<#formwork::form::FieldKey> {
                ::std::vec![#(#field_keys),*]
            }

            fn to_values(&self) -> #formwork::form::FormValues {
                let mut values = #formwork::form::FormValues::new();
                #(#to_values)*
                values
            }

            fn from_values(
                values: &#formwork::form::FormValues,
            ) -> #formwork::form::FormResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#from_values)*
                })
            }
        }
    }
    .into()
}

fn formwork_path() -> TokenStream2 {
    match crate_name("formwork") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::formwork),
    }
}
