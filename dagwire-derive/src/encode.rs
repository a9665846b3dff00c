use quote::quote;
use syn::{spanned::Spanned, DataEnum, DataStruct, Fields, Generics, Ident, LitStr};

use crate::attrs::{
    ensure_no_ipld_attrs, parse_field_attrs, parse_variant_attrs, Adapter, ContainerAttr, EnumRepr,
};
use crate::util::{
    add_where_bound, cbor_field_order, json_field_order, discriminant_value, type_mentions_self,
    RecordField,
};

pub(crate) fn collect_record_fields(fields: &syn::FieldsNamed) -> syn::Result<Vec<RecordField>> {
    let mut out = Vec::new();
    for field in &fields.named {
        let attr = parse_field_attrs(&field.attrs)?;
        let ident = field.ident.clone().unwrap();
        let key = attr
            .rename
            .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
        out.push(RecordField {
            ident,
            ty: field.ty.clone(),
            key,
        });
    }
    Ok(out)
}

fn split_where(
    name: &Ident,
    generics: &Generics,
    fields: &[RecordField],
    bound: &proc_macro2::TokenStream,
) -> Option<syn::WhereClause> {
    let mut wc = generics.where_clause.clone();
    let mut tys = Vec::new();
    for f in fields {
        if !type_mentions_self(&f.ty, name) {
            tys.push(&f.ty);
        }
    }
    if !tys.is_empty() {
        let wc = wc.get_or_insert_with(|| syn::WhereClause {
            where_token: Default::default(),
            predicates: Default::default(),
        });
        for ty in tys {
            add_where_bound(wc, ty, bound.clone());
        }
    }
    wc
}

fn adapter_encode(
    name: &Ident,
    generics: &Generics,
    adapter: Adapter,
) -> proc_macro2::TokenStream {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let (repr_trait, cbor_body, json_body) = match adapter {
        Adapter::String => (
            quote!(::dagwire::StringRepr),
            quote!(enc.text_adapter(self)),
            quote!(enc.str_adapter(self)),
        ),
        Adapter::Bytes => (
            quote!(::dagwire::BytesRepr),
            quote!(enc.bytes_adapter(self)),
            quote!(enc.bytes_adapter(self)),
        ),
        Adapter::Int => (
            quote!(::dagwire::IntRepr),
            quote!(enc.int(::dagwire::IntRepr::encode_integer(self))),
            quote!(enc.int(::dagwire::IntRepr::encode_integer(self))),
        ),
    };

    let mut wc = where_clause.cloned().unwrap_or_else(|| syn::WhereClause {
        where_token: Default::default(),
        predicates: Default::default(),
    });
    wc.predicates
        .push(syn::parse_quote!(#name #ty_generics: #repr_trait));

    quote! {
        impl #impl_generics ::dagwire::cbor::Encode for #name #ty_generics #wc {
            fn encode(&self, enc: &mut ::dagwire::cbor::Encoder) -> Result<(), ::dagwire::Error> {
                #cbor_body
            }
        }

        impl #impl_generics ::dagwire::json::Encode for #name #ty_generics #wc {
            fn encode(&self, enc: &mut ::dagwire::json::Encoder) -> Result<(), ::dagwire::Error> {
                #json_body
            }
        }

        impl #impl_generics ::dagwire::ListElem for #name #ty_generics #wc {}
    }
}

pub(crate) fn encode_struct(
    name: &Ident,
    generics: &Generics,
    data: &DataStruct,
    container: &ContainerAttr,
) -> syn::Result<proc_macro2::TokenStream> {
    if container.repr.is_some() {
        return Err(syn::Error::new(
            name.span(),
            "`ipld(repr=...)` is only valid on enums; use `ipld(adapter=...)` for structs",
        ));
    }
    if let Some(adapter) = container.adapter {
        return Ok(adapter_encode(name, generics, adapter));
    }

    let (impl_generics, ty_generics, base_wc) = generics.split_for_impl();

    match &data.fields {
        Fields::Named(fields) => {
            let fields = collect_record_fields(fields)?;
            let len = fields.len();

            let cbor_entries: Vec<_> = cbor_field_order(&fields)
                .into_iter()
                .map(|i| {
                    let RecordField { ident, key, .. } = &fields[i];
                    quote! {
                        enc.text(#key)?;
                        ::dagwire::cbor::Encode::encode(&self.#ident, enc)?;
                    }
                })
                .collect();

            let json_entries: Vec<_> = json_field_order(&fields)
                .into_iter()
                .enumerate()
                .map(|(pos, i)| {
                    let RecordField { ident, key, .. } = &fields[i];
                    let first = pos == 0;
                    quote! {
                        enc.key(#key, #first)?;
                        ::dagwire::json::Encode::encode(&self.#ident, enc)?;
                    }
                })
                .collect();

            let cbor_wc = split_where(name, generics, &fields, &quote!(::dagwire::cbor::Encode));
            let json_wc = split_where(name, generics, &fields, &quote!(::dagwire::json::Encode));

            Ok(quote! {
                impl #impl_generics ::dagwire::cbor::Encode for #name #ty_generics #cbor_wc {
                    fn encode(&self, enc: &mut ::dagwire::cbor::Encoder) -> Result<(), ::dagwire::Error> {
                        enc.map_begin(#len)?;
                        #(#cbor_entries)*
                        Ok(())
                    }
                }

                impl #impl_generics ::dagwire::json::Encode for #name #ty_generics #json_wc {
                    fn encode(&self, enc: &mut ::dagwire::json::Encoder) -> Result<(), ::dagwire::Error> {
                        enc.map_begin()?;
                        #(#json_entries)*
                        enc.map_end()
                    }
                }

                impl #impl_generics ::dagwire::ListElem for #name #ty_generics #base_wc {}
            })
        }

        Fields::Unnamed(fields) => {
            let mut tys = Vec::new();
            let mut cbor_items = Vec::new();
            let mut json_items = Vec::new();
            for (idx, field) in fields.unnamed.iter().enumerate() {
                ensure_no_ipld_attrs(&field.attrs, "tuple struct fields")?;
                let index = syn::Index::from(idx);
                if !type_mentions_self(&field.ty, name) {
                    tys.push(field.ty.clone());
                }
                let first = idx == 0;
                cbor_items.push(quote! {
                    ::dagwire::cbor::Encode::encode(&self.#index, enc)?;
                });
                json_items.push(quote! {
                    enc.elem(#first)?;
                    ::dagwire::json::Encode::encode(&self.#index, enc)?;
                });
            }
            let len = cbor_items.len();

            let mut cbor_wc = base_wc.cloned();
            let mut json_wc = base_wc.cloned();
            for ty in &tys {
                let wc = cbor_wc.get_or_insert_with(|| syn::WhereClause {
                    where_token: Default::default(),
                    predicates: Default::default(),
                });
                add_where_bound(wc, ty, quote!(::dagwire::cbor::Encode));
                let wc = json_wc.get_or_insert_with(|| syn::WhereClause {
                    where_token: Default::default(),
                    predicates: Default::default(),
                });
                add_where_bound(wc, ty, quote!(::dagwire::json::Encode));
            }

            Ok(quote! {
                impl #impl_generics ::dagwire::cbor::Encode for #name #ty_generics #cbor_wc {
                    fn encode(&self, enc: &mut ::dagwire::cbor::Encoder) -> Result<(), ::dagwire::Error> {
                        enc.list_begin(#len)?;
                        #(#cbor_items)*
                        Ok(())
                    }
                }

                impl #impl_generics ::dagwire::json::Encode for #name #ty_generics #json_wc {
                    fn encode(&self, enc: &mut ::dagwire::json::Encoder) -> Result<(), ::dagwire::Error> {
                        enc.list_begin()?;
                        #(#json_items)*
                        enc.list_end()
                    }
                }

                impl #impl_generics ::dagwire::ListElem for #name #ty_generics #base_wc {}
            })
        }

        Fields::Unit => Ok(quote! {
            impl #impl_generics ::dagwire::cbor::Encode for #name #ty_generics #base_wc {
                fn encode(&self, enc: &mut ::dagwire::cbor::Encoder) -> Result<(), ::dagwire::Error> {
                    enc.null()
                }
            }

            impl #impl_generics ::dagwire::json::Encode for #name #ty_generics #base_wc {
                fn encode(&self, enc: &mut ::dagwire::json::Encoder) -> Result<(), ::dagwire::Error> {
                    enc.null()
                }
            }

            impl #impl_generics ::dagwire::ListElem for #name #ty_generics #base_wc {}
        }),
    }
}

/// Collect `(variant ident, wire name, tag)` triples for a unit-variant enum.
pub(crate) fn enum_variants(data: &DataEnum) -> syn::Result<Vec<(Ident, LitStr, i64)>> {
    let mut out = Vec::new();
    let mut next_tag: i64 = 0;
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.span(),
                "enumerations must have unit variants only",
            ));
        }
        let attr = parse_variant_attrs(&variant.attrs)?;
        let wire = attr
            .rename
            .unwrap_or_else(|| LitStr::new(&variant.ident.to_string(), variant.ident.span()));
        let tag = match discriminant_value(variant)? {
            Some(v) => v,
            None => next_tag,
        };
        next_tag = tag
            .checked_add(1)
            .ok_or_else(|| syn::Error::new(variant.span(), "enum discriminant overflow"))?;
        out.push((variant.ident.clone(), wire, tag));
    }
    Ok(out)
}

pub(crate) fn encode_enum(
    name: &Ident,
    generics: &Generics,
    data: &DataEnum,
    container: &ContainerAttr,
) -> syn::Result<proc_macro2::TokenStream> {
    if let Some(adapter) = container.adapter {
        return Ok(adapter_encode(name, generics, adapter));
    }

    let variants = enum_variants(data)?;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let (cbor_body, json_body) = match container.repr.unwrap_or_default() {
        EnumRepr::Int => {
            let arms: Vec<_> = variants
                .iter()
                .map(|(ident, _, tag)| quote! { Self::#ident => #tag })
                .collect();
            let body = quote! {
                let tag: i64 = match self { #(#arms,)* };
                enc.int(tag)
            };
            (body.clone(), body)
        }
        EnumRepr::String => {
            let arms: Vec<_> = variants
                .iter()
                .map(|(ident, wire, _)| quote! { Self::#ident => #wire })
                .collect();
            (
                quote! {
                    let wire: &str = match self { #(#arms,)* };
                    enc.text(wire)
                },
                quote! {
                    let wire: &str = match self { #(#arms,)* };
                    enc.str(wire)
                },
            )
        }
    };

    Ok(quote! {
        impl #impl_generics ::dagwire::cbor::Encode for #name #ty_generics #where_clause {
            fn encode(&self, enc: &mut ::dagwire::cbor::Encoder) -> Result<(), ::dagwire::Error> {
                #cbor_body
            }
        }

        impl #impl_generics ::dagwire::json::Encode for #name #ty_generics #where_clause {
            fn encode(&self, enc: &mut ::dagwire::json::Encoder) -> Result<(), ::dagwire::Error> {
                #json_body
            }
        }

        impl #impl_generics ::dagwire::ListElem for #name #ty_generics #where_clause {}
    })
}
