use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, LitStr};

/// Adapter framing selected with `#[ipld(adapter = "...")]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Adapter {
    String,
    Bytes,
    Int,
}

/// Enumeration representation selected with `#[ipld(repr = "...")]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum EnumRepr {
    #[default]
    Int,
    String,
}

#[derive(Default)]
pub(crate) struct ContainerAttr {
    pub(crate) adapter: Option<Adapter>,
    pub(crate) repr: Option<EnumRepr>,
}

#[derive(Default, Clone)]
pub(crate) struct FieldAttr {
    pub(crate) rename: Option<LitStr>,
}

#[derive(Default, Clone)]
pub(crate) struct VariantAttr {
    pub(crate) rename: Option<LitStr>,
}

pub(crate) fn ensure_no_ipld_attrs(attrs: &[Attribute], ctx: &str) -> syn::Result<()> {
    for a in attrs {
        if a.path().is_ident("ipld") {
            return Err(syn::Error::new(
                a.span(),
                format!("`#[ipld(...)]` is not supported on {ctx}"),
            ));
        }
    }
    Ok(())
}

pub(crate) fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttr> {
    let mut out = ContainerAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("ipld") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("adapter") {
                if out.adapter.is_some() {
                    return Err(meta.error("duplicate `ipld(adapter=...)`"));
                }
                let lit: LitStr = meta.value()?.parse()?;
                out.adapter = Some(match lit.value().as_str() {
                    "string" => Adapter::String,
                    "bytes" => Adapter::Bytes,
                    "int" => Adapter::Int,
                    _ => {
                        return Err(meta.error(
                            "unsupported adapter (expected \"string\", \"bytes\", or \"int\")",
                        ))
                    }
                });
                return Ok(());
            }
            if meta.path.is_ident("repr") {
                if out.repr.is_some() {
                    return Err(meta.error("duplicate `ipld(repr=...)`"));
                }
                let lit: LitStr = meta.value()?.parse()?;
                out.repr = Some(match lit.value().as_str() {
                    "int" => EnumRepr::Int,
                    "string" => EnumRepr::String,
                    _ => return Err(meta.error("unsupported repr (expected \"int\" or \"string\")")),
                });
                return Ok(());
            }
            Err(meta.error("unsupported `ipld(...)` container attribute (allowed: adapter, repr)"))
        })?;
    }

    if out.adapter.is_some() && out.repr.is_some() {
        return Err(syn::Error::new(
            Span::call_site(),
            "`ipld(adapter)` and `ipld(repr)` cannot be combined",
        ));
    }

    Ok(out)
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("ipld") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if out.rename.is_some() {
                    return Err(meta.error("duplicate `ipld(rename=...)`"));
                }
                let lit: LitStr = meta.value()?.parse()?;
                out.rename = Some(lit);
                return Ok(());
            }
            Err(meta.error("unsupported `ipld(...)` field attribute (allowed: rename)"))
        })?;
    }
    Ok(out)
}

pub(crate) fn parse_variant_attrs(attrs: &[Attribute]) -> syn::Result<VariantAttr> {
    let mut out = VariantAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("ipld") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if out.rename.is_some() {
                    return Err(meta.error("duplicate `ipld(rename=...)` on variant"));
                }
                let lit: LitStr = meta.value()?.parse()?;
                out.rename = Some(lit);
                return Ok(());
            }
            Err(meta.error("unsupported `ipld(...)` variant attribute (allowed: rename)"))
        })?;
    }
    Ok(out)
}
