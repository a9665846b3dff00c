use proc_macro2::TokenStream;
use syn::{Expr, ExprLit, ExprUnary, Ident, Lit, LitStr, Type, UnOp, Variant, WhereClause};

pub(crate) fn add_where_bound(wc: &mut WhereClause, ty: &Type, bound: TokenStream) {
    wc.predicates.push(syn::parse_quote!(#ty: #bound));
}

/// Returns true when `ty` textually mentions `name`, in which case a where
/// bound would be cyclic and is omitted.
pub(crate) fn type_mentions_self(ty: &Type, name: &Ident) -> bool {
    let probe = name.to_string();
    let rendered = quote::quote!(#ty).to_string();
    rendered.split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|word| word == probe)
}

/// One named record field with its wire key.
pub(crate) struct RecordField {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) key: LitStr,
}

/// Indices of `fields` in dag-cbor canonical key order (length, then bytes).
pub(crate) fn cbor_field_order(fields: &[RecordField]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fields.len()).collect();
    order.sort_by(|&a, &b| {
        let (ka, kb) = (fields[a].key.value(), fields[b].key.value());
        ka.len().cmp(&kb.len()).then_with(|| ka.into_bytes().cmp(&kb.into_bytes()))
    });
    order
}

/// Indices of `fields` in dag-json canonical key order (bytes).
pub(crate) fn json_field_order(fields: &[RecordField]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fields.len()).collect();
    order.sort_by(|&a, &b| fields[a].key.value().into_bytes().cmp(&fields[b].key.value().into_bytes()));
    order
}

/// Evaluate an explicit enum discriminant: an integer literal, optionally
/// negated.
pub(crate) fn discriminant_value(variant: &Variant) -> syn::Result<Option<i64>> {
    let Some((_, expr)) = &variant.discriminant else {
        return Ok(None);
    };
    let (negative, lit) = match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => (false, lit),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => match expr.as_ref() {
            Expr::Lit(ExprLit {
                lit: Lit::Int(lit), ..
            }) => (true, lit),
            _ => {
                return Err(syn::Error::new_spanned(
                    expr,
                    "enum discriminants must be integer literals",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                expr,
                "enum discriminants must be integer literals",
            ))
        }
    };
    let value: i64 = lit.base10_parse()?;
    Ok(Some(if negative { -value } else { value }))
}
