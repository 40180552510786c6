//! Common helper functions for endpoint macros.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Expr, ExprLit, Ident, ItemFn, Lit, LitStr, Token};

/// actix-web route attributes whose first argument is the path.
const ROUTE_ATTRIBUTES: &[&str] = &[
    "get", "post", "put", "delete", "patch", "head", "options", "trace", "connect", "route",
];

/// Path of the facade crate in generated code.
pub fn core_crate_path() -> TokenStream2 {
    quote! { ::warden }
}

/// The actix-web route a handler is mounted on.
pub struct Route {
    pub path: LitStr,
    /// Upper-case method names, e.g. `GET`.
    pub methods: Vec<String>,
}

/// Finds the actix-web route attribute on `item_fn`: the path and method of
/// `#[get("/items")]`, or the path and every `method = ".."` of
/// `#[route("/items", method = "GET", method = "HEAD")]`.
pub fn find_route(item_fn: &ItemFn) -> Option<Route> {
    item_fn.attrs.iter().find_map(route)
}

fn route(attr: &Attribute) -> Option<Route> {
    let name = attr.path().segments.last()?.ident.to_string();
    if !ROUTE_ATTRIBUTES.contains(&name.as_str()) {
        return None;
    }

    let (first, named) = attr
        .parse_args_with(|input: syn::parse::ParseStream| {
            let first: Expr = input.parse()?;
            let mut named = Vec::new();
            while input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
                if input.is_empty() {
                    break;
                }
                let key: Ident = input.parse()?;
                input.parse::<Token![=]>()?;
                let value: Expr = input.parse()?;
                named.push((key, value));
            }
            Ok((first, named))
        })
        .ok()?;

    let path = string_literal(&first)?;
    let methods = if name == "route" {
        // guard, name and wrap arguments are not ours
        named
            .iter()
            .filter(|(key, _)| key == "method")
            .filter_map(|(_, value)| string_literal(value))
            .map(|method| method.value().to_uppercase())
            .collect()
    } else {
        vec![name.to_uppercase()]
    };

    if methods.is_empty() {
        return None;
    }
    Some(Route { path, methods })
}

fn string_literal(expr: &Expr) -> Option<LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(value), ..
        }) => Some(value.clone()),
        _ => None,
    }
}

/// Generates a compile error when no route attribute can be found.
pub fn missing_route_error(item_fn: &ItemFn, macro_name: &str) -> TokenStream2 {
    syn::Error::new_spanned(
        &item_fn.sig.ident,
        format!(
            "#[{}] could not find the route method and path. Place it above the route \
             attribute, e.g. #[get(\"/items\")] or #[route(\"/items\", method = \"GET\")].",
            macro_name
        ),
    )
    .to_compile_error()
}
