//! The `#[requires_action]` and `#[security_override]` macros.
//!
//! Both leave the handler untouched and submit one `EndpointDeclaration` per
//! route method, keyed by that method and the handler's route path.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Ident, ItemFn, LitStr, Token};

use crate::helpers::{core_crate_path, find_route, missing_route_error, Route};

/// Parsed arguments for `#[requires_action("read", path = "/items")]`.
pub struct RequiresActionArgs {
    pub action: LitStr,
    pub path: Option<LitStr>,
}

impl Parse for RequiresActionArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if !input.peek(LitStr) {
            return Err(syn::Error::new(
                Span::call_site(),
                r#"expected an action name, e.g. #[requires_action("read")]"#,
            ));
        }

        let action: LitStr = input.parse()?;
        if action.value().trim().is_empty() {
            return Err(syn::Error::new_spanned(action, "action name must not be empty"));
        }

        let mut path = None;
        while input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key: Ident = input.parse()?;
            if key != "path" {
                return Err(syn::Error::new_spanned(key, "expected `path = \"...\"`"));
            }
            input.parse::<Token![=]>()?;
            path = Some(input.parse()?);
        }

        Ok(RequiresActionArgs { action, path })
    }
}

/// Parsed arguments for `#[security_override(log_access, path = "/health")]`.
#[derive(Default)]
pub struct SecurityOverrideArgs {
    pub log_access: bool,
    pub path: Option<LitStr>,
}

impl Parse for SecurityOverrideArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = SecurityOverrideArgs::default();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            match key.to_string().as_str() {
                "log_access" => args.log_access = true,
                "path" => {
                    input.parse::<Token![=]>()?;
                    args.path = Some(input.parse()?);
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        key,
                        "expected `log_access` or `path = \"...\"`",
                    ))
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

pub fn requires_action_impl(attrs: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attrs as RequiresActionArgs);
    let item_fn = parse_macro_input!(input as ItemFn);

    let Some(route) = find_route(&item_fn) else {
        return with_item(missing_route_error(&item_fn, "requires_action"), &item_fn);
    };

    let core_path = core_crate_path();
    let action = &args.action;
    emit(&item_fn, route, args.path, |method, path| {
        quote! {
            #core_path::http::security::metadata::EndpointDeclaration::action(#method, #path, #action)
        }
    })
}

pub fn security_override_impl(attrs: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attrs as SecurityOverrideArgs);
    let item_fn = parse_macro_input!(input as ItemFn);

    let Some(route) = find_route(&item_fn) else {
        return with_item(missing_route_error(&item_fn, "security_override"), &item_fn);
    };

    let core_path = core_crate_path();
    let log_access = args.log_access;
    emit(&item_fn, route, args.path, |method, path| {
        quote! {
            #core_path::http::security::metadata::EndpointDeclaration::bypass(#method, #path, #log_access)
        }
    })
}

/// One declaration per route method; `path` replaces the route's own path.
fn emit(
    item_fn: &ItemFn,
    route: Route,
    path: Option<LitStr>,
    declaration: impl Fn(&str, &LitStr) -> TokenStream2,
) -> TokenStream {
    let core_path = core_crate_path();
    let path = path.unwrap_or(route.path);
    let submissions = route.methods.iter().map(|method| {
        let declaration = declaration(method, &path);
        quote! {
            #core_path::__private::inventory::submit! {
                #declaration
            }
        }
    });

    let expanded = quote! {
        #item_fn

        #(#submissions)*
    };

    expanded.into()
}

// keeps the handler in the output so a bad attribute yields one error, not two
fn with_item(error: TokenStream2, item_fn: &ItemFn) -> TokenStream {
    quote! {
        #error
        #item_fn
    }
    .into()
}
