//! `#[rest_client]`: turns a trait into a declarative REST client for restwire.
//!
//! ```ignore
//! #[rest_client(qualifier = "fast")]
//! pub trait UsersClient {
//!     #[get("/users/{id}")]
//!     fn user(&self, id: u64) -> Result<User, CallError>;
//!
//!     #[post("/users")]
//!     fn create(&self, #[body] user: &NewUser) -> Result<User, CallError>;
//! }
//! ```
//!
//! The trait is kept (with `Send + Sync` supertraits), `UsersClientHttp` implements it on
//! top of a `ClientDispatcher`, and a `ClientDescriptor` is submitted to the link-time
//! catalog so `ClientRegistry` can find it.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, parse_quote, Attribute, FnArg, GenericArgument, Ident, ItemTrait, LitStr,
    Meta, Pat, PathArguments, ReturnType, TraitItem, TraitItemFn, Type, TypeParamBound,
};

const VERBS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

#[derive(Default)]
struct ClientArgs {
    qualifier: Option<LitStr>,
    marker: Option<LitStr>,
    marker_value: Option<LitStr>,
}

impl ClientArgs {
    fn qualifiers(&self) -> syn::Result<Vec<TokenStream2>> {
        let mut out = Vec::new();
        if let Some(value) = &self.qualifier {
            out.push(quote! { ::restwire::Qualifier::generic(#value) });
        }
        match (&self.marker, &self.marker_value) {
            (Some(marker), Some(value)) => {
                out.push(quote! { ::restwire::Qualifier::marker_with_value(#marker, #value) })
            }
            (Some(marker), None) => out.push(quote! { ::restwire::Qualifier::marker(#marker) }),
            (None, Some(value)) => {
                return Err(syn::Error::new(
                    value.span(),
                    "`marker_value` needs a `marker`",
                ))
            }
            (None, None) => {}
        }
        Ok(out)
    }
}

/// Marks a trait as a remote REST client. See the crate docs for the accepted attributes.
#[proc_macro_attribute]
pub fn rest_client(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = ClientArgs::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("qualifier") {
            args.qualifier = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("marker") {
            args.marker = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("marker_value") {
            args.marker_value = Some(meta.value()?.parse()?);
        } else {
            return Err(meta.error("expected `qualifier`, `marker` or `marker_value`"));
        }
        Ok(())
    });
    parse_macro_input!(attr with parser);
    let item = parse_macro_input!(item as ItemTrait);
    expand(args, item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(args: ClientArgs, mut item: ItemTrait) -> syn::Result<TokenStream2> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "client traits cannot be generic",
        ));
    }
    add_thread_safety(&mut item);

    let qualifiers = args.qualifiers()?;
    let mut methods = Vec::new();
    for trait_item in &mut item.items {
        if let TraitItem::Fn(method) = trait_item {
            if let Some(generated) = expand_method(method)? {
                methods.push(generated);
            }
        }
    }

    let vis = &item.vis;
    let name = &item.ident;
    let adapter = format_ident!("{}Http", name);
    let doc = format!("HTTP implementation of [`{name}`], generated by `#[rest_client]`.");

    Ok(quote! {
        #item

        impl ::restwire::RestClient for dyn #name {
            const TYPE_NAME: &'static str = ::core::concat!(
                ::core::module_path!(),
                "::",
                ::core::stringify!(#name)
            );
        }

        #[doc = #doc]
        #[derive(Clone, Debug)]
        #vis struct #adapter {
            dispatcher: ::restwire::ClientDispatcher,
        }

        impl #adapter {
            pub const QUALIFIERS: &'static [::restwire::Qualifier] = &[#(#qualifiers),*];

            pub const DESCRIPTOR: ::restwire::ClientDescriptor = ::restwire::ClientDescriptor::new(
                <dyn #name as ::restwire::RestClient>::TYPE_NAME,
                Self::QUALIFIERS,
                Self::bind,
            );

            pub fn new(dispatcher: ::restwire::ClientDispatcher) -> Self {
                Self { dispatcher }
            }

            pub fn dispatcher(&self) -> &::restwire::ClientDispatcher {
                &self.dispatcher
            }

            fn bind(dispatcher: ::restwire::ClientDispatcher) -> ::restwire::BoundClient {
                let client: ::std::sync::Arc<dyn #name> = ::std::sync::Arc::new(Self::new(dispatcher));
                ::restwire::BoundClient::new(client)
            }
        }

        impl #name for #adapter {
            #(#methods)*
        }

        ::restwire::inventory::submit! {
            #adapter::DESCRIPTOR
        }
    })
}

fn add_thread_safety(item: &mut ItemTrait) {
    for marker in ["Send", "Sync"] {
        let present = item.supertraits.iter().any(|bound| match bound {
            TypeParamBound::Trait(t) => t.path.segments.last().is_some_and(|s| s.ident == marker),
            _ => false,
        });
        if !present {
            let ident = Ident::new(marker, Span::call_site());
            item.supertraits.push(parse_quote!(::core::marker::#ident));
        }
    }
}

// -----------------------------------------------------------------------------
// Methods
// -----------------------------------------------------------------------------

enum ParamRole {
    Path,
    Body,
    Query(String),
    Header(String),
}

struct Param {
    ident: Ident,
    ty: Type,
    role: ParamRole,
}

/// Strips the request attributes from `method` and returns its adapter implementation.
/// Provided methods are left alone.
fn expand_method(method: &mut TraitItemFn) -> syn::Result<Option<TokenStream2>> {
    let verb = take_verb(&mut method.attrs)?;
    let params = take_params(method)?;
    if method.default.is_some() {
        return match verb {
            Some((verb, _)) => Err(syn::Error::new(
                verb.span(),
                "methods with a default body are not dispatched",
            )),
            None => Ok(None),
        };
    }
    let Some((verb, path)) = verb else {
        return Err(syn::Error::new_spanned(
            &method.sig.ident,
            "client methods need one of #[get], #[post], #[put], #[patch] or #[delete]",
        ));
    };

    let sig = &method.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "client methods are blocking"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "client methods cannot be generic",
        ));
    }
    match sig.inputs.first() {
        Some(FnArg::Receiver(r)) if r.reference.is_some() && r.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                sig,
                "client methods take `&self`",
            ))
        }
    }
    let ok = result_ok_type(&sig.output)?;

    let template = path.value();
    let placeholders = placeholders(&template);
    let method_const = Ident::new(&verb.to_string().to_uppercase(), verb.span());
    let mut steps = Vec::new();
    for param in &params {
        let ident = &param.ident;
        steps.push(match &param.role {
            ParamRole::Path => {
                let name = ident.to_string();
                if !placeholders.contains(&name) {
                    return Err(syn::Error::new_spanned(
                        ident,
                        format!("`{name}` is not in the path; mark it #[query], #[header] or #[body]"),
                    ));
                }
                quote! { .path_param(#name, &#ident) }
            }
            ParamRole::Body => quote! { .json_body(&#ident)? },
            ParamRole::Query(name) if is_option(&param.ty) => {
                quote! { .query_opt(#name, #ident.as_ref()) }
            }
            ParamRole::Query(name) => quote! { .query(#name, &#ident) },
            ParamRole::Header(name) => quote! { .header(#name, &#ident) },
        });
    }
    for placeholder in &placeholders {
        let bound = params
            .iter()
            .any(|p| matches!(p.role, ParamRole::Path) && p.ident == placeholder);
        if !bound {
            return Err(syn::Error::new(
                path.span(),
                format!("no parameter for `{{{placeholder}}}`"),
            ));
        }
    }
    if params.iter().filter(|p| matches!(p.role, ParamRole::Body)).count() > 1 {
        return Err(syn::Error::new_spanned(sig, "at most one #[body] parameter"));
    }

    let invoke = if is_unit(ok) {
        quote! { self.dispatcher.invoke_unit(call) }
    } else {
        quote! { self.dispatcher.invoke::<#ok>(call) }
    };

    Ok(Some(quote! {
        #sig {
            let call = ::restwire::Call::new(::restwire::http::Method::#method_const, #path)
                #(#steps)*;
            #invoke.map_err(::core::convert::Into::into)
        }
    }))
}

fn take_verb(attrs: &mut Vec<Attribute>) -> syn::Result<Option<(Ident, LitStr)>> {
    let mut found = None;
    let mut error = None;
    attrs.retain(|attr| {
        let Some(ident) = attr.path().get_ident() else {
            return true;
        };
        if !VERBS.iter().any(|v| ident == v) {
            return true;
        }
        let parsed = if found.is_some() {
            Err(syn::Error::new_spanned(attr, "only one HTTP verb per method"))
        } else {
            attr.parse_args::<LitStr>()
        };
        match parsed {
            Ok(path) => found = Some((ident.clone(), path)),
            Err(e) => {
                error.get_or_insert(e);
            }
        }
        false
    });
    match error {
        Some(e) => Err(e),
        None => Ok(found),
    }
}

fn take_params(method: &mut TraitItemFn) -> syn::Result<Vec<Param>> {
    let mut params = Vec::new();
    for input in method.sig.inputs.iter_mut() {
        let FnArg::Typed(typed) = input else {
            continue;
        };
        let Pat::Ident(pat) = typed.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &typed.pat,
                "client parameters must be plain identifiers",
            ));
        };
        let ident = pat.ident.clone();
        let mut role = ParamRole::Path;
        let mut error = None;
        typed.attrs.retain(|attr| {
            let parsed = if attr.path().is_ident("body") {
                match &attr.meta {
                    Meta::Path(_) => Ok(ParamRole::Body),
                    _ => Err(syn::Error::new_spanned(attr, "#[body] takes no arguments")),
                }
            } else if attr.path().is_ident("query") {
                match &attr.meta {
                    Meta::Path(_) => Ok(ParamRole::Query(ident.to_string())),
                    _ => attr.parse_args::<LitStr>().map(|n| ParamRole::Query(n.value())),
                }
            } else if attr.path().is_ident("header") {
                attr.parse_args::<LitStr>().map(|n| ParamRole::Header(n.value()))
            } else {
                return true;
            };
            match parsed {
                Ok(parsed) => role = parsed,
                Err(e) => {
                    error.get_or_insert(e);
                }
            }
            false
        });
        if let Some(e) = error {
            return Err(e);
        }
        params.push(Param {
            ident,
            ty: (*typed.ty).clone(),
            role,
        });
    }
    Ok(params)
}

// -----------------------------------------------------------------------------
// Type helpers
// -----------------------------------------------------------------------------

fn result_ok_type(output: &ReturnType) -> syn::Result<&Type> {
    let error = || syn::Error::new_spanned(output, "client methods return `Result<T, E>`");
    let ReturnType::Type(_, ty) = output else {
        return Err(error());
    };
    let Type::Path(path) = ty.as_ref() else {
        return Err(error());
    };
    let Some(last) = path.path.segments.last() else {
        return Err(error());
    };
    if last.ident != "Result" {
        return Err(error());
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return Err(error());
    };
    match args.args.first() {
        Some(GenericArgument::Type(ok)) if args.args.len() == 2 => Ok(ok),
        _ => Err(error()),
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(t) if t.elems.is_empty())
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(p) => p.path.segments.last().is_some_and(|s| s.ident == "Option"),
        _ => false,
    }
}

/// `{name}` placeholders of a path template, in order.
fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        names.push(rest[start + 1..start + len].to_string());
        rest = &rest[start + len + 1..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_in_order() {
        assert_eq!(placeholders("/u/{id}/o/{order}"), ["id", "order"]);
        assert!(placeholders("/plain").is_empty());
        assert_eq!(placeholders("/broken/{id"), Vec::<String>::new());
    }

    #[test]
    fn result_shapes() {
        let unit: ReturnType = parse_quote!(-> Result<(), CallError>);
        assert!(is_unit(result_ok_type(&unit).unwrap()));
        let bare: ReturnType = parse_quote!(-> u32);
        assert!(result_ok_type(&bare).is_err());
        let opt: Type = parse_quote!(Option<u32>);
        assert!(is_option(&opt));
    }

    #[test]
    fn thread_safety_is_added_once() {
        let mut item: ItemTrait = parse_quote!(pub trait A: Send {});
        add_thread_safety(&mut item);
        assert_eq!(item.supertraits.len(), 2);
    }
}
