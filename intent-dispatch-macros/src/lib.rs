//! Procedural macros for intent-dispatch

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Intent)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(intent), supports(enum_any))]
struct IntentOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<IntentVariant, ()>,

    /// Prefix prepended to every generated name, e.g. `"Feed."`
    #[darling(default)]
    prefix: Option<String>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(intent))]
struct IntentVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Explicit name override
    #[darling(default)]
    rename: Option<String>,

    /// Keep the payload out of `summary()`
    #[darling(default)]
    redact: bool,
}

impl IntentVariant {
    /// Pattern that matches this variant regardless of its fields
    fn pattern(&self, enum_name: &syn::Ident) -> proc_macro2::TokenStream {
        let ident = &self.ident;
        match self.fields.style {
            darling::ast::Style::Unit => quote! { #enum_name::#ident },
            darling::ast::Style::Tuple => quote! { #enum_name::#ident(..) },
            darling::ast::Style::Struct => quote! { #enum_name::#ident { .. } },
        }
    }
}

/// Derive macro for the Intent trait
///
/// Generates a `name()` method that returns the variant name as a static string.
///
/// Attributes:
/// - `#[intent(prefix = "...")]` on the enum prepends a prefix to every name
/// - `#[intent(rename = "...")]` on a variant overrides its name
/// - `#[intent(redact)]` on a variant makes `summary()` return only the name
///
/// # Example
/// ```ignore
/// #[derive(Intent, Clone, Debug)]
/// enum FeedIntent {
///     Like,
///     #[intent(rename = "Unlike")]
///     UndoLike,
///     #[intent(redact)]
///     Comment { text: String },
/// }
///
/// assert_eq!(FeedIntent::Like.name(), "Like");
/// assert_eq!(FeedIntent::UndoLike.name(), "Unlike");
/// assert_eq!(FeedIntent::Comment { text: "hi".into() }.summary(), "Comment");
/// ```
#[proc_macro_derive(Intent, attributes(intent))]
pub fn derive_intent(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match IntentOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Intent can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    if variants.is_empty() {
        return syn::Error::new_spanned(&input, "Intent requires at least one variant")
            .to_compile_error()
            .into();
    }

    let prefix = opts.prefix.as_deref().unwrap_or("");

    let name_arms = variants.iter().map(|v| {
        let pattern = v.pattern(name);
        let base = v.rename.clone().unwrap_or_else(|| v.ident.to_string());
        let variant_str = format!("{}{}", prefix, base);
        quote! { #pattern => #variant_str }
    });

    let redacted: Vec<_> = variants
        .iter()
        .filter(|v| v.redact)
        .map(|v| v.pattern(name))
        .collect();

    let summary = if redacted.is_empty() {
        quote! {}
    } else {
        quote! {
            #[allow(unreachable_patterns)]
            fn summary(&self) -> ::std::string::String {
                match self {
                    #(#redacted)|* => ::std::string::ToString::to_string(
                        intent_dispatch::Intent::name(self)
                    ),
                    _ => ::std::format!("{:?}", self),
                }
            }
        }
    };

    let expanded = quote! {
        impl #impl_generics intent_dispatch::Intent for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }

            #summary
        }
    };

    TokenStream::from(expanded)
}
