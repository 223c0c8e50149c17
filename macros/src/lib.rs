//! Derive macros for the tasklist pipeline
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates dispatch-key helpers for action enums
//!
//! # Example
//!
//! ```ignore
//! use tasklist_core::action::{Lifecycle, Stage};
//! use tasklist_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TodoAction {
//!     CreateTodo(Lifecycle<NewTask, Task, ErrorInfo>),
//!
//!     #[plain]
//!     Reset,
//! }
//!
//! // Generated methods:
//! let action = TodoAction::CreateTodo(Lifecycle::Discard);
//! assert_eq!(action.action_type().to_string(), "CREATE_TODO.DISCARD");
//! assert!(action.is_discard());
//! assert_eq!(TodoAction::Reset.stage(), None);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, parse_macro_input};

/// Derive macro for Action enums
///
/// Every variant is either a one-field tuple variant wrapping a
/// `tasklist_core::action::Lifecycle`, or a variant marked `#[plain]`.
/// The variant name supplies verb and entity: `ObtainTodoList` becomes the
/// operation `OBTAIN_TODO_LIST`, the same string the runtime action factory
/// builds for verb `obtain` and entity `todoList`.
///
/// Generated methods:
/// - `OPERATIONS` - every operation name, in declaration order
/// - `operation()` - the operation name (`CREATE_TODO`)
/// - `effect_id()` - the operation as a cancellation id
/// - `stage()` - lifecycle stage, `None` for plain variants
/// - `action_type()` - the full dispatch key (`CREATE_TODO.REQUEST`)
/// - `is_request()`, `is_discard()`, `is_settled()`
///
/// # Attributes
///
/// - `#[plain]` - Mark a variant as stage-less
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A variant is neither `#[plain]` nor a one-field tuple variant
#[proc_macro_derive(Action, attributes(plain))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_action(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(error) => error.to_compile_error().into(),
    }
}

/// How a variant is matched and what it contributes
struct VariantInfo<'a> {
    ident: &'a Ident,
    operation: String,
    lifecycle: bool,
    fields: &'a Fields,
}

impl VariantInfo<'_> {
    /// Pattern matching the variant, optionally binding the lifecycle as `lifecycle`
    fn pattern(&self, bind: bool) -> TokenStream2 {
        let ident = self.ident;
        if self.lifecycle {
            return if bind {
                quote! { Self::#ident(lifecycle) }
            } else {
                quote! { Self::#ident(_) }
            };
        }
        match self.fields {
            Fields::Named(_) => quote! { Self::#ident { .. } },
            Fields::Unnamed(_) => quote! { Self::#ident(..) },
            Fields::Unit => quote! { Self::#ident },
        }
    }
}

fn expand_action(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(Action)] can only be used on enums",
        ));
    };

    let mut variants = Vec::with_capacity(data_enum.variants.len());
    for variant in &data_enum.variants {
        let plain = has_attribute(&variant.attrs, "plain");
        let wraps_one = matches!(&variant.fields, Fields::Unnamed(fields) if fields.unnamed.len() == 1);

        if !plain && !wraps_one {
            return Err(syn::Error::new_spanned(
                variant,
                "Action variants must wrap exactly one Lifecycle value or be marked #[plain]",
            ));
        }

        variants.push(VariantInfo {
            ident: &variant.ident,
            operation: screaming_snake_case(&variant.ident.to_string()),
            lifecycle: !plain,
            fields: &variant.fields,
        });
    }

    let operations: Vec<&str> = variants.iter().map(|v| v.operation.as_str()).collect();

    let operation_arms = variants.iter().map(|variant| {
        let pattern = variant.pattern(false);
        let operation = &variant.operation;
        quote! { #pattern => #operation, }
    });

    let stage_arms = variants.iter().map(|variant| {
        let pattern = variant.pattern(true);
        if variant.lifecycle {
            quote! { #pattern => ::core::option::Option::Some(lifecycle.stage()), }
        } else {
            quote! { #pattern => ::core::option::Option::None, }
        }
    });

    // An enum without variants has no value to match on
    let operation_body = if variants.is_empty() {
        quote! { match *self {} }
    } else {
        quote! { match self { #(#operation_arms)* } }
    };
    let stage_body = if variants.is_empty() {
        quote! { match *self {} }
    } else {
        quote! { match self { #(#stage_arms)* } }
    };

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Every operation of this action type, in declaration order
            pub const OPERATIONS: &'static [&'static str] = &[#(#operations),*];

            /// Operation name, e.g. `CREATE_TODO`
            #[must_use]
            pub const fn operation(&self) -> &'static str {
                #operation_body
            }

            /// Cancellation id shared by every call of this operation
            #[must_use]
            pub const fn effect_id(&self) -> ::tasklist_core::effect::EffectId {
                ::tasklist_core::effect::EffectId::from_static(self.operation())
            }

            /// Lifecycle stage, `None` for plain actions
            #[must_use]
            pub const fn stage(&self) -> ::core::option::Option<::tasklist_core::action::Stage> {
                #stage_body
            }

            /// Full dispatch key, e.g. `CREATE_TODO.REQUEST`
            #[must_use]
            pub fn action_type(&self) -> ::tasklist_core::action::ActionType {
                ::tasklist_core::action::ActionType::from_operation(self.operation(), self.stage())
            }

            /// Returns true for the request stage
            #[must_use]
            pub const fn is_request(&self) -> bool {
                matches!(self.stage(), ::core::option::Option::Some(::tasklist_core::action::Stage::Request))
            }

            /// Returns true for the discard stage
            #[must_use]
            pub const fn is_discard(&self) -> bool {
                matches!(self.stage(), ::core::option::Option::Some(::tasklist_core::action::Stage::Discard))
            }

            /// Returns true for the success and failure stages
            #[must_use]
            pub const fn is_settled(&self) -> bool {
                matches!(
                    self.stage(),
                    ::core::option::Option::Some(
                        ::tasklist_core::action::Stage::Success | ::tasklist_core::action::Stage::Failure
                    )
                )
            }
        }
    })
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// `ObtainTodoList` -> `OBTAIN_TODO_LIST`, `HTTPRequest` -> `HTTP_REQUEST`,
/// `Sync2Remote` -> `SYNC_2_REMOTE`.
///
/// Must agree with `tasklist_core::action::screaming_snake_case`; the
/// integration tests compare both.
fn screaming_snake_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let digit_edge = prev.is_numeric() != c.is_numeric();
            let case_edge = c.is_uppercase()
                && (prev.is_lowercase() || (prev.is_uppercase() && next_is_lower));
            if digit_edge || case_edge {
                out.push('_');
            }
        }

        out.extend(c.to_uppercase());
    }

    if out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::screaming_snake_case;

    #[test]
    fn variant_names_become_operations() {
        assert_eq!(screaming_snake_case("CreateTodo"), "CREATE_TODO");
        assert_eq!(screaming_snake_case("ObtainTodoList"), "OBTAIN_TODO_LIST");
        assert_eq!(screaming_snake_case("FetchHTTPStatus"), "FETCH_HTTP_STATUS");
        assert_eq!(screaming_snake_case("Reset"), "RESET");
        assert_eq!(screaming_snake_case("Sync2Remote"), "SYNC_2_REMOTE");
        assert_eq!(screaming_snake_case("ObtainTodo2List"), "OBTAIN_TODO_2_LIST");
        assert_eq!(screaming_snake_case("FetchV10"), "FETCH_V_10");
    }
}
