use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, ImplItem, ImplItemFn, ItemImpl, Stmt,
    Variant, Visibility,
};

/// Turns an error enum into an FFI-ready migrator error.
///
/// The macro:
/// 1. Adds `#[derive(Debug, thiserror::Error, uniffi::Error)]` and `#[uniffi(flat_error)]`
/// 2. Adds a `Generic { message: String }` variant if not already present
/// 3. Implements `From<anyhow::Error>`, flattening the cause chain into `message`
/// 4. Adds `from_anyhow_result` to lift `anyhow::Result` values
///
/// # Usage
///
/// ```rust,ignore
/// #[migrator_error]
/// pub enum MyError {
///     #[error("step {from} -> {to} failed")]
///     StepFailed { from: String, to: String },
/// }
/// ```
#[proc_macro_attribute]
pub fn migrator_error(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(
            &input,
            "migrator_error can only be applied to enums",
        )
        .to_compile_error()
        .into();
    };

    let enum_name = &input.ident;
    let visibility = &input.vis;
    let generics = &input.generics;

    // Existing derives and uniffi attributes are replaced by ours
    let attrs: Vec<_> = input
        .attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("derive") && !attr.path().is_ident("uniffi"))
        .collect();

    let mut variants = data_enum.variants.clone();
    if !has_generic_variant(&variants) {
        let generic_variant: Variant = syn::parse_quote! {
            /// A generic error wrapping an `anyhow` error chain.
            #[error("Generic error: {message}")]
            Generic {
                /// The flattened error chain.
                message: String
            }
        };
        variants.push(generic_variant);
    }

    quote! {
        #[derive(Debug, thiserror::Error, uniffi::Error)]
        #[uniffi(flat_error)]
        #(#attrs)*
        #visibility enum #enum_name #generics {
            #variants
        }

        impl #generics From<anyhow::Error> for #enum_name #generics {
            fn from(err: anyhow::Error) -> Self {
                let mut message = err.to_string();
                let chain: Vec<String> = err.chain().skip(1).map(|e| e.to_string()).collect();
                if !chain.is_empty() {
                    message.push_str(" (caused by: ");
                    message.push_str(&chain.join(" -> "));
                    message.push(')');
                }
                Self::Generic { message }
            }
        }

        impl #generics #enum_name #generics {
            /// Convert an `anyhow::Result` into a result carrying this error type
            ///
            /// # Errors
            /// Returns the `Generic` variant when `result` is an error.
            pub fn from_anyhow_result<T>(result: anyhow::Result<T>) -> Result<T, Self> {
                result.map_err(Self::from)
            }
        }
    }
    .into()
}

/// Exports an impl block through `uniffi::export` with logging context.
///
/// Every public method gets a `LogContext` named after the type as its first
/// statement, so log lines emitted during the call are prefixed with
/// `[TypeName]`. If any public method is `async`, `async_runtime = "tokio"` is
/// appended to the export arguments.
///
/// # Usage
///
/// ```rust,ignore
/// #[migrator_export]
/// impl PluginSettingsMigrator {
///     pub fn settings_form_schema(&self) -> String { .. }
///
///     pub async fn handle_update(&self, ..) -> Result<SettingsUpgrade, MigrationError> { .. }
/// }
/// ```
#[proc_macro_attribute]
pub fn migrator_export(args: TokenStream, input: TokenStream) -> TokenStream {
    let input_impl = parse_macro_input!(input as ItemImpl);

    let type_name = match &*input_impl.self_ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map_or_else(|| "Unknown".to_string(), |segment| segment.ident.to_string()),
        _ => "Unknown".to_string(),
    };

    let has_async_functions = has_async_functions_in_impl(&input_impl.items);

    let new_items = input_impl
        .items
        .iter()
        .map(|item| match item {
            ImplItem::Fn(method) if matches!(method.vis, Visibility::Public(_)) => {
                let mut new_method = method.clone();
                inject_logging_context(&mut new_method, &type_name);
                ImplItem::Fn(new_method)
            }
            _ => item.clone(),
        })
        .collect();

    let new_impl = ItemImpl {
        items: new_items,
        ..input_impl
    };

    let args = with_async_runtime(proc_macro2::TokenStream::from(args), has_async_functions);

    quote! {
        #[uniffi::export(#args)]
        #new_impl
    }
    .into()
}

/// Whether the enum already declares a `Generic` variant
fn has_generic_variant<'a>(variants: impl IntoIterator<Item = &'a Variant>) -> bool {
    variants
        .into_iter()
        .any(|variant| variant.ident == "Generic")
}

/// Appends `async_runtime = "tokio"` to the export arguments when needed
fn with_async_runtime(
    args: proc_macro2::TokenStream,
    has_async_functions: bool,
) -> proc_macro2::TokenStream {
    if !has_async_functions {
        args
    } else if args.is_empty() {
        quote! { async_runtime = "tokio" }
    } else {
        quote! { #args, async_runtime = "tokio" }
    }
}

/// Check if any public functions in the impl items are async
fn has_async_functions_in_impl(impl_items: &[ImplItem]) -> bool {
    impl_items.iter().any(|item| {
        if let ImplItem::Fn(method) = item {
            matches!(method.vis, Visibility::Public(_))
                && method.sig.asyncness.is_some()
        } else {
            false
        }
    })
}

/// Inject logging context at the start of a function body
fn inject_logging_context(method: &mut ImplItemFn, type_name: &str) {
    let context_stmt: Stmt = syn::parse_quote! {
        let _migrator_logger_ctx = crate::primitives::logger::LogContext::new(#type_name);
    };
    method.block.stmts.insert(0, context_stmt);
}
