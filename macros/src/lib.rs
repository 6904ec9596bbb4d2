use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

/// Test attribute used across the rxflow test suite.
///
/// * sync functions become plain `#[test]`s.
/// * async functions run on a current-thread tokio runtime, or on a
///   multi-thread runtime with `#[rxflow_macro::test(shared)]`.
///
/// Every test installs a `tracing` subscriber that writes through the test
/// harness, filtered by `RUST_LOG`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let mut input = parse_macro_input!(item as ItemFn);

  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let tokio_args = if raw_args.is_empty() {
    quote!(flavor = "current_thread")
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxflow_macro::test flavor args are only supported for async tests. Use \
           #[rxflow_macro::test] for sync tests, or make the function async.",
        )
        .to_compile_error(),
      );
    }

    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      Some((ident.to_string(), ident.span()))
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      Some((lit.value(), lit.span()))
    } else {
      None
    };

    match flavor {
      Some((name, _)) if name == "current" => quote!(flavor = "current_thread"),
      Some((name, _)) if name == "shared" => quote!(flavor = "multi_thread"),
      Some((_, span)) => {
        return TokenStream::from(
          syn::Error::new(span, "rxflow_macro::test only accepts `current` or `shared`")
            .to_compile_error(),
        );
      }
      None => {
        return TokenStream::from(
          syn::Error::new(
            raw_args.span(),
            "rxflow_macro::test only accepts: #[rxflow_macro::test], \
             #[rxflow_macro::test(current)], #[rxflow_macro::test(shared)], or string \
             equivalents",
          )
          .to_compile_error(),
        );
      }
    }
  };

  let init_tracing: syn::Stmt = syn::parse_quote! {
    let _ = ::tracing_subscriber::fmt()
      .with_env_filter(::tracing_subscriber::EnvFilter::from_default_env())
      .with_test_writer()
      .try_init();
  };
  input.block.stmts.insert(0, init_tracing);

  let native_attr = if is_async { quote!(tokio::test(#tokio_args)) } else { quote!(test) };

  let expanded = quote! {
      #[#native_attr]
      #input
  };

  TokenStream::from(expanded)
}
