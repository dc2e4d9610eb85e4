use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Error, ItemFn, Lit, Meta, NestedMeta};

const LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

pub fn expand(args: Vec<NestedMeta>, func: ItemFn) -> Result<TokenStream, Error> {
    let mut level = String::from("DEBUG");
    for arg in args {
        match arg {
            NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("level") => match nv.lit {
                Lit::Str(lit) => {
                    let value = lit.value().to_uppercase();
                    if !LEVELS.contains(&value.as_str()) {
                        return Err(Error::new(lit.span(), "unknown log level"));
                    }
                    level = value;
                }
                other => return Err(Error::new(other.span(), "level must be a string")),
            },
            other => return Err(Error::new(other.span(), "expected `level = \"...\"`")),
        }
    }
    let level = syn::Ident::new(&level, proc_macro2::Span::call_site());

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = func;
    Ok(quote! {
        #[test]
        #(#attrs)*
        #vis #sig {
            let _ = ::tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(::tracing::Level::#level)
                .with_line_number(true)
                .try_init();
            #block
        }
    })
}
