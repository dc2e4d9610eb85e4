//! Procedural macros for objwire.
//!
//! - `#[derive(Record)]` makes a struct traversable by the objwire-codec engines.
//! - `#[test_traced]` runs a test with a tracing subscriber installed.

use proc_macro::TokenStream;
use syn::{parse_macro_input, AttributeArgs, DeriveInput, ItemFn};

mod record;
mod traced;

/// Derives `Record`, `Encode` and `Decode` for a struct.
///
/// Every field is declared to the field cache, but only `pub` named fields are traversed.
/// A field may carry a tag:
///
/// ```ignore
/// #[derive(Default, Record)]
/// pub struct Entry {
///     #[wire("k")]
///     pub key: String,
///     #[wire(",omitempty")]
///     pub values: Vec<u32>,
///     #[wire("-")]
///     pub scratch: u64,
/// }
/// ```
///
/// The generated `Decode` implementation requires `Default`.
#[proc_macro_derive(Record, attributes(wire))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// Runs a test with a `tracing` subscriber that writes to the test harness.
///
/// The maximum level defaults to `DEBUG` and can be set with `level = "..."`.
///
/// ```ignore
/// #[test_traced(level = "INFO")]
/// fn test_decode() {
///     tracing::info!("captured by the test harness");
/// }
/// ```
#[proc_macro_attribute]
pub fn test_traced(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as AttributeArgs);
    let func = parse_macro_input!(item as ItemFn);
    traced::expand(args, func)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
