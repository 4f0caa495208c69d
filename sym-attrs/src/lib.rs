mod error_kind;

use error_kind::ErrorKindTarget;
use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Derives the [`ErrorKind`] trait for the given struct.
///
/// This trait can be derived for any struct with named fields or no fields at all.
///
/// The information of the error can be customized using the `error` attribute by adding the
/// corresponding tags to it:
/// ```
/// use sym_attrs::ErrorKind;
/// use sym_error::ErrorKind;
///
/// #[derive(Debug, ErrorKind)]
/// #[error(
///     message = format!("`{}` is already bound", self.name),
///     labels = ["this variable"],
///     help = "pass `allow_override = true` to replace the binding",
/// )]
/// pub struct AlreadyBound {
///     name: String,
/// }
/// ```
///
/// The following tags are available:
///
/// | Tag       | Description                                                                      |
/// | --------- | -------------------------------------------------------------------------------- |
/// | `message` | The message displayed at the top of the error when it is displayed.              |
/// | `labels`  | An array of label texts, one per span of the error, in the same order as spans.  |
/// | `help`    | Optional help text for the error, describing what the user can do to fix it.     |
///
/// Each tag accepts an expression that should evaluate to something implementing
/// [`ToString`]. For structs with named fields, the expression is evaluated with the members of
/// the struct in scope, so they can be used in the expression (tuple structs are not supported).
#[proc_macro_derive(ErrorKind, attributes(error))]
pub fn error_kind(item: TokenStream) -> TokenStream {
    let target = parse_macro_input!(item as ErrorKindTarget);
    let name = &target.name;
    quote! {
        impl ErrorKind for #name {
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            #target
        }
    }.into()
}
