use proc_macro::TokenStream;
use timer::expand_timer_tests;

mod timer;

/// Generate the conformance suite for a `Timer` built by the given expression
#[proc_macro]
pub fn test_timer(factory: TokenStream) -> TokenStream {
    expand_timer_tests(factory.into()).into()
}
