use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, LitStr, parse_macro_input};

pub fn timer_inner(attr: TokenStream, item: TokenStream) -> TokenStream {
    let function = parse_macro_input!(item as ItemFn);

    let label = if attr.is_empty() {
        function.sig.ident.to_string()
    } else {
        let lit = parse_macro_input!(attr as LitStr);
        lit.value()
    };

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = function;

    let expanded = quote! {
        #(#attrs)*
        #vis #sig {
            struct ElapsedLog(&'static str, std::time::Instant);

            impl Drop for ElapsedLog {
                fn drop(&mut self) {
                    log::debug!(
                        "{}: elapsed={:.3}s",
                        self.0,
                        self.1.elapsed().as_secs_f64()
                    );
                }
            }

            let _elapsed = ElapsedLog(#label, std::time::Instant::now());
            #block
        }
    };

    TokenStream::from(expanded)
}
