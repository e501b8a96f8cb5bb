use quote::quote;
use syn::{AngleBracketedGenericArguments, GenericArgument, Path, PathArguments, Type, TypePath};

/// Returns `T` for `Vec<T>`, `std::vec::Vec<T>` and `alloc::vec::Vec<T>`.
pub fn inner_of_vec(ty: &Type) -> Option<&Type> {
    let Type::Path(TypePath { path, .. }) = ty else {
        return None;
    };
    let is_vec_path = match path.segments.len() {
        1 => path.segments[0].ident == "Vec",
        3 => {
            (path.segments[0].ident == "std" || path.segments[0].ident == "alloc")
                && path.segments[1].ident == "vec"
                && path.segments[2].ident == "Vec"
        }
        _ => false,
    };
    if !is_vec_path {
        return None;
    }

    if let Some(seg) = path.segments.last()
        && let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) =
            &seg.arguments
        && let Some(GenericArgument::Type(t)) = args.first()
    {
        return Some(t);
    }
    None
}

pub fn build_cli_parse_expr(ty: &Type, parse_with: Option<&Path>) -> proc_macro2::TokenStream {
    if let Some(parse_with) = parse_with {
        quote! { #parse_with(&raw)? }
    } else {
        quote! {
            raw.parse::<#ty>()
                .map_err(|e| crate::Error::invalid_input(format!(
                    "Invalid value for --{name}: {raw} ({e})"
                )))?
        }
    }
}

pub fn to_kebab_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (idx, ch) in s.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if idx != 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::{inner_of_vec, to_kebab_case};

    #[test]
    fn inner_of_vec_supports_short_std_and_alloc_paths() {
        let short_ty: syn::Type = parse_quote!(Vec<String>);
        let std_ty: syn::Type = parse_quote!(std::vec::Vec<u8>);
        let alloc_ty: syn::Type = parse_quote!(alloc::vec::Vec<f64>);
        let non_vec: syn::Type = parse_quote!(Option<u8>);

        let short_inner = inner_of_vec(&short_ty).expect("expected Vec inner type");
        let std_inner = inner_of_vec(&std_ty).expect("expected std Vec inner type");
        let alloc_inner = inner_of_vec(&alloc_ty).expect("expected alloc Vec inner type");

        assert_eq!(quote::quote!(#short_inner).to_string(), "String");
        assert_eq!(quote::quote!(#std_inner).to_string(), "u8");
        assert_eq!(quote::quote!(#alloc_inner).to_string(), "f64");
        assert!(inner_of_vec(&non_vec).is_none());
    }

    #[test]
    fn inner_of_vec_rejects_missing_generic() {
        let bare: syn::Type = parse_quote!(Vec);
        assert!(inner_of_vec(&bare).is_none());
    }

    #[test]
    fn to_kebab_case_inserts_dashes_before_ascii_uppercase() {
        assert_eq!(to_kebab_case("FixedMap"), "fixed-map");
        assert_eq!(to_kebab_case("already-kebab"), "already-kebab");
        assert_eq!(to_kebab_case("X"), "x");
    }
}
