use proc_macro::{Delimiter, TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`. Only top-level commas
/// separate arguments: commas inside parentheses, brackets or braces are
/// part of a single `Group` token. Generic argument lists are not groups,
/// so a turbofish with several parameters must be wrapped in parentheses.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens back into Rust source.
///
/// Goes through `TokenStream`'s own printer, which keeps joint punctuation
/// together and separates everything else, so `1 as u8` never turns into
/// `1asu8`.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    tokens.iter().cloned().collect::<TokenStream>().to_string()
}

/// Returns the index of the last brace-delimited group, i.e. the body of
/// an item.
pub(crate) fn body_position(tokens: &[TokenTree]) -> Option<usize> {
    tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
}

/// Returns the index of the first parenthesized group, i.e. the parameter
/// list of a function item.
pub(crate) fn params_position(tokens: &[TokenTree]) -> Option<usize> {
    tokens.iter().position(
        |t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Parenthesis),
    )
}

/// Extracts the binding of a single `name: Type` parameter.
///
/// Returns `None` for an empty parameter list, and the source of every
/// token before the first `:` otherwise (so `mut manager` is kept whole).
pub(crate) fn single_binding(params: TokenStream) -> Option<String> {
    let tokens: Vec<TokenTree> = params.into_iter().collect();

    let colon = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Punct(p) if p.as_char() == ':'))?;

    let binding = tokens_to_string(&tokens[..colon]);

    if binding.trim().is_empty() {
        None
    } else {
        Some(binding)
    }
}

/// Parses `key = value` pairs from an attribute argument list.
pub(crate) fn parse_attr_pairs(attr: TokenStream) -> Vec<(String, String)> {
    split_args(attr)
        .into_iter()
        .filter_map(|arg| {
            let eq = arg
                .iter()
                .position(|t| matches!(t, TokenTree::Punct(p) if p.as_char() == '='))?;

            let key = tokens_to_string(&arg[..eq]);
            let value = tokens_to_string(&arg[eq + 1..]);

            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
