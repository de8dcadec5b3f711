//! Procedural macros for the Weft runtime.
//!
//! - [`race!`], [`all!`] and [`all_settled!`] combine futures of different
//!   types into one future, under the same policies as the functions of
//!   `weft::combinator`.
//! - [`#[weft::test]`](macro@test) runs an async test body on a fresh
//!   manager.

mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Policy requested from a combinator macro.
#[derive(Clone, Copy)]
enum Policy {
    Race,
    All,
    AllSettled,
}

impl Policy {
    fn name(self) -> &'static str {
        match self {
            Policy::Race => "race",
            Policy::All => "all",
            Policy::AllSettled => "all_settled",
        }
    }

    fn variant(self) -> &'static str {
        match self {
            Policy::Race => "Race",
            Policy::All => "All",
            Policy::AllSettled => "AllSettled",
        }
    }
}

/// Races futures of any types: `race!(manager, a, b, ...)`.
///
/// Evaluates to a `weft::Future<usize>` fulfilled with the position of the
/// first future to settle, whether it fulfilled or rejected. When several
/// futures are already settled, the first one in argument order wins.
#[proc_macro]
pub fn race(input: TokenStream) -> TokenStream {
    combine(input, Policy::Race)
}

/// Waits for every future: `all!(manager, a, b, ...)`.
///
/// Evaluates to a `weft::Future<(A, B, ...)>` fulfilled with every value,
/// or rejected with the first rejection.
#[proc_macro]
pub fn all(input: TokenStream) -> TokenStream {
    combine(input, Policy::All)
}

/// Waits for every future to settle: `all_settled!(manager, a, b, ...)`.
///
/// Evaluates to a `weft::Future<(Result<A, Error>, Result<B, Error>, ...)>`
/// that never rejects.
#[proc_macro]
pub fn all_settled(input: TokenStream) -> TokenStream {
    combine(input, Policy::AllSettled)
}

fn combine(input: TokenStream, policy: Policy) -> TokenStream {
    let args = utils::split_args(input);

    let Some((manager, children)) = args.split_first() else {
        return compile_error(&format!(
            "{}! expects a manager followed by futures",
            policy.name()
        ));
    };

    let count = children.len();

    if count == 0 {
        return compile_error(&format!("{}! expects at least one future", policy.name()));
    }

    let private = "::weft::combinator::__private";
    let manager = utils::tokens_to_string(manager);

    let mut out = String::new();
    out.push_str("{\n");
    out.push_str(&format!("let __manager: &::weft::Manager = &({manager});\n"));

    for (i, expr_tokens) in children.iter().enumerate() {
        let expr = utils::tokens_to_string(expr_tokens);
        out.push_str(&format!("let __f{i} = {expr};\n"));
    }

    out.push_str(&format!(
        "let (__node, __future) = {private}::Node::new(__manager, {private}::Policy::{}, {count}usize);\n",
        policy.variant()
    ));

    for i in 0..count {
        out.push_str(&format!("let __slot{i} = {private}::Slot::new();\n"));
    }

    // The finisher is installed before any child is attached: a child that
    // is already settled completes the node synchronously.
    out.push_str("{\n");
    for i in 0..count {
        out.push_str(&format!("    let __slot{i} = __slot{i}.clone();\n"));
    }

    let finish = match policy {
        Policy::Race => "::std::result::Result::Ok(__index)".to_string(),
        Policy::All => {
            let values = (0..count)
                .map(|i| format!("__slot{i}.outcome()?,"))
                .collect::<String>();
            format!("::std::result::Result::Ok(({values}))")
        }
        Policy::AllSettled => {
            let outcomes = (0..count)
                .map(|i| format!("__slot{i}.outcome(),"))
                .collect::<String>();
            format!("::std::result::Result::Ok(({outcomes}))")
        }
    };

    out.push_str(&format!(
        "    __node.on_finish(move |__index: usize| {{ let _ = __index; {finish} }});\n"
    ));
    out.push_str("}\n");

    for i in 0..count {
        out.push_str(&format!("__slot{i}.attach(&__node, {i}usize, __f{i});\n"));
    }

    out.push_str("__future\n");
    out.push_str("}\n");

    out.parse().unwrap_or_else(|err| {
        compile_error(&format!("{}! macro error: {err}", policy.name()))
    })
}

/// Marks an async function as a test driven by a fresh `weft::Manager`.
///
/// The function may take the manager as its single parameter:
///
/// ```rust,ignore
/// #[weft::test]
/// async fn clock_fires(manager: weft::Manager) {
///     manager.make_clock(Duration::from_millis(5)).await.unwrap();
/// }
/// ```
///
/// `stack_size = N` configures the stack of stackful tasks. The test fails
/// if its body panics; the manager is shut down afterwards either way.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens = item.into_iter().collect::<Vec<_>>();

    let mut builder = String::from("::weft::ManagerBuilder::new()");

    for (key, value) in utils::parse_attr_pairs(attr) {
        match key.as_str() {
            "stack_size" => builder.push_str(&format!(".stack_size({value})")),
            other => return compile_error(&format!("unknown weft::test option `{other}`")),
        }
    }

    builder.push_str(".build()");

    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let Some(params_pos) = utils::params_position(&tokens) else {
        return compile_error("weft::test expects a function");
    };

    let binding = match &tokens[params_pos] {
        TokenTree::Group(g) => utils::single_binding(g.stream()),
        _ => unreachable!(),
    };

    tokens[params_pos] = TokenTree::Group(Group::new(Delimiter::Parenthesis, TokenStream::new()));

    let Some(pos) = utils::body_position(&tokens) else {
        return compile_error("weft::test expects a function body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let bind = match binding {
        Some(binding) => format!("let {binding} = __manager.clone();"),
        None => String::new(),
    };

    let new_block = format!(
        "{{
        let __manager = {builder};
        let __outcome = {{
            {bind}
            __manager.block_on(async move {{ {block} }})
        }};
        __manager.shutdown();
        match __outcome {{
            ::std::result::Result::Ok(value) => value,
            ::std::result::Result::Err(err) => ::std::panic!(\"test task failed: {{}}\", err),
        }}
    }}"
    );

    let Ok(stream) = new_block.parse::<TokenStream>() else {
        return compile_error("weft::test could not rebuild the test body");
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));

    let test_attr: TokenStream = "#[::core::prelude::v1::test]".parse().unwrap_or_default();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}

fn compile_error(message: &str) -> TokenStream {
    format!("::std::compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
