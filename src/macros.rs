#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

#[macro_export]
macro_rules! rule {
    (
        name: $name:expr,
        category: $category:expr,
        pattern: $pat:literal
        $(, optional_phrases: [ $($opt_phrase:expr),* $(,)? ])?
        $(, buckets: $buckets:expr)?
        , prod: |$m:ident, $env:ident| -> $ret_ty:ty $body_expr:block
        $(,)?
    ) => {{
        $crate::Rule {
            name: $name,
            category: $category,
            pattern: $crate::regex!($pat),
            production: Box::new(move |$m: &$crate::RuleMatch<'_>, $env: &$crate::RuleEnv<'_>| {
                use $crate::IntoOutcome;
                let result: $ret_ty = $body_expr;
                result.and_then(|v| v.into_outcome())
            }),
            optional_phrases: &[ $($($opt_phrase),*)? ],
            buckets: { 0 $(| $buckets)? },
        }
    }};
}
