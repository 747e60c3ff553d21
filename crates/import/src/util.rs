/// Declares a function returning a lazily compiled, process-wide `Regex`.
macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub(crate) use re;

/// Drop one double quote from each end of `field`, where present.
pub fn strip_quotes(field: &str) -> &str {
    let field = field.strip_prefix('"').unwrap_or(field);
    field.strip_suffix('"').unwrap_or(field)
}

/// True when `s` has nothing but ASCII digits and whitespace (or nothing at all).
pub fn is_digits_or_blank(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit() || c.is_whitespace())
}
