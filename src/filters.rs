use crate::literal::{py_bool, single_quoted};

// Export individual filter functions
pub use self::pybool as filter_pybool;
pub use self::pystr as filter_pystr;

/// `True` / `False`, as Python spells them.
pub fn pybool(value: bool) -> String {
    py_bool(value).to_string()
}

/// A single-quoted Python string literal.
pub fn pystr(value: String) -> String {
    single_quoted(&value)
}
