/// A value that can stand in a record or criteria slice.
///
/// `None` is the absent value: it encodes as an empty field and, as a
/// search criterion, matches anything. Plain strings are always present.
pub trait Field {
    fn value(&self) -> Option<&str>;
}

impl Field for str {
    fn value(&self) -> Option<&str> {
        Some(self)
    }
}

impl Field for String {
    fn value(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: Field + ?Sized> Field for &T {
    fn value(&self) -> Option<&str> {
        (**self).value()
    }
}

impl<T: Field> Field for Option<T> {
    fn value(&self) -> Option<&str> {
        self.as_ref().and_then(|v| v.value())
    }
}

/// Prefix match of one criterion against one stored value.
///
/// An absent or empty criterion matches every value; otherwise the value
/// must start with the criterion (case-sensitive).
pub fn matches_prefix(criterion: Option<&str>, value: &str) -> bool {
    match criterion {
        None => true,
        Some(c) => c.is_empty() || value.starts_with(c),
    }
}
