use std::{
    fmt,
    fmt::{Debug, Display},
};

#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone + Default + PartialEq> Secret<T> {
    /// True if no secret value has been configured.
    pub fn is_unset(&self) -> bool {
        self.value == T::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn never_prints_value() {
        let s = Secret::new("sk_live_123".to_string());
        assert_eq!(format!("{s}"), "****");
        assert_eq!(format!("{s:?}"), "****");
        assert_eq!(s.reveal(), "sk_live_123");
        assert!(!s.is_unset());
        assert!(Secret::<String>::default().is_unset());
    }
}
