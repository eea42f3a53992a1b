//! Type-state markers for values that passed validation.

/// Proof wrapper indicating a value has been validated.
///
/// Only the validation crate constructs it; downstream stages accept
/// `Validated<T>` to make "validated before use" a type-level fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
    /// Wrap a validated value.
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the inner value.
    pub const fn as_ref(&self) -> &T {
        &self.0
    }

    /// Consume and return the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Validated;

    #[test]
    fn validated_derefs_to_inner() {
        let value = Validated::new(String::from("aws"));
        assert_eq!(value.len(), 3);
        assert_eq!(value.into_inner(), "aws");
    }
}
