pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

/// Verifies that `index` is a valid element position in a sequence of
/// length `len`, i.e. `index < len`.
#[inline]
pub fn verify_index(index: u64, len: u64) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        index_out_of_range(index, len)
    }
}

/// Verifies that the window `[start, start + count)` lies within a sequence
/// of length `len`. Also rejects `start + count` overflow.
#[inline]
pub fn verify_range(start: u64, count: u64, len: u64) -> Result<()> {
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => range_out_of_bounds(start, count, len),
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::Error::invalid_arg(name, condition))
}

#[cold]
pub fn index_out_of_range(index: u64, len: u64) -> Result<()> {
    Err(crate::error::Error::index_out_of_range(index, len))
}

#[cold]
pub fn range_out_of_bounds(start: u64, count: u64, len: u64) -> Result<()> {
    Err(crate::error::Error::range_out_of_bounds(start, count, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_index() {
        assert!(verify_index(0, 1).is_ok());
        assert!(verify_index(9, 10).is_ok());
        assert!(verify_index(10, 10).is_err());
        assert!(verify_index(0, 0).is_err());
    }

    #[test]
    fn test_verify_range() {
        assert!(verify_range(0, 0, 0).is_ok());
        assert!(verify_range(3, 7, 10).is_ok());
        assert!(verify_range(3, 8, 10).is_err());
        assert!(verify_range(u64::MAX, 2, u64::MAX).is_err());
    }

    #[test]
    fn test_verify_arg_macro() {
        fn check(n: usize) -> Result<()> {
            verify_arg!(n, n != 0);
            Ok(())
        }
        assert!(check(1).is_ok());
        assert!(check(0).is_err());
    }
}
