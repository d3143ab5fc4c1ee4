use anchor_lang::{error::Error, Result};

/// Asserts that `result` failed with the Anchor error code of `expected`.
#[track_caller]
pub fn assert_error_code<T: std::fmt::Debug>(result: Result<T>, expected: impl Into<u32>) {
    let expected = expected.into();
    match result {
        Err(Error::AnchorError(e)) => assert_eq!(
            e.error_code_number, expected,
            "unexpected error: {}",
            e.error_msg
        ),
        other => panic!("expected error code {}, got {:?}", expected, other),
    }
}
