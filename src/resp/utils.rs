use bytes::Bytes;

use super::error::CommandError;

/// Checks that `args` holds exactly `expected` entries.
pub fn expect_arity<const N: usize>(
    command: &'static str,
    args: Vec<Bytes>,
) -> Result<[Bytes; N], CommandError> {
    args.try_into().map_err(|_| CommandError::WrongArity(command))
}

pub fn extract_string(arg: &[u8]) -> String {
    String::from_utf8_lossy(arg).into_owned()
}

pub fn extract_integer(arg: &[u8]) -> Result<i64, CommandError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(CommandError::NotAnInteger)
}
