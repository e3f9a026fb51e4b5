//! Application constants.

use std::time::Duration;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const EXAMPLE_HEX: &str = "0x00ff";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_values() {
        assert_eq!(EXAMPLE_HEX, "0x00ff");
        assert_eq!(APP_NAME, "keystone");
        assert!(!VERSION.is_empty());
        assert_eq!(DEFAULT_TIMEOUT.as_secs(), 5);
    }

    #[test]
    fn example_hex_parses() {
        let value = u16::from_str_radix(EXAMPLE_HEX.trim_start_matches("0x"), 16).unwrap();
        assert_eq!(value, 0x00ff);
    }
}
