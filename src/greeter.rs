//! Greeting helper used by the binary's startup banner.

use crate::constants::APP_NAME;

/// Build the welcome line for `name`.
///
/// ```
/// assert_eq!(keystone::greeter::greet("Alice"), "Hello, Alice! Welcome to keystone!");
/// ```
pub fn greet(name: &str) -> String {
    format!("Hello, {name}! Welcome to {APP_NAME}!")
}
