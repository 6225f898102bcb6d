//! Keycode translation for synthesized key presses.

use opal_abi::Modifiers;

/// Keycode a key press reports for `code` under `modifiers`.
///
/// Ctrl+letter becomes the control code 1..=26. Ctrl+digit is reserved for
/// a separate input mode and produces no key press at all.
pub fn modified_keycode(code: u32, modifiers: Modifiers) -> Option<u32> {
    if !modifiers.contains(Modifiers::CTRL) {
        return Some(code);
    }
    match char::from_u32(code) {
        Some(c) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase() as u32 - 'a' as u32 + 1),
        Some(c) if c.is_ascii_digit() => None,
        _ => Some(code),
    }
}
