//! Formatting for panic payloads caught inside worker tasks.

use std::{any::Any, fmt};

/// Displays a caught panic payload.
///
/// String payloads print verbatim; anything else falls back to `Debug`.
///
/// ```
/// use warplink::panic::PanicMessage;
///
/// let payload: Box<dyn std::any::Any + Send> = Box::new("handler exploded");
/// assert_eq!(PanicMessage::new(&payload).to_string(), "handler exploded");
/// ```
#[derive(Debug)]
pub struct PanicMessage<'a>(&'a (dyn Any + Send));

impl<'a> PanicMessage<'a> {
    /// Borrow `payload` for display.
    #[must_use]
    #[expect(
        clippy::borrowed_box,
        reason = "Taking the box stops the box itself being coerced into `dyn Any`."
    )]
    pub fn new(payload: &'a Box<dyn Any + Send>) -> Self { Self(payload.as_ref()) }
}

impl fmt::Display for PanicMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.0.downcast_ref::<String>() {
            f.write_str(text)
        } else if let Some(text) = self.0.downcast_ref::<&'static str>() {
            f.write_str(text)
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::PanicMessage;

    #[test]
    fn owned_strings_display_verbatim() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("boom"));
        assert_eq!(PanicMessage::new(&payload).to_string(), "boom");
    }

    #[test]
    fn opaque_payloads_fall_back_to_debug() {
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert!(PanicMessage::new(&payload).to_string().contains("Any"));
    }
}
