//! Share messages for assignments.
//!
//! A giver's assignment is formatted as a short chat message and handed to
//! a messaging app through a deep link. Delivery is outside this crate:
//! the link is passed to a [`MessageChannel`] and nothing comes back.

use log::info;

use crate::exchange::{Assignment, Event, ExchangeError, Result};

/// Base of the WhatsApp send link.
pub const WHATSAPP_SEND_URL: &str = "https://api.whatsapp.com/send";

/// Text addressed to one giver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareMessage {
    /// Giver phone (digits, country code included).
    pub destination: String,
    /// Message body.
    pub text: String,
}

impl ShareMessage {
    /// Formats the message telling the giver whom they drew.
    #[must_use]
    pub fn compose(event: &Event, assignment: &Assignment) -> Self {
        let text = format!(
            "🎄 *GIFT EXCHANGE: {}* 🎄\n\nHi {}, you are giving a gift to:\n🎁 *{}*\n\n📝 *Wishlist:* {}\n💰 *Budget:* ${}",
            event.name,
            assignment.giver_name,
            assignment.receiver.name,
            assignment.receiver.wishlist,
            event.budget,
        );
        Self {
            destination: assignment.giver_phone.clone(),
            text,
        }
    }

    /// Builds the send link with the phone and URL-encoded text.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be encoded.
    pub fn deep_link(&self) -> Result<String> {
        let query = serde_urlencoded::to_string([
            ("phone", self.destination.as_str()),
            ("text", self.text.as_str()),
        ])
        .map_err(|e| ExchangeError::Validation(format!("Failed to encode share link: {e}")))?;
        Ok(format!("{WHATSAPP_SEND_URL}?{query}"))
    }
}

/// Hands share messages to an external messaging channel.
pub trait MessageChannel {
    /// Hands off `message`. Delivery is not confirmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be handed off.
    fn hand_off(&self, message: &ShareMessage) -> Result<()>;
}

/// Channel that turns messages into deep links and passes them to an
/// opener (a browser launcher, a UI callback, ...).
pub struct DeepLinkChannel<F> {
    open: F,
}

impl<F: Fn(&str)> DeepLinkChannel<F> {
    /// Creates a channel calling `open` with each link.
    pub const fn new(open: F) -> Self {
        Self { open }
    }
}

impl<F: Fn(&str)> MessageChannel for DeepLinkChannel<F> {
    fn hand_off(&self, message: &ShareMessage) -> Result<()> {
        let link = message.deep_link()?;
        (self.open)(&link);
        info!("event=share_handed_off module=notify status=ok");
        Ok(())
    }
}
