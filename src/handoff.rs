//! Human handoff channels
//!
//! When the visitor asks for a person, the engine hands them deep links to
//! WhatsApp and phone. The WhatsApp link carries a prefilled, percent-encoded
//! message containing the conversation summary so the agent has context
//! before the first reply. Delivery is advisory; nothing acknowledges it.

use serde::{Deserialize, Serialize};
use url::Url;

/// Contact points for the human team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// WhatsApp number in international format without the plus sign
    pub whatsapp_number: String,
    /// Phone number for the tel: link
    pub phone_number: String,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            whatsapp_number: "61478914106".to_string(),
            phone_number: "+256780950555".to_string(),
        }
    }
}

impl HandoffConfig {
    /// WhatsApp deep link with the summary prefilled into the text query
    pub fn whatsapp_url(&self, summary: &str) -> String {
        let message = format!(
            "Hello! I had a conversation with your AI assistant about East African \
             safari packages. Here's our conversation summary:\n\n{}\n\nI'd like to \
             speak with a human agent to continue planning my safari.",
            summary
        );
        let base = format!("https://wa.me/{}", self.whatsapp_number);
        match Url::parse_with_params(&base, &[("text", message.as_str())]) {
            Ok(url) => url.to_string(),
            Err(_) => base,
        }
    }

    /// Phone deep link
    pub fn phone_url(&self) -> String {
        format!("tel:{}", self.phone_number)
    }

    /// Both deep links for a reply card
    pub fn link(&self, summary: &str) -> HandoffLink {
        HandoffLink {
            whatsapp_url: self.whatsapp_url(summary),
            phone_url: self.phone_url(),
        }
    }
}

/// Deep links handed to the visitor for human contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffLink {
    pub whatsapp_url: String,
    pub phone_url: String,
}
