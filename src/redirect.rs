//! Redirect artifact for the hosted payment page.
//!
//! The provider takes the shopper on its own checkout page; the merchant
//! hands over a reference id by POSTing a `RefId` form field. This module
//! produces that handoff as data plus a self-submitting HTML document.

use crate::types::HOSTED_PAGE_URL;
use serde::Serialize;

/// Redirect target for a payment session.
#[derive(Debug, Clone, Serialize)]
pub struct RedirectPage {
    /// Hosted checkout page the form posts to.
    pub action_url: String,
    /// Reference id issued by the token call.
    pub ref_id: String,
}

impl RedirectPage {
    /// Builds the redirect for a reference id against the production page.
    pub fn new(ref_id: impl Into<String>) -> Self {
        Self { action_url: HOSTED_PAGE_URL.to_string(), ref_id: ref_id.into() }
    }

    /// Points the form at a different checkout page, e.g. a sandbox.
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = url.into();
        self
    }

    /// Renders a minimal HTML page that submits the form on load.
    ///
    /// Applications with their own templating can ignore this and read the
    /// fields directly.
    pub fn to_html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Redirecting…</title></head>\n\
             <body onload=\"document.forms[0].submit()\">\n\
             <form action=\"{}\" method=\"POST\">\n\
             <input type=\"hidden\" name=\"RefId\" value=\"{}\">\n\
             <noscript><input type=\"submit\" value=\"Continue to payment\"></noscript>\n\
             </form>\n</body>\n</html>\n",
            escape(&self.action_url),
            escape(&self.ref_id)
        )
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
