//! One-shot messages carried across a redirect.
//!
//! A handler that redirects after a POST stores a [`Flash`] in a short-lived
//! cookie; the next page render takes it out of the jar and shows it once.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::constants::FLASH_COOKIE_NAME;

const FLASH_MAX_AGE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub messages: Vec<String>,
}

impl Flash {
    pub fn new(kind: FlashKind, messages: Vec<String>) -> Self {
        Self { kind, messages }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Success, vec![message.into()])
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Error, vec![message.into()])
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Info, vec![message.into()])
    }

    fn encode(&self) -> Option<String> {
        serde_json::to_vec(self)
            .ok()
            .map(|json| BASE64_URL_SAFE_NO_PAD.encode(json))
    }

    fn decode(raw: &str) -> Option<Self> {
        let bytes = BASE64_URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Store a flash message to be shown by the next rendered page
pub fn set_flash(jar: CookieJar, flash: Flash) -> CookieJar {
    let Some(value) = flash.encode() else {
        tracing::warn!("Failed to encode flash message");
        return jar;
    };

    let cookie = Cookie::build((FLASH_COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(FLASH_MAX_AGE_MINUTES))
        .build();

    jar.add(cookie)
}

/// Remove the pending flash message from the jar, returning it if it decodes
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(value) = jar.get(FLASH_COOKIE_NAME).map(|c| c.value().to_string()) else {
        return (jar, None);
    };

    let jar = jar.remove(Cookie::build(FLASH_COOKIE_NAME).path("/"));
    (jar, Flash::decode(&value))
}
