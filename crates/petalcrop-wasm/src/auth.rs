//! Auth session and form bindings.
//!
//! The browser session lives in cookies under the canonical keys, written
//! with a `max-age` taken from the expiry policy. Where `document.cookie`
//! is unavailable (workers) the session falls back to memory.

use petalcrop_core::auth::{
    keys, AuthSession, Clock, Expiry, MemorySessionStore, Role, SessionStore, StoreError,
};
use petalcrop_core::form::{self, AuthResponse, FormAction, RegistrationForm};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

use crate::reader::describe_js_error;

/// `Date.now()` clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// Value of `key` in a `document.cookie` string, still URI-encoded.
pub(crate) fn find_cookie<'a>(cookies: &'a str, key: &str) -> Option<&'a str> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
}

/// Assignment string for `document.cookie`.
pub(crate) fn cookie_assignment(key: &str, encoded_value: &str, expiry: Expiry) -> String {
    let mut cookie = format!("{}={}; path=/; SameSite=Strict", key, encoded_value);
    if let Expiry::After(ttl) = expiry {
        cookie.push_str(&format!("; max-age={}", ttl.as_secs()));
    }
    cookie
}

/// Session store over `document.cookie`. The browser enforces expiry.
pub struct CookieSessionStore {
    document: HtmlDocument,
}

impl CookieSessionStore {
    pub fn from_document() -> Result<Self, StoreError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| StoreError::Unavailable("no document".to_string()))?;
        let document = document
            .dyn_into::<HtmlDocument>()
            .map_err(|_| StoreError::Unavailable("document has no cookies".to_string()))?;
        Ok(Self { document })
    }

    fn write(&self, assignment: &str) -> Result<(), StoreError> {
        self.document
            .set_cookie(assignment)
            .map_err(|e| StoreError::Unavailable(describe_js_error(&e)))
    }
}

impl SessionStore for CookieSessionStore {
    fn get(&self, key: &str, _now_ms: u64) -> Option<String> {
        let cookies = self.document.cookie().ok()?;
        let encoded = find_cookie(&cookies, key)?;
        js_sys::decode_uri_component(encoded).ok().map(String::from)
    }

    fn set(
        &mut self,
        key: &str,
        value: &str,
        expiry: Expiry,
        _now_ms: u64,
    ) -> Result<(), StoreError> {
        let encoded = String::from(js_sys::encode_uri_component(value));
        self.write(&cookie_assignment(key, &encoded, expiry))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.write(&format!("{}=; path=/; max-age=0", key))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        for key in keys::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Cookie store when available, memory otherwise.
pub enum BrowserStore {
    Cookies(CookieSessionStore),
    Memory(MemorySessionStore),
}

impl SessionStore for BrowserStore {
    fn get(&self, key: &str, now_ms: u64) -> Option<String> {
        match self {
            BrowserStore::Cookies(store) => store.get(key, now_ms),
            BrowserStore::Memory(store) => store.get(key, now_ms),
        }
    }

    fn set(
        &mut self,
        key: &str,
        value: &str,
        expiry: Expiry,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        match self {
            BrowserStore::Cookies(store) => store.set(key, value, expiry, now_ms),
            BrowserStore::Memory(store) => store.set(key, value, expiry, now_ms),
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match self {
            BrowserStore::Cookies(store) => store.remove(key),
            BrowserStore::Memory(store) => store.remove(key),
        }
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match self {
            BrowserStore::Cookies(store) => store.clear(),
            BrowserStore::Memory(store) => store.clear(),
        }
    }
}

fn store_error(err: StoreError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_plain_object<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Login state for the current browser.
#[wasm_bindgen]
pub struct JsAuthSession {
    inner: AuthSession<BrowserStore, JsClock>,
}

#[wasm_bindgen]
impl JsAuthSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsAuthSession {
        let store = match CookieSessionStore::from_document() {
            Ok(cookies) => BrowserStore::Cookies(cookies),
            Err(e) => {
                log::warn!("{}; keeping auth session in memory", e);
                BrowserStore::Memory(MemorySessionStore::new())
            }
        };
        JsAuthSession {
            inner: AuthSession::new(store, JsClock),
        }
    }

    /// Session that never touches cookies.
    pub fn in_memory() -> JsAuthSession {
        JsAuthSession {
            inner: AuthSession::new(BrowserStore::Memory(MemorySessionStore::new()), JsClock),
        }
    }

    /// Store a login/register response (`{accessToken, refreshToken,
    /// administrator?, user?}`) for `role` ("admin" or "user").
    pub fn save(&mut self, response: JsValue, role: &str) -> Result<(), JsValue> {
        let response: AuthResponse = serde_wasm_bindgen::from_value(response)
            .map_err(|e| JsValue::from_str(&format!("Invalid auth response: {}", e)))?;
        let role: Role = role.parse().map_err(|e: String| JsValue::from_str(&e))?;
        self.inner.save(&response, role).map_err(store_error)
    }

    /// Stored profile, or `undefined`.
    pub fn current_user(&self) -> Result<JsValue, JsValue> {
        match self.inner.current_user() {
            Some(user) => to_plain_object(&user),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated()
    }

    pub fn role(&self) -> Option<String> {
        self.inner.role().map(|role| role.as_str().to_string())
    }

    pub fn is_admin(&self) -> bool {
        self.inner.is_admin()
    }

    pub fn is_user(&self) -> bool {
        self.inner.is_user()
    }

    /// `Authorization` header value while the access token is live.
    pub fn bearer_header(&self) -> Option<String> {
        self.inner.bearer_header()
    }

    /// Clear the session. Redirecting to the login page is up to the caller.
    pub fn logout(&mut self) -> Result<(), JsValue> {
        self.inner.logout().map_err(store_error)
    }
}

impl Default for JsAuthSession {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_form(form: JsValue) -> Result<RegistrationForm, JsValue> {
    serde_wasm_bindgen::from_value(form)
        .map_err(|e| JsValue::from_str(&format!("Invalid registration form: {}", e)))
}

/// Client-side registration checks; rejects with the message to show.
#[wasm_bindgen]
pub fn validate_registration(form: JsValue) -> Result<(), JsValue> {
    parse_form(form)?
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Validate the form and build the register request body, attaching the
/// cropped avatar data URL when there is one.
#[wasm_bindgen]
pub fn registration_payload(form: JsValue, user_image: Option<String>) -> Result<JsValue, JsValue> {
    let form = parse_form(form)?;
    form.validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_plain_object(&form.into_payload(user_image))
}

fn parse_action(action: &str) -> FormAction {
    if action.eq_ignore_ascii_case("register") {
        FormAction::Register
    } else {
        FormAction::Login
    }
}

/// Message for a failed "register" or "login" request given the response
/// body.
#[wasm_bindgen]
pub fn server_error_message(body: Option<String>, action: &str) -> String {
    form::server_error_message(body.as_deref(), parse_action(action))
}
