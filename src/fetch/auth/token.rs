use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

use crate::fetch::HttpClient;
use crate::services::SemsError;

/// Header SEMS reads the session from.
pub const TOKEN_HEADER: &str = "Token";

/// An [`HttpClient`] wrapper that sends a SEMS token in the `Token` header.
pub struct TokenHeader<'a, C: ?Sized> {
    inner: &'a C,
    value: HeaderValue,
}

impl<'a, C: ?Sized> TokenHeader<'a, C> {
    pub fn new(inner: &'a C, token: &str) -> Result<Self, SemsError> {
        let value = HeaderValue::from_str(token)
            .map_err(|_| SemsError::Auth("token is not a valid header value".into()))?;
        Ok(Self { inner, value })
    }
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for TokenHeader<'_, C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut().insert(TOKEN_HEADER, self.value.clone());
        self.inner.execute(req).await
    }
}

#[derive(Serialize)]
struct PreLogin<'a> {
    uid: &'a str,
    timestamp: u64,
    token: &'a str,
    client: &'a str,
    version: &'a str,
    language: &'a str,
}

/// Anonymous token the login call itself is sent with.
pub fn pre_login_token() -> String {
    let blank = PreLogin {
        uid: "",
        timestamp: 0,
        token: "",
        client: "web",
        version: "",
        language: "en",
    };
    STANDARD.encode(spaced_json(&blank))
}

/// Session token derived from the login response's `data` object.
pub fn session_token(data: &serde_json::Value) -> String {
    STANDARD.encode(spaced_json(data))
}

/// JSON with `", "` and `": "` separators and non-ASCII escaped as `\uXXXX`,
/// the byte layout the portal's own web client produces.
fn spaced_json<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    // Writing plain data into a Vec cannot fail.
    if value.serialize(&mut ser).is_err() {
        out.clear();
    }
    out
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units).iter() {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}
