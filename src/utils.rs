use actix_web::{http::header, HttpRequest};

/// Left-justify `text` in a column of `width` characters. Longer input is
/// returned untouched.
pub fn pad_right(width: usize, text: &str) -> String {
    format!("{:<width$}", text, width = width)
}

/// Split a `host:port` pair and return the host part.
///
/// IPv6 hosts must be bracketed (`[::1]:80`). A missing port, unbracketed
/// colons in the host or stray brackets are all rejected.
pub fn split_host_port(addr: &str) -> Option<&str> {
    let colon = addr.rfind(':')?;
    let (host, _port) = (&addr[..colon], &addr[colon + 1..]);

    if let Some(inner) = host.strip_prefix('[') {
        let inner = inner.strip_suffix(']')?;
        if inner.contains('[') || inner.contains(']') {
            return None;
        }
        return Some(inner);
    }

    if host.contains(':') || host.contains('[') || host.contains(']') {
        return None;
    }
    Some(host)
}

pub trait RequestPeer {
    /// The peer address of the connection as `host:port`, or an empty string
    /// when the server doesn't know it.
    ///
    /// Forwarding headers are deliberately not consulted: this is the hop the
    /// server actually talks to.
    fn remote_addr(&self) -> String;

    /// The `Host` the client asked for, falling back to the URI authority.
    fn requested_host(&self) -> String;

    /// Value of a request header, empty if it is absent or not valid text.
    fn header_str(&self, name: header::HeaderName) -> String;
}

impl RequestPeer for HttpRequest {
    fn remote_addr(&self) -> String {
        self.peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }

    fn requested_host(&self) -> String {
        self.headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .or_else(|| self.uri().authority().map(|a| a.to_string()))
            .unwrap_or_default()
    }

    fn header_str(&self, name: header::HeaderName) -> String {
        self.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .unwrap_or_default()
    }
}
