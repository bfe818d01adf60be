/// Server address handling.
///
/// The operator passes one base URL. Admin calls go to `{base}/admin` over
/// http(s), the stream to `{base}/ws` over ws(s). Either family of scheme is
/// accepted on the command line and mapped to the other as needed.

use reqwest::Url;

use crate::net::session::SetupError;

#[derive(Clone, Debug)]
pub struct ServerUrl {
    base: Url,
}

impl ServerUrl {
    pub fn parse(raw: &str) -> Result<Self, SetupError> {
        let bad = |reason: String| SetupError::BadUrl { url: raw.to_string(), reason };

        let mut base = Url::parse(raw).map_err(|e| bad(e.to_string()))?;
        let http_scheme = match base.scheme() {
            "http" | "ws" => "http",
            "https" | "wss" => "https",
            other => return Err(bad(format!("unsupported scheme `{other}`"))),
        };
        base.set_scheme(http_scheme)
            .map_err(|_| bad(format!("cannot use scheme `{http_scheme}`")))?;
        base.set_query(None);
        base.set_fragment(None);
        Ok(ServerUrl { base })
    }

    /// `POST` target for one admin setting, e.g. `admin("rate", "5")`.
    pub fn admin(&self, key: &str, value: &str) -> Url {
        let mut url = self.join("admin");
        url.query_pairs_mut().append_pair(key, value);
        url
    }

    /// WebSocket endpoint carrying the snapshot stream.
    pub fn stream(&self) -> Url {
        let mut url = self.join("ws");
        let ws_scheme = if self.base.scheme() == "https" { "wss" } else { "ws" };
        // http→ws and https→wss are both special-to-special, always allowed
        let _ = url.set_scheme(ws_scheme);
        url
    }

    fn join(&self, segment: &str) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}/{segment}", self.base.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }
}
