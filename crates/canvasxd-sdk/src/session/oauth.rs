use std::sync::{Arc, PoisonError, RwLock};

use canvasxd_core::protocol::envelope::ClientDescriptor;
use canvasxd_core::protocol::hash::{decode_component, parse_hash_fragment};
use canvasxd_core::protocol::url::strip_url;

use super::store::{KeyValueStore, ACCESS_TOKEN_KEY, INSTANCE_URL_KEY};
use crate::host::FrameHost;

pub const AUTHORIZE_PATH: &str = "/services/oauth2/authorize";

#[derive(Debug, Default)]
struct State {
    token: Option<String>,
    instance_url: Option<String>,
    instance_id: Option<String>,
    target_origin: Option<String>,
}

fn present(v: &Option<String>) -> Option<String> {
    v.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

pub struct Session {
    host: Arc<dyn FrameHost>,
    store: Arc<dyn KeyValueStore>,
    login_base: String,
    state: RwLock<State>,
}

impl Session {
    pub fn new(host: Arc<dyn FrameHost>, store: Arc<dyn KeyValueStore>, login_base: &str) -> Self {
        Self {
            host,
            store,
            login_base: login_base.trim_end_matches('/').to_string(),
            state: RwLock::new(State::default()),
        }
    }

    /// Pick up a token parked by `prepare_reload` and clear it from storage.
    pub fn init(&self) {
        let token = self.store.get(ACCESS_TOKEN_KEY);
        self.store.remove(ACCESS_TOKEN_KEY);
        if token.is_some() {
            tracing::debug!("access token restored from storage");
        }
        self.write().token = token;
    }

    pub fn token(&self) -> Option<String> {
        present(&self.read().token)
    }

    pub fn set_token(&self, token: Option<String>) {
        self.write().token = token;
    }

    /// Cached instance URL, falling back to storage.
    pub fn instance_url(&self) -> Option<String> {
        if let Some(url) = present(&self.read().instance_url) {
            return Some(url);
        }
        let stored = self.store.get(INSTANCE_URL_KEY);
        self.write().instance_url = stored.clone();
        stored
    }

    /// `None` clears both the cache and storage.
    pub fn set_instance_url(&self, url: Option<&str>) {
        match url {
            Some(u) => self.store.set(INSTANCE_URL_KEY, u),
            None => self.store.remove(INSTANCE_URL_KEY),
        }
        self.write().instance_url = url.map(str::to_string);
    }

    /// Apply the `key=value` pairs of a hash fragment. Unknown keys are
    /// ignored and absent keys leave the current value alone.
    pub fn parse_hash(&self, hash: &str) {
        let params = parse_hash_fragment(hash);
        if params.is_empty() {
            return;
        }
        if let Some(url) = params.instance_url.as_deref() {
            self.set_instance_url(Some(url));
        }
        let mut state = self.write();
        if params.access_token.is_some() {
            state.token = params.access_token;
        }
        if let Some(origin) = params.target_origin {
            state.target_origin = strip_url(&origin).or(Some(origin));
        }
        if params.instance_id.is_some() {
            state.instance_id = params.instance_id;
        }
    }

    /// Final redirect of the OAuth popup: take its fragment and park the
    /// token for the reload that follows. Returns whether a token is held.
    pub fn accept_hash(&self, hash: &str) -> bool {
        self.parse_hash(hash);
        self.prepare_reload();
        self.logged_in()
    }

    /// Park the token in storage; `init` picks it up after the reload.
    pub fn prepare_reload(&self) {
        match self.token() {
            Some(token) => self.store.set(ACCESS_TOKEN_KEY, &token),
            None => self.store.remove(ACCESS_TOKEN_KEY),
        }
    }

    pub fn logout(&self) {
        self.write().token = None;
    }

    pub fn logged_in(&self) -> bool {
        self.token().is_some()
    }

    /// Authorize endpoint. A `loginUrl` query parameter in `search`
    /// overrides the configured login host.
    pub fn login_url(&self, search: Option<&str>) -> String {
        let base = search
            .map(|s| s.trim_start_matches('?'))
            .into_iter()
            .flat_map(|s| s.split('&'))
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == "loginUrl")
            .map(|(_, v)| decode_component(v))
            .unwrap_or_else(|| self.login_base.clone());
        format!("{base}{AUTHORIZE_PATH}")
    }

    pub fn instance_id(&self) -> Option<String> {
        if let Some(id) = present(&self.read().instance_id) {
            return Some(id);
        }
        self.parse_document_hash();
        present(&self.read().instance_id)
    }

    pub fn set_instance_id(&self, id: impl Into<String>) {
        self.write().instance_id = Some(id.into());
    }

    pub fn target_origin(&self) -> Option<String> {
        if let Some(origin) = present(&self.read().target_origin) {
            return Some(origin);
        }
        self.parse_document_hash();
        present(&self.read().target_origin)
    }

    pub fn set_target_origin(&self, origin: impl Into<String>) {
        self.write().target_origin = Some(origin.into());
    }

    /// Descriptor for calls made without an explicit client.
    pub fn client(&self) -> ClientDescriptor {
        // Lazy lookups first: parsing the hash may also supply the token.
        let instance_id = self.instance_id();
        let target_origin = self.target_origin();
        ClientDescriptor {
            oauth_token: self.token(),
            instance_id,
            target_origin,
            is_vf: false,
        }
    }

    fn parse_document_hash(&self) {
        if let Some(hash) = self.host.location_hash() {
            self.parse_hash(&hash);
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::session::MemoryStore;

    fn session(host: MemoryHost, store: Arc<MemoryStore>) -> Session {
        Session::new(Arc::new(host), store, "https://login.salesforce.com")
    }

    #[test]
    fn init_consumes_parked_token() {
        let store = Arc::new(MemoryStore::new().with_entry(ACCESS_TOKEN_KEY, "tok"));
        let s = session(MemoryHost::new(), Arc::clone(&store));
        s.init();
        assert_eq!(s.token().as_deref(), Some("tok"));
        assert!(store.get(ACCESS_TOKEN_KEY).is_none());

        s.prepare_reload();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok"));
    }

    #[test]
    fn client_reads_document_hash_lazily() {
        let host = MemoryHost::new().with_hash(
            "#access_token=abc&instance_id=inst1&target_origin=https%253A%252F%252Fna1.example.com%252Fpath",
        );
        let s = session(host, Arc::new(MemoryStore::new()));
        let c = s.client();
        assert_eq!(c.oauth_token.as_deref(), Some("abc"));
        assert_eq!(c.instance_id.as_deref(), Some("inst1"));
        assert_eq!(c.target_origin.as_deref(), Some("https://na1.example.com"));
    }

    #[test]
    fn explicit_values_win_over_document_hash() {
        let host = MemoryHost::new().with_hash("#instance_id=from-hash&target_origin=https%253A%252F%252Fhash.example.com");
        let s = session(host, Arc::new(MemoryStore::new()));
        s.set_instance_id("explicit");
        s.set_target_origin("https://explicit.example.com");
        s.set_token(Some("t".into()));

        let c = s.client();
        assert_eq!(c.instance_id.as_deref(), Some("explicit"));
        assert_eq!(c.target_origin.as_deref(), Some("https://explicit.example.com"));
        assert!(c.validate(None).is_ok());
    }

    #[test]
    fn instance_url_backed_by_store() {
        let store = Arc::new(MemoryStore::new().with_entry(INSTANCE_URL_KEY, "https://na1.example.com"));
        let s = session(MemoryHost::new(), Arc::clone(&store));
        assert_eq!(s.instance_url().as_deref(), Some("https://na1.example.com"));
        s.set_instance_url(None);
        assert!(s.instance_url().is_none());
        assert!(store.get(INSTANCE_URL_KEY).is_none());
    }

    #[test]
    fn logout_clears_token() {
        let s = session(MemoryHost::new(), Arc::new(MemoryStore::new()));
        assert!(s.accept_hash("#access_token=t1"));
        s.logout();
        assert!(!s.logged_in());
    }

    #[test]
    fn login_url_honours_query_override() {
        let s = session(MemoryHost::new(), Arc::new(MemoryStore::new()));
        assert_eq!(
            s.login_url(None),
            "https://login.salesforce.com/services/oauth2/authorize"
        );
        assert_eq!(
            s.login_url(Some("?a=1&loginUrl=https%3A%2F%2Ftest.salesforce.com")),
            "https://test.salesforce.com/services/oauth2/authorize"
        );
    }
}
