//! Request tokens for discarding late responses.
//!
//! Each logical query (catalog page, presence, account balance) owns a
//! [`RequestTokens`] counter. Issuing a new token makes every earlier token
//! stale, so a response that resolves after the account, page or chain moved
//! on can be recognised and dropped.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct RequestTokens {
    latest: u64,
}

impl RequestTokens {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    /// Makes all outstanding tokens stale without starting a new request.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}
