use hmac::{Mac as _, NewMac as _};
use sha1::Sha1;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`X-Hub-Signature` header isn't found")]
    HeaderNotFound,
    #[error("`X-Hub-Signature` has invalid length")]
    InvalidLength,
    #[error("`X-Hub-Signature` must start with `sha1=`")]
    InvalidPrefix,
    #[error("signature must be 40 hex digits")]
    NotHex,
}

#[derive(Debug, Clone)]
pub struct Signature(pub [u8; 20]);

impl Signature {
    pub fn from_headers(headers: &actix_web::http::HeaderMap) -> Result<Self, Error> {
        let sig_b = headers
            .get("X-Hub-Signature")
            .ok_or(Error::HeaderNotFound)?
            .as_ref();

        let prefix = b"sha1=";
        let prefix_len = prefix.len();
        if sig_b.len() != 40 + prefix_len {
            return Err(Error::InvalidLength);
        }
        let (sig_prefix, sig_b) = sig_b.split_at(prefix_len);
        if sig_prefix != prefix {
            return Err(Error::InvalidPrefix);
        }

        hex::FromHex::from_hex(sig_b)
            .map(Self)
            .map_err(|_| Error::NotHex)
    }
}

/// Checks `signature` against `HMAC-SHA1(key, body)`. The comparison goes
/// through `Mac::verify`, so its running time doesn't depend on where the
/// digests first differ.
pub fn verify(key: &[u8], body: &[u8], signature: &Signature) -> bool {
    let mut mac = match hmac::Hmac::<Sha1>::new_varkey(key) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify(&signature.0).is_ok()
}
