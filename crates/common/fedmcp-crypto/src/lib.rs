pub mod jws;

pub use jws::{
    sign_detached_jws, verify_detached_jws, Algorithm, DetachedJws, JwsError, JwsHeader,
    JWS_TYPE,
};
