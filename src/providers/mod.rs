mod google;
mod service_account;
mod sources;
mod traits;

pub use google::GoogleOAuth;
pub use service_account::{ServiceAccountKey, ServiceAccountSource, JWT_BEARER_GRANT};
pub use sources::{FileTokenSource, RefreshTokenSource, StaticTokenSource};
pub use traits::{TokenSet, TokenSource};
