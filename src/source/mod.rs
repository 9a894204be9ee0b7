// Upstream access: the conference API client, its body decoding and connectivity reports.

pub mod diagnostics;
pub mod http_source;
pub mod payload;
pub mod traits;
