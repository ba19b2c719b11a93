pub mod metrics;
pub mod relay;
pub mod upstream;

pub use metrics::{get_metrics, init_metrics};
pub use relay::{check_method, RelayHandler, RelayOptions, RelayResponse};
pub use upstream::{GeminiUpstream, GeminiUpstreamConfig, ImageUpstream, UpstreamReply};
