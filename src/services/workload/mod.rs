// 模擬ワークロード
// 遅延を伴う問い合わせを模した作業単位

pub mod simulated;

// 公開API
pub use simulated::{RecordingQuery, SimulatedQuery};
