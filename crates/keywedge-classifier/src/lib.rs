pub mod analysis;
pub mod buffer;
pub mod classifier;
pub mod machine;
pub mod observer;
pub mod replay;

pub use analysis::analyze;
pub use buffer::{InputBuffer, InputEvent};
pub use classifier::{Classifier, ClassifierCommand, ClassifierHandle};
pub use machine::BurstClassifier;
pub use observer::{AnalysisObserver, ChannelObserver, TracingObserver};
pub use replay::{load_replay, parse_replay, run_replay, ReplayEntry, ReplayEvent, ReplayReport};
