pub mod client;
pub mod notify;
pub mod presenter;
pub mod session;
pub mod source;
pub mod throttle;

pub use client::{ApiClient, ClientError, Health, Prediction, PredictionService};
pub use notify::{Notifier, NotifyError, NotifyOutcome};
pub use presenter::{FrameView, LogPresenter, Presenter, ServerStatus, Tier};
pub use session::Session;
pub use source::{LandmarkSource, ReplaySource, SourceError};
