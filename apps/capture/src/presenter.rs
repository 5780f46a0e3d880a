use std::fmt;

/// Color band of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Idle,
    High,
    Medium,
    Low,
    Error,
}

impl Tier {
    pub fn for_confidence(confidence: f32) -> Self {
        if confidence > 0.8 {
            Tier::High
        } else if confidence > 0.6 {
            Tier::Medium
        } else {
            Tier::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    Unknown,
    Reachable { model_loaded: bool },
    Unreachable(String),
}

/// Everything the rendering surface needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub hands: usize,
    pub text: String,
    pub tier: Tier,
    pub error: Option<String>,
    pub server: ServerStatus,
}

impl fmt::Display for FrameView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        if let Some(error) = &self.error {
            // one overlay line
            let short: String = error.chars().take(80).collect();
            write!(f, " | {short}")?;
        }
        Ok(())
    }
}

pub trait Presenter {
    fn render(&mut self, view: &FrameView);
}

/// Writes the status line through `tracing` whenever it changes.
#[derive(Debug, Default)]
pub struct LogPresenter {
    last: Option<FrameView>,
}

impl Presenter for LogPresenter {
    fn render(&mut self, view: &FrameView) {
        if self.last.as_ref() == Some(view) {
            return;
        }
        match view.tier {
            Tier::Error => tracing::warn!(hands = view.hands, "{}", view),
            _ => tracing::info!(hands = view.hands, tier = ?view.tier, "{}", view),
        }
        if self.last.as_ref().map(|last| &last.server) != Some(&view.server) {
            tracing::info!(server = ?view.server, "server status");
        }
        self.last = Some(view.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_tiers() {
        assert_eq!(Tier::for_confidence(0.95), Tier::High);
        assert_eq!(Tier::for_confidence(0.8), Tier::Medium);
        assert_eq!(Tier::for_confidence(0.61), Tier::Medium);
        assert_eq!(Tier::for_confidence(0.6), Tier::Low);
    }

    #[test]
    fn long_errors_are_cut() {
        let view = FrameView {
            hands: 1,
            text: "SERVER_ERROR (0.0%)".into(),
            tier: Tier::Error,
            error: Some("x".repeat(200)),
            server: ServerStatus::Unknown,
        };
        assert_eq!(view.to_string().len(), "SERVER_ERROR (0.0%) | ".len() + 80);
    }
}
