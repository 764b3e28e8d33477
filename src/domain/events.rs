#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// One command line typed by the user.
    Line(String),
    QuitRequested,
}
