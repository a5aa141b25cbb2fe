/// Capability for driving the host conversation composer with synthetic
/// user input. Implementations own the selectors and event mechanics; the
/// delivery paths only decide what to do and in which order.
pub trait InputSimulator: Send + Sync {
    /// Focus the composer. Returns false when no composer is present.
    fn focus_composer(&self) -> bool;

    /// Select-all and delete whatever the composer currently holds.
    fn clear_composer(&self);

    /// Insert one line of text at the caret.
    fn insert_text_line(&self, line: &str);

    /// Insert a line break without submitting (the Shift+Enter equivalent;
    /// the host treats a plain newline as submit).
    fn insert_line_break(&self);

    /// Dispatch the input/change events the host needs to notice the new
    /// composer content.
    fn dispatch_input_events(&self);

    /// Dispatch a synthetic Enter keydown/keyup pair to submit.
    fn press_enter(&self);

    /// Make the hidden file-attachment input available, clicking the
    /// "attach files" control if the host requires it. Returns false when
    /// no attachment input can be found.
    fn reveal_attachment_input(&self) -> bool;

    /// Assign `bytes` as a synthetic file selection and dispatch the change
    /// event. Returns false when the assignment is rejected.
    fn attach_file(&self, bytes: &[u8], mime: &str) -> bool;

    /// Whether an attachment preview is currently visible in the composer.
    fn attachment_preview_visible(&self) -> bool;
}
