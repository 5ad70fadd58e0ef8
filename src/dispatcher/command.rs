//! Presentation command templates

use serde::{Deserialize, Serialize};

use crate::notification::Notification;

/// A concrete program invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {:?}", arg)?;
        }
        Ok(())
    }
}

/// Program + argument template used to show a notification
///
/// Arguments may contain `{summary}`, `{body}`, `{application}`, `{icon}`,
/// `{urgency}` and `{id}`, replaced with the notification's fields. The
/// program exits 0 when the user explicitly dismissed the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PresentationCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn render(&self, notification: &Notification) -> CommandLine {
        CommandLine {
            program: self.program.clone(),
            args: self.args.iter().map(|arg| expand(arg, notification)).collect(),
        }
    }
}

/// Single pass, so braces inside notification text are never expanded.
fn expand(template: &str, notification: &Notification) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let placeholder = tail.find('}').map(|end| &tail[..=end]);
        let value = match placeholder {
            Some("{summary}") => Some(notification.summary.clone()),
            Some("{body}") => Some(notification.body.clone()),
            Some("{application}") => Some(notification.application.clone()),
            Some("{icon}") => Some(notification.app_icon.clone()),
            Some("{urgency}") => Some(notification.urgency.as_str().to_string()),
            Some("{id}") => Some(notification.id.to_string()),
            _ => None,
        };
        match (value, placeholder) {
            (Some(value), Some(placeholder)) => {
                out.push_str(&value);
                rest = &tail[placeholder.len()..];
            }
            _ => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

impl Default for PresentationCommand {
    /// `i3-nagbar -t warning -m "{application}: {summary}"`
    fn default() -> Self {
        Self::new("i3-nagbar", ["-t", "warning", "-m", "{application}: {summary}"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Urgency;

    #[test]
    fn test_render_substitutes_every_placeholder() {
        let template = PresentationCommand::new(
            "show",
            ["{id}", "{application}: {summary}", "{body}", "{icon}", "{urgency}"],
        );
        let n = Notification::new("mail", "New message")
            .with_id(12)
            .with_body("from bob")
            .with_icon("mail-unread")
            .with_urgency(Urgency::Critical);

        let cmd = template.render(&n);
        assert_eq!(cmd.program, "show");
        assert_eq!(
            cmd.args,
            vec!["12", "mail: New message", "from bob", "mail-unread", "CRITICAL"]
        );
    }

    #[test]
    fn test_default_template_is_nagbar() {
        let cmd = PresentationCommand::default().render(&Notification::new("irc", "ping"));
        assert_eq!(cmd.program, "i3-nagbar");
        assert_eq!(cmd.args.last().map(String::as_str), Some("irc: ping"));
    }

    #[test]
    fn test_substituted_text_is_not_reexpanded() {
        let template = PresentationCommand::new("show", ["{summary}"]);
        let cmd = template.render(&Notification::new("a", "literal {body}").with_body("x"));
        assert_eq!(cmd.args, vec!["literal {body}"]);
    }

    #[test]
    fn test_unknown_braces_are_kept() {
        let template = PresentationCommand::new("show", ["{nope} {summary} {"]);
        let cmd = template.render(&Notification::new("a", "hi"));
        assert_eq!(cmd.args, vec!["{nope} hi {"]);
    }
}
