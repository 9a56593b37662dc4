/// Email bodies
///
/// Each template renders a plain-text and an HTML body; user-supplied values
/// are escaped before they go into the HTML.
use chrono::{DateTime, Utc};

use super::OutgoingEmail;

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; background: #f5f5f5; margin: 0; }}
        .card {{ max-width: 560px; margin: 40px auto; background: white; border-radius: 8px; padding: 32px; }}
        h1 {{ font-size: 22px; margin-top: 0; }}
        .button {{ display: inline-block; padding: 10px 18px; border-radius: 6px; text-decoration: none; color: white; background: #2563eb; margin-right: 8px; }}
        .button.secondary {{ background: #6b7280; }}
        .footer {{ margin-top: 24px; color: #888; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="card">
        <h1>{}</h1>
        {}
        <div class="footer">TaskHub</div>
    </div>
</body>
</html>"#,
        escape_html(title),
        body
    )
}

/// Sent after registration
pub fn welcome(to: &str, full_name: &str) -> OutgoingEmail {
    let subject = "Welcome to TaskHub".to_string();

    let text = format!(
        "Hi {},\n\nYour TaskHub account is ready. Create a project or wait for an invitation to join one.\n\n--\nTaskHub",
        full_name
    );

    let html = html_page(
        &subject,
        &format!(
            "<p>Hi {},</p><p>Your TaskHub account is ready. Create a project or wait for an invitation to join one.</p>",
            escape_html(full_name)
        ),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        text,
        html,
    }
}

/// Values for an invitation email
#[derive(Debug, Clone)]
pub struct InvitationEmail<'a> {
    pub to: &'a str,
    pub project_name: &'a str,
    pub inviter_name: &'a str,
    pub accept_url: &'a str,
    pub decline_url: &'a str,
    pub expires_at: DateTime<Utc>,
}

/// Sent when a Leader invites someone
pub fn invitation(data: &InvitationEmail<'_>) -> OutgoingEmail {
    let subject = format!("You've been invited to join {} on TaskHub", data.project_name);
    let expires = data.expires_at.format("%Y-%m-%d %H:%M UTC");

    let text = format!(
        "{inviter} invited you to join the project \"{project}\".\n\n\
         Accept: {accept}\n\
         Decline: {decline}\n\n\
         This invitation expires on {expires}.\n\n--\nTaskHub",
        inviter = data.inviter_name,
        project = data.project_name,
        accept = data.accept_url,
        decline = data.decline_url,
        expires = expires,
    );

    let html = html_page(
        &subject,
        &format!(
            r#"<p>{inviter} invited you to join the project <strong>{project}</strong>.</p>
        <p><a class="button" href="{accept}">Accept</a><a class="button secondary" href="{decline}">Decline</a></p>
        <p>This invitation expires on {expires}.</p>"#,
            inviter = escape_html(data.inviter_name),
            project = escape_html(data.project_name),
            accept = escape_html(data.accept_url),
            decline = escape_html(data.decline_url),
            expires = expires,
        ),
    );

    OutgoingEmail {
        to: data.to.to_string(),
        subject,
        text,
        html,
    }
}

/// Sent by the deadline notifier
pub fn deadline_warning(
    to: &str,
    assignee_name: &str,
    task_title: &str,
    project_name: &str,
    deadline: DateTime<Utc>,
) -> OutgoingEmail {
    let subject = format!("Deadline approaching: {}", task_title);
    let due = deadline.format("%Y-%m-%d %H:%M UTC");

    let text = format!(
        "Hi {},\n\nYour task \"{}\" in project \"{}\" is due on {}.\n\n--\nTaskHub",
        assignee_name, task_title, project_name, due
    );

    let html = html_page(
        &subject,
        &format!(
            "<p>Hi {},</p><p>Your task <strong>{}</strong> in project <strong>{}</strong> is due on {}.</p>",
            escape_html(assignee_name),
            escape_html(task_title),
            escape_html(project_name),
            due
        ),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        text,
        html,
    }
}
