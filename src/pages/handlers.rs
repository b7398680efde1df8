use axum::response::Html;

use crate::api::v1::extractors::{CurrentSession, MaybeSession};
use crate::error::AppError;
use crate::services::identity::{Check, Role, check_role};

const INVOICE_PERMISSION: &str = "invoices:create";

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html lang=\"en\"><head><title>{title}</title></head>\
         <body><main>{body}</main></body></html>"
    ))
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

pub async fn home(MaybeSession(session): MaybeSession) -> Html<String> {
    let body = match session {
        Some(s) if s.is_authenticated() => {
            "<h1>Welcome back</h1><a href=\"/dashboard\">Dashboard</a>".to_string()
        }
        Some(s) if s.is_pending() => {
            "<h1>Almost there</h1><a href=\"/session-tasks\">Finish signing in</a>".to_string()
        }
        _ => "<h1>Welcome</h1><p>Sign in or sign up to get started.</p>".to_string(),
    };
    page("Home", &body)
}

pub async fn dashboard(CurrentSession(session): CurrentSession) -> Html<String> {
    let user = session.user_id.as_deref().unwrap_or("unknown");
    page(
        "Dashboard",
        &format!("<h1>Dashboard</h1><p>Signed in as {}</p>", escape(user)),
    )
}

// The gate already enforces `role=admin` by default; this holds even if the rule is reconfigured.
pub async fn admin(CurrentSession(session): CurrentSession) -> Result<Html<String>, AppError> {
    if !check_role(&session, Role::Admin) {
        return Err(AppError::Forbidden);
    }
    Ok(page(
        "Admin",
        "<p>This is the protected admin dashboard restricted to users with the `admin` role.</p>",
    ))
}

pub async fn example(CurrentSession(session): CurrentSession) -> Html<String> {
    if session.has(&Check::Permission(INVOICE_PERMISSION.to_string())) {
        page("Example", "<h1>Our Exclusive Content</h1>")
    } else {
        page(
            "Example",
            "<h1>Only subscribers with the Premium Access Manage permission can access this content.</h1>",
        )
    }
}

pub async fn session_tasks(MaybeSession(session): MaybeSession) -> Html<String> {
    let tasks = session
        .filter(|s| s.is_pending())
        .map(|s| s.tasks)
        .unwrap_or_default();

    if tasks.is_empty() {
        return page("Session tasks", "<p>No outstanding session tasks.</p>");
    }

    let items: String = tasks
        .iter()
        .map(|t| format!("<li>{}</li>", escape(t)))
        .collect();
    page(
        "Session tasks",
        &format!("<h1>Finish signing in</h1><ul>{}</ul>", items),
    )
}
