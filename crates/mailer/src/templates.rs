//! HTML bodies of the emails the platform sends.

use crate::Email;
use core_types::PlanKind;

fn plan_label(plan: PlanKind) -> &'static str {
    match plan {
        PlanKind::Free => "Free",
        PlanKind::Member => "Member",
        PlanKind::Participant => "Participant",
    }
}

/// Escapes user text for HTML and keeps its line breaks.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\r' => {}
            '\n' => out.push_str("<br>"),
            c => out.push(c),
        }
    }
    out
}

fn layout(body: &str) -> String {
    format!(
        "<div style=\"font-family:sans-serif;line-height:1.5\">{body}\
         <p style=\"color:#888\">GLUE &middot; Berlin</p></div>"
    )
}

fn link(url: &str, label: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape_html(url), escape_html(label))
}

pub fn welcome(to: &str, user_name: &str, plan: PlanKind, site_url: &str) -> Email {
    let body = format!(
        "<p>Hi {},</p><p>welcome to GLUE! Your account with the <strong>{}</strong> plan is ready.</p>\
         <p>{}</p>",
        escape_html(user_name),
        plan_label(plan),
        link(&format!("{}/login", site_url.trim_end_matches('/')), "Sign in to your profile"),
    );
    Email::new(to, "Welcome to GLUE", layout(&body))
}

/// Tells the moderators that an inactive participant wants back in.
pub fn reactivation_requested(
    moderators: &[String],
    participant: &str,
    message: Option<&str>,
    site_url: &str,
) -> Email {
    let message = match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => format!("<blockquote>{}</blockquote>", escape_html(m)),
        None => String::new(),
    };
    let body = format!(
        "<p><strong>{}</strong> asked to be reactivated for the current tour.</p>{}<p>{}</p>",
        escape_html(participant),
        message,
        link(&format!("{}/admin/reactivations", site_url.trim_end_matches('/')), "Review requests"),
    );
    Email {
        to: moderators.to_vec(),
        subject: format!("Reactivation request: {participant}"),
        html: layout(&body),
    }
}

pub fn reactivation_decided(to: &str, participant: &str, approved: bool, site_url: &str) -> Email {
    let (subject, text) = if approved {
        ("Your GLUE profile is active again", "is active again and visible on the map")
    } else {
        ("Your GLUE reactivation request", "could not be reactivated for this tour")
    };
    let body = format!(
        "<p>Hi,</p><p>your profile <strong>{}</strong> {}.</p><p>{}</p>",
        escape_html(participant),
        text,
        link(site_url, "Visit GLUE"),
    );
    Email::new(to, subject, layout(&body))
}

/// A moderator-written message; the body is plain text.
pub fn broadcast(to: &str, subject: &str, body: &str) -> Email {
    Email::new(to, subject.trim(), layout(&format!("<p>{}</p>", escape_html(body))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_keeps_line_breaks() {
        assert_eq!(
            escape_html("<b>Tom & \"Jerry\"</b>\r\nline 2"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;<br>line 2"
        );
    }

    #[test]
    fn welcome_mentions_the_plan_and_escapes_the_name() {
        let email = welcome("a@example.com", "<script>", PlanKind::Member, "https://glue.berlin/");
        assert_eq!(email.to, vec!["a@example.com".to_string()]);
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("<strong>Member</strong>"));
        assert!(email.html.contains("https://glue.berlin/login"));
    }

    #[test]
    fn reactivation_request_goes_to_all_moderators() {
        let moderators = vec!["m1@example.com".to_string(), "m2@example.com".to_string()];
        let email = reactivation_requested(&moderators, "Studio A", Some("We are back!\nSee you"), "https://glue.berlin");
        assert_eq!(email.to, moderators);
        assert_eq!(email.subject, "Reactivation request: Studio A");
        assert!(email.html.contains("We are back!<br>See you"));

        let email = reactivation_requested(&moderators, "Studio A", Some("   "), "https://glue.berlin");
        assert!(!email.html.contains("blockquote"));
    }

    #[test]
    fn decision_wording_depends_on_the_outcome() {
        let yes = reactivation_decided("p@example.com", "Studio A", true, "https://glue.berlin");
        let no = reactivation_decided("p@example.com", "Studio A", false, "https://glue.berlin");
        assert!(yes.html.contains("active again"));
        assert!(no.html.contains("could not be reactivated"));
        assert_ne!(yes.subject, no.subject);
    }

    #[test]
    fn broadcast_body_is_plain_text() {
        let email = broadcast("x@example.com", " News ", "Line <1>\nLine 2");
        assert_eq!(email.subject, "News");
        assert!(email.html.contains("Line &lt;1&gt;<br>Line 2"));
    }
}
