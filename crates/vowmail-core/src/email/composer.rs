/// Pure guest email composition with per-wedding template overrides.
///
/// Merge-field substitution is plain text replacement over a fixed,
/// enumerable field set; there is no template language and no code
/// execution. Unknown merge fields are left as literal text.
use crate::error::VowmailError;
use crate::models::{EmailTemplateOverride, EmailType, Guest, Wedding};

/// Fully rendered content, ready for the transport sender
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ComposedEmail {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// The enumerated merge-field set. Substitution never goes beyond this list.
struct MergeContext<'a> {
    guest_name: &'a str,
    partner_names: String,
    wedding_date: String,
    venue: &'a str,
    city: &'a str,
    rsvp_link: String,
}

impl MergeContext<'_> {
    fn apply(&self, template: &str) -> String {
        template
            .replace("{{guest_name}}", self.guest_name)
            .replace("{{partner_names}}", &self.partner_names)
            .replace("{{wedding_date}}", &self.wedding_date)
            .replace("{{venue}}", self.venue)
            .replace("{{city}}", self.city)
            .replace("{{rsvp_link}}", &self.rsvp_link)
    }
}

/// Composes guest emails. Pure: no I/O, no storage reads; the single-use
/// RSVP secret is handed in by the caller right after regeneration and is
/// never persisted here.
pub struct EmailComposer {
    site_base_url: String,
}

impl EmailComposer {
    pub fn new(site_base_url: impl Into<String>) -> Self {
        let mut base = site_base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { site_base_url: base }
    }

    pub fn from_env() -> Result<Self, VowmailError> {
        let base = std::env::var("SITE_BASE_URL")
            .map_err(|_| VowmailError::Config("Missing SITE_BASE_URL".to_string()))?;
        Ok(Self::new(base))
    }

    /// Renders subject, HTML body and text body for one guest.
    ///
    /// `raw_secret` is required for invitation and reminder emails and
    /// ignored for the other types.
    pub fn compose(
        &self,
        email_type: EmailType,
        guest: &Guest,
        wedding: &Wedding,
        raw_secret: Option<&str>,
    ) -> Result<ComposedEmail, VowmailError> {
        if email_type.needs_secret() && raw_secret.is_none() {
            return Err(VowmailError::Validation(format!(
                "{} emails require a freshly regenerated RSVP secret",
                email_type.as_str()
            )));
        }

        let rsvp_link = match raw_secret {
            Some(secret) if email_type.needs_secret() => format!(
                "{}/{}/rsvp?token={}",
                self.site_base_url, wedding.slug, secret
            ),
            _ => format!("{}/{}", self.site_base_url, wedding.slug),
        };

        let ctx = MergeContext {
            guest_name: &guest.name,
            partner_names: wedding.partner_names(),
            wedding_date: wedding.formatted_date(),
            venue: &wedding.venue,
            city: &wedding.city,
            rsvp_link,
        };

        let override_template = wedding.templates.get(&email_type);
        let defaults = default_template(email_type);

        let subject = ctx.apply(pick(override_template, |t| &t.subject, defaults.subject));
        let greeting = ctx.apply(pick(override_template, |t| &t.greeting, defaults.greeting));
        let body = ctx.apply(pick(override_template, |t| &t.body, defaults.body));
        let closing = ctx.apply(pick(override_template, |t| &t.closing, defaults.closing));

        let text_body = format!("{}\n\n{}\n\n{}", greeting, body, closing);
        let html_body = render_html(wedding, &greeting, &body, &closing, email_type, &ctx);

        Ok(ComposedEmail {
            to: guest.email.clone(),
            to_name: guest.name.clone(),
            subject,
            html_body,
            text_body,
        })
    }
}

fn pick<'a>(
    template: Option<&'a EmailTemplateOverride>,
    field: impl Fn(&'a EmailTemplateOverride) -> &'a Option<String>,
    default: &'a str,
) -> &'a str {
    template
        .and_then(|t| field(t).as_deref())
        .unwrap_or(default)
}

struct DefaultTemplate {
    subject: &'static str,
    greeting: &'static str,
    body: &'static str,
    closing: &'static str,
}

/// The documented default wording used when a wedding has no override.
fn default_template(email_type: EmailType) -> DefaultTemplate {
    match email_type {
        EmailType::Invitation => DefaultTemplate {
            subject: "You're invited to the wedding of {{partner_names}}",
            greeting: "Dear {{guest_name}},",
            body: "{{partner_names}} joyfully invite you to celebrate their wedding \
                   on {{wedding_date}} at {{venue}}, {{city}}.\n\n\
                   Please let us know whether you can join us: {{rsvp_link}}",
            closing: "With love,\n{{partner_names}}",
        },
        EmailType::Reminder => DefaultTemplate {
            subject: "A gentle reminder to RSVP — {{partner_names}}",
            greeting: "Dear {{guest_name}},",
            body: "Just a friendly reminder that {{partner_names}} are getting married \
                   on {{wedding_date}} at {{venue}}, {{city}}, and we have not yet \
                   received your RSVP.\n\n\
                   You can respond here: {{rsvp_link}}",
            closing: "Warmly,\n{{partner_names}}",
        },
        EmailType::SaveTheDate => DefaultTemplate {
            subject: "Save the date — {{partner_names}}, {{wedding_date}}",
            greeting: "Dear {{guest_name}},",
            body: "{{partner_names}} are getting married on {{wedding_date}} in {{city}}. \
                   A formal invitation will follow — for now, please save the date!",
            closing: "With love,\n{{partner_names}}",
        },
        EmailType::ThankYou => DefaultTemplate {
            subject: "Thank you, from {{partner_names}}",
            greeting: "Dear {{guest_name}},",
            body: "Thank you so much for being part of our wedding day. Your presence \
                   meant the world to us.",
            closing: "With all our love,\n{{partner_names}}",
        },
        EmailType::Update => DefaultTemplate {
            subject: "An update about the wedding of {{partner_names}}",
            greeting: "Dear {{guest_name}},",
            body: "We have an update about the wedding on {{wedding_date}} at {{venue}}, \
                   {{city}}. Details are available on our wedding site: {{rsvp_link}}",
            closing: "Warmly,\n{{partner_names}}",
        },
    }
}

fn render_html(
    wedding: &Wedding,
    greeting: &str,
    body: &str,
    closing: &str,
    email_type: EmailType,
    ctx: &MergeContext<'_>,
) -> String {
    let button = if email_type.needs_secret() {
        format!(
            r#"<p style="text-align:center;margin:28px 0;">
  <a href="{link}" style="background:{accent};color:#ffffff;padding:12px 28px;border-radius:4px;text-decoration:none;">RSVP now</a>
</p>"#,
            link = ctx.rsvp_link,
            accent = wedding.theme.accent_color,
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<body style="margin:0;padding:0;background:#faf8f5;font-family:Georgia,serif;">
  <div style="max-width:600px;margin:0 auto;padding:32px;">
    <h1 style="color:{primary};text-align:center;font-weight:normal;">{partner_names}</h1>
    <p>{greeting}</p>
    {body_html}
    {button}
    <p style="white-space:pre-line;">{closing}</p>
  </div>
</body>
</html>"#,
        primary = wedding.theme.primary_color,
        partner_names = ctx.partner_names,
        greeting = greeting,
        body_html = body
            .split("\n\n")
            .map(|p| format!("<p>{}</p>", p))
            .collect::<Vec<_>>()
            .join("\n    "),
        button = button,
        closing = closing,
    )
}
