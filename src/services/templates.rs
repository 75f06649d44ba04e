//! HTML email templates for registration and invitation flows.

use crate::services::mailer::EmailMessage;

/// Sender identity and links interpolated into every template.
#[derive(Debug, Clone)]
pub struct Branding {
    pub app_name: String,
    /// Public web app URL, e.g. `https://app.example.com`.
    pub app_domain: String,
    /// Admin panel URL.
    pub admin_domain: String,
    /// `from` address.
    pub sender: String,
    /// Recipients of admin notices.
    pub admin_recipients: Vec<String>,
}

/// Registration decision sent to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// `"approve"` approves; every other value rejects.
    pub fn from_request(value: &str) -> Self {
        if value == "approve" {
            Decision::Approved
        } else {
            Decision::Rejected
        }
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn signature(branding: &Branding) -> String {
    format!(
        "<br /><p>Best regards,</p><p>{} Team</p>",
        escape_html(&branding.app_name)
    )
}

impl Branding {
    fn message(&self, to: Vec<String>, subject: String, html: String) -> EmailMessage {
        EmailMessage {
            from: self.sender.clone(),
            to,
            subject,
            html,
        }
    }

    /// Admin notice for a new registration request awaiting review.
    pub fn registration_request(&self, name: &str, email: &str) -> EmailMessage {
        let html = format!(
            "<div><p>A new registration request has been received at {app}:</p>\
             <p><b>Name:</b> {name}</p><p><b>Email:</b> {email}</p>\
             <p>Please visit the admin panel to approve or reject the user.</p>\
             <p><a href='{admin}' target='_blank'>{admin}</a></p></div>",
            app = escape_html(&self.app_name),
            name = escape_html(name),
            email = escape_html(email),
            admin = self.admin_domain,
        );
        self.message(
            self.admin_recipients.clone(),
            format!("{}: New Registration Request", self.app_name),
            html,
        )
    }

    /// Admin notice and user confirmation sent once a user verified their
    /// email, in that order.
    pub fn verification_notices(&self, name: &str, email: &str) -> [EmailMessage; 2] {
        let admin_html = format!(
            "<div><p><b>Dear Administrator,</b></p><br />\
             <p>A new user has registered on <a href='{domain}' target='_blank'>{domain}</a>. \
             Here are the details of the new user:</p>\
             <p><b>Name: {name}</b></p><p><b>Email: {email}</b></p><br />\
             <p>Kindly review the user's profile and take any necessary administrative \
             actions by visiting the admin panel.</p>\
             <p><a href='{admin}' target='_blank'>Click here to visit Admin Panel</a></p></div>",
            domain = self.app_domain,
            name = escape_html(name),
            email = escape_html(email),
            admin = self.admin_domain,
        );
        let user_html = format!(
            "<div><p><b>Dear {name},</b></p><br />\
             <p>Congratulations! Your email address has been successfully verified.</p>\
             <p>Your profile is currently being reviewed by the admin. You can access your \
             account once it is approved.</p>{signature}</div>",
            name = escape_html(name),
            signature = signature(self),
        );

        [
            self.message(
                self.admin_recipients.clone(),
                format!("{}: New Registration Request", self.app_name),
                admin_html,
            ),
            self.message(
                vec![email.to_string()],
                format!("{}: Email Successfully Verified!", self.app_name),
                user_html,
            ),
        ]
    }

    /// Approval or rejection of a registration. Falls back to the email
    /// address when no name is known.
    pub fn registration_decision(
        &self,
        email: &str,
        name: Option<&str>,
        decision: Decision,
    ) -> EmailMessage {
        let app = escape_html(&self.app_name);
        let greeting = escape_html(name.filter(|n| !n.trim().is_empty()).unwrap_or(email));

        let (subject, body) = match decision {
            Decision::Approved => (
                format!("{}: Account Approved!", self.app_name),
                format!(
                    "<p>We are excited to inform you that your registration request on {app} \
                     has been successfully approved by the admin.</p>\
                     <p>You may login with your credentials now by visiting the link below.</p>\
                     <p><a href='{domain}/login' target='_blank'>Click here to Login</a></p>\
                     <p>Welcome aboard, and enjoy your journey with us!</p>",
                    domain = self.app_domain.trim_end_matches('/'),
                ),
            ),
            Decision::Rejected => (
                format!("{}: Account Rejected!", self.app_name),
                format!(
                    "<p>Thank you for your interest in joining {app}.</p>\
                     <p>After reviewing your registration, we regret to inform you that your \
                     account could not be approved at this time.</p>\
                     <p>Thank you for your understanding, and we appreciate your interest in \
                     {app}.</p>"
                ),
            ),
        };

        let html = format!(
            "<div><p><b>Dear {greeting},</b></p><br />{body}{signature}</div>",
            signature = signature(self),
        );
        self.message(vec![email.to_string()], subject, html)
    }

    /// Invitation to register and access a shared item.
    pub fn invitation(&self, email: &str, item_name: &str, item_type: &str) -> EmailMessage {
        let app = escape_html(&self.app_name);
        let item_type = escape_html(item_type);
        let html = format!(
            "<div><p><b>Dear {email},</b></p><br />\
             <p>You have been invited to access a {item_type}, <b>'{item_name}'</b> at {app}.</p>\
             <p>Please register at {app} to access the {item_type}.</p>\
             <p><a href='{domain}/register' target='_blank'>Please visit this link to register.</a></p>\
             {signature}</div>",
            email = escape_html(email),
            item_name = escape_html(item_name),
            domain = self.app_domain.trim_end_matches('/'),
            signature = signature(self),
        );
        self.message(
            vec![email.to_string()],
            format!("{}: Invitation Received", self.app_name),
            html,
        )
    }
}
