//! Custom-message trigger: verification and login email templates.

use crate::error::{HookError, Result};

use super::{TriggerContext, TriggerEvent};

/// Greeting used when the user has no `given_name`.
pub const DEFAULT_GIVEN_NAME: &str = "Friend";

/// Message flows the directory asks us to word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    SignUp,
    ResendCode,
    ForgotPassword,
    UpdateUserAttribute,
    VerifyUserAttribute,
    Authentication,
}

impl MessageKind {
    pub fn from_trigger_source(source: &str) -> Option<Self> {
        Some(match source {
            "CustomMessage_SignUp" => Self::SignUp,
            "CustomMessage_ResendCode" => Self::ResendCode,
            "CustomMessage_ForgotPassword" => Self::ForgotPassword,
            "CustomMessage_UpdateUserAttribute" => Self::UpdateUserAttribute,
            "CustomMessage_VerifyUserAttribute" => Self::VerifyUserAttribute,
            "CustomMessage_Authentication" => Self::Authentication,
            _ => return None,
        })
    }

    /// How long the code stays valid, as worded in the message.
    pub fn expiry(&self) -> &'static str {
        match self {
            Self::ForgotPassword => "1 hour",
            Self::Authentication => "5 minutes",
            _ => "24 hours",
        }
    }
}

/// Rendered subject and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

pub fn handle(ctx: &TriggerContext, mut event: TriggerEvent) -> Result<TriggerEvent> {
    log::info!(
        "Custom message trigger for user: {}, source: {}",
        event.user_name,
        event.trigger_source
    );

    let Some(kind) = MessageKind::from_trigger_source(&event.trigger_source) else {
        log::warn!("Unknown trigger source: {}", event.trigger_source);
        return Ok(event);
    };

    let code = event.request.code_parameter.as_deref().ok_or_else(|| {
        HookError::MalformedTriggerEvent(format!(
            "{} event has no codeParameter",
            event.trigger_source
        ))
    })?;
    let given_name = event.attribute("given_name").unwrap_or(DEFAULT_GIVEN_NAME);

    let message = render(ctx, kind, given_name, code);
    event.set_response("emailSubject", message.subject);
    event.set_response("emailMessage", message.body);

    log::info!("Custom message processed for user: {}", event.user_name);
    Ok(event)
}

pub fn render(ctx: &TriggerContext, kind: MessageKind, given_name: &str, code: &str) -> EmailMessage {
    let product = &ctx.product_name;
    let support = &ctx.support_email;
    let expiry = kind.expiry();
    let sign_off = format!("Best regards,\nThe {product} Team");

    let (subject, body) = match kind {
        MessageKind::SignUp => (
            format!("Welcome to {product} - Verify Your Email"),
            format!(
                "Welcome to {product}, {given_name}!\n\n\
                 Your verification code is: {code}\n\n\
                 This code expires in {expiry}.\n\n\
                 Questions? We're here to help at {support}\n\n\
                 If you didn't create this account, you can safely ignore this email."
            ),
        ),
        MessageKind::ResendCode => (
            format!("{product} - Your New Verification Code"),
            format!(
                "Hi {given_name},\n\n\
                 Here's your new verification code for {product}:\n\n\
                 {code}\n\n\
                 This code expires in {expiry}.\n\n\
                 If you're having trouble with verification, please contact {support}\n\n\
                 {sign_off}"
            ),
        ),
        MessageKind::ForgotPassword => (
            format!("{product} - Reset Your Password"),
            format!(
                "Hi {given_name},\n\n\
                 We received a request to reset your {product} password.\n\n\
                 Your password reset code is: {code}\n\n\
                 This code expires in {expiry} for security reasons.\n\n\
                 If you didn't request this password reset, you can safely ignore this email. \
                 Your password will remain unchanged.\n\n\
                 {sign_off}"
            ),
        ),
        MessageKind::UpdateUserAttribute => (
            format!("{product} - Verify Your Email Change"),
            format!(
                "Hi there,\n\n\
                 We received a request to update your email address for your {product} account.\n\n\
                 Please use this verification code to confirm the change: {code}\n\n\
                 This code expires in {expiry}.\n\n\
                 If you didn't make this change, please contact {support} immediately.\n\n\
                 {sign_off}"
            ),
        ),
        MessageKind::VerifyUserAttribute => (
            format!("{product} - Verify Your Information"),
            format!(
                "Hi there,\n\n\
                 Please verify your information with this code: {code}\n\n\
                 The code expires in {expiry}.\n\n\
                 {sign_off}"
            ),
        ),
        MessageKind::Authentication => (
            format!("{product} - Your Login Code"),
            format!(
                "Your {product} login code is: {code}\n\n\
                 This code expires in {expiry}.\n\n\
                 If you didn't try to log in, please secure your account and contact {support}\n\n\
                 {sign_off}"
            ),
        ),
    };

    EmailMessage { subject, body }
}
