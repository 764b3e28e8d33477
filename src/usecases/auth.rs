use std::{fs, io, path::Path};

use thiserror::Error;

use crate::{
    domain::{
        profile::{UserProfile, AVATAR_PALETTE},
        session::Session,
    },
    infra::secrets::redact_text,
    store::{codec::profile_fields, DocumentPath, DocumentStore, StoreError},
};

use super::{
    contracts::{AuthError, AuthService, Clock, MediaUploader},
    profile::touch_presence,
};

const AVATAR_UPLOAD_FAILED: &str = "AVATAR_UPLOAD_FAILED";
const AUTH_BACKEND_FAILED: &str = "AUTH_BACKEND_FAILED";

pub trait AuthTerminal {
    fn print_line(&mut self, line: &str) -> io::Result<()>;
    fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

pub struct StdTerminal;

impl AuthTerminal for StdTerminal {
    fn print_line(&mut self, line: &str) -> io::Result<()> {
        println!("{line}");
        Ok(())
    }

    fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        use std::io::Write;

        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        let bytes = io::stdin().read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().to_owned()))
    }

    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match rpassword::prompt_password(prompt) {
            Ok(password) => Ok(Some(password.trim().to_owned())),
            Err(source) if source.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(source) => Err(source),
        }
    }
}

/// Everything the auth flows touch besides the terminal.
pub struct AuthDeps<'a> {
    pub auth: &'a dyn AuthService,
    pub store: &'a dyn DocumentStore,
    pub clock: &'a dyn Clock,
    pub uploader: &'a dyn MediaUploader,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub password: String,
    pub confirmation: String,
    pub avatar_color: String,
    pub avatar: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignupError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("profile could not be saved: {0}")]
    Profile(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub fn validate_signup(form: &SignupForm) -> Result<(), SignupError> {
    let required = [
        ("name", &form.name),
        ("nickname", &form.nickname),
        ("email", &form.email),
        ("password", &form.password),
        ("password confirmation", &form.confirmation),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(SignupError::MissingField(*field));
    }

    if form.password != form.confirmation {
        return Err(SignupError::PasswordMismatch);
    }

    Ok(())
}

pub fn validate_login(form: &LoginForm) -> Result<(), LoginError> {
    if form.email.trim().is_empty() {
        return Err(LoginError::MissingField("email"));
    }
    if form.password.is_empty() {
        return Err(LoginError::MissingField("password"));
    }
    Ok(())
}

/// Creates the account, uploads the optional avatar and writes the profile.
/// A failed avatar upload degrades to a profile without an image.
pub fn sign_up(deps: &AuthDeps<'_>, form: SignupForm) -> Result<Session, SignupError> {
    validate_signup(&form)?;

    let email = form.email.trim();
    let session = deps
        .auth
        .sign_up(email, &form.password)
        .inspect_err(log_backend_error)?;

    let avatar_url = form.avatar.as_deref().and_then(|bytes| {
        let path = format!("avatars/{}.jpg", session.user_id);
        deps.uploader
            .upload(bytes, &path)
            .inspect_err(|error| {
                tracing::warn!(
                    code = AVATAR_UPLOAD_FAILED,
                    error = %error,
                    "avatar upload failed, continuing without image"
                );
            })
            .ok()
    });

    let avatar_color = if form.avatar_color.trim().is_empty() {
        AVATAR_PALETTE[0].to_owned()
    } else {
        form.avatar_color
    };
    let profile = UserProfile {
        id: session.user_id.clone(),
        name: form.name.trim().to_owned(),
        nickname: form.nickname.trim().to_owned(),
        email: session.email.clone(),
        avatar_color,
        avatar_url,
        last_seen_ms: Some(deps.clock.now_ms()),
    };
    deps.store.set(
        &DocumentPath::user(&session.user_id),
        profile_fields(&profile),
        false,
    )?;

    tracing::info!(user_id = %session.user_id, "account created");
    Ok(session)
}

pub fn log_in(deps: &AuthDeps<'_>, form: LoginForm) -> Result<Session, LoginError> {
    validate_login(&form)?;

    let session = deps
        .auth
        .sign_in(form.email.trim(), &form.password)
        .inspect_err(log_backend_error)?;
    let _ = touch_presence(deps.store, &session, deps.clock.now_ms());

    tracing::info!(user_id = %session.user_id, "signed in");
    Ok(session)
}

/// Interactive sign-up with a bounded number of attempts. Returns `None`
/// when the user gives up or input ends.
pub fn run_signup(
    terminal: &mut dyn AuthTerminal,
    deps: &AuthDeps<'_>,
    attempts: usize,
) -> io::Result<Option<Session>> {
    for attempt in 1..=attempts {
        let Some(form) = prompt_signup_form(terminal)? else {
            terminal.print_line("Input cancelled (EOF). Run pairchat signup again to retry.")?;
            return Ok(None);
        };

        match sign_up(deps, form) {
            Ok(session) => {
                terminal.print_line(&format!("Account created. Signed in as {}.", session.email))?;
                return Ok(Some(session));
            }
            Err(
                error @ (SignupError::MissingField(_)
                | SignupError::PasswordMismatch
                | SignupError::Auth(AuthError::EmailTaken)),
            ) => {
                terminal.print_line(&format!(
                    "{error}. Attempts left: {}",
                    attempts.saturating_sub(attempt)
                ))?;
            }
            Err(error) => {
                terminal.print_line(&format!("Sign-up failed: {}", redact_text(&error.to_string())))?;
                return Ok(None);
            }
        }
    }

    terminal.print_line("Sign-up failed too many times. Please try again later.")?;
    Ok(None)
}

pub fn run_login(
    terminal: &mut dyn AuthTerminal,
    deps: &AuthDeps<'_>,
    attempts: usize,
) -> io::Result<Option<Session>> {
    for attempt in 1..=attempts {
        let Some(email) = terminal.prompt_line("Email: ")? else {
            terminal.print_line("Input cancelled (EOF). Run pairchat login again to retry.")?;
            return Ok(None);
        };
        let Some(password) = terminal.prompt_secret("Password: ")? else {
            terminal.print_line("Input cancelled (EOF). Run pairchat login again to retry.")?;
            return Ok(None);
        };

        match log_in(deps, LoginForm { email, password }) {
            Ok(session) => {
                terminal.print_line(&format!("Signed in as {}.", session.email))?;
                return Ok(Some(session));
            }
            Err(
                error @ (LoginError::MissingField(_) | LoginError::Auth(AuthError::InvalidCredentials)),
            ) => {
                terminal.print_line(&format!(
                    "{error}. Attempts left: {}",
                    attempts.saturating_sub(attempt)
                ))?;
            }
            Err(error) => {
                terminal.print_line(&format!("Sign-in failed: {}", redact_text(&error.to_string())))?;
                return Ok(None);
            }
        }
    }

    terminal.print_line("Sign-in failed too many times. Please try again later.")?;
    Ok(None)
}

fn prompt_signup_form(terminal: &mut dyn AuthTerminal) -> io::Result<Option<SignupForm>> {
    let Some(name) = terminal.prompt_line("Name: ")? else {
        return Ok(None);
    };
    let Some(nickname) = terminal.prompt_line("Nickname: ")? else {
        return Ok(None);
    };
    let Some(email) = terminal.prompt_line("Email: ")? else {
        return Ok(None);
    };
    let Some(password) = terminal.prompt_secret("Password: ")? else {
        return Ok(None);
    };
    let Some(confirmation) = terminal.prompt_secret("Confirm password: ")? else {
        return Ok(None);
    };

    terminal.print_line(&format!(
        "Avatar colors: {}",
        AVATAR_PALETTE
            .iter()
            .enumerate()
            .map(|(index, color)| format!("{}={color}", index + 1))
            .collect::<Vec<_>>()
            .join(" ")
    ))?;
    let choice = terminal.prompt_line("Avatar color [1]: ")?.unwrap_or_default();
    let avatar_color = choice
        .parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| AVATAR_PALETTE.get(index))
        .unwrap_or(&AVATAR_PALETTE[0])
        .to_string();

    let avatar_path = terminal
        .prompt_line("Avatar image path (optional): ")?
        .unwrap_or_default();
    let avatar = read_avatar(terminal, &avatar_path)?;

    Ok(Some(SignupForm {
        name,
        nickname,
        email,
        password,
        confirmation,
        avatar_color,
        avatar,
    }))
}

fn read_avatar(terminal: &mut dyn AuthTerminal, path: &str) -> io::Result<Option<Vec<u8>>> {
    if path.is_empty() {
        return Ok(None);
    }

    match fs::read(Path::new(path)) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(error) => {
            terminal.print_line(&format!(
                "Could not read avatar image ({error}); continuing without one."
            ))?;
            Ok(None)
        }
    }
}

fn log_backend_error(error: &AuthError) {
    if let AuthError::Unavailable(details) = error {
        tracing::warn!(
            code = AUTH_BACKEND_FAILED,
            details = %redact_text(details),
            "authentication backend failed"
        );
    }
}
