use anyhow::{bail, Result};

use crate::{
    cli::{Cli, Command},
    domain::session::Session,
    infra::{clock::SystemClock, local_auth::LocalAuth},
    ui::{self, render},
    usecases::{
        auth::{run_login, run_signup, AuthDeps, AuthTerminal, StdTerminal},
        bootstrap,
        context::AppContext,
        contracts::AuthService,
        profile::{update_profile, ProfileEdit},
        saved_messages::list_saved_messages,
        user_directory::UserDirectory,
    },
};

const AUTH_ATTEMPTS: usize = 3;

pub fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(cli.config.as_deref())?;
    tracing::debug!(
        data_dir = %context.layout.data_dir.display(),
        "context loaded"
    );

    let mut terminal = StdTerminal;
    dispatch(&context, cli.command_or_default(), &mut terminal)
}

fn dispatch(context: &AppContext, command: Command, terminal: &mut dyn AuthTerminal) -> Result<()> {
    let auth = bootstrap::local_auth(&context.layout);

    match command {
        Command::Run => {
            let session = require_session(&auth)?;
            let opened = bootstrap::open_store(&context.layout)?;
            let mut shell = bootstrap::compose_shell(context, opened.store.clone(), session);
            let mut source = ui::LineEventSource::stdin();
            ui::shell::start(context, &mut source, &mut shell)?;
        }
        Command::Signup | Command::Login => {
            let opened = bootstrap::open_store(&context.layout)?;
            let media = bootstrap::media(&context.layout);
            let deps = AuthDeps {
                auth: &auth,
                store: opened.store.as_ref(),
                clock: &SystemClock,
                uploader: &media,
            };
            let session = if command == Command::Signup {
                run_signup(terminal, &deps, AUTH_ATTEMPTS)?
            } else {
                run_login(terminal, &deps, AUTH_ATTEMPTS)?
            };
            if let Some(session) = session {
                tracing::info!(user_id = %session.user_id, "signed in");
            }
        }
        Command::Logout => {
            auth.sign_out()?;
            tracing::info!("signed out");
            terminal.print_line("Signed out.")?;
        }
        Command::Users { query } => {
            let session = require_session(&auth)?;
            let opened = bootstrap::open_store(&context.layout)?;
            let mut directory =
                UserDirectory::new(&session.user_id, context.config.profile.fallback());
            directory.prime(opened.store.as_ref())?;

            let found = directory.search(query.as_deref().unwrap_or_default());
            if found.is_empty() {
                terminal.print_line("No users found.")?;
            }
            for profile in found {
                terminal.print_line(&render::render_user(profile))?;
            }
        }
        Command::Saved => {
            let session = require_session(&auth)?;
            let opened = bootstrap::open_store(&context.layout)?;
            let saved = list_saved_messages(opened.store.as_ref(), &session)?;
            if saved.is_empty() {
                terminal.print_line("No saved messages.")?;
            }
            for entry in &saved {
                terminal.print_line(&render::render_saved(entry, render::DEFAULT_WIDTH))?;
            }
        }
        Command::Profile {
            name,
            nickname,
            color,
        } => {
            let session = require_session(&auth)?;
            let opened = bootstrap::open_store(&context.layout)?;
            let edit = ProfileEdit {
                name,
                nickname,
                avatar_color: color,
            };
            if update_profile(opened.store.as_ref(), &session, edit)? {
                terminal.print_line("Profile updated.")?;
            } else {
                terminal.print_line("Nothing to change. Pass --name, --nickname or --color.")?;
            }
        }
    }

    Ok(())
}

fn require_session(auth: &LocalAuth) -> Result<Session> {
    match auth.current_user()? {
        Some(session) => Ok(session),
        None => bail!("not signed in; run `pairchat login` or `pairchat signup` first"),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, io};

    use serde_json::json;

    use super::*;
    use crate::{
        infra::{config::AppConfig, storage_layout::StorageLayout},
        store::{DocumentPath, DocumentStore},
    };

    #[derive(Default)]
    struct ScriptedTerminal {
        answers: VecDeque<String>,
        printed: Vec<String>,
    }

    impl AuthTerminal for ScriptedTerminal {
        fn print_line(&mut self, line: &str) -> io::Result<()> {
            self.printed.push(line.to_owned());
            Ok(())
        }

        fn prompt_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
            Ok(self.answers.pop_front())
        }

        fn prompt_secret(&mut self, _prompt: &str) -> io::Result<Option<String>> {
            Ok(self.answers.pop_front())
        }
    }

    fn context(dir: &tempfile::TempDir) -> AppContext {
        let layout = StorageLayout::resolve(Some(dir.path().to_path_buf())).expect("layout");
        layout.ensure_dirs().expect("dirs");
        AppContext::new(AppConfig::default(), layout)
    }

    fn signed_in(context: &AppContext) -> Session {
        bootstrap::local_auth(&context.layout)
            .sign_up("me@example.com", "hunter22")
            .expect("sign up")
    }

    #[test]
    fn listing_users_requires_a_session() {
        let dir = tempfile::tempdir().expect("temp dir");
        let context = context(&dir);

        let error = dispatch(
            &context,
            Command::Users { query: None },
            &mut ScriptedTerminal::default(),
        )
        .expect_err("must require login");

        assert!(error.to_string().contains("not signed in"));
    }

    #[test]
    fn lists_other_users_matching_the_query() {
        let dir = tempfile::tempdir().expect("temp dir");
        let context = context(&dir);
        let me = signed_in(&context);
        {
            let opened = bootstrap::open_store(&context.layout).expect("open");
            for (id, name) in [(me.user_id.as_str(), "Me"), ("ann", "Ann"), ("bo", "Bo")] {
                opened
                    .store
                    .set(&DocumentPath::user(id), crate::store::fields([("name", json!(name))]), false)
                    .expect("seed");
            }
        }
        let mut terminal = ScriptedTerminal::default();

        dispatch(
            &context,
            Command::Users {
                query: Some("an".to_owned()),
            },
            &mut terminal,
        )
        .expect("users");

        assert_eq!(terminal.printed.len(), 1);
        assert!(terminal.printed[0].contains("Ann") && terminal.printed[0].contains("id=ann"));
    }

    #[test]
    fn login_then_logout_round_trip_through_the_session_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let context = context(&dir);
        signed_in(&context);
        let auth = bootstrap::local_auth(&context.layout);
        auth.sign_out().expect("sign out");

        let mut terminal = ScriptedTerminal {
            answers: VecDeque::from(["me@example.com".to_owned(), "hunter22".to_owned()]),
            ..ScriptedTerminal::default()
        };
        dispatch(&context, Command::Login, &mut terminal).expect("login");
        assert!(auth.current_user().expect("read").is_some());

        dispatch(&context, Command::Logout, &mut terminal).expect("logout");
        assert!(auth.current_user().expect("read").is_none());
        assert_eq!(terminal.printed.last().map(String::as_str), Some("Signed out."));
    }

    #[test]
    fn profile_without_flags_writes_nothing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let context = context(&dir);
        signed_in(&context);
        let mut terminal = ScriptedTerminal::default();

        dispatch(
            &context,
            Command::Profile {
                name: None,
                nickname: None,
                color: None,
            },
            &mut terminal,
        )
        .expect("profile");

        assert!(terminal.printed[0].starts_with("Nothing to change"));
    }
}
